// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_graphql_value::ConstValue;
use indexmap::IndexMap;

use super::types::{InputValue, TypeRef};

pub const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveLocation {
    Query,
    Mutation,
    Subscription,
    Field,
    FragmentDefinition,
    FragmentSpread,
    InlineFragment,
    VariableDefinition,
    Schema,
    Scalar,
    Object,
    FieldDefinition,
    ArgumentDefinition,
    Interface,
    Union,
    Enum,
    EnumValue,
    InputObject,
    InputFieldDefinition,
}

impl DirectiveLocation {
    pub const ALL: [DirectiveLocation; 19] = [
        DirectiveLocation::Query,
        DirectiveLocation::Mutation,
        DirectiveLocation::Subscription,
        DirectiveLocation::Field,
        DirectiveLocation::FragmentDefinition,
        DirectiveLocation::FragmentSpread,
        DirectiveLocation::InlineFragment,
        DirectiveLocation::VariableDefinition,
        DirectiveLocation::Schema,
        DirectiveLocation::Scalar,
        DirectiveLocation::Object,
        DirectiveLocation::FieldDefinition,
        DirectiveLocation::ArgumentDefinition,
        DirectiveLocation::Interface,
        DirectiveLocation::Union,
        DirectiveLocation::Enum,
        DirectiveLocation::EnumValue,
        DirectiveLocation::InputObject,
        DirectiveLocation::InputFieldDefinition,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DirectiveLocation::Query => "QUERY",
            DirectiveLocation::Mutation => "MUTATION",
            DirectiveLocation::Subscription => "SUBSCRIPTION",
            DirectiveLocation::Field => "FIELD",
            DirectiveLocation::FragmentDefinition => "FRAGMENT_DEFINITION",
            DirectiveLocation::FragmentSpread => "FRAGMENT_SPREAD",
            DirectiveLocation::InlineFragment => "INLINE_FRAGMENT",
            DirectiveLocation::VariableDefinition => "VARIABLE_DEFINITION",
            DirectiveLocation::Schema => "SCHEMA",
            DirectiveLocation::Scalar => "SCALAR",
            DirectiveLocation::Object => "OBJECT",
            DirectiveLocation::FieldDefinition => "FIELD_DEFINITION",
            DirectiveLocation::ArgumentDefinition => "ARGUMENT_DEFINITION",
            DirectiveLocation::Interface => "INTERFACE",
            DirectiveLocation::Union => "UNION",
            DirectiveLocation::Enum => "ENUM",
            DirectiveLocation::EnumValue => "ENUM_VALUE",
            DirectiveLocation::InputObject => "INPUT_OBJECT",
            DirectiveLocation::InputFieldDefinition => "INPUT_FIELD_DEFINITION",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirectiveDefinition {
    pub name: String,
    pub description: Option<String>,
    pub locations: Vec<DirectiveLocation>,
    pub args: IndexMap<String, InputValue>,
}

impl DirectiveDefinition {
    pub fn new(name: impl Into<String>, locations: Vec<DirectiveLocation>) -> Self {
        Self {
            name: name.into(),
            description: None,
            locations,
            args: IndexMap::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn argument(mut self, argument: InputValue) -> Self {
        self.args.insert(argument.name.clone(), argument);
        self
    }
}

pub fn include_directive() -> DirectiveDefinition {
    DirectiveDefinition::new(
        "include",
        vec![
            DirectiveLocation::Field,
            DirectiveLocation::FragmentSpread,
            DirectiveLocation::InlineFragment,
        ],
    )
    .description(
        "Directs the executor to include this field or fragment only when the `if` argument is true.",
    )
    .argument(InputValue::new("if", TypeRef::from("Boolean!")).description("Included when true."))
}

pub fn skip_directive() -> DirectiveDefinition {
    DirectiveDefinition::new(
        "skip",
        vec![
            DirectiveLocation::Field,
            DirectiveLocation::FragmentSpread,
            DirectiveLocation::InlineFragment,
        ],
    )
    .description(
        "Directs the executor to skip this field or fragment when the `if` argument is true.",
    )
    .argument(InputValue::new("if", TypeRef::from("Boolean!")).description("Skipped when true."))
}

pub fn deprecated_directive() -> DirectiveDefinition {
    DirectiveDefinition::new(
        "deprecated",
        vec![DirectiveLocation::FieldDefinition, DirectiveLocation::EnumValue],
    )
    .description("Marks an element of a GraphQL schema as no longer supported.")
    .argument(
        InputValue::new("reason", TypeRef::named("String"))
            .description(
                "Explains why this element was deprecated, usually also including a suggestion for how to access supported similar data. Formatted in [Markdown](https://daringfireball.net/projects/markdown/).",
            )
            .default_value(ConstValue::String(DEFAULT_DEPRECATION_REASON.to_string())),
    )
}

pub fn iam_directive() -> DirectiveDefinition {
    DirectiveDefinition::new("iam", vec![DirectiveLocation::FieldDefinition])
        .description("Annotates the necessary access permissions for the element.")
        .argument(
            InputValue::new("name", TypeRef::named("String")).description("Defines the access key"),
        )
}

pub fn specified_directives() -> Vec<DirectiveDefinition> {
    vec![
        include_directive(),
        skip_directive(),
        deprecated_directive(),
        iam_directive(),
    ]
}
