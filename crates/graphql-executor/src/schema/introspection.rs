// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The `__schema`, `__type` and `__typename` meta-fields and the `__*` types they return.
//!
//! Introspection values are ordinary [`Value::Object`]s. Anything that needs the schema to
//! compute (the kind of a named type, its fields, ...) is a [`Value::Method`] evaluated through
//! the default field resolver, which gives it access to the schema via the resolve info.

use std::sync::Arc;

use async_graphql_value::ConstValue;

use super::{
    Schema,
    directives::{DirectiveDefinition, DirectiveLocation},
    types::{
        EnumType, EnumValue, Field, InputValue, NamedType, ObjectType, TypeRef,
    },
};
use crate::{maybe_async::MaybeAsync, value::Value, values::Arguments};

pub fn introspection_types() -> Vec<NamedType> {
    vec![
        schema_type().into(),
        type_type().into(),
        type_kind_type().into(),
        field_type().into(),
        input_value_type().into(),
        enum_value_type().into(),
        directive_type().into(),
        directive_location_type().into(),
    ]
}

pub fn is_introspection_type(name: &str) -> bool {
    name.starts_with("__")
}

pub(crate) fn schema_meta_field() -> Field {
    Field::new("__schema", "__Schema!")
        .description("Access the current type schema of this server.")
        .resolver(|ctx| MaybeAsync::ready(Ok(schema_value(ctx.info.schema))))
}

pub(crate) fn type_meta_field() -> Field {
    Field::new("__type", "__Type")
        .description("Request the type information of a single type.")
        .argument(InputValue::new("name", "String!"))
        .resolver(|ctx| {
            let value = match ctx.args.get("name") {
                Some(ConstValue::String(name)) if ctx.info.schema.get_type(name).is_some() => {
                    named_type_value(name)
                }
                _ => Value::Null,
            };
            MaybeAsync::ready(Ok(value))
        })
}

pub(crate) fn typename_meta_field() -> Field {
    Field::new("__typename", "String!")
        .description("The name of the current Object type at runtime.")
        .resolver(|ctx| MaybeAsync::ready(Ok(Value::String(ctx.info.parent_type.name.clone()))))
}

fn schema_value(schema: &Schema) -> Value {
    Value::object([
        (
            "types",
            Value::List(schema.types().map(|t| named_type_value(t.name())).collect()),
        ),
        (
            "queryType",
            schema
                .query_type()
                .map(|t| named_type_value(&t.name))
                .unwrap_or_default(),
        ),
        (
            "mutationType",
            schema
                .mutation_type()
                .map(|t| named_type_value(&t.name))
                .unwrap_or_default(),
        ),
        ("subscriptionType", Value::Null),
        (
            "directives",
            Value::List(schema.directives().iter().map(directive_value).collect()),
        ),
    ])
}

fn type_ref_value(ty: &TypeRef) -> Value {
    match ty {
        TypeRef::Named(name) => named_type_value(name),
        TypeRef::List(of_type) => wrapping_type_value("LIST", of_type),
        TypeRef::NonNull(of_type) => wrapping_type_value("NON_NULL", of_type),
    }
}

fn wrapping_type_value(kind: &str, of_type: &TypeRef) -> Value {
    Value::object([
        ("kind", Value::from(kind)),
        ("name", Value::Null),
        ("description", Value::Null),
        ("fields", Value::Null),
        ("interfaces", Value::Null),
        ("possibleTypes", Value::Null),
        ("enumValues", Value::Null),
        ("inputFields", Value::Null),
        ("ofType", type_ref_value(of_type)),
    ])
}

fn named_type_value(name: &str) -> Value {
    let name: Arc<str> = Arc::from(name);

    Value::object([
        ("kind", lazy(&name, |t, _, _| Value::from(type_kind(t)))),
        ("name", Value::from(name.to_string())),
        (
            "description",
            lazy(&name, |t, _, _| Value::from(t.description().map(str::to_string))),
        ),
        ("fields", lazy(&name, type_fields)),
        ("interfaces", lazy(&name, type_interfaces)),
        ("possibleTypes", lazy(&name, type_possible_types)),
        ("enumValues", lazy(&name, type_enum_values)),
        ("inputFields", lazy(&name, type_input_fields)),
        ("ofType", Value::Null),
    ])
}

/// A property of the named type `name`, computed when the field is resolved.
fn lazy<F>(name: &Arc<str>, compute: F) -> Value
where
    F: Fn(&NamedType, &Arguments, &Schema) -> Value + Send + Sync + 'static,
{
    let name = name.clone();
    Value::method(move |args, _, info| {
        let value = info
            .schema
            .get_type(&name)
            .map(|named_type| compute(named_type, args, info.schema))
            .unwrap_or_default();
        MaybeAsync::ready(Ok(value))
    })
}

fn type_kind(named_type: &NamedType) -> &'static str {
    match named_type {
        NamedType::Scalar(_) => "SCALAR",
        NamedType::Object(_) => "OBJECT",
        NamedType::Interface(_) => "INTERFACE",
        NamedType::Union(_) => "UNION",
        NamedType::Enum(_) => "ENUM",
        NamedType::InputObject(_) => "INPUT_OBJECT",
    }
}

fn include_deprecated(args: &Arguments) -> bool {
    matches!(args.get("includeDeprecated"), Some(ConstValue::Boolean(true)))
}

fn type_fields(named_type: &NamedType, args: &Arguments, _: &Schema) -> Value {
    let include_deprecated = include_deprecated(args);

    named_type
        .fields()
        .map(|fields| {
            Value::List(
                fields
                    .values()
                    .filter(|field| include_deprecated || field.deprecation_reason.is_none())
                    .map(field_value)
                    .collect(),
            )
        })
        .unwrap_or_default()
}

fn type_interfaces(named_type: &NamedType, _: &Arguments, _: &Schema) -> Value {
    match named_type {
        NamedType::Object(object_type) => Value::List(
            object_type
                .interfaces
                .iter()
                .map(|name| named_type_value(name))
                .collect(),
        ),
        _ => Value::Null,
    }
}

fn type_possible_types(named_type: &NamedType, _: &Arguments, schema: &Schema) -> Value {
    if !named_type.is_abstract() {
        return Value::Null;
    }

    Value::List(
        schema
            .possible_types(named_type.name())
            .iter()
            .map(|name| named_type_value(name))
            .collect(),
    )
}

fn type_enum_values(named_type: &NamedType, args: &Arguments, _: &Schema) -> Value {
    let NamedType::Enum(enum_type) = named_type else {
        return Value::Null;
    };
    let include_deprecated = include_deprecated(args);

    Value::List(
        enum_type
            .values
            .values()
            .filter(|value| include_deprecated || value.deprecation_reason.is_none())
            .map(|value| {
                Value::object([
                    ("name", Value::from(value.name.clone())),
                    ("description", Value::from(value.description.clone())),
                    ("isDeprecated", Value::from(value.deprecation_reason.is_some())),
                    ("deprecationReason", Value::from(value.deprecation_reason.clone())),
                ])
            })
            .collect(),
    )
}

fn type_input_fields(named_type: &NamedType, _: &Arguments, _: &Schema) -> Value {
    match named_type {
        NamedType::InputObject(input_type) => {
            Value::List(input_type.fields.values().map(input_value_value).collect())
        }
        _ => Value::Null,
    }
}

fn field_value(field: &Field) -> Value {
    Value::object([
        ("name", Value::from(field.name.clone())),
        ("description", Value::from(field.description.clone())),
        (
            "args",
            Value::List(field.args.values().map(input_value_value).collect()),
        ),
        ("type", type_ref_value(&field.ty)),
        ("isDeprecated", Value::from(field.deprecation_reason.is_some())),
        ("deprecationReason", Value::from(field.deprecation_reason.clone())),
    ])
}

fn input_value_value(input_value: &InputValue) -> Value {
    Value::object([
        ("name", Value::from(input_value.name.clone())),
        ("description", Value::from(input_value.description.clone())),
        ("type", type_ref_value(&input_value.ty)),
        (
            "defaultValue",
            Value::from(input_value.default_value.as_ref().map(ConstValue::to_string)),
        ),
    ])
}

fn directive_value(directive: &DirectiveDefinition) -> Value {
    Value::object([
        ("name", Value::from(directive.name.clone())),
        ("description", Value::from(directive.description.clone())),
        (
            "locations",
            Value::List(
                directive
                    .locations
                    .iter()
                    .map(|location| Value::from(location.as_str()))
                    .collect(),
            ),
        ),
        (
            "args",
            Value::List(directive.args.values().map(input_value_value).collect()),
        ),
    ])
}

fn include_deprecated_argument() -> InputValue {
    InputValue::new("includeDeprecated", "Boolean").default_value(ConstValue::Boolean(false))
}

fn schema_type() -> ObjectType {
    ObjectType::new("__Schema")
        .description(
            "A GraphQL Schema defines the capabilities of a GraphQL server. It exposes all available types and directives on the server, as well as the entry points for query, mutation, and subscription operations.",
        )
        .field(
            Field::new("types", "[__Type!]!")
                .description("A list of all types supported by this server."),
        )
        .field(
            Field::new("queryType", "__Type!")
                .description("The type that query operations will be rooted at."),
        )
        .field(
            Field::new("mutationType", "__Type").description(
                "If this server supports mutation, the type that mutation operations will be rooted at.",
            ),
        )
        .field(
            Field::new("subscriptionType", "__Type").description(
                "If this server support subscription, the type that subscription operations will be rooted at.",
            ),
        )
        .field(
            Field::new("directives", "[__Directive!]!")
                .description("A list of all directives supported by this server."),
        )
}

fn type_type() -> ObjectType {
    ObjectType::new("__Type")
        .description(
            "The fundamental unit of any GraphQL Schema is the type. There are many kinds of types in GraphQL as represented by the `__TypeKind` enum.",
        )
        .field(Field::new("kind", "__TypeKind!"))
        .field(Field::new("name", "String"))
        .field(Field::new("description", "String"))
        .field(Field::new("fields", "[__Field!]").argument(include_deprecated_argument()))
        .field(Field::new("interfaces", "[__Type!]"))
        .field(Field::new("possibleTypes", "[__Type!]"))
        .field(
            Field::new("enumValues", "[__EnumValue!]").argument(include_deprecated_argument()),
        )
        .field(Field::new("inputFields", "[__InputValue!]"))
        .field(Field::new("ofType", "__Type"))
}

fn type_kind_type() -> EnumType {
    [
        ("SCALAR", "Indicates this type is a scalar."),
        (
            "OBJECT",
            "Indicates this type is an object. `fields` and `interfaces` are valid fields.",
        ),
        (
            "INTERFACE",
            "Indicates this type is an interface. `fields` and `possibleTypes` are valid fields.",
        ),
        (
            "UNION",
            "Indicates this type is a union. `possibleTypes` is a valid field.",
        ),
        (
            "ENUM",
            "Indicates this type is an enum. `enumValues` is a valid field.",
        ),
        (
            "INPUT_OBJECT",
            "Indicates this type is an input object. `inputFields` is a valid field.",
        ),
        ("LIST", "Indicates this type is a list. `ofType` is a valid field."),
        ("NON_NULL", "Indicates this type is a non-null. `ofType` is a valid field."),
    ]
    .into_iter()
    .fold(
        EnumType::new("__TypeKind")
            .description("An enum describing what kind of type a given `__Type` is."),
        |enum_type, (name, description)| {
            enum_type.value(EnumValue::new(name).description(description))
        },
    )
}

fn field_type() -> ObjectType {
    ObjectType::new("__Field")
        .description(
            "Object and Interface types are described by a list of Fields, each of which has a name, potentially a list of arguments, and a return type.",
        )
        .field(Field::new("name", "String!"))
        .field(Field::new("description", "String"))
        .field(Field::new("args", "[__InputValue!]!"))
        .field(Field::new("type", "__Type!"))
        .field(Field::new("isDeprecated", "Boolean!"))
        .field(Field::new("deprecationReason", "String"))
}

fn input_value_type() -> ObjectType {
    ObjectType::new("__InputValue")
        .description(
            "Arguments provided to Fields or Directives and the input fields of an InputObject are represented as Input Values which describe their type and optionally a default value.",
        )
        .field(Field::new("name", "String!"))
        .field(Field::new("description", "String"))
        .field(Field::new("type", "__Type!"))
        .field(
            Field::new("defaultValue", "String").description(
                "A GraphQL-formatted string representing the default value for this input value.",
            ),
        )
}

fn enum_value_type() -> ObjectType {
    ObjectType::new("__EnumValue")
        .description(
            "One possible value for a given Enum. Enum values are unique values, not a placeholder for a string or numeric value. However an Enum value is returned in a JSON response as a string.",
        )
        .field(Field::new("name", "String!"))
        .field(Field::new("description", "String"))
        .field(Field::new("isDeprecated", "Boolean!"))
        .field(Field::new("deprecationReason", "String"))
}

fn directive_type() -> ObjectType {
    ObjectType::new("__Directive")
        .description(
            "A Directive provides a way to describe alternate runtime execution and type validation behavior in a GraphQL document.",
        )
        .field(Field::new("name", "String!"))
        .field(Field::new("description", "String"))
        .field(Field::new("locations", "[__DirectiveLocation!]!"))
        .field(Field::new("args", "[__InputValue!]!"))
}

fn directive_location_type() -> EnumType {
    DirectiveLocation::ALL.iter().fold(
        EnumType::new("__DirectiveLocation").description(
            "A Directive can be adjacent to many parts of the GraphQL language, a __DirectiveLocation describes one such possible adjacencies.",
        ),
        |enum_type, location| enum_type.value(EnumValue::new(location.as_str())),
    )
}
