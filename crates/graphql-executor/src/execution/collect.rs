// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{collections::HashSet, sync::Arc};

use async_graphql_parser::{
    Positioned,
    types::{Directive, Field, Selection, SelectionSet, TypeCondition},
};
use async_graphql_value::ConstValue;
use indexmap::IndexMap;

use super::context::ExecutionContext;
use crate::{
    error::GraphQLError,
    schema::{
        Schema,
        types::{NamedType, ObjectType},
    },
    values::directive_values,
};

/// Field nodes grouped by response key, in the order the keys first appear.
pub type FieldsMap<'a> = IndexMap<&'a str, Vec<&'a Positioned<Field>>>;

/// Collects the fields of `selection_set` that apply to `runtime_type` into `fields`, following
/// fragments.
///
/// A fragment spread whose name is already in `visited_fragment_names` is not followed again,
/// which also stops cycles between fragments.
pub fn collect_fields<'a>(
    ctx: &ExecutionContext<'a>,
    runtime_type: &ObjectType,
    selection_set: &'a SelectionSet,
    fields: &mut FieldsMap<'a>,
    visited_fragment_names: &mut HashSet<&'a str>,
) -> Result<(), GraphQLError> {
    for selection in &selection_set.items {
        match &selection.node {
            Selection::Field(field) => {
                if !should_include(ctx, &field.node.directives)? {
                    continue;
                }
                fields
                    .entry(field.node.response_key().node.as_str())
                    .or_default()
                    .push(field);
            }
            Selection::InlineFragment(fragment) => {
                if !should_include(ctx, &fragment.node.directives)?
                    || !does_fragment_condition_match(
                        ctx.schema,
                        fragment.node.type_condition.as_ref().map(|c| &c.node),
                        runtime_type,
                    )
                {
                    continue;
                }
                collect_fields(
                    ctx,
                    runtime_type,
                    &fragment.node.selection_set.node,
                    fields,
                    visited_fragment_names,
                )?;
            }
            Selection::FragmentSpread(spread) => {
                let fragment_name = spread.node.fragment_name.node.as_str();
                if visited_fragment_names.contains(fragment_name)
                    || !should_include(ctx, &spread.node.directives)?
                {
                    continue;
                }
                visited_fragment_names.insert(fragment_name);

                let Some(fragment) = ctx.fragments.get(fragment_name) else {
                    continue;
                };
                if !does_fragment_condition_match(
                    ctx.schema,
                    Some(&fragment.node.type_condition.node),
                    runtime_type,
                ) {
                    continue;
                }
                collect_fields(
                    ctx,
                    runtime_type,
                    &fragment.node.selection_set.node,
                    fields,
                    visited_fragment_names,
                )?;
            }
        }
    }

    Ok(())
}

/// Collects and merges the sub-selections of `field_nodes` for `return_type`.
///
/// The result is cached for the execution, since every item of a list of objects asks for the
/// same fields.
pub(crate) fn collect_subfields<'a>(
    ctx: &ExecutionContext<'a>,
    return_type: &ObjectType,
    field_nodes: &[&'a Positioned<Field>],
) -> Result<Arc<FieldsMap<'a>>, GraphQLError> {
    ctx.cached_subfields(&return_type.name, field_nodes, || {
        let mut fields = FieldsMap::new();
        let mut visited_fragment_names = HashSet::new();
        for field_node in field_nodes {
            collect_fields(
                ctx,
                return_type,
                &field_node.node.selection_set.node,
                &mut fields,
                &mut visited_fragment_names,
            )?;
        }
        Ok(fields)
    })
}

/// Whether a field or fragment is included given its `@skip` and `@include` directives.
///
/// `@skip(if: true)` wins over any `@include`.
pub fn should_include(
    ctx: &ExecutionContext<'_>,
    directives: &[Positioned<Directive>],
) -> Result<bool, GraphQLError> {
    if directives.is_empty() {
        return Ok(true);
    }

    let directive_if = |name: &str| -> Result<Option<ConstValue>, GraphQLError> {
        let Some(definition) = ctx.schema.directive(name) else {
            return Ok(None);
        };
        Ok(
            directive_values(ctx.schema, definition, directives, &ctx.variable_values)?
                .and_then(|mut args| args.shift_remove("if")),
        )
    };

    if directive_if("skip")? == Some(ConstValue::Boolean(true)) {
        return Ok(false);
    }
    if directive_if("include")? == Some(ConstValue::Boolean(false)) {
        return Ok(false);
    }
    Ok(true)
}

/// Whether a fragment with `type_condition` applies to objects of `runtime_type`.
pub fn does_fragment_condition_match(
    schema: &Schema,
    type_condition: Option<&TypeCondition>,
    runtime_type: &ObjectType,
) -> bool {
    let Some(type_condition) = type_condition else {
        return true;
    };
    let condition = type_condition.on.node.as_str();

    if condition == runtime_type.name {
        return true;
    }

    match schema.get_type(condition) {
        Some(named_type @ (NamedType::Interface(_) | NamedType::Union(_))) => {
            schema.is_possible_type(named_type.name(), &runtime_type.name)
        }
        _ => false,
    }
}
