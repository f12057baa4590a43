// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{collections::HashMap, sync::Arc};

use async_graphql_parser::{
    Positioned,
    types::{Field as FieldNode, FragmentDefinition, OperationDefinition},
};
use async_graphql_value::Name;
use tracing::debug;

use super::{
    complete::{Completion, complete_value_catching_error},
    context::ExecutionContext,
};
use crate::{
    error::GraphQLError,
    maybe_async::MaybeAsync,
    path::Path,
    schema::{
        Schema,
        types::{Field, ObjectType, TypeRef},
    },
    value::{ContextValue, Resolution, Value},
    values::{Arguments, Variables, argument_values},
};

/// Describes the field being resolved.
#[derive(Clone)]
pub struct ResolveInfo<'a> {
    pub field_name: &'a str,
    pub field_nodes: Arc<[&'a Positioned<FieldNode>]>,
    pub return_type: &'a TypeRef,
    pub parent_type: &'a ObjectType,
    pub path: Path,
    pub schema: &'a Schema,
    pub fragments: &'a HashMap<Name, Positioned<FragmentDefinition>>,
    pub root_value: &'a Value,
    pub operation: &'a Positioned<OperationDefinition>,
    pub variable_values: &'a Variables,
}

impl std::fmt::Debug for ResolveInfo<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolveInfo")
            .field("field_name", &self.field_name)
            .field("parent_type", &self.parent_type.name)
            .field("return_type", &self.return_type)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// What a resolver is called with.
///
/// `source`, `args` and `info` are only borrowed for the duration of the call: a resolver that
/// answers later must copy what it needs into its future.
#[derive(Clone, Copy)]
pub struct ResolverContext<'r, 'a> {
    pub source: &'r Value,
    pub args: &'r Arguments,
    pub context_value: &'a ContextValue,
    pub info: &'r ResolveInfo<'a>,
}

/// Reads the property named after the field from an object source. A property holding a
/// [`Value::Method`] is called with the field's arguments.
pub fn default_field_resolver<'r, 'a>(ctx: ResolverContext<'r, 'a>) -> Resolution<'a> {
    let Value::Object(entries) = ctx.source else {
        return MaybeAsync::ready(Ok(Value::Null));
    };

    match entries.get(ctx.info.field_name) {
        Some(Value::Method(method)) => method.call(ctx.args, ctx.context_value, ctx.info),
        Some(value) => MaybeAsync::ready(Ok(value.clone())),
        None => MaybeAsync::ready(Ok(Value::Null)),
    }
}

/// The definition of `field_name` on `parent_type`, including the introspection meta-fields.
///
/// `__schema` and `__type` exist only on the query root, and only while introspection is
/// enabled.
pub fn get_field_def<'a>(
    ctx: &ExecutionContext<'a>,
    parent_type: &'a ObjectType,
    field_name: &str,
) -> Option<&'a Field> {
    let schema = ctx.schema;
    let is_query_root = || {
        schema
            .query_type()
            .is_some_and(|query_type| query_type.name == parent_type.name)
    };

    match field_name {
        "__schema" if ctx.config.introspection && is_query_root() => {
            Some(&schema.schema_meta_field)
        }
        "__type" if ctx.config.introspection && is_query_root() => Some(&schema.type_meta_field),
        "__typename" => Some(&schema.typename_meta_field),
        _ => parent_type.fields.get(field_name),
    }
}

pub fn build_resolve_info<'a>(
    ctx: &'a ExecutionContext<'a>,
    field_def: &'a Field,
    field_nodes: &[&'a Positioned<FieldNode>],
    parent_type: &'a ObjectType,
    path: Path,
) -> ResolveInfo<'a> {
    ResolveInfo {
        field_name: &field_def.name,
        field_nodes: field_nodes.into(),
        return_type: &field_def.ty,
        parent_type,
        path,
        schema: ctx.schema,
        fragments: ctx.fragments,
        root_value: &ctx.root_value,
        operation: ctx.operation,
        variable_values: &ctx.variable_values,
    }
}

/// Coerces the field's arguments and calls `resolve_fn`.
pub fn resolve_field_value_or_error<'a>(
    ctx: &'a ExecutionContext<'a>,
    field_def: &'a Field,
    field_node: &'a Positioned<FieldNode>,
    resolve_fn: &(dyn for<'r, 'e> Fn(ResolverContext<'r, 'e>) -> Resolution<'e> + Send + Sync),
    source: &Value,
    info: &ResolveInfo<'a>,
) -> MaybeAsync<'a, Result<Value, GraphQLError>> {
    let args = match argument_values(
        ctx.schema,
        &field_def.args,
        &field_node.node.arguments,
        field_node.pos,
        &ctx.variable_values,
    ) {
        Ok(args) => args,
        Err(error) => return MaybeAsync::ready(Err(error)),
    };

    resolve_fn(ResolverContext {
        source,
        args: &args,
        context_value: &ctx.context_value,
        info,
    })
    .map(|result| result.map_err(GraphQLError::from))
}

/// Resolves and completes one field of `source`.
///
/// Returns `None` for a field that is not defined on `parent_type`; such a field is left out of
/// the response.
pub fn resolve_field<'a>(
    ctx: &'a ExecutionContext<'a>,
    parent_type: &'a ObjectType,
    source: &Value,
    field_nodes: &[&'a Positioned<FieldNode>],
    path: Path,
) -> Option<Completion<'a>> {
    let field_node = *field_nodes.first()?;
    let field_name = field_node.node.name.node.as_str();

    let Some(field_def) = get_field_def(ctx, parent_type, field_name) else {
        debug!(
            parent_type = %parent_type.name,
            field_name,
            "Skipping field not defined on the parent type"
        );
        return None;
    };

    let resolve_fn = field_def.resolve_fn().unwrap_or(&ctx.field_resolver);
    let info = build_resolve_info(ctx, field_def, field_nodes, parent_type, path);

    let result = resolve_field_value_or_error(
        ctx,
        field_def,
        field_node,
        resolve_fn.as_ref(),
        source,
        &info,
    );

    Some(complete_value_catching_error(
        ctx,
        &field_def.ty,
        &info,
        &info.path,
        result,
    ))
}
