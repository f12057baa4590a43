// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Completion turns the raw value of a field into its response value, guided by the field's
//! type.
//!
//! Errors are plain `Err` results. [`complete_value_catching_error`] is the boundary at which an
//! error is located and either recorded (nullable positions, which then complete to `null`) or
//! passed up to the enclosing field (non-null positions).

use async_graphql_parser::{Positioned, types::Field};
use futures::FutureExt;
use serde_json::Value as JsonValue;
use tracing::warn;

use super::{
    collect::collect_subfields, context::ExecutionContext, operation::execute_fields,
    resolve::ResolveInfo,
};
use crate::{
    error::GraphQLError,
    maybe_async::MaybeAsync,
    path::Path,
    schema::types::{NamedType, ObjectType, TypeRef},
    value::Value,
};

/// A completed response value, possibly still being computed.
pub type Completion<'a> = MaybeAsync<'a, Result<JsonValue, GraphQLError>>;

/// Completes `result` (which may still be pending) and handles any error it produces.
///
/// Only fails if `return_type` is non-null, with an error that is already located.
pub(crate) fn complete_value_catching_error<'a>(
    ctx: &'a ExecutionContext<'a>,
    return_type: &'a TypeRef,
    info: &ResolveInfo<'a>,
    path: &Path,
    result: MaybeAsync<'a, Result<Value, GraphQLError>>,
) -> Completion<'a> {
    let result = result.and_then(|result| match result {
        Ok(Value::Pending(deferred)) => MaybeAsync::pending(
            deferred
                .settle()
                .map(|settled| settled.map_err(GraphQLError::from)),
        ),
        result => MaybeAsync::ready(result),
    });

    let completed = match result.into_ready() {
        Ok(result) => complete_settled_value(ctx, return_type, info, path, result),
        Err(pending) => {
            let info = info.clone();
            let path = path.clone();
            MaybeAsync::pending(async move {
                let result = pending.resolve().await;
                complete_settled_value(ctx, return_type, &info, &path, result)
                    .resolve()
                    .await
            })
        }
    };

    let field_nodes = info.field_nodes.clone();
    let path = path.clone();
    completed.map(move |result| {
        result.or_else(|error| handle_field_error(ctx, return_type, &field_nodes, &path, error))
    })
}

fn handle_field_error(
    ctx: &ExecutionContext<'_>,
    return_type: &TypeRef,
    field_nodes: &[&Positioned<Field>],
    path: &Path,
    error: GraphQLError,
) -> Result<JsonValue, GraphQLError> {
    let error = error.locate(field_nodes, path);

    if return_type.is_non_null() {
        return Err(error);
    }

    warn!(%path, error = %error.message, "Field error, completing as null");
    ctx.record_error(error);
    Ok(JsonValue::Null)
}

fn complete_settled_value<'a>(
    ctx: &'a ExecutionContext<'a>,
    return_type: &'a TypeRef,
    info: &ResolveInfo<'a>,
    path: &Path,
    result: Result<Value, GraphQLError>,
) -> Completion<'a> {
    match result {
        Ok(value) => complete_value(ctx, return_type, info, path, value),
        Err(error) => MaybeAsync::ready(Err(error)),
    }
}

/// Completes a settled raw value against `return_type`.
pub fn complete_value<'a>(
    ctx: &'a ExecutionContext<'a>,
    return_type: &'a TypeRef,
    info: &ResolveInfo<'a>,
    path: &Path,
    result: Value,
) -> Completion<'a> {
    let result = match result {
        Value::Error(error) => return MaybeAsync::ready(Err(error.into())),
        Value::Pending(deferred) => {
            let info = info.clone();
            let path = path.clone();
            return MaybeAsync::pending(async move {
                match deferred.settle().await {
                    Ok(value) => {
                        complete_value(ctx, return_type, &info, &path, value)
                            .resolve()
                            .await
                    }
                    Err(error) => Err(error.into()),
                }
            });
        }
        result => result,
    };

    match return_type {
        TypeRef::NonNull(of_type) => {
            let parent_type = info.parent_type;
            let field_name = info.field_name;
            complete_value(ctx, of_type, info, path, result).map(move |completed| match completed {
                Ok(JsonValue::Null) => Err(GraphQLError::new(format!(
                    "Cannot return null for non-nullable field {}.{field_name}.",
                    parent_type.name
                ))),
                completed => completed,
            })
        }
        _ if result.is_nullish() => MaybeAsync::ready(Ok(JsonValue::Null)),
        TypeRef::List(item_type) => complete_list_value(ctx, item_type, info, path, result),
        TypeRef::Named(type_name) => match ctx.schema.get_type(type_name) {
            Some(NamedType::Scalar(scalar_type)) => MaybeAsync::ready(complete_leaf_value(
                type_name,
                scalar_type.serialize(&result),
                &result,
            )),
            Some(NamedType::Enum(enum_type)) => MaybeAsync::ready(complete_leaf_value(
                type_name,
                enum_type.serialize(&result),
                &result,
            )),
            Some(NamedType::Object(object_type)) => {
                complete_object_value(ctx, object_type, info, path, result)
            }
            Some(abstract_type @ (NamedType::Interface(_) | NamedType::Union(_))) => {
                complete_abstract_value(ctx, abstract_type, info, path, result)
            }
            Some(NamedType::InputObject(_)) | None => MaybeAsync::ready(Err(GraphQLError::new(
                format!("Cannot complete value of unexpected type \"{return_type}\"."),
            ))),
        },
    }
}

/// Completes every item independently: a failed item is `null` unless the item type is
/// non-null, in which case the items after it are not completed.
///
/// [`Value::Pending`] items are completed once they settle; all pending items are awaited
/// together.
fn complete_list_value<'a>(
    ctx: &'a ExecutionContext<'a>,
    item_type: &'a TypeRef,
    info: &ResolveInfo<'a>,
    path: &Path,
    result: Value,
) -> Completion<'a> {
    let Value::List(items) = result else {
        return MaybeAsync::ready(Err(GraphQLError::new(format!(
            "Expected Iterable, but did not find one for field {}.{}.",
            info.parent_type.name, info.field_name
        ))));
    };

    let mut completed = Vec::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        let item = complete_value_catching_error(
            ctx,
            item_type,
            info,
            &path.append(index),
            MaybeAsync::ready(Ok(item)),
        );

        match item.into_ready() {
            Ok(Err(error)) => return MaybeAsync::ready(Err(error)),
            Ok(item) => completed.push(MaybeAsync::ready(item)),
            Err(pending) => completed.push(pending),
        }
    }

    MaybeAsync::join_all(completed).map(|items| {
        items
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map(JsonValue::Array)
    })
}

fn complete_leaf_value(
    type_name: &str,
    serialized: Option<JsonValue>,
    result: &Value,
) -> Result<JsonValue, GraphQLError> {
    serialized.ok_or_else(|| {
        GraphQLError::new(format!(
            "Expected a value of type \"{type_name}\" but received: {result}"
        ))
    })
}

fn complete_abstract_value<'a>(
    ctx: &'a ExecutionContext<'a>,
    abstract_type: &'a NamedType,
    info: &ResolveInfo<'a>,
    path: &Path,
    result: Value,
) -> Completion<'a> {
    let runtime_type = match abstract_type.resolve_type_fn() {
        Some(resolve_type) => resolve_type(&result, &ctx.context_value, info),
        None => default_resolve_type(ctx, abstract_type, &result, info),
    };

    match runtime_type.into_ready() {
        Ok(runtime_type) => {
            complete_runtime_object(ctx, abstract_type, runtime_type, info, path, result)
        }
        Err(pending) => {
            let info = info.clone();
            let path = path.clone();
            MaybeAsync::pending(async move {
                let runtime_type = pending.resolve().await;
                complete_runtime_object(ctx, abstract_type, runtime_type, &info, &path, result)
                    .resolve()
                    .await
            })
        }
    }
}

fn complete_runtime_object<'a>(
    ctx: &'a ExecutionContext<'a>,
    abstract_type: &'a NamedType,
    runtime_type: Option<String>,
    info: &ResolveInfo<'a>,
    path: &Path,
    result: Value,
) -> Completion<'a> {
    match ensure_valid_runtime_type(ctx, abstract_type, runtime_type.as_deref(), info, &result) {
        Ok(object_type) => complete_object_value(ctx, object_type, info, path, result),
        Err(error) => MaybeAsync::ready(Err(error)),
    }
}

fn ensure_valid_runtime_type<'a>(
    ctx: &ExecutionContext<'a>,
    abstract_type: &NamedType,
    runtime_type: Option<&str>,
    info: &ResolveInfo<'a>,
    result: &Value,
) -> Result<&'a ObjectType, GraphQLError> {
    let schema = ctx.schema;
    let abstract_name = abstract_type.name();

    let object_type = match runtime_type.and_then(|name| schema.get_type(name)) {
        Some(NamedType::Object(object_type)) => object_type,
        other => {
            let received = other.map_or("undefined", NamedType::name);
            return Err(GraphQLError::at_field_nodes(
                format!(
                    "Abstract type {abstract_name} must resolve to an Object type at runtime for field {}.{} with value {result}, received \"{received}\". Either the {abstract_name} type should provide a \"resolveType\" function or each possible type should provide an \"isTypeOf\" function.",
                    info.parent_type.name, info.field_name
                ),
                &info.field_nodes,
            ));
        }
    };

    if !schema.is_possible_type(abstract_name, &object_type.name) {
        return Err(GraphQLError::at_field_nodes(
            format!(
                "Runtime Object type \"{}\" is not a possible type for \"{abstract_name}\".",
                object_type.name
            ),
            &info.field_nodes,
        ));
    }

    Ok(object_type)
}

/// Names the object type of `value` when the abstract type has no `resolve_type` hook.
///
/// A string `__typename` property wins. Otherwise the `is_type_of` predicates of the possible
/// types are asked in declaration order, and the first synchronous match is used. Pending
/// answers are awaited together and the first positive one (in declaration order) wins.
fn default_resolve_type<'a>(
    ctx: &'a ExecutionContext<'a>,
    abstract_type: &NamedType,
    value: &Value,
    info: &ResolveInfo<'a>,
) -> MaybeAsync<'a, Option<String>> {
    if let Some(Value::String(type_name)) = value.get("__typename") {
        return MaybeAsync::ready(Some(type_name.clone()));
    }

    let schema = ctx.schema;
    let mut pending = vec![];

    for type_name in schema.possible_types(abstract_type.name()) {
        let Some(is_type_of) = schema
            .object_type(type_name)
            .and_then(ObjectType::is_type_of_fn)
        else {
            continue;
        };

        match is_type_of(value, &ctx.context_value, info).into_ready() {
            Ok(true) => return MaybeAsync::ready(Some(type_name.clone())),
            Ok(false) => {}
            Err(is_type_of) => pending.push((type_name, is_type_of)),
        }
    }

    if pending.is_empty() {
        return MaybeAsync::ready(None);
    }

    let (type_names, checks): (Vec<_>, Vec<_>) = pending.into_iter().unzip();
    MaybeAsync::join_all(checks).map(move |matches| {
        type_names
            .into_iter()
            .zip(matches)
            .find_map(|(type_name, matched)| matched.then(|| type_name.clone()))
    })
}

fn complete_object_value<'a>(
    ctx: &'a ExecutionContext<'a>,
    return_type: &'a ObjectType,
    info: &ResolveInfo<'a>,
    path: &Path,
    result: Value,
) -> Completion<'a> {
    let Some(is_type_of) = return_type.is_type_of_fn() else {
        return collect_and_execute_subfields(ctx, return_type, info, path, result);
    };

    match is_type_of(&result, &ctx.context_value, info).into_ready() {
        Ok(matched) => complete_checked_object(ctx, return_type, matched, info, path, result),
        Err(pending) => {
            let info = info.clone();
            let path = path.clone();
            MaybeAsync::pending(async move {
                let matched = pending.resolve().await;
                complete_checked_object(ctx, return_type, matched, &info, &path, result)
                    .resolve()
                    .await
            })
        }
    }
}

fn complete_checked_object<'a>(
    ctx: &'a ExecutionContext<'a>,
    return_type: &'a ObjectType,
    matched: bool,
    info: &ResolveInfo<'a>,
    path: &Path,
    result: Value,
) -> Completion<'a> {
    if matched {
        collect_and_execute_subfields(ctx, return_type, info, path, result)
    } else {
        MaybeAsync::ready(Err(GraphQLError::at_field_nodes(
            format!(
                "Expected value of type \"{}\" but got: {result}.",
                return_type.name
            ),
            &info.field_nodes,
        )))
    }
}

fn collect_and_execute_subfields<'a>(
    ctx: &'a ExecutionContext<'a>,
    return_type: &'a ObjectType,
    info: &ResolveInfo<'a>,
    path: &Path,
    result: Value,
) -> Completion<'a> {
    match collect_subfields(ctx, return_type, &info.field_nodes) {
        Ok(subfields) => execute_fields(ctx, return_type, &result, path, &subfields),
        Err(error) => MaybeAsync::ready(Err(error)),
    }
}
