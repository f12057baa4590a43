// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashSet;

use async_graphql_parser::{
    Positioned,
    types::{Field, OperationDefinition, OperationType},
};
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::{error, instrument};

use super::{
    collect::{FieldsMap, collect_fields},
    complete::Completion,
    context::ExecutionContext,
    resolve::resolve_field,
};
use crate::{
    error::GraphQLError,
    maybe_async::MaybeAsync,
    path::Path,
    schema::{Schema, types::ObjectType},
    value::Value,
};

/// The root object type an operation is executed against.
pub(crate) fn operation_root_type<'a>(
    schema: &'a Schema,
    operation: &Positioned<OperationDefinition>,
) -> Result<&'a ObjectType, GraphQLError> {
    match operation.node.ty {
        OperationType::Query => schema.query_type().ok_or_else(|| {
            GraphQLError::with_positions(
                "Schema does not define the required query root type.",
                [operation.pos],
            )
        }),
        OperationType::Mutation => schema.mutation_type().ok_or_else(|| {
            GraphQLError::with_positions("Schema is not configured for mutations.", [operation.pos])
        }),
        OperationType::Subscription => Err(GraphQLError::with_positions(
            "Schema is not configured for subscriptions.",
            [operation.pos],
        )),
    }
}

/// Executes the selected operation and produces the `data` of the response.
///
/// A failure that reaches the root is recorded and results in `null` data.
#[instrument(
    name = "execute_operation",
    skip_all,
    fields(operation_type = %ctx.operation.node.ty)
)]
pub fn execute_operation<'a>(ctx: &'a ExecutionContext<'a>) -> MaybeAsync<'a, JsonValue> {
    let operation = &ctx.operation.node;

    let root_fields = operation_root_type(ctx.schema, ctx.operation).and_then(|root_type| {
        let mut fields = FieldsMap::new();
        collect_fields(
            ctx,
            root_type,
            &operation.selection_set.node,
            &mut fields,
            &mut HashSet::new(),
        )?;
        Ok((root_type, fields))
    });

    let completion = match root_fields {
        Ok((root_type, fields)) => {
            let path = Path::root();
            match operation.ty {
                OperationType::Mutation => {
                    execute_fields_serially(ctx, root_type, &ctx.root_value, &path, &fields)
                }
                _ => execute_fields(ctx, root_type, &ctx.root_value, &path, &fields),
            }
        }
        Err(error) => MaybeAsync::ready(Err(error)),
    };

    completion.map(move |result| match result {
        Ok(data) => data,
        Err(err) => {
            error!(error = %err.message, "Operation failed, returning null data");
            ctx.record_error(err);
            JsonValue::Null
        }
    })
}

/// Resolves all fields without waiting for one before starting the next. The result object
/// follows the order of `fields`, whatever order the values settle in.
///
/// A field that fails synchronously at a non-null position stops the loop: the remaining
/// fields are never resolved, and fields already pending are dropped.
pub fn execute_fields<'a>(
    ctx: &'a ExecutionContext<'a>,
    parent_type: &'a ObjectType,
    source: &Value,
    path: &Path,
    fields: &FieldsMap<'a>,
) -> Completion<'a> {
    let mut response_keys = Vec::with_capacity(fields.len());
    let mut completions = Vec::with_capacity(fields.len());

    for (response_key, field_nodes) in fields {
        let Some(completion) = resolve_field(
            ctx,
            parent_type,
            source,
            field_nodes,
            path.append(*response_key),
        ) else {
            continue;
        };

        let completion = match completion.into_ready() {
            Ok(Err(error)) => return MaybeAsync::ready(Err(error)),
            Ok(value) => MaybeAsync::ready(value),
            Err(pending) => pending,
        };
        response_keys.push(*response_key);
        completions.push(completion);
    }

    MaybeAsync::join_all(completions).map(move |results| -> Result<JsonValue, GraphQLError> {
        let mut object = JsonMap::with_capacity(results.len());
        for (response_key, result) in response_keys.into_iter().zip(results) {
            object.insert(response_key.to_string(), result?);
        }
        Ok(JsonValue::Object(object))
    })
}

/// Resolves fields one after the other: a field is only resolved once the previous one has
/// completed. Used for the root fields of mutations.
pub fn execute_fields_serially<'a>(
    ctx: &'a ExecutionContext<'a>,
    parent_type: &'a ObjectType,
    source: &Value,
    path: &Path,
    fields: &FieldsMap<'a>,
) -> Completion<'a> {
    let mut object = JsonMap::with_capacity(fields.len());
    let mut entries = fields.iter();

    while let Some((response_key, field_nodes)) = entries.next() {
        let Some(completion) = resolve_field(
            ctx,
            parent_type,
            source,
            field_nodes,
            path.append(*response_key),
        ) else {
            continue;
        };

        match completion.into_ready() {
            Ok(result) => match result {
                Ok(value) => {
                    object.insert(response_key.to_string(), value);
                }
                Err(error) => return MaybeAsync::ready(Err(error)),
            },
            Err(pending) => {
                // From here on, every field waits for the previous one.
                let response_key = *response_key;
                let remaining: Vec<(&'a str, Vec<&'a Positioned<Field>>)> = entries
                    .map(|(key, field_nodes)| (*key, field_nodes.clone()))
                    .collect();
                let source = source.clone();
                let path = path.clone();

                return MaybeAsync::pending(async move {
                    object.insert(response_key.to_string(), pending.resolve().await?);

                    for (response_key, field_nodes) in remaining {
                        let Some(completion) = resolve_field(
                            ctx,
                            parent_type,
                            &source,
                            &field_nodes,
                            path.append(response_key),
                        ) else {
                            continue;
                        };
                        object.insert(response_key.to_string(), completion.resolve().await?);
                    }

                    Ok::<_, GraphQLError>(JsonValue::Object(object))
                });
            }
        }
    }

    MaybeAsync::ready(Ok(JsonValue::Object(object)))
}
