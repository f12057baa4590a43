// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use async_graphql_parser::{
    Positioned,
    types::{
        DocumentOperations, ExecutableDocument, Field, FragmentDefinition, OperationDefinition,
        OperationType,
    },
};
use async_graphql_value::Name;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, instrument};

use super::{
    collect::FieldsMap,
    operation::operation_root_type,
    resolve::{ResolverContext, default_field_resolver},
};
use crate::{
    config::ExecutorConfig,
    error::{ExecutionError, GraphQLError},
    schema::{Schema, types::ResolveFn},
    value::{ContextValue, Resolution, Value},
    values::{Variables, coerce_variable_values},
};

/// Everything an execution needs, gathered once per request.
pub struct ExecutionContext<'a> {
    pub schema: &'a Schema,
    pub fragments: &'a HashMap<Name, Positioned<FragmentDefinition>>,
    pub root_value: Value,
    pub context_value: ContextValue,
    pub operation: &'a Positioned<OperationDefinition>,
    pub variable_values: Variables,
    pub field_resolver: ResolveFn,
    pub config: ExecutorConfig,
    errors: Mutex<Vec<GraphQLError>>,
    subfields: Mutex<HashMap<SubfieldsKey, Arc<FieldsMap<'a>>>>,
}

/// The identity of an object type and the field nodes whose sub-selections are merged.
type SubfieldsKey = (String, Vec<usize>);

impl<'a> ExecutionContext<'a> {
    pub(crate) fn record_error(&self, error: GraphQLError) {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error);
    }

    /// Errors recorded so far, in the order they were encountered.
    pub fn errors(&self) -> Vec<GraphQLError> {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn cached_subfields(
        &self,
        type_name: &str,
        field_nodes: &[&'a Positioned<Field>],
        compute: impl FnOnce() -> Result<FieldsMap<'a>, GraphQLError>,
    ) -> Result<Arc<FieldsMap<'a>>, GraphQLError> {
        let key = (
            type_name.to_string(),
            field_nodes
                .iter()
                .map(|node| std::ptr::from_ref(*node) as usize)
                .collect(),
        );

        if let Some(fields) = self
            .subfields
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(fields.clone());
        }

        let fields = Arc::new(compute()?);
        self.subfields
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, fields.clone());
        Ok(fields)
    }
}

/// Inputs of a single execution.
pub struct ExecutionArgs<'a> {
    pub(crate) schema: &'a Schema,
    pub(crate) document: &'a ExecutableDocument,
    pub(crate) root_value: Value,
    pub(crate) context_value: ContextValue,
    pub(crate) variable_values: Option<JsonValue>,
    pub(crate) operation_name: Option<String>,
    pub(crate) field_resolver: Option<ResolveFn>,
    pub(crate) config: ExecutorConfig,
}

impl<'a> ExecutionArgs<'a> {
    pub fn new(schema: &'a Schema, document: &'a ExecutableDocument) -> Self {
        Self {
            schema,
            document,
            root_value: Value::Null,
            context_value: ContextValue::default(),
            variable_values: None,
            operation_name: None,
            field_resolver: None,
            config: ExecutorConfig::default(),
        }
    }

    pub fn root_value(mut self, root_value: impl Into<Value>) -> Self {
        self.root_value = root_value.into();
        self
    }

    pub fn context_value(mut self, context_value: ContextValue) -> Self {
        self.context_value = context_value;
        self
    }

    /// Raw variable values, which must be a JSON object (or `null`).
    pub fn variable_values(mut self, variable_values: JsonValue) -> Self {
        self.variable_values = Some(variable_values);
        self
    }

    pub fn operation_name(mut self, operation_name: impl Into<String>) -> Self {
        self.operation_name = Some(operation_name.into());
        self
    }

    /// Resolver for fields that do not declare their own.
    pub fn field_resolver<F>(mut self, field_resolver: F) -> Self
    where
        F: for<'r, 'e> Fn(ResolverContext<'r, 'e>) -> Resolution<'e> + Send + Sync + 'static,
    {
        self.field_resolver = Some(Arc::new(field_resolver));
        self
    }

    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }
}

/// Why an execution context could not be built.
#[derive(Error, Debug)]
pub enum ContextError {
    /// The executor was called incorrectly.
    #[error(transparent)]
    Invalid(#[from] ExecutionError),

    /// The request cannot be executed. These errors form the response.
    #[error("{}", .0.iter().map(|e| e.message.as_str()).collect::<Vec<_>>().join("\n"))]
    Request(Vec<GraphQLError>),
}

#[instrument(
    name = "build_execution_context",
    skip_all,
    fields(operation_name = args.operation_name.as_deref())
)]
pub fn build_execution_context(
    args: ExecutionArgs<'_>,
) -> Result<ExecutionContext<'_>, ContextError> {
    let raw_variables = match args.variable_values {
        None | Some(JsonValue::Null) => serde_json::Map::new(),
        Some(JsonValue::Object(variables)) => variables,
        Some(_) => return Err(ExecutionError::VariablesNotAnObject.into()),
    };

    let mut errors = vec![];

    let operation = select_operation(args.document, args.operation_name.as_deref())
        .map_err(|error| errors.push(error))
        .ok();

    let variable_values = operation.and_then(|operation| {
        debug!(operation_type = %operation.node.ty, "Selected operation");

        if let Err(error) = check_operation_allowed(args.schema, operation, &args.config) {
            errors.push(error);
            return None;
        }

        coerce_variable_values(
            args.schema,
            &operation.node.variable_definitions,
            &raw_variables,
        )
        .map_err(|coercion_errors| errors.extend(coercion_errors))
        .ok()
    });

    match (operation, variable_values) {
        (Some(operation), Some(variable_values)) if errors.is_empty() => Ok(ExecutionContext {
            schema: args.schema,
            fragments: &args.document.fragments,
            root_value: args.root_value,
            context_value: args.context_value,
            operation,
            variable_values,
            field_resolver: args
                .field_resolver
                .unwrap_or_else(|| Arc::new(default_field_resolver)),
            config: args.config,
            errors: Mutex::new(vec![]),
            subfields: Mutex::new(HashMap::new()),
        }),
        _ => Err(ContextError::Request(errors)),
    }
}

fn select_operation<'a>(
    document: &'a ExecutableDocument,
    operation_name: Option<&str>,
) -> Result<&'a Positioned<OperationDefinition>, GraphQLError> {
    match (&document.operations, operation_name) {
        (DocumentOperations::Single(operation), None) => Ok(operation),
        (DocumentOperations::Multiple(operations), Some(name)) => operations
            .get(name)
            .ok_or_else(|| GraphQLError::new(format!("Unknown operation named \"{name}\"."))),
        // An anonymous operation never matches a name.
        (DocumentOperations::Single(_), Some(name)) => {
            Err(GraphQLError::new(format!("Unknown operation named \"{name}\".")))
        }
        // A named operation parses as `Multiple` even when it is alone in the document.
        (DocumentOperations::Multiple(operations), None) => {
            let mut operations = operations.values();
            match (operations.next(), operations.next()) {
                (Some(operation), None) => Ok(operation),
                (None, _) => Err(GraphQLError::new("Must provide an operation.")),
                (Some(_), Some(_)) => Err(GraphQLError::new(
                    "Must provide operation name if query contains multiple operations.",
                )),
            }
        }
    }
}

fn check_operation_allowed(
    schema: &Schema,
    operation: &Positioned<OperationDefinition>,
    config: &ExecutorConfig,
) -> Result<(), GraphQLError> {
    operation_root_type(schema, operation)?;

    if operation.node.ty == OperationType::Mutation && !config.allow_mutations {
        return Err(GraphQLError::with_positions("Mutations are not allowed", [operation.pos]));
    }

    Ok(())
}
