// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::instrument;

use super::{
    context::{ContextError, ExecutionArgs, build_execution_context},
    operation::execute_operation,
};
use crate::error::{ExecutionError, GraphQLError};

/// The result of an execution, serialized as `{"errors": [...], "data": ...}`.
///
/// `errors` is omitted when empty. `data` is omitted only when the request failed before
/// execution could start; a failure at the root of the operation yields `"data": null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

impl Response {
    pub fn from_errors(errors: Vec<GraphQLError>) -> Self {
        Self { errors, data: None }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn to_json(&self) -> JsonValue {
        // Serializing strings, numbers and maps with string keys cannot fail.
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

/// Executes an operation of `args`'s document.
///
/// Problems with the request (an unknown operation, invalid variables, ...) and failures during
/// execution are reported in the response. Only misuse of the executor is an `Err`.
#[instrument(
    name = "execute",
    skip_all,
    fields(operation_name = args.operation_name.as_deref())
)]
pub async fn execute(args: ExecutionArgs<'_>) -> Result<Response, ExecutionError> {
    let ctx = match build_execution_context(args) {
        Ok(ctx) => ctx,
        Err(ContextError::Invalid(error)) => return Err(error),
        Err(ContextError::Request(errors)) => return Ok(Response::from_errors(errors)),
    };

    let data = execute_operation(&ctx).resolve().await;

    Ok(Response {
        errors: ctx.errors(),
        data: Some(data),
    })
}

#[cfg(test)]
mod tests {
    use async_graphql_parser::parse_query;

    use super::*;
    use crate::{
        FieldError, MaybeAsync, Schema,
        schema::types::{Field, ObjectType},
    };

    fn schema() -> Schema {
        let query = ObjectType::new("Query")
            .field(Field::new("ok", "String").resolver(|_| MaybeAsync::ready(Ok("yes".into()))))
            .field(
                Field::new("bad", "String")
                    .resolver(|_| MaybeAsync::ready(Err(FieldError::new("nope")))),
            );

        Schema::build(query).finish().unwrap()
    }

    #[tokio::test]
    async fn errors_are_serialized_before_data() {
        let schema = schema();
        let document = parse_query("{ bad ok }").unwrap();

        let response = execute(ExecutionArgs::new(&schema, &document))
            .await
            .unwrap();

        assert!(!response.is_ok());
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"errors":[{"message":"nope","locations":[{"line":1,"column":3}],"path":["bad"]}],"data":{"bad":null,"ok":"yes"}}"#
        );
    }

    #[tokio::test]
    async fn request_errors_have_no_data() {
        let schema = schema();
        let document = parse_query("query A { ok } query B { ok }").unwrap();

        let response = execute(ExecutionArgs::new(&schema, &document))
            .await
            .unwrap();

        assert_eq!(response.data, None);
        assert_eq!(
            response.errors[0].message,
            "Must provide operation name if query contains multiple operations."
        );
    }
}
