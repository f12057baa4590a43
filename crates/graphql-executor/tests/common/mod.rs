// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

#![allow(dead_code)]

use std::time::Duration;

use async_graphql_parser::parse_query;
use graphql_executor::{
    ExecutionArgs, FieldError, MaybeAsync, Resolution, Response, Schema, Value, execute,
};
use serde_json::Value as JsonValue;

pub fn ready<'e>(value: impl Into<Value>) -> Resolution<'e> {
    MaybeAsync::ready(Ok(value.into()))
}

pub fn fail<'e>(message: &str) -> Resolution<'e> {
    MaybeAsync::ready(Err(FieldError::new(message)))
}

/// Resolves to `value` after `millis` milliseconds.
pub fn delayed<'e>(millis: u64, value: impl Into<Value> + Send + 'static) -> Resolution<'e> {
    MaybeAsync::pending(async move {
        tokio::time::sleep(Duration::from_millis(millis)).await;
        Ok(value.into())
    })
}

pub fn delayed_fail<'e>(millis: u64, message: &'static str) -> Resolution<'e> {
    MaybeAsync::pending(async move {
        tokio::time::sleep(Duration::from_millis(millis)).await;
        Err(FieldError::new(message))
    })
}

pub async fn run(schema: &Schema, query: &str) -> JsonValue {
    run_with(schema, query, |args| args).await
}

pub async fn run_with<F>(schema: &Schema, query: &str, configure: F) -> JsonValue
where
    F: for<'a> FnOnce(ExecutionArgs<'a>) -> ExecutionArgs<'a>,
{
    response_with(schema, query, configure).await.to_json()
}

pub async fn response_with<F>(schema: &Schema, query: &str, configure: F) -> Response
where
    F: for<'a> FnOnce(ExecutionArgs<'a>) -> ExecutionArgs<'a>,
{
    let document = parse_query(query).unwrap();
    execute(configure(ExecutionArgs::new(schema, &document)))
        .await
        .unwrap()
}
