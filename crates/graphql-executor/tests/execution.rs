// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod common;

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_graphql_parser::parse_query;
use async_graphql_value::ConstValue;
use graphql_executor::{
    ContextValue, ExecutionArgs, ExecutionError, ExecutorConfig, FieldError, MaybeAsync, Schema,
    Value, execute,
    execution::{build_execution_context, execute_operation},
    schema::types::{EnumType, EnumValue, Field, InputValue, ObjectType, ScalarType},
};
use serde_json::json;
use test_log::test;

use common::{delayed, delayed_fail, fail, ready, response_with, run, run_with};

fn item(id: i64, name: &str) -> Value {
    Value::object([("id", Value::from(id)), ("name", Value::from(name))])
}

fn echo_scalar() -> ScalarType {
    ScalarType::new("Echo", |value| match value {
        Value::Int(i) => Some(json!(i)),
        Value::String(s) => Some(json!(s)),
        _ => None,
    })
}

fn counter() -> Value {
    Value::object([(
        "add",
        Value::method(|args, _, _| {
            let by = match args.get("by") {
                Some(ConstValue::Number(n)) => n.as_i64().unwrap_or_default(),
                _ => 0,
            };
            MaybeAsync::ready(Ok(Value::Int(10 + by)))
        }),
    )])
}

fn schema() -> Schema {
    let item_type = ObjectType::new("Item")
        .field(Field::new("id", "ID!"))
        .field(Field::new("name", "String"))
        .field(Field::new("required", "String!"))
        .field(Field::new("child", "Item"));

    let counter_type = ObjectType::new("Counter")
        .field(Field::new("add", "Int").argument(InputValue::new("by", "Int!")));

    let color = EnumType::new("Color")
        .value(EnumValue::new("RED").value(1))
        .value(EnumValue::new("GREEN").value(2));

    let query = ObjectType::new("Query")
        .field(Field::new("hello", "String").resolver(|_| ready("world")))
        .field(
            Field::new("greet", "String!")
                .argument(
                    InputValue::new("name", "String")
                        .default_value(ConstValue::String("stranger".into())),
                )
                .resolver(|ctx| {
                    let name = match ctx.args.get("name") {
                        Some(ConstValue::String(name)) => name.clone(),
                        _ => "nobody".to_string(),
                    };
                    ready(format!("Hello, {name}"))
                }),
        )
        .field(Field::new("slow", "String").resolver(|_| delayed(20, "later")))
        .field(Field::new("failing", "String").resolver(|_| fail("boom")))
        .field(Field::new("slowFailing", "String").resolver(|_| delayed_fail(5, "slow boom")))
        .field(Field::new("nonNullFailing", "String!").resolver(|_| fail("fatal")))
        .field(Field::new("item", "Item").resolver(|_| ready(item(1, "first"))))
        .field(
            Field::new("items", "[Item]")
                .resolver(|_| ready(vec![item(1, "first"), item(2, "second")])),
        )
        .field(Field::new("numbers", "[Int]").resolver(|_| {
            ready(vec![
                Value::Int(1),
                Value::Error(FieldError::new("bad number")),
                Value::Int(3),
            ])
        }))
        .field(
            Field::new("strictNumbers", "[Int!]")
                .resolver(|_| ready(vec![Value::Int(1), Value::Null, Value::Int(3)])),
        )
        .field(Field::new("brokenItem", "Item").resolver(|_| {
            ready(Value::object([
                ("id", Value::from(3)),
                ("name", Value::Error(FieldError::new("name failed"))),
            ]))
        }))
        .field(Field::new("brokenItems", "[Item!]").resolver(|_| {
            ready(vec![
                Value::Null,
                Value::object([
                    ("id", Value::from(4)),
                    ("name", Value::Error(FieldError::new("name failed"))),
                ]),
            ])
        }))
        .field(Field::new("lazyNumbers", "[Int]").resolver(|_| {
            ready(vec![
                Value::pending(async {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Ok(Value::Int(1))
                }),
                Value::Int(2),
                Value::pending(async { Err(FieldError::new("lazy failure")) }),
                Value::pending(async { Ok(Value::pending(async { Ok(Value::Int(4)) })) }),
            ])
        }))
        .field(Field::new("lazyStrict", "[Int!]").resolver(|_| {
            ready(vec![
                Value::pending(async {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Ok(Value::Null)
                }),
                Value::Int(2),
            ])
        }))
        .field(Field::new("notAList", "[Int]").resolver(|_| ready(1)))
        .field(Field::new("badInt", "Int").resolver(|_| ready("abc")))
        .field(
            Field::new("echo", "Echo")
                .argument(InputValue::new("value", "Echo!"))
                .resolver(|ctx| ready(ctx.args.get("value").cloned().map(Value::from))),
        )
        .field(Field::new("color", "Color").resolver(|_| ready(1)))
        .field(Field::new("counter", "Counter").resolver(|_| ready(counter())))
        .field(
            Field::new("whoami", "String")
                .resolver(|ctx| ready(ctx.context_value.get::<String>().cloned())),
        )
        .field(Field::new("rootName", "String"));

    Schema::build(query)
        .register(item_type)
        .register(counter_type)
        .register(color)
        .register(echo_scalar())
        .finish()
        .unwrap()
}

#[test(tokio::test)]
async fn resolves_fields_in_selection_order() {
    let schema = schema();

    let result = run(&schema, "{ hello greet item { name id } }").await;

    assert_eq!(
        serde_json::to_string(&result).unwrap(),
        r#"{"data":{"hello":"world","greet":"Hello, stranger","item":{"name":"first","id":"1"}}}"#
    );
}

#[test(tokio::test)]
async fn nullable_field_error_leaves_siblings_intact() {
    let schema = schema();

    let result = run(&schema, "{ hello failing }").await;

    insta::assert_json_snapshot!(result, @r#"
    {
      "errors": [
        {
          "message": "boom",
          "locations": [
            {
              "line": 1,
              "column": 9
            }
          ],
          "path": [
            "failing"
          ]
        }
      ],
      "data": {
        "hello": "world",
        "failing": null
      }
    }
    "#);
}

#[test(tokio::test)]
async fn async_error_is_reported_like_a_sync_one() {
    let schema = schema();

    let result = run(&schema, "{ slowFailing hello }").await;

    assert_eq!(
        result,
        json!({
            "errors": [{
                "message": "slow boom",
                "locations": [{"line": 1, "column": 3}],
                "path": ["slowFailing"]
            }],
            "data": {"slowFailing": null, "hello": "world"}
        })
    );
}

#[test(tokio::test)]
async fn non_null_violation_nulls_the_nearest_nullable_parent() {
    let schema = schema();

    let result = run(&schema, "{ item { id required } hello }").await;

    assert_eq!(
        result,
        json!({
            "errors": [{
                "message": "Cannot return null for non-nullable field Item.required.",
                "locations": [{"line": 1, "column": 13}],
                "path": ["item", "required"]
            }],
            "data": {"item": null, "hello": "world"}
        })
    );
}

#[test(tokio::test)]
async fn non_null_root_field_error_nulls_data() {
    let schema = schema();

    let result = run(&schema, "{ hello nonNullFailing }").await;

    assert_eq!(
        result,
        json!({
            "errors": [{
                "message": "fatal",
                "locations": [{"line": 1, "column": 9}],
                "path": ["nonNullFailing"]
            }],
            "data": null
        })
    );
}

#[test(tokio::test)]
async fn list_item_error_is_reported_at_its_index() {
    let schema = schema();

    let result = run(&schema, "{ numbers }").await;

    assert_eq!(
        result,
        json!({
            "errors": [{
                "message": "bad number",
                "locations": [{"line": 1, "column": 3}],
                "path": ["numbers", 1]
            }],
            "data": {"numbers": [1, null, 3]}
        })
    );
}

#[test(tokio::test)]
async fn null_non_null_list_item_nulls_the_list() {
    let schema = schema();

    let result = run(&schema, "{ strictNumbers hello }").await;

    assert_eq!(
        result,
        json!({
            "errors": [{
                "message": "Cannot return null for non-nullable field Query.strictNumbers.",
                "locations": [{"line": 1, "column": 3}],
                "path": ["strictNumbers", 1]
            }],
            "data": {"strictNumbers": null, "hello": "world"}
        })
    );
}

#[test(tokio::test)]
async fn non_null_failure_stops_sibling_fields() {
    let schema = schema();

    let result = run(&schema, "{ brokenItem { required name } }").await;

    assert_eq!(
        result,
        json!({
            "errors": [{
                "message": "Cannot return null for non-nullable field Item.required.",
                "locations": [{"line": 1, "column": 16}],
                "path": ["brokenItem", "required"]
            }],
            "data": {"brokenItem": null}
        })
    );
}

#[test(tokio::test)]
async fn non_null_failure_stops_later_list_items() {
    let schema = schema();

    let result = run(&schema, "{ brokenItems { name } }").await;

    assert_eq!(
        result,
        json!({
            "errors": [{
                "message": "Cannot return null for non-nullable field Query.brokenItems.",
                "locations": [{"line": 1, "column": 3}],
                "path": ["brokenItems", 0]
            }],
            "data": {"brokenItems": null}
        })
    );
}

#[test(tokio::test)]
async fn pending_list_items_complete_in_place() {
    let schema = schema();

    let result = run(&schema, "{ lazyNumbers }").await;

    assert_eq!(
        result,
        json!({
            "errors": [{
                "message": "lazy failure",
                "locations": [{"line": 1, "column": 3}],
                "path": ["lazyNumbers", 2]
            }],
            "data": {"lazyNumbers": [1, 2, null, 4]}
        })
    );
}

#[test(tokio::test)]
async fn pending_null_in_non_null_list_nulls_the_list() {
    let schema = schema();

    let result = run(&schema, "{ lazyStrict hello }").await;

    assert_eq!(
        result,
        json!({
            "errors": [{
                "message": "Cannot return null for non-nullable field Query.lazyStrict.",
                "locations": [{"line": 1, "column": 3}],
                "path": ["lazyStrict", 0]
            }],
            "data": {"lazyStrict": null, "hello": "world"}
        })
    );
}

#[test(tokio::test)]
async fn lists_of_objects_complete_every_item() {
    let schema = schema();

    let result = run(&schema, "{ items { id name } }").await;

    assert_eq!(
        result,
        json!({"data": {"items": [{"id": "1", "name": "first"}, {"id": "2", "name": "second"}]}})
    );
}

#[test(tokio::test)]
async fn leaf_and_list_shape_errors() {
    let schema = schema();

    let result = run(&schema, "{ notAList badInt }").await;

    assert_eq!(
        result["data"],
        json!({"notAList": null, "badInt": null})
    );
    let messages: Vec<_> = result["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|error| error["message"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        messages,
        vec![
            "Expected Iterable, but did not find one for field Query.notAList.",
            "Expected a value of type \"Int\" but received: \"abc\"",
        ]
    );
}

#[test(tokio::test)]
async fn enums_serialize_by_internal_value() {
    let schema = schema();

    let result = run(&schema, "{ color }").await;

    assert_eq!(result, json!({"data": {"color": "RED"}}));
}

#[test(tokio::test)]
async fn custom_scalar_accepts_literals_and_variables() {
    let schema = schema();

    let literal = run(&schema, "{ echo(value: 42) }").await;
    assert_eq!(literal, json!({"data": {"echo": 42}}));

    let variable = run_with(&schema, "query ($v: Echo!) { echo(value: $v) }", |args| {
        args.variable_values(json!({"v": "text"}))
    })
    .await;
    assert_eq!(variable, json!({"data": {"echo": "text"}}));
}

#[test(tokio::test)]
async fn arguments_use_defaults_and_variables() {
    let schema = schema();

    let literal = run(&schema, r#"{ a: greet b: greet(name: "Ann") }"#).await;
    assert_eq!(
        literal,
        json!({"data": {"a": "Hello, stranger", "b": "Hello, Ann"}})
    );

    let query = "query ($n: String) { greet(name: $n) }";
    let provided = run_with(&schema, query, |args| {
        args.variable_values(json!({"n": "Bo"}))
    })
    .await;
    assert_eq!(provided, json!({"data": {"greet": "Hello, Bo"}}));

    let omitted = run(&schema, query).await;
    assert_eq!(omitted, json!({"data": {"greet": "Hello, stranger"}}));
}

#[test(tokio::test)]
async fn invalid_argument_is_a_field_error() {
    let schema = schema();

    let result = run(&schema, "{ greet(name: 3) }").await;

    assert_eq!(result["data"], json!(null));
    assert_eq!(
        result["errors"][0]["message"],
        json!("Argument \"name\" has invalid value 3.")
    );
    assert_eq!(result["errors"][0]["path"], json!(["greet"]));
}

#[test(tokio::test)]
async fn default_resolver_calls_methods_with_arguments() {
    let schema = schema();

    let result = run(&schema, "{ counter { add(by: 5) } }").await;

    assert_eq!(result, json!({"data": {"counter": {"add": 15}}}));
}

#[test(tokio::test)]
async fn root_and_context_values_reach_resolvers() {
    let schema = schema();

    let result = run_with(&schema, "{ rootName whoami }", |args| {
        args.root_value(Value::object([("rootName", Value::from("root"))]))
            .context_value(ContextValue::new("alice".to_string()))
    })
    .await;

    assert_eq!(
        result,
        json!({"data": {"rootName": "root", "whoami": "alice"}})
    );
}

#[test(tokio::test)]
async fn field_resolver_replaces_the_default() {
    let schema = schema();

    let result = run_with(&schema, "{ rootName hello }", |args| {
        args.field_resolver(|ctx| ready(ctx.info.field_name.to_uppercase()))
    })
    .await;

    assert_eq!(
        result,
        json!({"data": {"rootName": "ROOTNAME", "hello": "world"}})
    );
}

#[test(tokio::test)]
async fn skip_wins_over_include() {
    let schema = schema();
    let query = r#"
        query ($yes: Boolean!) {
            a: hello @skip(if: true) @include(if: true)
            b: hello @include(if: false)
            c: hello @skip(if: false)
            d: hello @include(if: $yes)
            e: hello @skip(if: true) @include(if: false)
            ...F @skip(if: true)
            ... on Query @include(if: true) { f: hello }
        }

        fragment F on Query { g: hello }
    "#;

    let result = run_with(&schema, query, |args| {
        args.variable_values(json!({"yes": true}))
    })
    .await;

    assert_eq!(
        result,
        json!({"data": {"c": "world", "d": "world", "f": "world"}})
    );
}

#[test(tokio::test)]
async fn fragment_cycles_are_visited_once() {
    let schema = schema();
    let query = r#"
        { item { ...A } }

        fragment A on Item { id ...B }
        fragment B on Item { name ...A }
    "#;

    let result = run(&schema, query).await;

    assert_eq!(result, json!({"data": {"item": {"id": "1", "name": "first"}}}));
}

#[test(tokio::test)]
async fn repeated_fields_merge_their_selections() {
    let schema = schema();

    let result = run(&schema, "{ item { id } item { name } }").await;

    assert_eq!(result, json!({"data": {"item": {"id": "1", "name": "first"}}}));
}

#[test(tokio::test)]
async fn async_fields_keep_their_position() {
    let schema = schema();

    let result = run(&schema, "{ slow hello }").await;

    assert_eq!(
        serde_json::to_string(&result).unwrap(),
        r#"{"data":{"slow":"later","hello":"world"}}"#
    );
}

#[test(tokio::test)]
async fn synchronous_operations_complete_without_awaiting() {
    let schema = schema();
    let document = parse_query("{ hello item { id child { id } } }").unwrap();
    let ctx = build_execution_context(ExecutionArgs::new(&schema, &document)).unwrap();

    let data = execute_operation(&ctx);

    assert!(data.is_ready());
    assert_eq!(
        data.into_ready().unwrap(),
        json!({"hello": "world", "item": {"id": "1", "child": null}})
    );
}

#[test(tokio::test)]
async fn asynchronous_operations_are_pending() {
    let schema = schema();
    let document = parse_query("{ hello slow }").unwrap();
    let ctx = build_execution_context(ExecutionArgs::new(&schema, &document)).unwrap();

    let data = execute_operation(&ctx);

    assert!(!data.is_ready());
    assert_eq!(
        data.resolve().await,
        json!({"hello": "world", "slow": "later"})
    );
}

#[test(tokio::test)]
async fn execution_is_repeatable() {
    let schema = schema();
    let query = "{ hello slow failing item { id required } numbers }";

    let first = run(&schema, query).await;
    let second = run(&schema, query).await;

    assert_eq!(first, second);
}

#[test(tokio::test)]
async fn selects_the_requested_operation() {
    let schema = schema();
    let document = "query A { a: hello } query B { b: hello }";

    let named = run_with(&schema, document, |args| args.operation_name("B")).await;
    assert_eq!(named, json!({"data": {"b": "world"}}));

    let unnamed = run(&schema, document).await;
    assert_eq!(
        unnamed,
        json!({"errors": [{"message": "Must provide operation name if query contains multiple operations."}]})
    );

    let unknown = run_with(&schema, document, |args| args.operation_name("C")).await;
    assert_eq!(
        unknown,
        json!({"errors": [{"message": "Unknown operation named \"C\"."}]})
    );
}

#[test(tokio::test)]
async fn single_operation_needs_no_name() {
    let schema = schema();

    let named = run(&schema, "query A { hello }").await;
    assert_eq!(named, json!({"data": {"hello": "world"}}));

    let anonymous = run_with(&schema, "{ hello }", |args| args.operation_name("A")).await;
    assert_eq!(
        anonymous,
        json!({"errors": [{"message": "Unknown operation named \"A\"."}]})
    );
}

#[test(tokio::test)]
async fn variables_must_be_an_object() {
    let schema = schema();
    let document = parse_query("{ hello }").unwrap();

    let result =
        execute(ExecutionArgs::new(&schema, &document).variable_values(json!([1]))).await;

    assert_eq!(result.unwrap_err(), ExecutionError::VariablesNotAnObject);
}

#[test(tokio::test)]
async fn invalid_variables_prevent_execution() {
    let schema = schema();

    let response = response_with(&schema, "query ($n: Int!) { hello }", |args| args).await;

    assert_eq!(response.data, None);
    assert_eq!(response.errors.len(), 1);
    assert_eq!(
        response.errors[0].message,
        "Variable \"$n\" of required type \"Int!\" was not provided."
    );
    assert_eq!(response.errors[0].locations.len(), 1);
}

#[test(tokio::test)]
async fn missing_root_types_are_request_errors() {
    let schema = schema();

    let mutation = run(&schema, "mutation { hello }").await;
    assert_eq!(
        mutation,
        json!({"errors": [{
            "message": "Schema is not configured for mutations.",
            "locations": [{"line": 1, "column": 1}]
        }]})
    );

    let subscription = run(&schema, "subscription { hello }").await;
    assert_eq!(
        subscription["errors"][0]["message"],
        json!("Schema is not configured for subscriptions.")
    );
    assert_eq!(subscription.get("data"), None);
}

type Log = Arc<Mutex<Vec<&'static str>>>;

fn logging_fields(log: &Log) -> [Field; 2] {
    let first_log = log.clone();
    let second_log = log.clone();

    [
        Field::new("first", "String").resolver(move |_| {
            let log = first_log.clone();
            MaybeAsync::pending(async move {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                log.lock().unwrap().push("first");
                Ok(Value::from("first"))
            })
        }),
        Field::new("second", "String").resolver(move |_| {
            second_log.lock().unwrap().push("second");
            ready("second")
        }),
    ]
}

fn logging_schema(log: &Log) -> Schema {
    let query = logging_fields(log)
        .into_iter()
        .fold(ObjectType::new("Query"), ObjectType::field);
    let mutation = logging_fields(log)
        .into_iter()
        .fold(ObjectType::new("Mutation"), ObjectType::field);

    Schema::build(query).mutation(mutation).finish().unwrap()
}

#[test(tokio::test)]
async fn mutation_fields_run_serially() {
    let log = Log::default();
    let schema = logging_schema(&log);

    let result = run(&schema, "mutation { first second }").await;

    assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    assert_eq!(
        serde_json::to_string(&result).unwrap(),
        r#"{"data":{"first":"first","second":"second"}}"#
    );
}

#[test(tokio::test)]
async fn query_fields_run_concurrently() {
    let log = Log::default();
    let schema = logging_schema(&log);

    let result = run(&schema, "{ first second }").await;

    assert_eq!(*log.lock().unwrap(), vec!["second", "first"]);
    assert_eq!(
        serde_json::to_string(&result).unwrap(),
        r#"{"data":{"first":"first","second":"second"}}"#
    );
}

#[test(tokio::test)]
async fn mutations_can_be_disallowed() {
    let log = Log::default();
    let schema = logging_schema(&log);
    let config = ExecutorConfig {
        allow_mutations: false,
        ..Default::default()
    };

    let mutation = run_with(&schema, "mutation { second }", |args| args.config(config)).await;
    assert_eq!(
        mutation["errors"][0]["message"],
        json!("Mutations are not allowed")
    );
    assert_eq!(mutation.get("data"), None);
    assert!(log.lock().unwrap().is_empty());

    let query = run_with(&schema, "{ second }", |args| args.config(config)).await;
    assert_eq!(query, json!({"data": {"second": "second"}}));
}
