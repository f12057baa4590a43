// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod common;

use async_graphql_value::ConstValue;
use graphql_executor::{
    ExecutorConfig, Schema, Value,
    schema::types::{
        EnumType, EnumValue, Field, InputObjectType, InputValue, InterfaceType, ObjectType,
    },
};
use serde_json::json;
use test_log::test;

use common::{ready, run, run_with};

fn schema() -> Schema {
    let item = ObjectType::new("Item")
        .description("Something with an identity")
        .field(Field::new("id", "ID!"))
        .field(Field::new("name", "String"));

    let pet = InterfaceType::new("Pet").field(Field::new("name", "String"));
    let dog = ObjectType::new("Dog")
        .implements("Pet")
        .field(Field::new("name", "String"));

    let color = EnumType::new("Color")
        .value(EnumValue::new("RED"))
        .value(EnumValue::new("GREEN").deprecated("Use RED"));

    let filter = InputObjectType::new("Filter")
        .field(InputValue::new("term", "String!"))
        .field(InputValue::new("limit", "Int").default_value(ConstValue::Number(10.into())));

    let query = ObjectType::new("Query")
        .field(Field::new("hello", "String").resolver(|_| ready("world")))
        .field(
            Field::new("old", "String")
                .deprecated("Use hello")
                .resolver(|_| ready("old")),
        )
        .field(
            Field::new("item", "Item")
                .resolver(|_| ready(Value::object([("id", Value::from(1))]))),
        )
        .field(
            Field::new("pets", "[Pet]").argument(
                InputValue::new("limit", "Int").default_value(ConstValue::Number(10.into())),
            ),
        )
        .field(Field::new("color", "Color"))
        .field(Field::new("search", "String").argument(InputValue::new("filter", "Filter")));

    Schema::build(query)
        .register(item)
        .register(pet)
        .register(dog)
        .register(color)
        .register(filter)
        .finish()
        .unwrap()
}

#[test(tokio::test)]
async fn typename_names_the_parent_type() {
    let schema = schema();

    let result = run(&schema, "{ __typename item { __typename } }").await;

    assert_eq!(
        result,
        json!({"data": {"__typename": "Query", "item": {"__typename": "Item"}}})
    );
}

#[test(tokio::test)]
async fn type_describes_fields_and_wrapping_types() {
    let schema = schema();
    let query = r#"{
        __type(name: "Item") {
            kind
            name
            description
            fields { name type { kind name ofType { kind name } } }
            interfaces { name }
            possibleTypes { name }
        }
    }"#;

    let result = run(&schema, query).await;

    assert_eq!(
        result,
        json!({
            "data": {
                "__type": {
                    "kind": "OBJECT",
                    "name": "Item",
                    "description": "Something with an identity",
                    "fields": [
                        {
                            "name": "id",
                            "type": {"kind": "NON_NULL", "name": null, "ofType": {"kind": "SCALAR", "name": "ID"}}
                        },
                        {
                            "name": "name",
                            "type": {"kind": "SCALAR", "name": "String", "ofType": null}
                        }
                    ],
                    "interfaces": [],
                    "possibleTypes": null
                }
            }
        })
    );
}

#[test(tokio::test)]
async fn unknown_type_is_null() {
    let schema = schema();

    let result = run(&schema, r#"{ __type(name: "Missing") { name } }"#).await;

    assert_eq!(result, json!({"data": {"__type": null}}));
}

#[test(tokio::test)]
async fn abstract_types_list_their_implementations() {
    let schema = schema();
    let query = r#"{
        pet: __type(name: "Pet") { kind possibleTypes { name } fields { name } }
        dog: __type(name: "Dog") { interfaces { name } }
    }"#;

    let result = run(&schema, query).await;

    assert_eq!(
        result,
        json!({
            "data": {
                "pet": {"kind": "INTERFACE", "possibleTypes": [{"name": "Dog"}], "fields": [{"name": "name"}]},
                "dog": {"interfaces": [{"name": "Pet"}]}
            }
        })
    );
}

#[test(tokio::test)]
async fn deprecated_members_are_hidden_by_default() {
    let schema = schema();
    let query = r#"{
        color: __type(name: "Color") {
            enumValues { name }
            all: enumValues(includeDeprecated: true) { name isDeprecated deprecationReason }
        }
        query: __type(name: "Query") {
            fields { name }
            all: fields(includeDeprecated: true) { name isDeprecated }
        }
    }"#;

    let result = run(&schema, query).await;

    assert_eq!(
        result["data"]["color"],
        json!({
            "enumValues": [{"name": "RED"}],
            "all": [
                {"name": "RED", "isDeprecated": false, "deprecationReason": null},
                {"name": "GREEN", "isDeprecated": true, "deprecationReason": "Use RED"}
            ]
        })
    );
    assert_eq!(
        result["data"]["query"]["fields"],
        json!([
            {"name": "hello"},
            {"name": "item"},
            {"name": "pets"},
            {"name": "color"},
            {"name": "search"}
        ])
    );
    assert_eq!(
        result["data"]["query"]["all"][1],
        json!({"name": "old", "isDeprecated": true})
    );
}

#[test(tokio::test)]
async fn arguments_and_input_fields_report_defaults() {
    let schema = schema();
    let query = r#"{
        query: __type(name: "Query") { fields { name args { name defaultValue type { name } } } }
        filter: __type(name: "Filter") { kind inputFields { name defaultValue } }
    }"#;

    let result = run(&schema, query).await;

    assert_eq!(
        result["data"]["query"]["fields"][2],
        json!({"name": "pets", "args": [{"name": "limit", "defaultValue": "10", "type": {"name": "Int"}}]})
    );
    assert_eq!(
        result["data"]["filter"],
        json!({
            "kind": "INPUT_OBJECT",
            "inputFields": [
                {"name": "term", "defaultValue": null},
                {"name": "limit", "defaultValue": "10"}
            ]
        })
    );
}

#[test(tokio::test)]
async fn schema_describes_roots_and_directives() {
    let schema = schema();
    let query = "{ __schema { queryType { name } mutationType { name } subscriptionType { name } directives { name } types { name } } }";

    let result = run(&schema, query).await;
    let introspected = &result["data"]["__schema"];

    assert_eq!(introspected["queryType"], json!({"name": "Query"}));
    assert_eq!(introspected["mutationType"], json!(null));
    assert_eq!(introspected["subscriptionType"], json!(null));
    assert_eq!(
        introspected["directives"],
        json!([{"name": "include"}, {"name": "skip"}, {"name": "deprecated"}, {"name": "iam"}])
    );

    let type_names: Vec<_> = introspected["types"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    for expected in ["Query", "Item", "Color", "Filter", "String", "Boolean", "__Schema", "__Type"] {
        assert!(type_names.contains(&expected), "missing {expected}");
    }
}

#[test(tokio::test)]
async fn directive_arguments_are_introspectable() {
    let schema = schema();
    let query = "{ __schema { directives { name locations args { name type { kind ofType { name } } } } } }";

    let result = run(&schema, query).await;

    assert_eq!(
        result["data"]["__schema"]["directives"][1],
        json!({
            "name": "skip",
            "locations": ["FIELD", "FRAGMENT_SPREAD", "INLINE_FRAGMENT"],
            "args": [{"name": "if", "type": {"kind": "NON_NULL", "ofType": {"name": "Boolean"}}}]
        })
    );
}

#[test(tokio::test)]
async fn disabled_introspection_drops_schema_fields() {
    let schema = schema();
    let config = ExecutorConfig {
        introspection: false,
        ..Default::default()
    };

    let result = run_with(
        &schema,
        r#"{ __schema { queryType { name } } __type(name: "Item") { name } hello __typename }"#,
        |args| args.config(config),
    )
    .await;

    assert_eq!(
        result,
        json!({"data": {"hello": "world", "__typename": "Query"}})
    );
}

#[test(tokio::test)]
async fn type_meta_field_exists_only_on_the_query_root() {
    let schema = schema();

    let result = run(&schema, r#"{ item { __type(name: "Item") { name } id } }"#).await;

    assert_eq!(result, json!({"data": {"item": {"id": "1"}}}));
}
