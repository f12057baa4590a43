// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The built-in scalars: `Int`, `Float`, `String`, `Boolean` and `ID`.

use async_graphql_value::ConstValue;
use serde_json::{Number, Value as JsonValue};

use super::types::ScalarType;
use crate::value::Value;

const MAX_INT: i64 = i32::MAX as i64;
const MIN_INT: i64 = i32::MIN as i64;

pub const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

pub fn builtin_scalars() -> Vec<ScalarType> {
    vec![int(), float(), string(), boolean(), id()]
}

fn int() -> ScalarType {
    ScalarType::new("Int", |value| {
        let number = match value {
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            Value::Boolean(b) => i64::from(*b) as f64,
            Value::String(s) if !s.trim().is_empty() => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        int_in_range(number).map(JsonValue::from)
    })
    .description(
        "The `Int` scalar type represents non-fractional signed whole numeric values. Int can represent values between -(2^31) and 2^31 - 1.",
    )
    .parse_value(|value| match value {
        ConstValue::Number(n) => n
            .as_f64()
            .and_then(int_in_range)
            .map(|i| ConstValue::Number(i.into())),
        _ => None,
    })
}

fn int_in_range(number: f64) -> Option<i64> {
    if number.fract() != 0.0 || !number.is_finite() {
        return None;
    }
    let number = number as i64;
    (MIN_INT..=MAX_INT).contains(&number).then_some(number)
}

fn float() -> ScalarType {
    ScalarType::new("Float", |value| {
        let number = match value {
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            Value::Boolean(b) => i64::from(*b) as f64,
            Value::String(s) if !s.trim().is_empty() => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        Number::from_f64(number).map(JsonValue::Number)
    })
    .description(
        "The `Float` scalar type represents signed double-precision fractional values as specified by [IEEE 754](https://en.wikipedia.org/wiki/IEEE_floating_point).",
    )
    .parse_value(|value| match value {
        ConstValue::Number(n) if n.as_f64().is_some_and(f64::is_finite) => Some(value.clone()),
        _ => None,
    })
}

fn string() -> ScalarType {
    ScalarType::new("String", |value| match value {
        Value::String(s) => Some(JsonValue::String(s.clone())),
        Value::Int(i) => Some(JsonValue::String(i.to_string())),
        Value::Float(f) => Some(JsonValue::String(f.to_string())),
        Value::Boolean(b) => Some(JsonValue::String(b.to_string())),
        _ => None,
    })
    .description(
        "The `String` scalar type represents textual data, represented as UTF-8 character sequences. The String type is most often used by GraphQL to represent free-form human-readable text.",
    )
    .parse_value(|value| match value {
        ConstValue::String(_) => Some(value.clone()),
        _ => None,
    })
}

fn boolean() -> ScalarType {
    ScalarType::new("Boolean", |value| match value {
        Value::Boolean(b) => Some(JsonValue::Bool(*b)),
        Value::Int(i) => Some(JsonValue::Bool(*i != 0)),
        Value::Float(f) => Some(JsonValue::Bool(*f != 0.0)),
        _ => None,
    })
    .description("The `Boolean` scalar type represents `true` or `false`.")
    .parse_value(|value| match value {
        ConstValue::Boolean(_) => Some(value.clone()),
        _ => None,
    })
}

fn id() -> ScalarType {
    ScalarType::new("ID", |value| match value {
        Value::String(s) => Some(JsonValue::String(s.clone())),
        Value::Int(i) => Some(JsonValue::String(i.to_string())),
        _ => None,
    })
    .description(
        "The `ID` scalar type represents a unique identifier, often used to refetch an object or as key for a cache. The ID type appears in a JSON response as a String; however, it is not intended to be human-readable. When expected as an input type, any string (such as `\"4\"`) or integer (such as `4`) input value will be accepted as an ID.",
    )
    .parse_value(|value| match value {
        ConstValue::String(_) => Some(value.clone()),
        ConstValue::Number(n) if n.is_i64() || n.is_u64() => {
            Some(ConstValue::String(n.to_string()))
        }
        _ => None,
    })
}
