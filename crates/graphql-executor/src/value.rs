// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{any::Any, fmt, future::Future, sync::Arc};

use async_graphql_value::ConstValue;
use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::{
    error::FieldError, execution::ResolveInfo, maybe_async::MaybeAsync, values::Arguments,
};

/// What a resolver (or a [`Method`]) produces: a value now, a value later, or a failure.
pub type Resolution<'e> = MaybeAsync<'e, Result<Value, FieldError>>;

type MethodFn = dyn for<'r, 'e> Fn(
        &'r Arguments,
        &'e ContextValue,
        &'r ResolveInfo<'e>,
    ) -> Resolution<'e>
    + Send
    + Sync;

/// An invocable property of an object value.
///
/// The default field resolver calls it with the field arguments, the context value and the
/// resolve info instead of returning it verbatim.
#[derive(Clone)]
pub struct Method(Arc<MethodFn>);

impl Method {
    pub fn new<F>(f: F) -> Self
    where
        F: for<'r, 'e> Fn(&'r Arguments, &'e ContextValue, &'r ResolveInfo<'e>) -> Resolution<'e>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call<'r, 'e>(
        &self,
        args: &'r Arguments,
        context_value: &'e ContextValue,
        info: &'r ResolveInfo<'e>,
    ) -> Resolution<'e> {
        (self.0)(args, context_value, info)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Method")
    }
}

/// A value that settles later, for example a list element that is still being fetched.
///
/// Clones share the same underlying future, so it runs at most once.
#[derive(Clone)]
pub struct Deferred(Shared<BoxFuture<'static, Result<Value, FieldError>>>);

impl Deferred {
    pub fn new(future: impl Future<Output = Result<Value, FieldError>> + Send + 'static) -> Self {
        Self(future.boxed().shared())
    }

    /// Waits for the value. A deferred value that settles to another one is followed.
    pub async fn settle(self) -> Result<Value, FieldError> {
        let mut value = self.0.await?;
        while let Value::Pending(deferred) = value {
            value = deferred.0.await?;
        }
        Ok(value)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Deferred")
    }
}

/// The request-scoped value handed to every resolver (an authenticated user, loaders, ...).
#[derive(Clone)]
pub struct ContextValue(Arc<dyn Any + Send + Sync>);

impl ContextValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn get<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl Default for ContextValue {
    fn default() -> Self {
        Self::new(())
    }
}

impl fmt::Debug for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContextValue")
    }
}

/// A raw value produced by a resolver, before it is completed against the field's type.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Object(IndexMap<String, Value>),
    Method(Method),
    /// A host object, for resolvers that know its concrete type.
    Opaque(Arc<dyn Any + Send + Sync>),
    /// A failed value. Completing it reports the error at its position.
    Error(FieldError),
    /// A value that is not available yet. It is completed once it settles.
    Pending(Deferred),
}

impl Value {
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Value::Opaque(Arc::new(value))
    }

    pub fn pending(
        future: impl Future<Output = Result<Value, FieldError>> + Send + 'static,
    ) -> Self {
        Value::Pending(Deferred::new(future))
    }

    pub fn method<F>(f: F) -> Self
    where
        F: for<'r, 'e> Fn(&'r Arguments, &'e ContextValue, &'r ResolveInfo<'e>) -> Resolution<'e>
            + Send
            + Sync
            + 'static,
    {
        Value::Method(Method::new(f))
    }

    /// `null` and `NaN` complete to `null`.
    pub fn is_nullish(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(entries) => entries.get(key),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Opaque(value) => value.downcast_ref(),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Method(a), Value::Method(b)) => Arc::ptr_eq(&a.0, &b.0),
            (Value::Opaque(a), Value::Opaque(b)) => Arc::ptr_eq(a, b),
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Pending(a), Value::Pending(b)) => a.0.ptr_eq(&b.0),
            _ => false,
        }
    }
}

/// Renders a value for error messages (`"text"`, `{ a: 1 }`, `[1, 2]`).
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) if v.is_nan() => f.write_str("NaN"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "{}", JsonValue::String(s.clone())),
            Value::List(items) => {
                let items = items.iter().map(|v| v.to_string()).collect::<Vec<_>>();
                write!(f, "[{}]", items.join(", "))
            }
            Value::Object(entries) if entries.is_empty() => f.write_str("{}"),
            Value::Object(entries) => {
                let entries = entries
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>();
                write!(f, "{{ {} }}", entries.join(", "))
            }
            Value::Method(_) => f.write_str("[function]"),
            Value::Opaque(_) => f.write_str("[object]"),
            Value::Error(e) => write!(f, "[Error: {e}]"),
            Value::Pending(_) => f.write_str("[pending]"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<FieldError> for Value {
    fn from(error: FieldError) -> Self {
        Value::Error(error)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(entries: IndexMap<String, Value>) -> Self {
        Value::Object(entries)
    }
}

impl From<JsonValue> for Value {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Boolean(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<ConstValue> for Value {
    fn from(value: ConstValue) -> Self {
        match value {
            ConstValue::Null => Value::Null,
            ConstValue::Boolean(b) => Value::Boolean(b),
            ConstValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            ConstValue::String(s) => Value::String(s),
            ConstValue::Binary(bytes) => {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            }
            ConstValue::Enum(name) => Value::String(name.to_string()),
            ConstValue::List(items) => Value::List(items.into_iter().map(Value::from).collect()),
            ConstValue::Object(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}
