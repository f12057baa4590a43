// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{fmt, sync::Arc};

use async_graphql_parser::types::{BaseType, Type};
use async_graphql_value::ConstValue;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::{
    execution::{ResolveInfo, ResolverContext},
    maybe_async::MaybeAsync,
    value::{ContextValue, Resolution, Value},
};

pub type ResolveFn =
    Arc<dyn for<'r, 'e> Fn(ResolverContext<'r, 'e>) -> Resolution<'e> + Send + Sync>;

pub type IsTypeOfFn = Arc<
    dyn for<'r, 'e> Fn(&'r Value, &'e ContextValue, &'r ResolveInfo<'e>) -> MaybeAsync<'e, bool>
        + Send
        + Sync,
>;

/// Names the concrete object type of a value of an abstract type (`None` if it cannot tell).
pub type ResolveTypeFn = Arc<
    dyn for<'r, 'e> Fn(
            &'r Value,
            &'e ContextValue,
            &'r ResolveInfo<'e>,
        ) -> MaybeAsync<'e, Option<String>>
        + Send
        + Sync,
>;

type SerializeFn = Arc<dyn Fn(&Value) -> Option<JsonValue> + Send + Sync>;
type ParseValueFn = Arc<dyn Fn(&ConstValue) -> Option<ConstValue> + Send + Sync>;

/// A reference to a type, possibly wrapped in list and non-null modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn list(of_type: impl Into<TypeRef>) -> Self {
        TypeRef::List(Box::new(of_type.into()))
    }

    pub fn non_null(of_type: impl Into<TypeRef>) -> Self {
        TypeRef::NonNull(Box::new(of_type.into()))
    }

    /// Parses a type reference in SDL notation, such as `[String!]!`.
    pub fn parse(sdl: &str) -> Option<Self> {
        Type::new(sdl).map(|ty| TypeRef::from(&ty))
    }

    /// The name of the innermost named type.
    pub fn named_type(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::List(of_type) | TypeRef::NonNull(of_type) => of_type.named_type(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }
}

impl From<&Type> for TypeRef {
    fn from(ty: &Type) -> Self {
        let base = match &ty.base {
            BaseType::Named(name) => TypeRef::Named(name.to_string()),
            BaseType::List(of_type) => TypeRef::List(Box::new(TypeRef::from(of_type.as_ref()))),
        };

        if ty.nullable {
            base
        } else {
            TypeRef::NonNull(Box::new(base))
        }
    }
}

/// SDL notation. Strings that are not valid type references become a named reference, which
/// the schema builder then rejects as unknown.
impl From<&str> for TypeRef {
    fn from(sdl: &str) -> Self {
        TypeRef::parse(sdl).unwrap_or_else(|| TypeRef::Named(sdl.to_string()))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => write!(f, "{name}"),
            TypeRef::List(of_type) => write!(f, "[{of_type}]"),
            TypeRef::NonNull(of_type) => write!(f, "{of_type}!"),
        }
    }
}

/// An argument or input object field.
#[derive(Debug, Clone)]
pub struct InputValue {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub default_value: Option<ConstValue>,
}

impl InputValue {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            description: None,
            ty: ty.into(),
            default_value: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn default_value(mut self, value: ConstValue) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// A field of an object or interface type.
#[derive(Clone)]
pub struct Field {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub args: IndexMap<String, InputValue>,
    pub deprecation_reason: Option<String>,
    resolver: Option<ResolveFn>,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            description: None,
            ty: ty.into(),
            args: IndexMap::new(),
            deprecation_reason: None,
            resolver: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn argument(mut self, argument: InputValue) -> Self {
        self.args.insert(argument.name.clone(), argument);
        self
    }

    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    pub fn resolver<F>(mut self, resolver: F) -> Self
    where
        F: for<'r, 'e> Fn(ResolverContext<'r, 'e>) -> Resolution<'e> + Send + Sync + 'static,
    {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn resolve_fn(&self) -> Option<&ResolveFn> {
        self.resolver.as_ref()
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct ScalarType {
    pub name: String,
    pub description: Option<String>,
    serialize: SerializeFn,
    parse_value: ParseValueFn,
}

impl ScalarType {
    /// A scalar whose `serialize` returns `None` for values it cannot represent. Input values are
    /// accepted unchanged unless [`ScalarType::parse_value`] says otherwise.
    pub fn new<F>(name: impl Into<String>, serialize: F) -> Self
    where
        F: Fn(&Value) -> Option<JsonValue> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: None,
            serialize: Arc::new(serialize),
            parse_value: Arc::new(|value| Some(value.clone())),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn parse_value<F>(mut self, parse_value: F) -> Self
    where
        F: Fn(&ConstValue) -> Option<ConstValue> + Send + Sync + 'static,
    {
        self.parse_value = Arc::new(parse_value);
        self
    }

    pub fn serialize(&self, value: &Value) -> Option<JsonValue> {
        (self.serialize)(value)
    }

    pub fn parse(&self, value: &ConstValue) -> Option<ConstValue> {
        (self.parse_value)(value)
    }
}

#[derive(Clone)]
pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, Field>,
    pub interfaces: Vec<String>,
    is_type_of: Option<IsTypeOfFn>,
}

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
            interfaces: vec![],
            is_type_of: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Predicate deciding whether a raw value belongs to this type.
    pub fn is_type_of<F>(mut self, is_type_of: F) -> Self
    where
        F: for<'r, 'e> Fn(&'r Value, &'e ContextValue, &'r ResolveInfo<'e>) -> MaybeAsync<'e, bool>
            + Send
            + Sync
            + 'static,
    {
        self.is_type_of = Some(Arc::new(is_type_of));
        self
    }

    pub fn is_type_of_fn(&self) -> Option<&IsTypeOfFn> {
        self.is_type_of.as_ref()
    }
}

#[derive(Clone)]
pub struct InterfaceType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, Field>,
    resolve_type: Option<ResolveTypeFn>,
}

impl InterfaceType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
            resolve_type: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    pub fn resolve_type<F>(mut self, resolve_type: F) -> Self
    where
        F: for<'r, 'e> Fn(
                &'r Value,
                &'e ContextValue,
                &'r ResolveInfo<'e>,
            ) -> MaybeAsync<'e, Option<String>>
            + Send
            + Sync
            + 'static,
    {
        self.resolve_type = Some(Arc::new(resolve_type));
        self
    }
}

#[derive(Clone)]
pub struct UnionType {
    pub name: String,
    pub description: Option<String>,
    pub types: Vec<String>,
    resolve_type: Option<ResolveTypeFn>,
}

impl UnionType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            types: vec![],
            resolve_type: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn member(mut self, type_name: impl Into<String>) -> Self {
        self.types.push(type_name.into());
        self
    }

    pub fn resolve_type<F>(mut self, resolve_type: F) -> Self
    where
        F: for<'r, 'e> Fn(
                &'r Value,
                &'e ContextValue,
                &'r ResolveInfo<'e>,
            ) -> MaybeAsync<'e, Option<String>>
            + Send
            + Sync
            + 'static,
    {
        self.resolve_type = Some(Arc::new(resolve_type));
        self
    }
}

#[derive(Debug, Clone)]
pub struct EnumValue {
    pub name: String,
    pub description: Option<String>,
    /// The internal value resolvers return for this enum value.
    pub value: Value,
    pub deprecation_reason: Option<String>,
}

impl EnumValue {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            value: Value::String(name.clone()),
            name,
            description: None,
            deprecation_reason: None,
        }
    }

    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct EnumType {
    pub name: String,
    pub description: Option<String>,
    pub values: IndexMap<String, EnumValue>,
}

impl EnumType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            values: IndexMap::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn value(mut self, value: EnumValue) -> Self {
        self.values.insert(value.name.clone(), value);
        self
    }

    /// Maps an internal value to the name of the matching enum value.
    pub fn serialize(&self, value: &Value) -> Option<JsonValue> {
        self.values
            .values()
            .find(|enum_value| &enum_value.value == value)
            .map(|enum_value| JsonValue::String(enum_value.name.clone()))
    }

    pub fn parse(&self, value: &ConstValue) -> Option<ConstValue> {
        let name = match value {
            ConstValue::Enum(name) => name.as_str(),
            ConstValue::String(name) => name.as_str(),
            _ => return None,
        };

        self.values
            .get_key_value(name)
            .map(|(name, _)| ConstValue::Enum(async_graphql_value::Name::new(name)))
    }
}

#[derive(Debug, Clone)]
pub struct InputObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, InputValue>,
}

impl InputObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, field: InputValue) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }
}

/// Any named type of the type system.
#[derive(Clone)]
pub enum NamedType {
    Scalar(ScalarType),
    Object(ObjectType),
    Interface(InterfaceType),
    Union(UnionType),
    Enum(EnumType),
    InputObject(InputObjectType),
}

impl NamedType {
    pub fn name(&self) -> &str {
        match self {
            NamedType::Scalar(t) => &t.name,
            NamedType::Object(t) => &t.name,
            NamedType::Interface(t) => &t.name,
            NamedType::Union(t) => &t.name,
            NamedType::Enum(t) => &t.name,
            NamedType::InputObject(t) => &t.name,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            NamedType::Scalar(t) => t.description.as_deref(),
            NamedType::Object(t) => t.description.as_deref(),
            NamedType::Interface(t) => t.description.as_deref(),
            NamedType::Union(t) => t.description.as_deref(),
            NamedType::Enum(t) => t.description.as_deref(),
            NamedType::InputObject(t) => t.description.as_deref(),
        }
    }

    /// Output fields of object and interface types.
    pub fn fields(&self) -> Option<&IndexMap<String, Field>> {
        match self {
            NamedType::Object(t) => Some(&t.fields),
            NamedType::Interface(t) => Some(&t.fields),
            _ => None,
        }
    }

    pub fn is_input_type(&self) -> bool {
        matches!(
            self,
            NamedType::Scalar(_) | NamedType::Enum(_) | NamedType::InputObject(_)
        )
    }

    pub fn is_output_type(&self) -> bool {
        !matches!(self, NamedType::InputObject(_))
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self, NamedType::Interface(_) | NamedType::Union(_))
    }

    pub(crate) fn resolve_type_fn(&self) -> Option<&ResolveTypeFn> {
        match self {
            NamedType::Interface(t) => t.resolve_type.as_ref(),
            NamedType::Union(t) => t.resolve_type.as_ref(),
            _ => None,
        }
    }
}

impl fmt::Debug for NamedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            NamedType::Scalar(_) => "Scalar",
            NamedType::Object(_) => "Object",
            NamedType::Interface(_) => "Interface",
            NamedType::Union(_) => "Union",
            NamedType::Enum(_) => "Enum",
            NamedType::InputObject(_) => "InputObject",
        };
        f.debug_tuple(kind).field(&self.name()).finish()
    }
}

impl From<ScalarType> for NamedType {
    fn from(t: ScalarType) -> Self {
        NamedType::Scalar(t)
    }
}

impl From<ObjectType> for NamedType {
    fn from(t: ObjectType) -> Self {
        NamedType::Object(t)
    }
}

impl From<InterfaceType> for NamedType {
    fn from(t: InterfaceType) -> Self {
        NamedType::Interface(t)
    }
}

impl From<UnionType> for NamedType {
    fn from(t: UnionType) -> Self {
        NamedType::Union(t)
    }
}

impl From<EnumType> for NamedType {
    fn from(t: EnumType) -> Self {
        NamedType::Enum(t)
    }
}

impl From<InputObjectType> for NamedType {
    fn from(t: InputObjectType) -> Self {
        NamedType::InputObject(t)
    }
}
