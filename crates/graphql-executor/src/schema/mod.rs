// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The type system the executor runs against.
//!
//! A [`Schema`] can only be obtained through [`SchemaBuilder::finish`], which checks that the
//! type graph is internally consistent. Execution can therefore rely on every referenced type
//! existing and being of a sensible kind.

use std::collections::HashMap;

use indexmap::IndexMap;
use thiserror::Error;

pub mod directives;
pub mod introspection;
pub mod scalars;
pub mod types;

use directives::{DirectiveDefinition, specified_directives};
use types::{Field, NamedType, ObjectType, TypeRef};

#[derive(Error, Debug, PartialEq)]
pub enum SchemaError {
    #[error("Schema must contain uniquely named types but contains multiple types named \"{0}\".")]
    DuplicateType(String),

    #[error("Root type \"{0}\" must be an Object type.")]
    RootNotObject(String),

    #[error("Unknown type \"{type_name}\" referenced by {coordinate}.")]
    UnknownType {
        type_name: String,
        coordinate: String,
    },

    #[error("The type of {coordinate} must be Output Type but got: {type_ref}.")]
    NotOutputType {
        coordinate: String,
        type_ref: String,
    },

    #[error("The type of {coordinate} must be Input Type but got: {type_ref}.")]
    NotInputType {
        coordinate: String,
        type_ref: String,
    },

    #[error("Union type {union} can only include Object types, it cannot include {member}.")]
    UnionMemberNotObject { union: String, member: String },

    #[error("Union type {0} must define one or more member types.")]
    EmptyUnion(String),

    #[error("Type {object} must only implement Interface types, it cannot implement {interface}.")]
    NotAnInterface { object: String, interface: String },

    #[error("Interface field {interface}.{field} expected but {object} does not provide it.")]
    MissingInterfaceField {
        object: String,
        interface: String,
        field: String,
    },

    #[error(
        "Schema must contain uniquely named directives but contains multiple directives named \"@{0}\"."
    )]
    DuplicateDirective(String),
}

/// A validated type graph with its root operation types.
pub struct Schema {
    types: IndexMap<String, NamedType>,
    query_type: String,
    mutation_type: Option<String>,
    directives: Vec<DirectiveDefinition>,
    possible_types: HashMap<String, Vec<String>>,
    pub(crate) schema_meta_field: Field,
    pub(crate) type_meta_field: Field,
    pub(crate) typename_meta_field: Field,
}

impl Schema {
    pub fn build(query: ObjectType) -> SchemaBuilder {
        SchemaBuilder {
            query,
            mutation: None,
            types: vec![],
            directives: specified_directives(),
        }
    }

    pub fn get_type(&self, name: &str) -> Option<&NamedType> {
        self.types.get(name)
    }

    pub fn object_type(&self, name: &str) -> Option<&ObjectType> {
        match self.types.get(name) {
            Some(NamedType::Object(object_type)) => Some(object_type),
            _ => None,
        }
    }

    pub fn types(&self) -> impl Iterator<Item = &NamedType> {
        self.types.values()
    }

    pub fn query_type(&self) -> Option<&ObjectType> {
        self.object_type(&self.query_type)
    }

    pub fn mutation_type(&self) -> Option<&ObjectType> {
        self.mutation_type
            .as_deref()
            .and_then(|name| self.object_type(name))
    }

    pub fn directives(&self) -> &[DirectiveDefinition] {
        &self.directives
    }

    pub fn directive(&self, name: &str) -> Option<&DirectiveDefinition> {
        self.directives
            .iter()
            .find(|directive| directive.name == name)
    }

    /// Object types that may appear where the abstract type `abstract_type` is expected, in
    /// declaration order.
    pub fn possible_types(&self, abstract_type: &str) -> &[String] {
        self.possible_types
            .get(abstract_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_possible_type(&self, abstract_type: &str, object_type: &str) -> bool {
        self.possible_types(abstract_type)
            .iter()
            .any(|name| name == object_type)
    }

    fn validate(&self) -> Result<(), SchemaError> {
        for root in std::iter::once(&self.query_type).chain(&self.mutation_type) {
            if self.object_type(root).is_none() {
                return Err(SchemaError::RootNotObject(root.clone()));
            }
        }

        for named_type in self.types.values() {
            match named_type {
                NamedType::Object(object_type) => {
                    self.validate_fields(&object_type.name, &object_type.fields)?;
                    self.validate_interfaces(object_type)?;
                }
                NamedType::Interface(interface_type) => {
                    self.validate_fields(&interface_type.name, &interface_type.fields)?;
                }
                NamedType::Union(union_type) => {
                    if union_type.types.is_empty() {
                        return Err(SchemaError::EmptyUnion(union_type.name.clone()));
                    }
                    for member in &union_type.types {
                        if self.object_type(member).is_none() {
                            return Err(SchemaError::UnionMemberNotObject {
                                union: union_type.name.clone(),
                                member: member.clone(),
                            });
                        }
                    }
                }
                NamedType::InputObject(input_type) => {
                    for field in input_type.fields.values() {
                        self.check_input_type(
                            &field.ty,
                            format!("{}.{}", input_type.name, field.name),
                        )?;
                    }
                }
                NamedType::Scalar(_) | NamedType::Enum(_) => {}
            }
        }

        for directive in &self.directives {
            for arg in directive.args.values() {
                self.check_input_type(&arg.ty, format!("@{}({}:)", directive.name, arg.name))?;
            }
        }

        Ok(())
    }

    fn validate_fields(
        &self,
        parent: &str,
        fields: &IndexMap<String, Field>,
    ) -> Result<(), SchemaError> {
        for field in fields.values() {
            let coordinate = format!("{parent}.{}", field.name);
            let named_type = self.referenced_type(&field.ty, &coordinate)?;
            if !named_type.is_output_type() {
                return Err(SchemaError::NotOutputType {
                    coordinate,
                    type_ref: field.ty.to_string(),
                });
            }

            for arg in field.args.values() {
                self.check_input_type(&arg.ty, format!("{coordinate}({}:)", arg.name))?;
            }
        }
        Ok(())
    }

    fn validate_interfaces(&self, object_type: &ObjectType) -> Result<(), SchemaError> {
        for interface_name in &object_type.interfaces {
            let Some(NamedType::Interface(interface_type)) = self.types.get(interface_name) else {
                return Err(SchemaError::NotAnInterface {
                    object: object_type.name.clone(),
                    interface: interface_name.clone(),
                });
            };

            if let Some(missing) = interface_type
                .fields
                .keys()
                .find(|field| !object_type.fields.contains_key(*field))
            {
                return Err(SchemaError::MissingInterfaceField {
                    object: object_type.name.clone(),
                    interface: interface_name.clone(),
                    field: missing.clone(),
                });
            }
        }
        Ok(())
    }

    fn check_input_type(&self, ty: &TypeRef, coordinate: String) -> Result<(), SchemaError> {
        let named_type = self.referenced_type(ty, &coordinate)?;
        if named_type.is_input_type() {
            Ok(())
        } else {
            Err(SchemaError::NotInputType {
                coordinate,
                type_ref: ty.to_string(),
            })
        }
    }

    fn referenced_type(&self, ty: &TypeRef, coordinate: &str) -> Result<&NamedType, SchemaError> {
        self.types
            .get(ty.named_type())
            .ok_or_else(|| SchemaError::UnknownType {
                type_name: ty.named_type().to_string(),
                coordinate: coordinate.to_string(),
            })
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("query_type", &self.query_type)
            .field("mutation_type", &self.mutation_type)
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

pub struct SchemaBuilder {
    query: ObjectType,
    mutation: Option<ObjectType>,
    types: Vec<NamedType>,
    directives: Vec<DirectiveDefinition>,
}

impl SchemaBuilder {
    pub fn mutation(mut self, mutation: ObjectType) -> Self {
        self.mutation = Some(mutation);
        self
    }

    /// Adds a type that is not reachable from the root types by name only (or that should be
    /// listed in any case).
    pub fn register(mut self, named_type: impl Into<NamedType>) -> Self {
        self.types.push(named_type.into());
        self
    }

    pub fn directive(mut self, directive: DirectiveDefinition) -> Self {
        self.directives.push(directive);
        self
    }

    pub fn finish(self) -> Result<Schema, SchemaError> {
        let query_type = self.query.name.clone();
        let mutation_type = self.mutation.as_ref().map(|mutation| mutation.name.clone());

        let mut types: IndexMap<String, NamedType> = IndexMap::new();
        let user_types = std::iter::once(NamedType::Object(self.query))
            .chain(self.mutation.map(NamedType::Object))
            .chain(self.types);

        for named_type in user_types {
            if types.contains_key(named_type.name()) {
                return Err(SchemaError::DuplicateType(named_type.name().to_string()));
            }
            types.insert(named_type.name().to_string(), named_type);
        }

        for scalar in scalars::builtin_scalars() {
            if !types.contains_key(&scalar.name) {
                types.insert(scalar.name.clone(), NamedType::Scalar(scalar));
            }
        }

        for named_type in introspection::introspection_types() {
            if types.contains_key(named_type.name()) {
                return Err(SchemaError::DuplicateType(named_type.name().to_string()));
            }
            types.insert(named_type.name().to_string(), named_type);
        }

        let mut directives: Vec<DirectiveDefinition> = vec![];
        for directive in self.directives {
            if directives.iter().any(|d| d.name == directive.name) {
                return Err(SchemaError::DuplicateDirective(directive.name));
            }
            directives.push(directive);
        }

        let possible_types = compute_possible_types(&types);

        let schema = Schema {
            types,
            query_type,
            mutation_type,
            directives,
            possible_types,
            schema_meta_field: introspection::schema_meta_field(),
            type_meta_field: introspection::type_meta_field(),
            typename_meta_field: introspection::typename_meta_field(),
        };

        schema.validate()?;

        Ok(schema)
    }
}

fn compute_possible_types(types: &IndexMap<String, NamedType>) -> HashMap<String, Vec<String>> {
    let mut possible_types: HashMap<String, Vec<String>> = HashMap::new();

    for named_type in types.values() {
        match named_type {
            NamedType::Union(union_type) => {
                possible_types
                    .entry(union_type.name.clone())
                    .or_default()
                    .extend(union_type.types.iter().cloned());
            }
            NamedType::Object(object_type) => {
                for interface in &object_type.interfaces {
                    possible_types
                        .entry(interface.clone())
                        .or_default()
                        .push(object_type.name.clone());
                }
            }
            _ => {}
        }
    }

    possible_types
}

#[cfg(test)]
mod tests {
    use super::types::{Field, InterfaceType, UnionType};
    use super::*;

    fn query() -> ObjectType {
        ObjectType::new("Query").field(Field::new("hero", "Character"))
    }

    #[test]
    fn possible_types_follow_declaration_order() {
        let schema = Schema::build(query())
            .register(InterfaceType::new("Character").field(Field::new("name", "String")))
            .register(
                ObjectType::new("Human")
                    .implements("Character")
                    .field(Field::new("name", "String")),
            )
            .register(
                ObjectType::new("Droid")
                    .implements("Character")
                    .field(Field::new("name", "String")),
            )
            .register(UnionType::new("SearchResult").member("Droid"))
            .finish()
            .unwrap();

        assert_eq!(schema.possible_types("Character"), ["Human", "Droid"]);
        assert!(schema.is_possible_type("SearchResult", "Droid"));
        assert!(!schema.is_possible_type("SearchResult", "Human"));
        assert!(schema.get_type("__Schema").is_some());
        assert!(schema.get_type("Boolean").is_some());
        assert!(schema.directive("skip").is_some());
    }

    #[test]
    fn unknown_field_type_is_rejected() {
        let error = Schema::build(query()).finish().unwrap_err();

        assert_eq!(
            error,
            SchemaError::UnknownType {
                type_name: "Character".into(),
                coordinate: "Query.hero".into(),
            }
        );
    }

    #[test]
    fn structural_errors_are_reported() {
        let missing_field = Schema::build(ObjectType::new("Query").field(Field::new("a", "Int")))
            .register(InterfaceType::new("Node").field(Field::new("id", "ID!")))
            .register(ObjectType::new("User").implements("Node"))
            .finish()
            .unwrap_err();
        assert!(matches!(missing_field, SchemaError::MissingInterfaceField { .. }));

        let bad_union = Schema::build(ObjectType::new("Query").field(Field::new("a", "Int")))
            .register(UnionType::new("U").member("Int"))
            .finish()
            .unwrap_err();
        assert!(matches!(bad_union, SchemaError::UnionMemberNotObject { .. }));

        let duplicate = Schema::build(ObjectType::new("Query").field(Field::new("a", "Int")))
            .register(ObjectType::new("Query"))
            .finish()
            .unwrap_err();
        assert_eq!(duplicate, SchemaError::DuplicateType("Query".into()));
    }
}
