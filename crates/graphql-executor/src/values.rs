// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Coercion of variables and arguments into the values resolvers receive.

use async_graphql_parser::{
    Pos, Positioned,
    types::{Directive, VariableDefinition},
};
use async_graphql_value::{ConstValue, Name, Value as AstValue};
use indexmap::IndexMap;
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::{
    error::GraphQLError,
    path::PathSegment,
    schema::{
        Schema,
        directives::DirectiveDefinition,
        types::{InputValue, NamedType, TypeRef},
    },
    value::Value,
};

/// Coerced argument values of a field or directive, keyed by argument name.
pub type Arguments = IndexMap<String, ConstValue>;

/// Coerced variable values of an operation.
pub type Variables = IndexMap<Name, ConstValue>;

/// Coerces the raw variable `inputs` against the operation's variable definitions.
///
/// All problems are reported, not just the first one.
pub fn coerce_variable_values(
    schema: &Schema,
    definitions: &[Positioned<VariableDefinition>],
    inputs: &JsonMap<String, JsonValue>,
) -> Result<Variables, Vec<GraphQLError>> {
    let mut errors = vec![];
    let mut coerced = Variables::new();

    for definition in definitions {
        let var_name = &definition.node.name.node;
        let var_type = TypeRef::from(&definition.node.var_type.node);

        let is_input_type = schema
            .get_type(var_type.named_type())
            .is_some_and(NamedType::is_input_type);
        if !is_input_type {
            errors.push(GraphQLError::with_positions(
                format!(
                    "Variable \"${var_name}\" expected value of type \"{var_type}\" which cannot be used as an input type."
                ),
                [definition.node.var_type.pos],
            ));
            continue;
        }

        let input = inputs.get(var_name.as_str());
        match (input, &definition.node.default_value) {
            (None, Some(default_value)) => {
                // Literal defaults were checked against the variable type by validation.
                let value = value_from_ast(
                    schema,
                    &default_value.node.clone().into_value(),
                    &var_type,
                    None,
                )
                .unwrap_or_else(|| default_value.node.clone());
                coerced.insert(var_name.clone(), value);
            }
            (None | Some(JsonValue::Null), _) if var_type.is_non_null() => {
                let message = if input.is_some() {
                    format!(
                        "Variable \"${var_name}\" of non-null type \"{var_type}\" must not be null."
                    )
                } else {
                    format!(
                        "Variable \"${var_name}\" of required type \"{var_type}\" was not provided."
                    )
                };
                errors.push(GraphQLError::with_positions(message, [definition.pos]));
            }
            (None, None) => {}
            (Some(JsonValue::Null), _) => {
                coerced.insert(var_name.clone(), ConstValue::Null);
            }
            (Some(input), _) => {
                let value = ConstValue::from_json(input.clone()).unwrap_or(ConstValue::Null);
                match coerce_value(schema, &value, &var_type, &mut vec![]) {
                    Ok(value) => {
                        coerced.insert(var_name.clone(), value);
                    }
                    Err(messages) => {
                        let prelude = format!(
                            "Variable \"${var_name}\" got invalid value {}; ",
                            Value::from(input.clone())
                        );
                        errors.extend(messages.into_iter().map(|message| {
                            GraphQLError::with_positions(
                                format!("{prelude}{message}"),
                                [definition.pos],
                            )
                        }));
                    }
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(coerced)
    } else {
        Err(errors)
    }
}

/// Coerces an input value (as received in the variables) to `ty`, collecting every problem.
pub fn coerce_value(
    schema: &Schema,
    value: &ConstValue,
    ty: &TypeRef,
    path: &mut Vec<PathSegment>,
) -> Result<ConstValue, Vec<String>> {
    let of_type = match ty {
        TypeRef::NonNull(of_type) => {
            if matches!(value, ConstValue::Null) {
                return Err(vec![coercion_error(
                    format!("Expected non-nullable type {ty} not to be null"),
                    path,
                    None,
                )]);
            }
            return coerce_value(schema, value, of_type, path);
        }
        _ if matches!(value, ConstValue::Null) => return Ok(ConstValue::Null),
        TypeRef::List(of_type) => of_type,
        TypeRef::Named(name) => return coerce_named(schema, value, name, path),
    };

    match value {
        ConstValue::List(items) => {
            let mut errors = vec![];
            let mut coerced = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                path.push(PathSegment::Index(index));
                match coerce_value(schema, item, of_type, path) {
                    Ok(item) => coerced.push(item),
                    Err(item_errors) => errors.extend(item_errors),
                }
                path.pop();
            }
            if errors.is_empty() {
                Ok(ConstValue::List(coerced))
            } else {
                Err(errors)
            }
        }
        // Lists accept a single value as a list of one.
        _ => coerce_value(schema, value, of_type, &mut vec![])
            .map(|item| ConstValue::List(vec![item])),
    }
}

fn coerce_named(
    schema: &Schema,
    value: &ConstValue,
    name: &str,
    path: &mut Vec<PathSegment>,
) -> Result<ConstValue, Vec<String>> {
    let expected = || vec![coercion_error(format!("Expected type {name}"), path, None)];

    match schema.get_type(name) {
        Some(NamedType::Scalar(scalar)) => scalar.parse(value).ok_or_else(expected),
        Some(NamedType::Enum(enum_type)) => match value {
            ConstValue::String(_) => enum_type.parse(value).ok_or_else(expected),
            _ => Err(expected()),
        },
        Some(NamedType::InputObject(input_type)) => {
            let ConstValue::Object(entries) = value else {
                return Err(vec![coercion_error(
                    format!("Expected type {name} to be an object"),
                    path,
                    None,
                )]);
            };

            let mut errors = vec![];
            let mut coerced = IndexMap::new();
            for field in input_type.fields.values() {
                match entries.get(field.name.as_str()) {
                    None => {
                        if let Some(default_value) = &field.default_value {
                            coerced.insert(Name::new(&field.name), default_value.clone());
                        } else if field.ty.is_non_null() {
                            path.push(PathSegment::from(field.name.as_str()));
                            errors.push(format!(
                                "Field {} of required type {} was not provided.",
                                print_path(path),
                                field.ty
                            ));
                            path.pop();
                        }
                    }
                    Some(field_value) => {
                        path.push(PathSegment::from(field.name.as_str()));
                        match coerce_value(schema, field_value, &field.ty, path) {
                            Ok(field_value) => {
                                coerced.insert(Name::new(&field.name), field_value);
                            }
                            Err(field_errors) => errors.extend(field_errors),
                        }
                        path.pop();
                    }
                }
            }

            for key in entries.keys() {
                if !input_type.fields.contains_key(key.as_str()) {
                    errors.push(coercion_error(
                        format!("Field \"{key}\" is not defined by type {name}"),
                        path,
                        None,
                    ));
                }
            }

            if errors.is_empty() {
                Ok(ConstValue::Object(coerced))
            } else {
                Err(errors)
            }
        }
        _ => Err(expected()),
    }
}

fn coercion_error(message: String, path: &[PathSegment], sub_message: Option<&str>) -> String {
    let path = print_path(path);
    let at = if path.is_empty() {
        String::new()
    } else {
        format!(" at {path}")
    };

    match sub_message {
        Some(sub_message) => format!("{message}{at}; {sub_message}"),
        None => format!("{message}{at}."),
    }
}

/// Describes where in an input value a problem was found, such as `value.items[2].name`.
fn print_path(path: &[PathSegment]) -> String {
    if path.is_empty() {
        return String::new();
    }

    path.iter().fold(String::from("value"), |mut acc, segment| {
        match segment {
            PathSegment::Key(key) => {
                acc.push('.');
                acc.push_str(key);
            }
            PathSegment::Index(index) => acc.push_str(&format!("[{index}]")),
        }
        acc
    })
}

/// Produces a coerced value from a literal in the document, or `None` if it is not valid for
/// `ty`. Variables are read from `variables`; without variables, any variable is invalid.
pub fn value_from_ast(
    schema: &Schema,
    value: &AstValue,
    ty: &TypeRef,
    variables: Option<&Variables>,
) -> Option<ConstValue> {
    if let AstValue::Variable(name) = value {
        let variable = variables?.get(name.as_str())?;
        if ty.is_non_null() && matches!(variable, ConstValue::Null) {
            return None;
        }
        return Some(variable.clone());
    }

    match ty {
        TypeRef::NonNull(of_type) => {
            if matches!(value, AstValue::Null) {
                return None;
            }
            value_from_ast(schema, value, of_type, variables)
        }
        _ if matches!(value, AstValue::Null) => Some(ConstValue::Null),
        TypeRef::List(of_type) => match value {
            AstValue::List(items) => {
                let mut coerced = Vec::with_capacity(items.len());
                for item in items {
                    if is_missing_variable(item, variables) {
                        if of_type.is_non_null() {
                            return None;
                        }
                        coerced.push(ConstValue::Null);
                    } else {
                        coerced.push(value_from_ast(schema, item, of_type, variables)?);
                    }
                }
                Some(ConstValue::List(coerced))
            }
            _ => value_from_ast(schema, value, of_type, variables)
                .map(|item| ConstValue::List(vec![item])),
        },
        TypeRef::Named(name) => match schema.get_type(name)? {
            NamedType::InputObject(input_type) => {
                let AstValue::Object(entries) = value else {
                    return None;
                };
                let mut coerced = IndexMap::new();
                for field in input_type.fields.values() {
                    match entries.get(field.name.as_str()) {
                        Some(field_value) if !is_missing_variable(field_value, variables) => {
                            let field_value =
                                value_from_ast(schema, field_value, &field.ty, variables)?;
                            coerced.insert(Name::new(&field.name), field_value);
                        }
                        _ => {
                            if let Some(default_value) = &field.default_value {
                                coerced.insert(Name::new(&field.name), default_value.clone());
                            } else if field.ty.is_non_null() {
                                return None;
                            }
                        }
                    }
                }
                Some(ConstValue::Object(coerced))
            }
            NamedType::Enum(enum_type) => match value {
                AstValue::Enum(_) => enum_type.parse(&value.clone().into_const()?),
                _ => None,
            },
            NamedType::Scalar(scalar) => scalar.parse(&value.clone().into_const()?),
            _ => None,
        },
    }
}

fn is_missing_variable(value: &AstValue, variables: Option<&Variables>) -> bool {
    match value {
        AstValue::Variable(name) => {
            variables.is_none_or(|variables| !variables.contains_key(name.as_str()))
        }
        _ => false,
    }
}

/// Coerces the arguments given to a field or directive against their definitions.
///
/// `pos` is the position of the field or directive, for errors about missing arguments.
pub fn argument_values(
    schema: &Schema,
    definitions: &IndexMap<String, InputValue>,
    arguments: &[(Positioned<Name>, Positioned<AstValue>)],
    pos: Pos,
    variables: &Variables,
) -> Result<Arguments, GraphQLError> {
    let mut coerced = Arguments::new();

    for definition in definitions.values() {
        let name = &definition.name;
        let arg_type = &definition.ty;
        let argument = arguments
            .iter()
            .find(|(arg_name, _)| arg_name.node.as_str() == name)
            .map(|(_, value)| value);

        let (has_value, is_null) = match argument.map(|value| &value.node) {
            Some(AstValue::Variable(var_name)) => {
                let variable = variables.get(var_name.as_str());
                (variable.is_some(), matches!(variable, Some(ConstValue::Null)))
            }
            Some(value) => (true, matches!(value, AstValue::Null)),
            None => (false, false),
        };

        if let (false, Some(default_value)) = (has_value, &definition.default_value) {
            coerced.insert(name.clone(), default_value.clone());
        } else if (!has_value || is_null) && arg_type.is_non_null() {
            let error = match argument {
                Some(value) if is_null => GraphQLError::with_positions(
                    format!(
                        "Argument \"{name}\" of non-null type \"{arg_type}\" must not be null."
                    ),
                    [value.pos],
                ),
                Some(Positioned {
                    node: AstValue::Variable(var_name),
                    pos,
                }) => GraphQLError::with_positions(
                    format!(
                        "Argument \"{name}\" of required type \"{arg_type}\" was provided the variable \"${var_name}\" which was not provided a runtime value."
                    ),
                    [*pos],
                ),
                _ => GraphQLError::with_positions(
                    format!(
                        "Argument \"{name}\" of required type \"{arg_type}\" was not provided."
                    ),
                    [pos],
                ),
            };
            return Err(error);
        } else if let Some(value) = argument.filter(|_| has_value) {
            let coerced_value = match &value.node {
                AstValue::Variable(var_name) => variables.get(var_name.as_str()).cloned(),
                literal => value_from_ast(schema, literal, arg_type, Some(variables)),
            }
            .ok_or_else(|| {
                GraphQLError::with_positions(
                    format!("Argument \"{name}\" has invalid value {}.", value.node),
                    [value.pos],
                )
            })?;
            coerced.insert(name.clone(), coerced_value);
        }
    }

    Ok(coerced)
}

/// The arguments of `definition` as applied in `directives`, or `None` if it is not applied.
pub fn directive_values(
    schema: &Schema,
    definition: &DirectiveDefinition,
    directives: &[Positioned<Directive>],
    variables: &Variables,
) -> Result<Option<Arguments>, GraphQLError> {
    directives
        .iter()
        .find(|directive| directive.node.name.node.as_str() == definition.name)
        .map(|directive| {
            argument_values(
                schema,
                &definition.args,
                &directive.node.arguments,
                directive.pos,
                variables,
            )
        })
        .transpose()
}
