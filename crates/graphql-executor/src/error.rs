// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_graphql_parser::{Pos, Positioned, types::Field};
use serde::Serialize;
use thiserror::Error;

use crate::path::{Path, PathSegment};

/// A source position reported with an error (1-based, like [`Pos`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl From<Pos> for Location {
    fn from(pos: Pos) -> Self {
        Self {
            line: pos.line,
            column: pos.column,
        }
    }
}

/// An error as it appears in the `errors` entry of a response.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{message}")]
pub struct GraphQLError {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,
}

impl GraphQLError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: vec![],
            path: None,
        }
    }

    pub fn with_positions(
        message: impl Into<String>,
        positions: impl IntoIterator<Item = Pos>,
    ) -> Self {
        Self {
            message: message.into(),
            locations: positions.into_iter().map(Location::from).collect(),
            path: None,
        }
    }

    pub fn at_field_nodes(message: impl Into<String>, field_nodes: &[&Positioned<Field>]) -> Self {
        Self::with_positions(message, field_nodes.iter().map(|node| node.pos))
    }

    /// Attach the source locations of `field_nodes` and the response `path`.
    ///
    /// An error that already carries a path was located deeper in the tree and is returned
    /// unchanged, so that a failure bubbling through non-null ancestors keeps its original
    /// position.
    pub fn locate(self, field_nodes: &[&Positioned<Field>], path: &Path) -> Self {
        if self.path.is_some() {
            return self;
        }

        let locations = if self.locations.is_empty() {
            field_nodes
                .iter()
                .map(|node| Location::from(node.pos))
                .collect()
        } else {
            self.locations
        };

        Self {
            message: self.message,
            locations,
            path: Some(path.to_vec()),
        }
    }

    pub fn is_located(&self) -> bool {
        self.path.is_some()
    }
}

/// An error raised by a resolver (or any other user-supplied hook) while producing a value.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct FieldError {
    message: String,
}

impl FieldError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Wraps any displayable error (for example an I/O or database error).
    pub fn from_error(error: impl std::fmt::Display) -> Self {
        Self::new(error.to_string())
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for FieldError {
    fn from(message: &str) -> Self {
        FieldError::new(message)
    }
}

impl From<String> for FieldError {
    fn from(message: String) -> Self {
        FieldError::new(message)
    }
}

impl From<FieldError> for GraphQLError {
    fn from(error: FieldError) -> Self {
        GraphQLError::new(error.message)
    }
}

/// Misuse of the executor. These are never turned into a response.
#[derive(Error, Debug, PartialEq)]
pub enum ExecutionError {
    #[error(
        "Variables must be provided as an Object where each property is a variable value. Perhaps look to see if an unparsed JSON string was provided."
    )]
    VariablesNotAnObject,
}
