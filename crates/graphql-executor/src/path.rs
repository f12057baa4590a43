// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{fmt, sync::Arc};

use serde::Serialize;

/// A single key in a response path: either an object key or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{key}"),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

#[derive(Debug)]
struct PathNode {
    prev: Path,
    key: PathSegment,
}

/// Position of a value in the response tree.
///
/// Paths are immutable, backward-linked chains. Appending allocates a new tail node pointing at
/// the existing chain, so sibling fields (and list items) share their common prefix.
#[derive(Debug, Clone, Default)]
pub struct Path(Option<Arc<PathNode>>);

impl Path {
    /// The path of the response root (no segments).
    pub fn root() -> Self {
        Self(None)
    }

    pub fn append(&self, key: impl Into<PathSegment>) -> Self {
        Self(Some(Arc::new(PathNode {
            prev: self.clone(),
            key: key.into(),
        })))
    }

    pub fn is_root(&self) -> bool {
        self.0.is_none()
    }

    /// The last segment, if any.
    pub fn key(&self) -> Option<&PathSegment> {
        self.0.as_ref().map(|node| &node.key)
    }

    pub fn prev(&self) -> Option<&Path> {
        self.0.as_ref().map(|node| &node.prev)
    }

    /// Segments ordered from the response root to this position.
    pub fn to_vec(&self) -> Vec<PathSegment> {
        let mut segments = vec![];
        let mut current = self;

        while let Some(node) = &current.0 {
            segments.push(node.key.clone());
            current = &node.prev;
        }

        segments.reverse();
        segments
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let segments = self
            .to_vec()
            .iter()
            .map(|segment| segment.to_string())
            .collect::<Vec<_>>();
        write!(f, "{}", segments.join("."))
    }
}
