// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Executes GraphQL operations against a schema of resolver-backed types.
//!
//! ```ignore
//! let schema = Schema::build(query_type).finish()?;
//! let document = async_graphql_parser::parse_query("{ hello }")?;
//! let response = execute(ExecutionArgs::new(&schema, &document)).await?;
//! ```

pub mod config;
pub mod error;
pub mod execution;
pub mod maybe_async;
pub mod path;
pub mod schema;
pub mod value;
pub mod values;

pub use config::ExecutorConfig;
pub use error::{ExecutionError, FieldError, GraphQLError, Location};
pub use execution::{ExecutionArgs, ResolveInfo, ResolverContext, Response, execute};
pub use maybe_async::MaybeAsync;
pub use path::{Path, PathSegment};
pub use schema::{Schema, SchemaBuilder, SchemaError};
pub use value::{ContextValue, Deferred, Resolution, Value};
