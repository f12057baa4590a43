// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The execution engine: from a parsed document and a schema to a response.

mod collect;
mod complete;
mod context;
mod operation;
mod resolve;
mod response;

pub use collect::{FieldsMap, collect_fields, does_fragment_condition_match, should_include};
pub use complete::{Completion, complete_value};
pub use context::{ContextError, ExecutionArgs, ExecutionContext, build_execution_context};
pub use operation::{execute_fields, execute_fields_serially, execute_operation};
pub use resolve::{
    ResolveInfo, ResolverContext, build_resolve_info, default_field_resolver, get_field_def,
    resolve_field, resolve_field_value_or_error,
};
pub use response::{Response, execute};
