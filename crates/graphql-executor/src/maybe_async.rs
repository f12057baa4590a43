// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{fmt, future::Future};

use futures::{FutureExt, future::BoxFuture};

/// A value that is either available now or will be produced by a future.
///
/// Execution stays synchronous for as long as every resolver answers synchronously; only when a
/// [`MaybeAsync::Pending`] value shows up do we allocate futures to wait on it.
pub enum MaybeAsync<'a, T> {
    Ready(T),
    Pending(BoxFuture<'a, T>),
}

impl<'a, T> MaybeAsync<'a, T>
where
    T: Send + 'a,
{
    pub fn ready(value: T) -> Self {
        MaybeAsync::Ready(value)
    }

    pub fn pending(future: impl Future<Output = T> + Send + 'a) -> Self {
        MaybeAsync::Pending(future.boxed())
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, MaybeAsync::Ready(_))
    }

    /// Returns the value if it is already available, or gives back `self` otherwise.
    pub fn into_ready(self) -> Result<T, Self> {
        match self {
            MaybeAsync::Ready(value) => Ok(value),
            pending => Err(pending),
        }
    }

    pub fn map<U, F>(self, f: F) -> MaybeAsync<'a, U>
    where
        U: Send + 'a,
        F: FnOnce(T) -> U + Send + 'a,
    {
        match self {
            MaybeAsync::Ready(value) => MaybeAsync::Ready(f(value)),
            MaybeAsync::Pending(future) => MaybeAsync::pending(future.map(f)),
        }
    }

    /// Chains another (possibly pending) computation on the settled value.
    pub fn and_then<U, F>(self, f: F) -> MaybeAsync<'a, U>
    where
        U: Send + 'a,
        F: FnOnce(T) -> MaybeAsync<'a, U> + Send + 'a,
    {
        match self {
            MaybeAsync::Ready(value) => f(value),
            MaybeAsync::Pending(future) => {
                MaybeAsync::pending(async move { f(future.await).resolve().await })
            }
        }
    }

    /// Waits for the value.
    pub async fn resolve(self) -> T {
        match self {
            MaybeAsync::Ready(value) => value,
            MaybeAsync::Pending(future) => future.await,
        }
    }

    /// Joins independently started computations, preserving their order.
    ///
    /// If every item is ready, so is the result.
    pub fn join_all(items: Vec<MaybeAsync<'a, T>>) -> MaybeAsync<'a, Vec<T>> {
        if items.iter().all(MaybeAsync::is_ready) {
            return MaybeAsync::Ready(
                items
                    .into_iter()
                    .filter_map(|item| item.into_ready().ok())
                    .collect(),
            );
        }

        MaybeAsync::pending(futures::future::join_all(
            items.into_iter().map(MaybeAsync::resolve),
        ))
    }
}

impl<T> fmt::Debug for MaybeAsync<'_, T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaybeAsync::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            MaybeAsync::Pending(_) => f.write_str("Pending"),
        }
    }
}
