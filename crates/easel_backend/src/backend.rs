// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The contract every cache backend implements.
//!
//! [`CacheBackend`] is intentionally small: the query cache only ever looks results up by
//! identifier, stores fresh results, and invalidates everything after a write. Retention,
//! eviction and cross-process coherency are entirely up to the implementation.

use std::time::Duration;

use crate::{CallContext, Error, QueryResult};

/// Trait for cache backend implementations.
///
/// All three operations receive the [`CallContext`] of the query call being served, so
/// implementations can honor cancellation and deadlines.
///
/// Invalidation is deliberately broad: a write invalidates the whole backend (or whatever
/// scope the backend associates with the call), not a single identifier.
#[dynosaur::dynosaur(pub(crate) DynCacheBackend = dyn(box) CacheBackend, bridge(none))]
pub trait CacheBackend<D>: Send + Sync {
    /// Looks up the result stored under `identifier`.
    ///
    /// `template` is the destination buffer of the call being served; backends that decode
    /// stored bytes can use it as a shape hint. Returns `Ok(None)` on a miss.
    fn get(
        &self,
        ctx: &CallContext,
        identifier: &str,
        template: &D,
    ) -> impl Future<Output = Result<Option<QueryResult<D>>, Error>> + Send;

    /// Stores `result` under `identifier`, optionally expiring after `ttl`.
    fn store(
        &self,
        ctx: &CallContext,
        identifier: &str,
        result: QueryResult<D>,
        ttl: Option<Duration>,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// Invalidates cached results after a write.
    fn invalidate(&self, ctx: &CallContext) -> impl Future<Output = Result<(), Error>> + Send;
}
