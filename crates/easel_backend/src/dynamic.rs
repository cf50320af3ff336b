// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared, type-erased handles to cache backends.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::DynCacheBackend;
use crate::{CacheBackend, CallContext, Error, QueryResult};

/// Turns a concrete backend into a [`DynamicBackend`] handle.
///
/// Blanket-implemented for every `'static` [`CacheBackend`].
///
/// # Examples
///
/// ```
/// use easel_backend::{CacheBackend, DynamicBackend, DynamicBackendExt};
///
/// fn erase<B>(backend: B) -> DynamicBackend<Vec<String>>
/// where
///     B: CacheBackend<Vec<String>> + 'static,
/// {
///     backend.into_dynamic()
/// }
/// ```
pub trait DynamicBackendExt<D>: Sized {
    /// Wraps this backend in a shared handle.
    fn into_dynamic(self) -> DynamicBackend<D>;
}

impl<D, B> DynamicBackendExt<D> for B
where
    B: CacheBackend<D> + 'static,
{
    fn into_dynamic(self) -> DynamicBackend<D> {
        DynamicBackend::new(self)
    }
}

/// Handle to a query-result store whose concrete type has been erased.
///
/// A query cache holds its backend through this handle, so it is not generic over the
/// store it talks to. Clones point at the same store: several caches built from clones of
/// one handle read each other's results and see each other's invalidations.
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "test-util")]
/// # futures::executor::block_on(async {
/// use easel_backend::testing::MockBackend;
/// use easel_backend::{CacheBackend, CallContext, DynamicBackend, QueryResult};
///
/// let reads = DynamicBackend::new(MockBackend::new());
/// let writes = reads.clone();
/// let ctx = CallContext::new();
///
/// writes.store(&ctx, "users:all", QueryResult::new(vec!["ana".to_string()], 1), None).await?;
/// assert!(reads.get(&ctx, "users:all", &Vec::new()).await?.is_some());
/// assert!(reads.shares_store_with(&writes));
/// # Ok::<(), easel_backend::Error>(())
/// # }).unwrap();
/// ```
pub struct DynamicBackend<D>(Arc<DynCacheBackend<'static, D>>);

impl<D> DynamicBackend<D> {
    /// Erases the type of `backend`.
    pub fn new<B>(backend: B) -> Self
    where
        B: CacheBackend<D> + Send + Sync + 'static,
    {
        Self(DynCacheBackend::new_arc(backend))
    }

    /// Returns `true` if both handles talk to the same store.
    #[must_use]
    pub fn shares_store_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<D> fmt::Debug for DynamicBackend<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicBackend")
            .field("handles", &Arc::strong_count(&self.0))
            .finish_non_exhaustive()
    }
}

impl<D> Clone for DynamicBackend<D> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<D> CacheBackend<D> for DynamicBackend<D>
where
    D: Send + Sync,
{
    async fn get(&self, ctx: &CallContext, identifier: &str, template: &D) -> Result<Option<QueryResult<D>>, Error> {
        self.0.get(ctx, identifier, template).await
    }

    async fn store(&self, ctx: &CallContext, identifier: &str, result: QueryResult<D>, ttl: Option<Duration>) -> Result<(), Error> {
        self.0.store(ctx, identifier, result, ttl).await
    }

    async fn invalidate(&self, ctx: &CallContext) -> Result<(), Error> {
        self.0.invalidate(ctx).await
    }
}
