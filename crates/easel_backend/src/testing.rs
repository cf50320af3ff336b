// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock backend implementation for testing.
//!
//! This module provides `MockBackend`, an in-memory backend that records every
//! operation and supports failure injection for testing error paths.

use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::{CacheBackend, CallContext, Error, QueryResult};

/// Recorded backend operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendOp<D> {
    /// A lookup was performed for the given identifier.
    Get(String),
    /// A result was stored.
    Store {
        /// The identifier the result was stored under.
        identifier: String,
        /// The stored result.
        result: QueryResult<D>,
        /// The requested expiry.
        ttl: Option<Duration>,
    },
    /// The backend was invalidated.
    Invalidate,
}

type FailPredicate<D> = Box<dyn Fn(&BackendOp<D>) -> bool + Send + Sync>;

/// A stored result together with the TTL it was stored with.
type Stored<D> = (QueryResult<D>, Option<Duration>);

/// A configurable mock backend for testing.
///
/// Results are kept in memory, every operation is recorded for later verification,
/// and operations can be made to fail on demand. `invalidate` drops every stored result.
/// TTLs are recorded but never enforced.
///
/// Clones share their storage, recorded operations and failure predicate, so a test can
/// hand one clone to the cache and keep another for assertions.
///
/// # Examples
///
/// ```
/// use easel_backend::testing::{BackendOp, MockBackend};
/// use easel_backend::{CacheBackend, CallContext, QueryResult};
/// # futures::executor::block_on(async {
///
/// let backend = MockBackend::<String>::new();
/// let ctx = CallContext::new();
///
/// backend.store(&ctx, "id", QueryResult::new("row".to_string(), 1), None).await.unwrap();
/// let hit = backend.get(&ctx, "id", &String::new()).await.unwrap();
/// assert_eq!(hit.unwrap().dest(), "row");
///
/// // Fail every lookup from now on
/// backend.fail_when(|op| matches!(op, BackendOp::Get(_)));
/// assert!(backend.get(&ctx, "id", &String::new()).await.is_err());
/// # });
/// ```
pub struct MockBackend<D> {
    data: Arc<Mutex<HashMap<String, Stored<D>>>>,
    operations: Arc<Mutex<Vec<BackendOp<D>>>>,
    fail_when: Arc<Mutex<Option<FailPredicate<D>>>>,
}

impl<D> std::fmt::Debug for MockBackend<D>
where
    D: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBackend")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl<D> Clone for MockBackend<D> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
        }
    }
}

impl<D> Default for MockBackend<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> MockBackend<D> {
    /// Creates a new empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Creates a mock backend pre-populated with results.
    #[must_use]
    pub fn with_data(data: impl IntoIterator<Item = (String, QueryResult<D>)>) -> Self {
        let data = data.into_iter().map(|(identifier, result)| (identifier, (result, None))).collect();
        Self {
            data: Arc::new(Mutex::new(data)),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the number of stored results.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns true if a result is stored under `identifier`.
    #[must_use]
    pub fn contains(&self, identifier: &str) -> bool {
        self.data.lock().contains_key(identifier)
    }

    /// Returns the TTL the result under `identifier` was stored with.
    ///
    /// Returns `None` both when nothing is stored and when the result has no TTL.
    #[must_use]
    pub fn ttl_of(&self, identifier: &str) -> Option<Duration> {
        self.data.lock().get(identifier).and_then(|(_, ttl)| *ttl)
    }

    /// Sets a predicate that determines which operations fail.
    ///
    /// The predicate receives the operation about to run and returns `true` if it
    /// should fail. Failed operations are still recorded.
    ///
    /// # Examples
    ///
    /// ```
    /// use easel_backend::testing::{BackendOp, MockBackend};
    ///
    /// let backend: MockBackend<String> = MockBackend::new();
    ///
    /// // Fail all operations
    /// backend.fail_when(|_| true);
    ///
    /// // Fail only stores
    /// backend.fail_when(|op| matches!(op, BackendOp::Store { .. }));
    ///
    /// // Fail lookups of one identifier
    /// backend.fail_when(|op| matches!(op, BackendOp::Get(id) if id == "bad"));
    /// ```
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&BackendOp<D>) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn should_fail(&self, op: &BackendOp<D>) -> bool {
        self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(op))
    }
}

impl<D> MockBackend<D>
where
    D: Clone,
{
    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<BackendOp<D>> {
        self.operations.lock().clone()
    }

    /// Returns the result stored under `identifier`, without recording an operation.
    #[must_use]
    pub fn peek(&self, identifier: &str) -> Option<QueryResult<D>> {
        self.data.lock().get(identifier).map(|(result, _)| result.clone())
    }

    /// Returns how many operations match the predicate.
    #[must_use]
    pub fn count(&self, predicate: impl Fn(&BackendOp<D>) -> bool) -> usize {
        self.operations.lock().iter().filter(|op| predicate(op)).count()
    }

    fn record(&self, op: BackendOp<D>) {
        self.operations.lock().push(op);
    }
}

impl<D> CacheBackend<D> for MockBackend<D>
where
    D: Clone + Send + Sync,
{
    async fn get(&self, _ctx: &CallContext, identifier: &str, _template: &D) -> Result<Option<QueryResult<D>>, Error> {
        let op = BackendOp::Get(identifier.to_owned());
        let fail = self.should_fail(&op);
        self.record(op);
        if fail {
            return Err(Error::backend("mock: get failed"));
        }
        Ok(self.peek(identifier))
    }

    async fn store(&self, _ctx: &CallContext, identifier: &str, result: QueryResult<D>, ttl: Option<Duration>) -> Result<(), Error> {
        let op = BackendOp::Store {
            identifier: identifier.to_owned(),
            result: result.clone(),
            ttl,
        };
        let fail = self.should_fail(&op);
        self.record(op);
        if fail {
            return Err(Error::backend("mock: store failed"));
        }
        self.data.lock().insert(identifier.to_owned(), (result, ttl));
        Ok(())
    }

    async fn invalidate(&self, _ctx: &CallContext) -> Result<(), Error> {
        let op = BackendOp::Invalidate;
        let fail = self.should_fail(&op);
        self.record(op);
        if fail {
            return Err(Error::backend("mock: invalidate failed"));
        }
        self.data.lock().clear();
        Ok(())
    }
}
