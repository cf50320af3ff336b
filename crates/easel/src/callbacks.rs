// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Execution callbacks invoked for queries and mutations.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::call::QueryCall;

type CallbackFn<D> = dyn for<'a> Fn(&'a mut QueryCall<D>) -> BoxFuture<'a, ()> + Send + Sync;

/// An async execution handle for one kind of operation.
///
/// The callback performs the actual work for a call: it reads the call's statement, fills
/// in the destination and row count, and records any failure with
/// [`QueryCall::add_error`].
///
/// # Examples
///
/// ```
/// use easel::{Callback, QueryCall};
/// # futures::executor::block_on(async {
///
/// let callback = Callback::new(|call: &mut QueryCall<Vec<u32>>| {
///     Box::pin(async move {
///         call.dest_mut().push(1);
///         call.set_rows_affected(1);
///     })
/// });
///
/// let mut call = QueryCall::new("SELECT 1", Vec::new());
/// callback.call(&mut call).await;
/// assert_eq!(call.dest(), &[1]);
/// # });
/// ```
pub struct Callback<D>(Arc<CallbackFn<D>>);

impl<D> Callback<D> {
    /// Wraps an async function as a callback.
    pub fn new<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a mut QueryCall<D>) -> BoxFuture<'a, ()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invokes the callback on `call`.
    pub async fn call(&self, call: &mut QueryCall<D>) {
        (self.0)(call).await;
    }
}

impl<D> Clone for Callback<D> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<D> fmt::Debug for Callback<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback")
    }
}

/// The kind of mutation being performed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// A row insertion.
    Create,
    /// A row update.
    Update,
    /// A row deletion.
    Delete,
}

impl OperationKind {
    /// Returns a stable, lowercase name for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// The table of execution callbacks a host routes calls through.
///
/// Every slot is optional; running an absent slot does nothing.
pub struct Callbacks<D> {
    /// Runs read queries.
    pub query: Option<Callback<D>>,
    /// Runs insertions.
    pub create: Option<Callback<D>>,
    /// Runs updates.
    pub update: Option<Callback<D>>,
    /// Runs deletions.
    pub delete: Option<Callback<D>>,
}

impl<D> Callbacks<D> {
    /// Creates a table with every slot empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the query callback.
    #[must_use]
    pub fn with_query(mut self, callback: Callback<D>) -> Self {
        self.query = Some(callback);
        self
    }

    /// Sets the callback for the given mutation kind.
    #[must_use]
    pub fn with_mutation(mut self, kind: OperationKind, callback: Callback<D>) -> Self {
        *self.mutation_slot(kind) = Some(callback);
        self
    }

    /// Returns the callback registered for the given mutation kind.
    #[must_use]
    pub fn mutation(&self, kind: OperationKind) -> Option<&Callback<D>> {
        match kind {
            OperationKind::Create => self.create.as_ref(),
            OperationKind::Update => self.update.as_ref(),
            OperationKind::Delete => self.delete.as_ref(),
        }
    }

    /// Runs the query callback on `call`, if one is registered.
    pub async fn run_query(&self, call: &mut QueryCall<D>) {
        if let Some(callback) = &self.query {
            callback.call(call).await;
        }
    }

    /// Runs the mutation callback for `kind` on `call`, if one is registered.
    pub async fn run_mutation(&self, kind: OperationKind, call: &mut QueryCall<D>) {
        if let Some(callback) = self.mutation(kind) {
            callback.call(call).await;
        }
    }

    fn mutation_slot(&mut self, kind: OperationKind) -> &mut Option<Callback<D>> {
        match kind {
            OperationKind::Create => &mut self.create,
            OperationKind::Update => &mut self.update,
            OperationKind::Delete => &mut self.delete,
        }
    }
}

impl<D> Default for Callbacks<D> {
    fn default() -> Self {
        Self {
            query: None,
            create: None,
            update: None,
            delete: None,
        }
    }
}

impl<D> Clone for Callbacks<D> {
    fn clone(&self) -> Self {
        Self {
            query: self.query.clone(),
            create: self.create.clone(),
            update: self.update.clone(),
            delete: self.delete.clone(),
        }
    }
}

impl<D> fmt::Debug for Callbacks<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("query", &self.query.is_some())
            .field("create", &self.create.is_some())
            .field("update", &self.update.is_some())
            .field("delete", &self.delete.is_some())
            .finish()
    }
}
