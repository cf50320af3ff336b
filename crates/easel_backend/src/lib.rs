// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Backend contract for the `easel` query-result cache.
//!
//! This crate defines the [`CacheBackend`] trait that every cache backend must satisfy,
//! along with [`QueryResult`] for the cached (destination, row count) pair, [`CallContext`]
//! for the ambient cancellation/deadline context of a query call, and the shared [`Error`]
//! type.
//!
//! # Overview
//!
//! The query cache never looks inside a backend: it asks for a result by identifier, hands
//! over fresh results to store, and asks for invalidation after writes. Implement
//! [`CacheBackend`] for your storage (an in-process map, Redis, memcached, ...) and plug it
//! into `easel`.
//!
//! # Implementing a Backend
//!
//! ```
//! use easel_backend::{CacheBackend, CallContext, Error, QueryResult};
//! use std::collections::HashMap;
//! use std::sync::RwLock;
//! use std::time::Duration;
//!
//! struct SimpleBackend<D>(RwLock<HashMap<String, QueryResult<D>>>);
//!
//! impl<D> CacheBackend<D> for SimpleBackend<D>
//! where
//!     D: Clone + Send + Sync,
//! {
//!     async fn get(&self, _ctx: &CallContext, identifier: &str, _template: &D) -> Result<Option<QueryResult<D>>, Error> {
//!         Ok(self.0.read().unwrap().get(identifier).cloned())
//!     }
//!
//!     async fn store(&self, _ctx: &CallContext, identifier: &str, result: QueryResult<D>, _ttl: Option<Duration>) -> Result<(), Error> {
//!         self.0.write().unwrap().insert(identifier.to_owned(), result);
//!         Ok(())
//!     }
//!
//!     async fn invalidate(&self, _ctx: &CallContext) -> Result<(), Error> {
//!         self.0.write().unwrap().clear();
//!         Ok(())
//!     }
//! }
//! ```
//!
//! # Dynamic Dispatch
//!
//! [`DynamicBackend`] wraps any `CacheBackend` in a cloneable, type-erased handle. The
//! query cache stores its backend this way.

mod backend;
mod context;
mod dynamic;
pub mod error;
mod result;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[doc(inline)]
pub use backend::CacheBackend;
#[doc(inline)]
pub use context::CallContext;
#[doc(inline)]
pub use dynamic::{DynamicBackend, DynamicBackendExt};
#[doc(inline)]
pub use error::{Error, ErrorKind, Result};
#[doc(inline)]
pub use result::QueryResult;
