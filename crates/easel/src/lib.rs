// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Transparent query-result caching with coalescing of identical in-flight queries.
//!
//! This crate sits between a data-access layer and its query executor:
//! - Read queries are served from a pluggable [`CacheBackend`] when possible
//! - Identical concurrent queries are executed once and the result is shared ("easing")
//! - Writes invalidate the backend before they run
//! - Per-call [directives](CacheDirective) force a specific identifier and expiry
//!
//! # Examples
//!
//! ## Decorating a Callback Table
//!
//! ```
//! use std::sync::Arc;
//!
//! use easel::{Callback, Callbacks, QueryCache, QueryCall};
//! use easel_backend::testing::MockBackend;
//! use tick::Clock;
//! # futures::executor::block_on(async {
//!
//! let original = Callbacks::new().with_query(Callback::new(|call: &mut QueryCall<Vec<u64>>| {
//!     Box::pin(async move {
//!         call.dest_mut().extend([1, 2, 3]);
//!         call.set_rows_affected(3);
//!     })
//! }));
//!
//! let cache = Arc::new(
//!     QueryCache::builder(Clock::new_frozen(), original)
//!         .easing(true)
//!         .backend(MockBackend::new())
//!         .build(),
//! );
//! let callbacks = cache.install();
//!
//! let mut call = cache.prepare("SELECT id FROM orders", Vec::new());
//! callbacks.run_query(&mut call).await;
//! assert_eq!(call.dest(), &[1, 2, 3]);
//! # });
//! ```
//!
//! ## Identifiers
//!
//! A query's identifier is its text and bound arguments rendered canonically, so equal
//! queries share a cache entry regardless of map iteration order:
//!
//! ```
//! use std::collections::HashMap;
//!
//! use easel::{Statement, build_identifier};
//!
//! let filter = HashMap::from([("status", "open"), ("owner", "ana")]);
//! let mut statement = Statement::new("SELECT * FROM tickets WHERE ?").bind(filter);
//! assert_eq!(
//!     build_identifier(&mut statement, None),
//!     r#"easel::SELECT * FROM tickets WHERE ?-[{"owner": "ana", "status": "open"}]"#
//! );
//! ```
//!
//! # Time
//!
//! Every pipeline step is timed on the [`tick::Clock`] given to [`QueryCache::builder`].
//! Services pass a runtime-driven clock such as `Clock::new_tokio()`; tests pass
//! `Clock::new_frozen()` or a `ClockControl` clock.
//!
//! # Features
//!
//! - `logs` (default): emit structured `query.event` records through `tracing`.
//! - `test-util`: enables the mock backend and controllable clocks for tests.

mod builder;
mod cache;
mod call;
mod callbacks;
mod directive;
mod easer;
mod identifier;
mod telemetry;
mod transfer;
mod value;

#[doc(inline)]
pub use builder::{Config, QueryCacheBuilder};
#[doc(inline)]
pub use cache::{PLUGIN_NAME, QueryCache};
#[doc(inline)]
pub use call::{QueryCall, Statement};
#[doc(inline)]
pub use callbacks::{Callback, Callbacks, OperationKind};
#[doc(inline)]
pub use directive::{CacheDirective, cache, cache_for};
#[doc(inline)]
pub use easel_backend::{CacheBackend, CallContext, DynamicBackend, DynamicBackendExt, Error, ErrorKind, QueryResult, Result};
#[doc(inline)]
pub use easer::{Eased, Easer};
#[doc(inline)]
pub use identifier::{IDENTIFIER_PREFIX, build_identifier};
#[doc(inline)]
pub use value::{ABSENT, Scalar, ToValue, Value};
