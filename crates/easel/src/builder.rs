// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder and resolved settings for [`QueryCache`].

use std::fmt;

use easel_backend::{CacheBackend, DynamicBackend};
use tick::Clock;

use crate::cache::{PLUGIN_NAME, QueryCache};
use crate::callbacks::Callbacks;
use crate::identifier::IDENTIFIER_PREFIX;

/// Resolved settings of a [`QueryCache`].
///
/// # Examples
///
/// ```
/// use easel::{Config, IDENTIFIER_PREFIX};
///
/// let config = Config::default();
/// assert!(!config.easing);
/// assert_eq!(config.prefix, IDENTIFIER_PREFIX);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Whether identical concurrent queries are coalesced into one execution.
    pub easing: bool,
    /// Prefix of every derived identifier.
    pub prefix: String,
    /// Name reported in telemetry.
    pub name: &'static str,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            easing: false,
            prefix: IDENTIFIER_PREFIX.to_owned(),
            name: PLUGIN_NAME,
        }
    }
}

/// Builder for [`QueryCache`].
///
/// Created by [`QueryCache::builder`]. Easing is off, no backend is configured and the
/// default identifier prefix is used unless set otherwise.
///
/// # Examples
///
/// ```
/// use easel::{Callbacks, QueryCache};
/// use easel_backend::testing::MockBackend;
/// use tick::Clock;
///
/// let cache = QueryCache::<Vec<u64>>::builder(Clock::new_frozen(), Callbacks::new())
///     .easing(true)
///     .backend(MockBackend::new())
///     .prefix("app::")
///     .build();
///
/// assert!(cache.config().easing);
/// assert_eq!(cache.config().prefix, "app::");
/// assert!(cache.has_backend());
/// ```
pub struct QueryCacheBuilder<D> {
    clock: Clock,
    callbacks: Callbacks<D>,
    backend: Option<DynamicBackend<D>>,
    config: Config,
}

impl<D> QueryCacheBuilder<D> {
    pub(crate) fn new(clock: Clock, callbacks: Callbacks<D>) -> Self {
        Self {
            clock,
            callbacks,
            backend: None,
            config: Config::default(),
        }
    }

    /// Enables or disables coalescing of identical concurrent queries.
    #[must_use]
    pub fn easing(mut self, enabled: bool) -> Self {
        self.config.easing = enabled;
        self
    }

    /// Sets the cache backend.
    #[must_use]
    pub fn backend<B>(mut self, backend: B) -> Self
    where
        B: CacheBackend<D> + 'static,
    {
        self.backend = Some(DynamicBackend::new(backend));
        self
    }

    /// Sets an already type-erased cache backend.
    #[must_use]
    pub fn dynamic_backend(mut self, backend: DynamicBackend<D>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Sets the identifier prefix. An empty prefix keeps the default.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.config.prefix = if prefix.is_empty() { IDENTIFIER_PREFIX.to_owned() } else { prefix };
        self
    }

    /// Sets the name reported in telemetry.
    #[must_use]
    pub fn name(mut self, name: &'static str) -> Self {
        self.config.name = name;
        self
    }

    /// Builds the cache.
    #[must_use]
    pub fn build(self) -> QueryCache<D> {
        QueryCache::new(self.config, self.clock, self.callbacks, self.backend)
    }
}

impl<D> fmt::Debug for QueryCacheBuilder<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCacheBuilder")
            .field("callbacks", &self.callbacks)
            .field("backend", &self.backend)
            .field("config", &self.config)
            .field("clock", &self.clock)
            .finish()
    }
}
