// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use crate::call::QueryCall;
use crate::cache::PLUGIN_NAME;

/// A per-call instruction to cache under a fixed identifier.
///
/// When a call carries a directive, its key is used verbatim as the cache identifier and its
/// TTL is passed to the backend when the result is stored. The directive is cleared once the
/// store has been attempted.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use easel::{Callbacks, QueryCache, cache_for};
/// use tick::Clock;
///
/// let cache = QueryCache::<Vec<String>>::builder(Clock::new_frozen(), Callbacks::new()).build();
///
/// let call = cache
///     .prepare("SELECT * FROM users", Vec::new())
///     .scope(cache_for("users:all", Duration::from_secs(10)));
/// assert_eq!(call.directive().map(|d| d.key()), Some("users:all"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheDirective {
    key: String,
    ttl: Option<Duration>,
}

impl CacheDirective {
    /// Creates a directive with the given key and no expiry.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into(), ttl: None }
    }

    /// Sets the expiry passed to the backend.
    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Returns the identifier this directive forces.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the expiry passed to the backend, if any.
    #[must_use]
    pub fn expiry(&self) -> Option<Duration> {
        self.ttl
    }

    /// Attaches this directive to `call`.
    ///
    /// Has no effect unless a query cache is attached to the call's context, as is the
    /// case for calls created with [`QueryCache::prepare`](crate::QueryCache::prepare).
    /// Returns whether the directive was attached.
    pub fn apply<D>(self, call: &mut QueryCall<D>) -> bool {
        if !call.context().is_attached(PLUGIN_NAME) {
            return false;
        }
        call.set_directive(self);
        true
    }
}

/// Creates a directive that caches under `key` with no expiry.
#[must_use]
pub fn cache(key: impl Into<String>) -> CacheDirective {
    CacheDirective::new(key)
}

/// Creates a directive that caches under `key` for `ttl`.
#[must_use]
pub fn cache_for(key: impl Into<String>, ttl: Duration) -> CacheDirective {
    CacheDirective::new(key).ttl(ttl)
}

#[cfg(test)]
mod tests {
    use easel_backend::CallContext;

    use super::*;

    #[test]
    fn detached_call_ignores_directive() {
        let mut call = QueryCall::new("q", ());
        assert!(!cache_for("xxx", Duration::from_secs(10)).apply(&mut call));
        assert!(call.directive().is_none());
    }

    #[test]
    fn attached_call_takes_directive() {
        let mut context = CallContext::new();
        context.attach(PLUGIN_NAME);
        let call = QueryCall::with_context("q", (), context).scope(cache("key"));

        let directive = call.directive().expect("directive attached");
        assert_eq!(directive.key(), "key");
        assert_eq!(directive.expiry(), None);
    }

    #[test]
    fn other_instances_do_not_count() {
        let mut context = CallContext::new();
        context.attach("some:other-plugin");
        let call = QueryCall::with_context("q", (), context).scope(cache("key"));
        assert!(call.directive().is_none());
    }

    #[test]
    fn cache_for_sets_ttl() {
        let directive = cache_for("k", Duration::from_millis(250));
        assert_eq!(directive.expiry(), Some(Duration::from_millis(250)));
        assert_eq!(directive, CacheDirective::new("k").ttl(Duration::from_millis(250)));
    }
}
