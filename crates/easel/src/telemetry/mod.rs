// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Query-cache telemetry.
//!
//! When the `logs` feature is enabled, every lookup, execution, store and invalidation
//! emits a structured `query.event` record through `tracing`. Without the feature,
//! recording compiles to nothing.

use std::time::Duration;

#[cfg(any(feature = "logs", test))]
use tracing::Level;

#[cfg(test)]
pub(crate) mod attributes;
#[cfg(test)]
pub(crate) mod testing;
mod timing;

pub(crate) use timing::StepTimer;

/// Records query-cache activity for one cache instance.
#[derive(Clone, Debug)]
pub(crate) struct QueryTelemetry {
    cache_name: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum QueryOperation {
    Lookup,
    Execute,
    Store,
    Invalidate,
}

impl QueryOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lookup => "query.lookup",
            Self::Execute => "query.execute",
            Self::Store => "query.store",
            Self::Invalidate => "query.invalidate",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum QueryActivity {
    Hit,
    Miss,
    Led,
    Joined,
    Stored,
    Invalidated,
    Passthrough,
    Error,
}

impl QueryActivity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "query.hit",
            Self::Miss => "query.miss",
            Self::Led => "query.led",
            Self::Joined => "query.joined",
            Self::Stored => "query.stored",
            Self::Invalidated => "query.invalidated",
            Self::Passthrough => "query.passthrough",
            Self::Error => "query.error",
        }
    }

    #[cfg(any(feature = "logs", test))]
    pub fn level(self) -> Level {
        match self {
            Self::Hit | Self::Miss | Self::Led | Self::Passthrough => Level::DEBUG,
            Self::Joined | Self::Stored | Self::Invalidated => Level::INFO,
            Self::Error => Level::ERROR,
        }
    }
}

impl QueryTelemetry {
    pub(crate) fn new(cache_name: &'static str) -> Self {
        Self { cache_name }
    }

    #[inline]
    pub(crate) fn record(&self, identifier: &str, operation: QueryOperation, activity: QueryActivity, duration: Option<Duration>) {
        #[cfg(any(feature = "logs", test))]
        Self::emit(self.cache_name, identifier, operation, activity, duration);

        #[cfg(not(any(feature = "logs", test)))]
        let _ = (self.cache_name, identifier, operation, activity, duration);
    }

    #[cfg(any(feature = "logs", test))]
    fn emit(cache_name: &'static str, identifier: &str, operation: QueryOperation, activity: QueryActivity, duration: Option<Duration>) {
        let op = operation.as_str();
        let act = activity.as_str();
        let duration_ns = duration.map(|d| d.as_nanos());

        // Tracing levels must be constant. Field names must match attributes.rs.
        macro_rules! emit_event {
            ($level:ident) => {
                tracing::$level!(
                    query.cache = cache_name,
                    query.identifier = identifier,
                    query.operation = op,
                    query.activity = act,
                    query.duration_ns = ?duration_ns,
                    "query.event"
                )
            };
        }

        match activity.level() {
            Level::ERROR => emit_event!(error),
            Level::INFO => emit_event!(info),
            _ => emit_event!(debug),
        }
    }
}
