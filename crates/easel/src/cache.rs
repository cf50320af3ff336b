// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The query interception pipeline.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use easel_backend::{CacheBackend, CallContext, DynamicBackend, Error, QueryResult};
use tick::Clock;

use crate::builder::{Config, QueryCacheBuilder};
use crate::call::{QueryCall, Statement};
use crate::callbacks::{Callback, Callbacks, OperationKind};
use crate::easer::{Eased, Easer};
use crate::identifier::build_identifier;
use crate::telemetry::{QueryActivity, QueryOperation, QueryTelemetry, StepTimer};
use crate::transfer::{snapshot, transfer};

/// Name under which a query cache registers itself with a host.
pub const PLUGIN_NAME: &str = "easel:query-cache";

/// What a coalesced execution hands to the callers that joined it.
#[derive(Clone)]
struct Outcome<D> {
    result: QueryResult<D>,
    error: Option<Error>,
}

/// Transparent caching and coalescing in front of query execution.
///
/// A `QueryCache` decorates a host's [`Callbacks`]. Read queries are looked up in the
/// configured backend by identifier, executed on a miss (at most once at a time per
/// identifier when easing is enabled), and stored afterwards. Mutations invalidate the
/// backend before they run.
///
/// Backend failures never abort a call: they are recorded on the call with
/// [`QueryCall::add_error`] and the pipeline carries on where it safely can.
///
/// Every lookup, execution, store and invalidation is timed on the cache's [`Clock`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// use easel::{Callback, Callbacks, QueryCache, QueryCall};
/// use easel_backend::testing::MockBackend;
/// use tick::Clock;
/// # futures::executor::block_on(async {
///
/// let executions = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&executions);
/// let callbacks = Callbacks::new().with_query(Callback::new(move |call: &mut QueryCall<Vec<String>>| {
///     counter.fetch_add(1, Ordering::SeqCst);
///     Box::pin(async move {
///         *call.dest_mut() = vec!["alice".to_string()];
///         call.set_rows_affected(1);
///     })
/// }));
///
/// let cache = QueryCache::builder(Clock::new_frozen(), callbacks)
///     .backend(MockBackend::new())
///     .build();
///
/// let mut first = cache.prepare("SELECT name FROM users", Vec::new());
/// cache.query(&mut first).await;
///
/// let mut second = cache.prepare("SELECT name FROM users", Vec::new());
/// cache.query(&mut second).await;
///
/// assert_eq!(second.dest(), &["alice"]);
/// assert_eq!(executions.load(Ordering::SeqCst), 1);
/// # });
/// ```
pub struct QueryCache<D> {
    config: Config,
    callbacks: Callbacks<D>,
    backend: Option<DynamicBackend<D>>,
    easer: Easer<Outcome<D>>,
    telemetry: QueryTelemetry,
    clock: Clock,
}

impl<D> QueryCache<D> {
    /// Creates a builder that decorates `callbacks`, timing every step on `clock`.
    #[must_use]
    pub fn builder(clock: Clock, callbacks: Callbacks<D>) -> QueryCacheBuilder<D> {
        QueryCacheBuilder::new(clock, callbacks)
    }

    pub(crate) fn new(config: Config, clock: Clock, callbacks: Callbacks<D>, backend: Option<DynamicBackend<D>>) -> Self {
        Self {
            telemetry: QueryTelemetry::new(config.name),
            config,
            callbacks,
            backend,
            easer: Easer::new(),
            clock,
        }
    }

    /// Returns the name this cache registers under with a host.
    #[must_use]
    pub fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    /// Returns the resolved settings.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the clock this cache times its steps on.
    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Returns `true` if a backend is configured.
    #[must_use]
    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// Creates a call that this cache is reachable from.
    ///
    /// Cache directives applied to the returned call take effect.
    pub fn prepare(&self, statement: impl Into<Statement>, dest: D) -> QueryCall<D> {
        let mut context = CallContext::new();
        self.attach(&mut context);
        QueryCall::with_context(statement, dest, context)
    }

    /// Makes this cache reachable from `context`.
    pub fn attach(&self, context: &mut CallContext) {
        context.attach(PLUGIN_NAME);
    }
}

impl<D> QueryCache<D>
where
    D: Clone + Send + Sync + 'static,
{
    /// Serves a read query.
    ///
    /// With neither easing nor a backend configured, the query callback runs directly.
    /// Otherwise the call's identifier is derived (or taken from its directive), a cached
    /// result is returned if present, and on a miss the query is executed and the result
    /// stored. A call that joined another call's execution receives a copy of that result,
    /// or its error.
    pub async fn query(&self, call: &mut QueryCall<D>) {
        if !self.config.easing && self.backend.is_none() {
            self.telemetry
                .record(call.statement().sql(), QueryOperation::Execute, QueryActivity::Passthrough, None);
            self.callbacks.run_query(call).await;
            return;
        }

        let directive = call.directive().cloned();
        let identifier = match &directive {
            Some(directive) => directive.key().to_owned(),
            None => build_identifier(call.statement_mut(), Some(&self.config.prefix)),
        };

        if let Some(backend) = &self.backend
            && self.lookup(backend, &identifier, call).await
        {
            return;
        }

        if let Some(outcome) = self.execute(&identifier, call).await {
            if let Some(error) = outcome.error {
                call.add_error(error);
                return;
            }
            transfer(outcome.result, call);
        }

        if call.has_error() {
            return;
        }

        if let Some(backend) = &self.backend {
            let ttl = directive.and_then(|directive| directive.expiry());
            self.store(backend, &identifier, ttl, call).await;
            call.clear_directive();
        }
    }

    /// Serves a mutation of the given kind.
    ///
    /// The backend is invalidated first; a failed invalidation is recorded on the call and
    /// the mutation callback still runs.
    pub async fn mutate(&self, call: &mut QueryCall<D>, kind: OperationKind) {
        if let Some(backend) = &self.backend {
            let (result, elapsed) = self.clock.time_step(backend.invalidate(call.context())).await;
            let activity = match result {
                Ok(()) => QueryActivity::Invalidated,
                Err(error) => {
                    call.add_error(error);
                    QueryActivity::Error
                }
            };
            self.telemetry
                .record(kind.as_str(), QueryOperation::Invalidate, activity, Some(elapsed));
        }

        self.callbacks.run_mutation(kind, call).await;
    }

    /// Serves an insertion.
    pub async fn create(&self, call: &mut QueryCall<D>) {
        self.mutate(call, OperationKind::Create).await;
    }

    /// Serves an update.
    pub async fn update(&self, call: &mut QueryCall<D>) {
        self.mutate(call, OperationKind::Update).await;
    }

    /// Serves a deletion.
    pub async fn delete(&self, call: &mut QueryCall<D>) {
        self.mutate(call, OperationKind::Delete).await;
    }

    /// Returns a callback table that routes through this cache.
    ///
    /// Queries go through [`query`](Self::query) and every mutation slot goes through
    /// [`mutate`](Self::mutate), whether or not the original table had a callback there.
    #[must_use]
    pub fn install(self: &Arc<Self>) -> Callbacks<D> {
        let cache = Arc::clone(self);
        let query = Callback::new(move |call| {
            let cache = Arc::clone(&cache);
            Box::pin(async move { cache.query(call).await })
        });

        Callbacks {
            query: Some(query),
            create: Some(self.mutation_callback(OperationKind::Create)),
            update: Some(self.mutation_callback(OperationKind::Update)),
            delete: Some(self.mutation_callback(OperationKind::Delete)),
        }
    }

    fn mutation_callback(self: &Arc<Self>, kind: OperationKind) -> Callback<D> {
        let cache = Arc::clone(self);
        Callback::new(move |call| {
            let cache = Arc::clone(&cache);
            Box::pin(async move { cache.mutate(call, kind).await })
        })
    }

    /// Returns `true` on a hit, after copying the cached result onto the call.
    async fn lookup(&self, backend: &DynamicBackend<D>, identifier: &str, call: &mut QueryCall<D>) -> bool {
        let (found, elapsed) = self.clock.time_step(backend.get(call.context(), identifier, call.dest())).await;
        let elapsed = Some(elapsed);

        match found {
            Ok(Some(result)) => {
                self.telemetry.record(identifier, QueryOperation::Lookup, QueryActivity::Hit, elapsed);
                transfer(result, call);
                true
            }
            Ok(None) => {
                self.telemetry.record(identifier, QueryOperation::Lookup, QueryActivity::Miss, elapsed);
                false
            }
            Err(error) => {
                self.telemetry.record(identifier, QueryOperation::Lookup, QueryActivity::Error, elapsed);
                call.add_error(error);
                false
            }
        }
    }

    /// Runs the query, returning the outcome of another call's execution if this call
    /// joined it instead.
    async fn execute(&self, identifier: &str, call: &mut QueryCall<D>) -> Option<Outcome<D>> {
        if !self.config.easing {
            let ((), elapsed) = self.clock.time_step(self.callbacks.run_query(call)).await;
            self.telemetry
                .record(identifier, QueryOperation::Execute, QueryActivity::Led, Some(elapsed));
            return None;
        }

        let leader = &mut *call;
        let (eased, elapsed) = self
            .clock
            .time_step(self.easer.ease(identifier, move || self.run(leader)))
            .await;
        let elapsed = Some(elapsed);

        match eased {
            Eased::Led(_) => {
                self.telemetry.record(identifier, QueryOperation::Execute, QueryActivity::Led, elapsed);
                None
            }
            Eased::Joined(outcome) => {
                self.telemetry.record(identifier, QueryOperation::Execute, QueryActivity::Joined, elapsed);
                Some(outcome)
            }
        }
    }

    async fn run(&self, call: &mut QueryCall<D>) -> Outcome<D> {
        let before = call.errors().len();
        self.callbacks.run_query(call).await;

        // Only errors raised by this execution are handed to joined calls.
        let error = call.errors().get(before..).and_then(<[Error]>::last).cloned();
        Outcome {
            result: snapshot(call),
            error,
        }
    }

    async fn store(&self, backend: &DynamicBackend<D>, identifier: &str, ttl: Option<Duration>, call: &mut QueryCall<D>) {
        let (stored, elapsed) = self
            .clock
            .time_step(backend.store(call.context(), identifier, snapshot(call), ttl))
            .await;
        let activity = match stored {
            Ok(()) => QueryActivity::Stored,
            Err(error) => {
                call.add_error(error);
                QueryActivity::Error
            }
        };
        self.telemetry.record(identifier, QueryOperation::Store, activity, Some(elapsed));
    }
}

impl<D> fmt::Debug for QueryCache<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("config", &self.config)
            .field("callbacks", &self.callbacks)
            .field("backend", &self.backend)
            .field("easer", &self.easer)
            .field("clock", &self.clock)
            .finish()
    }
}
