// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Ambient context carried by every query call.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tick::Clock;

/// Ambient context of a query call.
///
/// The context is handed to every cache backend operation so that backends can honor
/// cancellation and deadlines. It also records which query-cache instances are reachable
/// from the call, which is how per-call directives discover whether they apply.
///
/// Deadlines are measured against the [`Clock`] they were set with. Cloned contexts share
/// their cancellation flag: cancelling one cancels all clones.
///
/// # Examples
///
/// ```
/// use easel_backend::CallContext;
/// use std::time::Duration;
/// use tick::Clock;
///
/// let clock = Clock::new_frozen();
/// let ctx = CallContext::new().with_timeout(&clock, Duration::from_secs(5));
/// let observer = ctx.clone();
///
/// assert_eq!(observer.remaining(), Some(Duration::from_secs(5)));
/// ctx.cancel();
/// assert!(observer.is_cancelled());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Deadline>,
    instances: Vec<&'static str>,
}

#[derive(Clone, Debug)]
struct Deadline {
    clock: Clock,
    at: Instant,
}

impl CallContext {
    /// Creates a context without deadline, not cancelled, with no attached instances.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an absolute deadline on `clock`.
    #[must_use]
    pub fn with_deadline(mut self, clock: &Clock, deadline: Instant) -> Self {
        self.deadline = Some(Deadline {
            clock: clock.clone(),
            at: deadline,
        });
        self
    }

    /// Sets a deadline `timeout` after the current instant of `clock`.
    ///
    /// A timeout too large to be represented as an instant leaves the call without a
    /// deadline.
    #[must_use]
    pub fn with_timeout(mut self, clock: &Clock, timeout: Duration) -> Self {
        match clock.instant().checked_add(timeout) {
            Some(deadline) => self.with_deadline(clock, deadline),
            None => {
                self.deadline = None;
                self
            }
        }
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline.as_ref().map(|deadline| deadline.at)
    }

    /// Returns the time left until the deadline.
    ///
    /// Returns `None` when no deadline is set and `Some(Duration::ZERO)` once it has passed.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .as_ref()
            .map(|deadline| deadline.at.saturating_duration_since(deadline.clock.instant()))
    }

    /// Returns `true` once the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining().is_some_and(|left| left.is_zero())
    }

    /// Cancels the call and every clone of this context.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns `true` if [`cancel`](Self::cancel) was called on this context or a clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns `true` if the call was cancelled or its deadline has passed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.is_expired()
    }

    /// Marks the named instance as reachable from this call.
    pub fn attach(&mut self, instance: &'static str) {
        if !self.instances.contains(&instance) {
            self.instances.push(instance);
        }
    }

    /// Returns `true` if the named instance is reachable from this call.
    #[must_use]
    pub fn is_attached(&self, instance: &str) -> bool {
        self.instances.iter().any(|name| *name == instance)
    }
}

#[cfg(test)]
mod tests {
    use tick::ClockControl;

    use super::*;

    #[test]
    fn new_context_is_live() {
        let ctx = CallContext::new();
        assert!(!ctx.is_cancelled());
        assert!(!ctx.is_expired());
        assert!(ctx.deadline().is_none());
        assert!(ctx.remaining().is_none());
    }

    #[test]
    fn cancellation_is_shared_between_clones() {
        let ctx = CallContext::new();
        let clone = ctx.clone();
        clone.cancel();
        assert!(ctx.is_cancelled());
        assert!(ctx.is_done());
    }

    #[test]
    fn deadline_at_current_instant_is_expired() {
        let clock = Clock::new_frozen();
        let ctx = CallContext::new().with_deadline(&clock, clock.instant());
        assert!(ctx.is_expired());
        assert!(ctx.is_done());
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn timeout_runs_down_with_the_clock() {
        let control = ClockControl::new();
        let clock = control.to_clock();
        let ctx = CallContext::new().with_timeout(&clock, Duration::from_secs(10));
        assert_eq!(ctx.deadline(), Some(clock.instant() + Duration::from_secs(10)));

        control.advance(Duration::from_secs(4));
        assert_eq!(ctx.remaining(), Some(Duration::from_secs(6)));
        assert!(!ctx.is_expired());

        control.advance(Duration::from_secs(7));
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
        assert!(ctx.is_expired());
    }

    #[test]
    fn unrepresentable_timeout_leaves_no_deadline() {
        let clock = Clock::new_frozen();
        let ctx = CallContext::new()
            .with_timeout(&clock, Duration::from_secs(1))
            .with_timeout(&clock, Duration::MAX);
        assert!(ctx.deadline().is_none());
        assert!(ctx.remaining().is_none());
        assert!(!ctx.is_done());
    }

    #[test]
    fn attach_registers_instance_once() {
        let mut ctx = CallContext::new();
        assert!(!ctx.is_attached("cache"));
        ctx.attach("cache");
        ctx.attach("cache");
        assert!(ctx.is_attached("cache"));
        assert!(!ctx.is_attached("other"));
        assert_eq!(ctx.instances.len(), 1);
    }
}
