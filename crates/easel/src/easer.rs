// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Coalescing of identical in-flight work.
//!
//! An [`Easer`] makes sure that, for a given identifier, only one unit of work runs at a
//! time. The first caller (the leader) runs its work and publishes the output; callers that
//! arrive while the leader is still running (the followers) wait for it and receive a clone
//! of that output instead of running their own work.
//!
//! # Cancellation and Panic Safety
//!
//! If the leader's future is dropped or its work panics before publishing, the next
//! waiting follower is promoted and runs its own work, so followers never wait forever.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Slot<T> = AsyncMutex<Option<T>>;

/// How a caller's request was served by an [`Easer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Eased<T> {
    /// This caller ran its own work.
    Led(T),
    /// This caller waited for another caller's work and received a clone of its output.
    Joined(T),
}

impl<T> Eased<T> {
    /// Returns the output regardless of how it was obtained.
    #[must_use]
    pub fn into_inner(self) -> T {
        match self {
            Self::Led(value) | Self::Joined(value) => value,
        }
    }

    /// Returns `true` if the output was produced by another caller's work.
    #[must_use]
    pub fn is_joined(&self) -> bool {
        matches!(self, Self::Joined(_))
    }
}

/// Suppresses duplicate concurrent work keyed by identifier.
///
/// The registry of in-flight identifiers belongs to the instance; two `Easer`s never
/// coalesce with each other.
///
/// # Examples
///
/// ```
/// use easel::{Eased, Easer};
/// # futures::executor::block_on(async {
///
/// let easer = Easer::new();
/// let (first, second) = futures::join!(
///     easer.ease("report", || async { "fresh".to_string() }),
///     easer.ease("report", || async { "never computed".to_string() }),
/// );
///
/// assert_eq!(first, Eased::Led("fresh".to_string()));
/// assert_eq!(second, Eased::Joined("fresh".to_string()));
/// # });
/// ```
pub struct Easer<T> {
    in_flight: Mutex<HashMap<String, Weak<Slot<T>>>>,
}

impl<T> Default for Easer<T> {
    fn default() -> Self {
        Self {
            in_flight: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> fmt::Debug for Easer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Easer").field("in_flight", &self.in_flight()).finish()
    }
}

enum Role<T> {
    Leader(OwnedMutexGuard<Option<T>>),
    Follower,
}

impl<T> Easer<T> {
    /// Creates an easer with nothing in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of identifiers currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().values().filter(|slot| slot.strong_count() > 0).count()
    }

    /// Runs `work` for `identifier` unless identical work is already in flight.
    ///
    /// Returns [`Eased::Led`] with the output of `work` when this caller ran it, or
    /// [`Eased::Joined`] with a clone of the in-flight work's output otherwise. The future
    /// does nothing until first polled; registration happens then.
    pub async fn ease<F, Fut>(&self, identifier: &str, work: F) -> Eased<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
        T: Clone,
    {
        let (slot, role) = self.enter(identifier);

        let guard = match role {
            Role::Leader(guard) => guard,
            Role::Follower => Arc::clone(&slot).lock_owned().await,
        };

        if let Some(value) = guard.as_ref() {
            return Eased::Joined(value.clone());
        }

        // Either the first caller or a follower whose leader vanished without publishing.
        self.lead(identifier, &slot, guard, work).await
    }

    fn enter(&self, identifier: &str) -> (Arc<Slot<T>>, Role<T>) {
        let mut in_flight = self.in_flight.lock();

        if let Some(slot) = in_flight.get(identifier).and_then(Weak::upgrade) {
            let role = match Arc::clone(&slot).try_lock_owned() {
                Ok(guard) => Role::Leader(guard),
                Err(_) => Role::Follower,
            };
            return (slot, role);
        }

        let slot = Arc::new(AsyncMutex::new(None));
        in_flight.insert(identifier.to_owned(), Arc::downgrade(&slot));

        match Arc::clone(&slot).try_lock_owned() {
            Ok(guard) => (slot, Role::Leader(guard)),
            Err(_) => (slot, Role::Follower),
        }
    }

    async fn lead<F, Fut>(&self, identifier: &str, slot: &Arc<Slot<T>>, mut guard: OwnedMutexGuard<Option<T>>, work: F) -> Eased<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
        T: Clone,
    {
        let value = work().await;
        *guard = Some(value.clone());

        // Deregister before releasing the slot so later arrivals start a new generation.
        self.leave(identifier, slot);
        drop(guard);

        Eased::Led(value)
    }

    fn leave(&self, identifier: &str, slot: &Arc<Slot<T>>) {
        let mut in_flight = self.in_flight.lock();
        let current = in_flight.get(identifier).is_some_and(|entry| entry.as_ptr() == Arc::as_ptr(slot));
        if current {
            in_flight.remove(identifier);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::FutureExt;
    use tokio::sync::oneshot;

    use super::*;

    #[tokio::test]
    async fn single_caller_leads() {
        let easer = Easer::new();
        assert_eq!(easer.ease("k", || async { 1_u32 }).await, Eased::Led(1));
        assert_eq!(easer.in_flight(), 0);
    }

    #[tokio::test]
    async fn sequential_callers_start_new_generations() {
        let easer = Easer::new();
        let runs = AtomicUsize::new(0);

        for _ in 0..3 {
            let eased = easer
                .ease("k", || async {
                    runs.fetch_add(1, Ordering::SeqCst);
                    "v"
                })
                .await;
            assert!(!eased.is_joined());
        }

        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_run() {
        let easer = Easer::new();
        let runs = AtomicUsize::new(0);
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let leader = easer.ease("k", || async {
            runs.fetch_add(1, Ordering::SeqCst);
            release_rx.await.ok();
            42_u64
        });
        let follower_a = easer.ease("k", || async {
            runs.fetch_add(1, Ordering::SeqCst);
            0
        });
        let follower_b = easer.ease("k", || async {
            runs.fetch_add(1, Ordering::SeqCst);
            0
        });
        let release = async {
            tokio::task::yield_now().await;
            release_tx.send(()).ok();
        };

        let (leader, follower_a, follower_b, ()) = tokio::join!(leader, follower_a, follower_b, release);

        assert_eq!(leader, Eased::Led(42));
        assert_eq!(follower_a, Eased::Joined(42));
        assert_eq!(follower_b, Eased::Joined(42));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(easer.in_flight(), 0);
    }

    #[tokio::test]
    async fn different_identifiers_do_not_coalesce() {
        let easer = Easer::new();
        let (a, b) = tokio::join!(easer.ease("a", || async { 1_i32 }), easer.ease("b", || async { 2_i32 }));
        assert_eq!(a, Eased::Led(1));
        assert_eq!(b, Eased::Led(2));
    }

    #[tokio::test]
    async fn dropped_leader_promotes_follower() {
        let easer = Easer::new();

        let mut leader = Box::pin(easer.ease("k", std::future::pending::<u32>));
        assert!((&mut leader).now_or_never().is_none());
        assert_eq!(easer.in_flight(), 1);

        let mut follower = Box::pin(easer.ease("k", || async { 7 }));
        assert!((&mut follower).now_or_never().is_none());

        drop(leader);

        assert_eq!(follower.await, Eased::Led(7));
        assert_eq!(easer.in_flight(), 0);
    }

    #[tokio::test]
    async fn panicking_leader_promotes_follower() {
        let easer = Arc::new(Easer::<u32>::new());
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let leader = tokio::spawn({
            let easer = Arc::clone(&easer);
            async move {
                easer
                    .ease("k", || async move {
                        started_tx.send(()).ok();
                        if release_rx.await.is_ok() {
                            panic!("leader failed");
                        }
                        0
                    })
                    .await
            }
        });
        started_rx.await.expect("leader should start");

        let follower = tokio::spawn({
            let easer = Arc::clone(&easer);
            async move { easer.ease("k", || async { 9 }).await }
        });
        tokio::task::yield_now().await;
        release_tx.send(()).ok();

        assert!(leader.await.expect_err("leader panicked").is_panic());
        assert_eq!(follower.await.expect("follower completes"), Eased::Led(9));
    }

    #[test]
    fn eased_accessors() {
        assert_eq!(Eased::Led(3).into_inner(), 3);
        assert_eq!(Eased::Joined(4).into_inner(), 4);
        assert!(Eased::Joined(()).is_joined());
        assert!(!Eased::Led(()).is_joined());
        assert!(format!("{:?}", Easer::<u8>::new()).contains("in_flight"));
    }
}
