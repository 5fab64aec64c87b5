//! Per-key single-flight coordination.
//!
//! Concurrent callers asking for the same key while a fetch is running all
//! await that one fetch. The shared future is driven by whichever waiters are
//! still polling it, so a caller that goes away does not cancel the fetch for
//! the others.

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::{BoxFuture, FutureExt, Shared};

type SharedFetch<T> = Shared<BoxFuture<'static, T>>;

/// Whether a caller started the fetch or joined one already in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightRole {
    Leader,
    Follower,
}

pub struct SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    inflight: Arc<DashMap<String, SharedFetch<T>>>,
}

impl<T> Default for SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            inflight: Arc::new(DashMap::new()),
        }
    }

    /// Run `start` for `key` unless a fetch for `key` is already in flight,
    /// in which case its result is awaited instead.
    pub async fn run<F>(&self, key: &str, start: F) -> (T, FlightRole)
    where
        F: FnOnce() -> BoxFuture<'static, T>,
    {
        let (shared, role) = match self.inflight.entry(key.to_string()) {
            Entry::Occupied(occupied) => (occupied.get().clone(), FlightRole::Follower),
            Entry::Vacant(vacant) => {
                let shared = start().shared();
                vacant.insert(shared.clone());
                (shared, FlightRole::Leader)
            }
        };

        let mut waiter = Waiter {
            key,
            inflight: &self.inflight,
            shared,
            done: false,
        };
        let output = (&mut waiter.shared).await;
        waiter.done = true;
        (output, role)
    }

    /// Number of keys with a fetch currently in flight.
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }
}

struct Waiter<'a, T>
where
    T: Clone + Send + Sync + 'static,
{
    key: &'a str,
    inflight: &'a DashMap<String, SharedFetch<T>>,
    shared: SharedFetch<T>,
    done: bool,
}

impl<T> Drop for Waiter<'_, T>
where
    T: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        // The map holds one handle and this waiter the other: nobody else is
        // left to drive the fetch, so forget it and let the next caller retry.
        let abandoned = !self.done && self.shared.strong_count() == Some(2);
        if self.done || abandoned {
            self.inflight
                .remove_if(self.key, |_, current| current.ptr_eq(&self.shared));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use futures::future::join_all;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_fetch() {
        let flight: Arc<SingleFlight<u32>> = Arc::new(SingleFlight::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks = (0..8).map(|_| {
            let flight = Arc::clone(&flight);
            let calls = Arc::clone(&calls);
            async move {
                flight
                    .run("post:hello", move || {
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            7
                        }
                        .boxed()
                    })
                    .await
            }
        });

        let results = join_all(tasks).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|(value, _)| *value == 7));
        assert_eq!(
            results
                .iter()
                .filter(|(_, role)| *role == FlightRole::Leader)
                .count(),
            1
        );
        assert_eq!(flight.in_flight(), 0);
    }

    #[tokio::test]
    async fn sequential_callers_fetch_again() {
        let flight: SingleFlight<u32> = SingleFlight::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            let (_, role) = flight
                .run("k", move || {
                    async move { calls.fetch_add(1, Ordering::SeqCst) as u32 }.boxed()
                })
                .await;
            assert_eq!(role, FlightRole::Leader);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_fetch_is_forgotten() {
        let flight: SingleFlight<u32> = SingleFlight::new();

        let pending = flight.run("k", || {
            async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                1
            }
            .boxed()
        });
        let timed_out = tokio::time::timeout(Duration::from_millis(10), pending).await;
        assert!(timed_out.is_err());
        assert_eq!(flight.in_flight(), 0);

        let (value, role) = flight.run("k", || async { 2 }.boxed()).await;
        assert_eq!(value, 2);
        assert_eq!(role, FlightRole::Leader);
    }
}
