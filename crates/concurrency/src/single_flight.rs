//! Single-flight call coalescing
//!
//! Concurrent callers asking for the same key share one execution: the
//! first caller (the leader) runs the work, everyone else awaits the same
//! cell and receives a clone of its result.
//!
//! The flight is removed from the table as soon as it resolves, so a caller
//! that arrives afterwards starts a new flight. If the leader is cancelled
//! before finishing, the next waiter takes over and runs its own work.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Coalesces concurrent calls keyed by `K` into one execution producing `V`
pub struct SingleFlight<K, V> {
    calls: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
    executions: AtomicU64,
    coalesced: AtomicU64,
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty group
    pub fn new() -> Self {
        SingleFlight {
            calls: Mutex::new(HashMap::new()),
            executions: AtomicU64::new(0),
            coalesced: AtomicU64::new(0),
        }
    }

    /// Run `work` for `key`, or join the flight already running for it
    pub async fn run<F, Fut>(&self, key: K, work: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let cell = {
            let mut calls = self.calls.lock();
            Arc::clone(
                calls
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };

        let mut led = false;
        let value = cell
            .get_or_init(|| {
                led = true;
                work()
            })
            .await
            .clone();

        if led {
            self.executions.fetch_add(1, Ordering::Relaxed);
        } else {
            self.coalesced.fetch_add(1, Ordering::Relaxed);
        }

        let mut calls = self.calls.lock();
        if calls.get(&key).is_some_and(|current| Arc::ptr_eq(current, &cell)) {
            calls.remove(&key);
        }

        value
    }

    /// Number of keys with a flight currently in progress
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }

    /// Flights that actually executed work
    pub fn executions(&self) -> u64 {
        self.executions.load(Ordering::Relaxed)
    }

    /// Calls that received another caller's result
    pub fn coalesced(&self) -> u64 {
        self.coalesced.load(Ordering::Relaxed)
    }
}
