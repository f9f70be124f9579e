//! Populate-once keyed map
//!
//! The mechanism under all three evaluation side-caches: each key is
//! populated at most once per map, concurrent first lookups for the same
//! key coalesce into a single population with every waiter observing the
//! one result, and a failed population leaves the key unpopulated so a
//! later lookup can retry. Lookups for unrelated keys never serialize
//! against each other; the map-wide lock is held only long enough to hand
//! out a per-key slot.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use serde::Serialize;
use tracing::trace;

use super::{CacheError, CacheResult};

/// Snapshot of one cache's activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Keys currently populated
    pub entries: usize,
    /// Lookups served from an already-populated key, including lookups
    /// that waited out another caller's population
    pub hits: u64,
    /// Lookups that started a population attempt, successful or not
    pub misses: u64,
}

/// Per-key population state.
struct SlotState<V> {
    /// Populated value, if any. Never overwritten once set.
    value: Option<V>,
    /// A caller is currently running the population closure
    in_flight: bool,
    /// Monotonic id of the most recently started attempt
    attempt: u64,
    /// Outcome of the most recent failed attempt, kept so every caller
    /// that joined that attempt receives the same error
    failed: Option<(u64, CacheError)>,
}

struct Slot<V> {
    state: Mutex<SlotState<V>>,
    ready: Condvar,
}

impl<V> Default for Slot<V> {
    fn default() -> Self {
        Self {
            state: Mutex::new(SlotState {
                value: None,
                in_flight: false,
                attempt: 0,
                failed: None,
            }),
            ready: Condvar::new(),
        }
    }
}

/// Clears the in-flight flag and wakes waiters when the populating caller
/// leaves, whether it returned or panicked mid-population.
struct FlightReset<'a, V> {
    slot: &'a Slot<V>,
}

impl<V> Drop for FlightReset<'_, V> {
    fn drop(&mut self) {
        let mut state = lock(&self.slot.state);
        state.in_flight = false;
        drop(state);
        self.slot.ready.notify_all();
    }
}

/// Keyed map whose entries are populated at most once.
pub struct OnceMap<K, V> {
    slots: Mutex<HashMap<K, Arc<Slot<V>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> OnceMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the value for `key`, populating it on first lookup.
    ///
    /// Exactly one concurrent caller runs `populate` for a given key;
    /// the others block until that population finishes and then observe
    /// its result. On success the value is pinned for the life of the map.
    /// On failure every caller that joined the attempt receives the same
    /// error and the key reverts to unpopulated, eligible for retry.
    pub fn get_or_populate<F>(&self, key: K, populate: F) -> CacheResult<V>
    where
        F: FnOnce() -> CacheResult<V>,
    {
        let slot = self.slot(key);
        let mut state = lock(&slot.state);

        loop {
            if let Some(value) = &state.value {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(value.clone());
            }

            if !state.in_flight {
                // This caller populates the key.
                state.in_flight = true;
                state.attempt += 1;
                let attempt = state.attempt;
                drop(state);
                self.misses.fetch_add(1, Ordering::Relaxed);

                let result = {
                    let _reset = FlightReset { slot: &*slot };
                    let result = populate();
                    let mut state = lock(&slot.state);
                    match &result {
                        Ok(value) => {
                            state.value = Some(value.clone());
                            state.failed = None;
                        }
                        Err(err) => {
                            trace!(error = %err, "cache population failed");
                            state.failed = Some((attempt, err.clone()));
                        }
                    }
                    result
                    // _reset drops here: in-flight cleared, waiters woken
                };
                return result;
            }

            // Another caller is populating this key: wait for the outcome
            // of the attempt in flight right now.
            let attempt = state.attempt;
            while state.in_flight && state.value.is_none() {
                state = wait(&slot.ready, state);
            }

            if let Some(value) = &state.value {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(value.clone());
            }
            if let Some((failed_attempt, err)) = &state.failed {
                if *failed_attempt == attempt {
                    return Err(err.clone());
                }
            }
            // The attempt this caller joined ended without an outcome for
            // it (panic in the populating closure, or a newer attempt has
            // already come and gone); take another turn at the state.
        }
    }

    /// Number of populated keys.
    pub fn len(&self) -> usize {
        let slots = lock(&self.slots);
        slots
            .values()
            .filter(|slot| lock(&slot.state).value.is_some())
            .count()
    }

    /// True if no key has been populated yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of this map's activity.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Fetch or create the slot for `key`, holding the map lock only for
    /// the lookup itself.
    fn slot(&self, key: K) -> Arc<Slot<V>> {
        let mut slots = lock(&self.slots);
        Arc::clone(slots.entry(key).or_default())
    }
}

impl<K, V> Default for OnceMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for OnceMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnceMap")
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}

/// Lock, recovering the guard if a panicking thread poisoned the mutex.
/// No caller-supplied code ever runs while a lock here is held.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn wait<'a, T>(condvar: &Condvar, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
    condvar
        .wait(guard)
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
