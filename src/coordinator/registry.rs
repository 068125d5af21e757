//! Tier registry: priority → teardown callbacks.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::priority::Priority;
use super::teardown::Teardown;

/// One priority tier taken out of the registry for draining.
#[derive(Debug)]
pub struct Tier {
    pub priority: Priority,
    pub callbacks: Vec<Teardown>,
}

/// Thread-safe mapping from priority to the callbacks registered at it.
///
/// The map's keys double as the set of priorities in use. The lock is only
/// held while a list is mutated or swapped out.
///
/// Callbacks can only be added from outside the crate. Swapping the tiers
/// out is reserved for the drain:
///
/// ```compile_fail
/// let registry = closer::coordinator::TierRegistry::new();
/// let _ = registry.take();
/// ```
#[derive(Debug, Default)]
pub struct TierRegistry {
    tiers: Mutex<BTreeMap<Priority, Vec<Teardown>>>,
}

impl TierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append callbacks to the tier for `priority`, creating it if absent.
    pub fn register(&self, priority: Priority, callbacks: impl IntoIterator<Item = Teardown>) {
        let mut callbacks = callbacks.into_iter().peekable();
        if callbacks.peek().is_none() {
            return;
        }

        self.lock().entry(priority).or_default().extend(callbacks);
    }

    /// Swap out the entire contents, returning tiers in descending priority.
    pub(crate) fn take(&self) -> Vec<Tier> {
        let tiers = std::mem::take(&mut *self.lock());

        tiers
            .into_iter()
            .rev()
            .map(|(priority, callbacks)| Tier { priority, callbacks })
            .collect()
    }

    /// Priorities currently in use, highest first.
    pub fn priorities(&self) -> Vec<Priority> {
        self.lock().keys().rev().copied().collect()
    }

    /// Number of callbacks registered at `priority`.
    pub fn tier_len(&self, priority: Priority) -> usize {
        self.lock().get(&priority).map_or(0, Vec::len)
    }

    /// Total number of registered callbacks.
    pub fn len(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave the map half-mutated, so
    // poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<Priority, Vec<Teardown>>> {
        self.tiers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
