//! At-most-one-in-flight guard.
//!
//! Keys are independent, so there is no global lock: one set of active keys
//! and a permit that releases its key on drop (including on early return or
//! a cancelled future).

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

#[derive(Debug)]
pub struct InFlight<K> {
    active: Mutex<HashSet<K>>,
}

impl<K> Default for InFlight<K> {
    fn default() -> Self {
        Self {
            active: Mutex::new(HashSet::new()),
        }
    }
}

impl<K> InFlight<K>
where
    K: Clone + Eq + Hash,
{
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// `None` when an operation for `key` is already running.
    pub fn try_acquire(self: &Arc<Self>, key: K) -> Option<InFlightPermit<K>> {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if !active.insert(key.clone()) {
            return None;
        }
        Some(InFlightPermit {
            owner: Arc::clone(self),
            key,
        })
    }

    pub fn is_active(&self, key: &K) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(key)
    }
}

/// Held for the duration of one operation.
#[derive(Debug)]
pub struct InFlightPermit<K>
where
    K: Clone + Eq + Hash,
{
    owner: Arc<InFlight<K>>,
    key: K,
}

impl<K> Drop for InFlightPermit<K>
where
    K: Clone + Eq + Hash,
{
    fn drop(&mut self) {
        let mut active = self.owner.active.lock().unwrap_or_else(|e| e.into_inner());
        active.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_refused_until_release() {
        let guard: Arc<InFlight<u32>> = InFlight::new();

        let permit = guard.try_acquire(1).unwrap();
        assert!(guard.try_acquire(1).is_none());
        assert!(guard.is_active(&1));

        // Other keys are unaffected.
        assert!(guard.try_acquire(2).is_some());

        drop(permit);
        assert!(!guard.is_active(&1));
        assert!(guard.try_acquire(1).is_some());
    }
}
