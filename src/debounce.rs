//! Keyed debounce timers driven by an external clock.
//!
//! The scheduler never sleeps. Callers pass `now` when scheduling and poll
//! [`DebounceScheduler::take_due`] from their tick loop.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct PendingAction<A> {
    deadline: Instant,
    action: A,
}

#[derive(Debug)]
pub struct DebounceScheduler<K, A> {
    pending: HashMap<K, PendingAction<A>>,
}

impl<K, A> DebounceScheduler<K, A>
where
    K: Eq + Hash + Copy + Debug,
{
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }

    /// Replaces any pending action for `key` and restarts its quiet period.
    pub fn schedule(&mut self, key: K, delay: Duration, now: Instant, action: A) {
        let deadline = now + delay;
        let restarted = self
            .pending
            .insert(key, PendingAction { deadline, action })
            .is_some();
        tracing::trace!(?key, ?delay, restarted, "debounce scheduled");
    }

    pub fn cancel(&mut self, key: K) -> bool {
        self.pending.remove(&key).is_some()
    }

    pub fn is_pending(&self, key: K) -> bool {
        self.pending.contains_key(&key)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|pending| pending.deadline).min()
    }

    /// Removes and returns every action whose quiet period has elapsed,
    /// earliest deadline first.
    pub fn take_due(&mut self, now: Instant) -> Vec<(K, A)> {
        let due_keys: Vec<K> = self
            .pending
            .iter()
            .filter(|(_, pending)| pending.deadline <= now)
            .map(|(key, _)| *key)
            .collect();

        let mut due: Vec<(Instant, K, A)> = due_keys
            .into_iter()
            .filter_map(|key| {
                self.pending
                    .remove(&key)
                    .map(|pending| (pending.deadline, key, pending.action))
            })
            .collect();
        due.sort_by_key(|(deadline, _, _)| *deadline);
        due.into_iter().map(|(_, key, action)| (key, action)).collect()
    }
}

impl<K, A> Default for DebounceScheduler<K, A>
where
    K: Eq + Hash + Copy + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}
