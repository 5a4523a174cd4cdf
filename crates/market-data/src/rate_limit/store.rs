use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use log::warn;

/// One fixed-window counter.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CounterEntry {
    /// Requests counted in the current window.
    pub count: u32,
    /// Epoch milliseconds at which the window ends.
    pub reset_at: i64,
}

/// Storage backend for rate-limit counters.
///
/// The limiter serialises its own read-modify-write, so implementations only
/// need per-call consistency.
pub trait CounterStore: Send + Sync {
    fn get(&self, key: &str) -> Option<CounterEntry>;

    fn set(&self, key: &str, entry: CounterEntry);

    fn delete(&self, key: &str);

    /// Drop every entry whose window ended at or before `now`.
    ///
    /// Returns the number of entries removed. Stores with native expiry can
    /// keep the default no-op.
    fn sweep_expired(&self, now: i64) -> usize {
        let _ = now;
        0
    }
}

/// Process-local [`CounterStore`]. State is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    entries: Mutex<HashMap<String, CounterEntry>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, CounterEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Counter store mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Number of live counters.
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CounterStore for MemoryCounterStore {
    fn get(&self, key: &str) -> Option<CounterEntry> {
        self.lock_entries().get(key).copied()
    }

    fn set(&self, key: &str, entry: CounterEntry) {
        self.lock_entries().insert(key.to_string(), entry);
    }

    fn delete(&self, key: &str) {
        self.lock_entries().remove(key);
    }

    fn sweep_expired(&self, now: i64) -> usize {
        let mut entries = self.lock_entries();
        let before = entries.len();
        entries.retain(|_, entry| entry.reset_at > now);
        before - entries.len()
    }
}

/// Millisecond wall clock used by the limiter.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// [`Clock`] reading the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// [`Clock`] that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now
            .fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
