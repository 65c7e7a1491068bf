//! Bounded log of recent deaths.

use std::collections::VecDeque;

use dashboard_types::DeathRecord;
use parking_lot::Mutex;

/// Deaths kept when no capacity is configured.
pub const DEFAULT_DEATH_LOG_CAPACITY: usize = 50;

/// Fixed-capacity, oldest-evicted-first log of deaths.
#[derive(Debug)]
pub struct DeathLog {
    capacity: usize,
    entries: Mutex<VecDeque<DeathRecord>>,
}

impl DeathLog {
    /// Create an empty log holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Append a death, dropping the oldest entry when full.
    pub fn record(&self, death: DeathRecord) {
        let mut entries = self.entries.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(death);
    }

    /// Up to `count` most recent deaths, newest first.
    pub fn recent(&self, count: usize) -> Vec<DeathRecord> {
        self.entries.lock().iter().rev().take(count).cloned().collect()
    }

    /// Every retained death, oldest first.
    pub fn snapshot(&self) -> Vec<DeathRecord> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Number of retained deaths.
    pub fn total(&self) -> usize {
        self.entries.lock().len()
    }

    /// Maximum number of retained deaths.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Forget every death.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for DeathLog {
    fn default() -> Self {
        Self::new(DEFAULT_DEATH_LOG_CAPACITY)
    }
}
