//! Current murderer and victim.

use chrono::{DateTime, TimeDelta, Utc};
use dashboard_types::{MurderState, NO_ID};

use crate::cache::SnapshotCell;

/// Single-slot tracker for the active murder case.
///
/// Each slot is set independently. `last_updated` strictly increases
/// with every change, even if the wall clock does not.
#[derive(Debug, Default)]
pub struct MurderTracker {
    state: SnapshotCell<MurderState>,
}

fn next_stamp(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    match previous {
        Some(prev) if now <= prev => prev
            .checked_add_signed(TimeDelta::microseconds(1))
            .unwrap_or(prev),
        _ => now,
    }
}

impl MurderTracker {
    /// Create a tracker with both slots unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the murderer slot.
    pub fn set_murderer(&self, id: i32) {
        self.state.update(|s| {
            s.murderer_id = id;
            s.last_updated = Some(next_stamp(s.last_updated));
        });
    }

    /// Set the victim slot.
    pub fn set_victim(&self, id: i32) {
        self.state.update(|s| {
            s.victim_id = id;
            s.last_updated = Some(next_stamp(s.last_updated));
        });
    }

    /// Unset the victim slot if it currently holds `id`. Returns whether it did.
    pub fn clear_victim_if(&self, id: i32) -> bool {
        let mut cleared = false;
        self.state.update(|s| {
            if s.victim_id == id && id != NO_ID {
                s.victim_id = NO_ID;
                s.last_updated = Some(next_stamp(s.last_updated));
                cleared = true;
            }
        });
        cleared
    }

    /// Unset both slots.
    pub fn reset(&self) {
        self.state.update(|s| {
            s.murderer_id = NO_ID;
            s.victim_id = NO_ID;
            s.last_updated = Some(next_stamp(s.last_updated));
        });
    }

    /// Copy of the current state.
    pub fn current(&self) -> MurderState {
        self.state.get()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn slots_are_independent() {
        let tracker = MurderTracker::new();
        tracker.set_murderer(4);
        tracker.set_victim(9);
        tracker.set_murderer(5);
        let state = tracker.current();
        assert_eq!(state.murderer_id, 5);
        assert_eq!(state.victim_id, 9);
    }

    #[test]
    fn timestamps_strictly_increase() {
        let tracker = MurderTracker::new();
        let mut last = None;
        for id in 0..200 {
            tracker.set_victim(id);
            let stamp = tracker.current().last_updated.unwrap();
            if let Some(prev) = last {
                assert!(stamp > prev);
            }
            last = Some(stamp);
        }
    }

    #[test]
    fn clearing_a_different_victim_is_ignored() {
        let tracker = MurderTracker::new();
        tracker.set_victim(9);
        assert!(!tracker.clear_victim_if(3));
        assert!(tracker.clear_victim_if(9));
        assert_eq!(tracker.current().victim_id, NO_ID);
    }
}
