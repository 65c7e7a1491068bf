//! Citizen and address caches.
//!
//! Adds the field-level patches the simulation hooks apply to cached
//! citizens, and the orderings the API lists use.

use std::cmp::Ordering;

use dashboard_types::{AddressRecord, AddressSummary, NpcRecord};

use crate::cache::{Keyed, SnapshotCache};

/// Cache of every citizen.
pub type NpcCache = SnapshotCache<NpcRecord>;

/// Cache of every address.
pub type AddressCache = SnapshotCache<AddressRecord>;

impl Keyed for NpcRecord {
    fn key(&self) -> i32 {
        self.id
    }
}

impl Keyed for AddressRecord {
    fn key(&self) -> i32 {
        self.id
    }
}

impl SnapshotCache<NpcRecord> {
    /// Set current and maximum hit points.
    ///
    /// Never changes the dead flag: zero hit points can mean knocked out.
    pub fn set_health(&self, id: i32, current: f32, max: f32) -> bool {
        self.patch(id, |npc| {
            npc.hp_current = current;
            npc.hp_max = max;
        })
    }

    /// Set the dead flag. Dying also ends any knock-out.
    pub fn set_dead(&self, id: i32, dead: bool) -> bool {
        self.patch(id, |npc| {
            npc.is_dead = dead;
            if dead {
                npc.is_ko = false;
                npc.ko_remaining_seconds = 0.0;
                npc.ko_total_seconds = 0.0;
            }
        })
    }

    /// Set knock-out state. Negative timers are stored as zero.
    pub fn set_knockout(&self, id: i32, is_ko: bool, total_seconds: f32, remaining_seconds: f32) -> bool {
        self.patch(id, |npc| {
            npc.is_ko = is_ko;
            npc.ko_total_seconds = total_seconds.max(0.0);
            npc.ko_remaining_seconds = remaining_seconds.max(0.0);
        })
    }

    /// Update the knock-out countdown. Negative values are stored as zero.
    pub fn tick_knockout(&self, id: i32, remaining_seconds: f32) -> bool {
        self.patch(id, |npc| {
            npc.ko_remaining_seconds = remaining_seconds.max(0.0);
        })
    }

    /// Snapshot ordered by name, then surname, ignoring case.
    pub fn sorted_by_name(&self) -> Vec<NpcRecord> {
        let mut npcs = self.snapshot();
        npcs.sort_by(|a, b| {
            cmp_ignore_case(&a.name, &b.name).then_with(|| cmp_ignore_case(&a.surname, &b.surname))
        });
        npcs
    }
}

impl SnapshotCache<AddressRecord> {
    /// Snapshot with residents reduced to counts.
    pub fn summaries(&self) -> Vec<AddressSummary> {
        self.snapshot().iter().map(AddressSummary::from).collect()
    }
}

/// Compare two strings without regard to case.
pub fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}
