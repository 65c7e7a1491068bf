//! Every cache the control plane serves, constructed together.

use chrono::Utc;
use dashboard_types::DeathRecord;
use tracing::{info, warn};

use crate::cache::RebuildStats;
use crate::death_log::DeathLog;
use crate::directory::{AddressCache, NpcCache};
use crate::extract::{extract_address, extract_npc};
use crate::game_state::GameStateCache;
use crate::murder::MurderTracker;
use crate::simulation::{GameDate, Simulation};

/// Name recorded for deaths whose citizen name could not be read.
pub const UNKNOWN_NAME: &str = "Unknown";

/// The caches shared between the owner thread and request handlers.
///
/// Constructed once by the composition root and handed out behind an
/// `Arc`. The owner thread writes; everyone else reads snapshots.
#[derive(Debug)]
pub struct Caches {
    /// Citizen directory.
    pub npcs: NpcCache,
    /// Address directory.
    pub addresses: AddressCache,
    /// Session metadata.
    pub game: GameStateCache,
    /// Recent deaths.
    pub deaths: DeathLog,
    /// Current murderer and victim.
    pub murder: MurderTracker,
}

impl Caches {
    /// Create empty caches with a death log of `death_log_capacity` entries.
    pub fn new(death_log_capacity: usize) -> Self {
        Self {
            npcs: NpcCache::new("npcs"),
            addresses: AddressCache::new("addresses"),
            game: GameStateCache::new(),
            deaths: DeathLog::new(death_log_capacity),
            murder: MurderTracker::new(),
        }
    }

    /// Re-scan both directories of `sim` and replace the cached lists.
    ///
    /// Returns the citizen and address rebuild statistics.
    pub fn rebuild_all(&self, sim: &dyn Simulation) -> (RebuildStats, RebuildStats) {
        let npcs = self
            .npcs
            .rebuild_from(sim.citizens().into_iter().map(extract_npc));
        let addresses = self
            .addresses
            .rebuild_from(sim.addresses().into_iter().map(extract_address));
        info!(
            npcs = npcs.kept,
            npcs_skipped = npcs.skipped,
            addresses = addresses.kept,
            addresses_skipped = addresses.skipped,
            "Directories rebuilt"
        );
        (npcs, addresses)
    }

    /// Record the death of citizen `id`.
    ///
    /// Marks the cached citizen dead, appends to the death log, and clears
    /// the victim slot if `id` was the current victim.
    pub fn record_death(&self, id: i32, name: Option<String>, date: GameDate) {
        if !self.npcs.set_dead(id, true) {
            warn!(id, "Death reported for uncached citizen");
        }
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| String::from(UNKNOWN_NAME));
        self.deaths.record(DeathRecord {
            human_id: id,
            name,
            timestamp: Utc::now(),
            game_time: date.game_time,
            game_month: date.month,
            game_day: date.day,
            game_year: date.year,
        });
        if self.murder.clear_victim_if(id) {
            info!(id, "Murder victim died; victim slot cleared");
        }
    }
}

impl Default for Caches {
    fn default() -> Self {
        Self::new(crate::death_log::DEFAULT_DEATH_LOG_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use dashboard_types::{NO_ID, NpcRecord};

    use super::*;

    #[test]
    fn death_of_victim_clears_slot() {
        let caches = Caches::default();
        caches.npcs.rebuild(vec![NpcRecord::blank(3)]);
        caches.murder.set_murderer(1);
        caches.murder.set_victim(3);

        let date = GameDate {
            game_time: 12.5,
            month: 4,
            day: 9,
            year: 1979,
        };
        caches.record_death(3, None, date);

        assert!(caches.npcs.get(3).unwrap().is_dead);
        assert_eq!(caches.murder.current().victim_id, NO_ID);
        assert_eq!(caches.murder.current().murderer_id, 1);
        let death = caches.deaths.recent(1).pop().unwrap();
        assert_eq!(death.name, UNKNOWN_NAME);
        assert_eq!(death.game_month, 4);
    }

    #[test]
    fn unrelated_death_keeps_victim() {
        let caches = Caches::default();
        caches.murder.set_victim(3);
        caches.record_death(8, Some(String::from("Ada Vance")), GameDate::default());
        assert_eq!(caches.murder.current().victim_id, 3);
        assert_eq!(caches.deaths.total(), 1);
    }
}
