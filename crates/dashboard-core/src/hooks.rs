//! Keeps the caches in step with simulation events.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::caches::Caches;
use crate::runner::TickCallback;
use crate::simulation::{GameDate, SessionInfo, SimEvent, Simulation};

/// Tick callback that applies each event to the shared [`Caches`].
///
/// A world load rebuilds both directories and captures the session
/// info; everything else is a field-level patch. The game clock text is
/// refreshed every tick.
#[derive(Debug, Clone)]
pub struct CacheSync {
    caches: Arc<Caches>,
}

impl CacheSync {
    /// Create a callback writing into `caches`.
    pub const fn new(caches: Arc<Caches>) -> Self {
        Self { caches }
    }

    fn world_loaded(&self, sim: &dyn Simulation) {
        self.caches.rebuild_all(sim);
        let info = sim.session_info().unwrap_or_else(|e| {
            warn!(error = %e, "Session info unreadable, using defaults");
            SessionInfo::default()
        });
        self.caches.game.set_base_info(info);
    }

    fn apply(&self, event: &SimEvent, sim: &dyn Simulation) {
        let caches = &self.caches;
        match event {
            SimEvent::WorldLoaded => self.world_loaded(sim),
            SimEvent::WorldUnloading => caches.game.mark_unloaded(),
            SimEvent::HealthChanged { id, current, max } => {
                caches.npcs.set_health(*id, *current, *max);
            }
            SimEvent::Died { id, name } => {
                let date = sim.game_date().unwrap_or_else(|e| {
                    warn!(id, error = %e, "Game date unreadable for death record");
                    GameDate::default()
                });
                caches.record_death(*id, name.clone(), date);
            }
            SimEvent::KnockedOut {
                id,
                total_seconds,
                remaining_seconds,
            } => {
                caches
                    .npcs
                    .set_knockout(*id, true, *total_seconds, *remaining_seconds);
            }
            SimEvent::KnockoutTick {
                id,
                remaining_seconds,
            } => {
                caches.npcs.tick_knockout(*id, *remaining_seconds);
            }
            SimEvent::Recovered { id } => {
                caches.npcs.set_knockout(*id, false, 0.0, 0.0);
            }
            SimEvent::MurdererPicked { id } => caches.murder.set_murderer(*id),
            SimEvent::VictimPicked { id } => caches.murder.set_victim(*id),
        }
    }
}

impl TickCallback for CacheSync {
    fn on_tick(&mut self, events: &[SimEvent], sim: &dyn Simulation) {
        for event in events {
            self.apply(event, sim);
        }
        match sim.time_text() {
            Ok(text) => self.caches.game.set_time(text),
            Err(e) => debug!(error = %e, "Clock text unreadable"),
        }
    }
}
