//! Session metadata cache.

use dashboard_types::{DEFAULT_SAVE_NAME, GameMetadata};

use crate::cache::SnapshotCell;
use crate::simulation::SessionInfo;

/// Cached [`GameMetadata`], written by the owner thread.
#[derive(Debug, Default)]
pub struct GameStateCache {
    meta: SnapshotCell<GameMetadata>,
}

impl GameStateCache {
    /// Create a cache in the not-ready state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the values fixed at world load and mark the cache ready.
    ///
    /// An empty save name falls back to [`DEFAULT_SAVE_NAME`].
    pub fn set_base_info(&self, info: SessionInfo) {
        self.meta.update(|m| {
            m.save_name = if info.save_name.is_empty() {
                String::from(DEFAULT_SAVE_NAME)
            } else {
                info.save_name
            };
            m.murder_mo = info.murder_mo;
            m.city_name = info.city_name;
            m.ready = true;
        });
    }

    /// Refresh the clock text.
    pub fn set_time(&self, time_text: String) {
        self.meta.update(|m| m.time_text = time_text);
    }

    /// Mark the world as gone. Names are kept until the next load.
    pub fn mark_unloaded(&self) {
        self.meta.update(|m| m.ready = false);
    }

    /// Copy of the current metadata.
    pub fn snapshot(&self) -> GameMetadata {
        self.meta.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_info_marks_ready() {
        let cache = GameStateCache::new();
        assert!(!cache.snapshot().ready);
        cache.set_base_info(SessionInfo {
            save_name: String::new(),
            murder_mo: String::from("Strangler"),
            city_name: String::from("Quay"),
        });
        cache.set_time(String::from("Mon 09:15"));
        let meta = cache.snapshot();
        assert!(meta.ready);
        assert_eq!(meta.save_name, DEFAULT_SAVE_NAME);
        assert_eq!(meta.murder_mo, "Strangler");
        assert_eq!(meta.time_text, "Mon 09:15");

        cache.mark_unloaded();
        assert!(!cache.snapshot().ready);
        assert_eq!(cache.snapshot().city_name, "Quay");
    }
}
