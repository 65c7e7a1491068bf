//! Player vitals and the normalised status report derived from them.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Raw player vitals as the simulation stores them.
///
/// Nourishment, hydration, energy, hygiene and heat are "fullness"
/// values in `0..=1` where 1 is good. The ailment fields are already
/// severity values where 1 is bad.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerVitals {
    /// Current hit points.
    pub current_health: f32,
    /// Current maximum hit points; may be zero while the player spawns.
    pub max_health: f32,
    /// Baseline maximum hit points.
    pub maximum_health: f32,
    /// Food level.
    pub nourishment: f32,
    /// Drink level.
    pub hydration: f32,
    /// Rest level.
    pub energy: f32,
    /// Cleanliness level.
    pub hygiene: f32,
    /// Warmth level.
    pub heat: f32,
    /// Wetness severity.
    pub wet: f32,
    /// Headache severity.
    pub headache: f32,
    /// Bruising severity.
    pub bruised: f32,
    /// Bleeding severity.
    pub bleeding: f32,
}

/// Health portion of a [`PlayerStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HealthReading {
    /// Current hit points.
    pub current: f32,
    /// Effective maximum hit points, at least 1.
    pub max: f32,
}

/// Needs portion of a [`PlayerStatus`]; every value is clamped to `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NeedsReading {
    /// `1 - nourishment`.
    pub hunger: f32,
    /// `1 - hydration`.
    pub thirst: f32,
    /// Ramps from 0 at 20% energy to 1 at zero energy.
    pub tiredness: f32,
    /// Energy level.
    pub energy: f32,
}

/// Status-effect portion of a [`PlayerStatus`]; every value is clamped to `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StatusReading {
    /// `1 - hygiene`.
    pub stinky: f32,
    /// `1 - heat`.
    pub cold: f32,
    /// Wetness.
    pub wet: f32,
    /// Headache.
    pub headache: f32,
    /// Bruising.
    pub bruised: f32,
    /// Bleeding.
    pub bleeding: f32,
}

/// Body of `GET /api/player/status`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerStatus {
    /// Always `true`; failures use the `{ok: false, message}` shape instead.
    pub ok: bool,
    /// Hit points.
    pub health: HealthReading,
    /// Hunger, thirst and tiredness.
    pub needs: NeedsReading,
    /// Ailments.
    pub status: StatusReading,
}

/// Threshold below which low energy starts to count as tiredness.
const TIREDNESS_THRESHOLD: f32 = 0.2;

fn clamp01(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

impl From<&PlayerVitals> for PlayerStatus {
    // Float math on normalised vitals; no overflow is possible.
    #[allow(clippy::arithmetic_side_effects)]
    fn from(v: &PlayerVitals) -> Self {
        let max = if v.max_health > 0.0 {
            v.max_health
        } else {
            v.maximum_health.max(1.0)
        };
        Self {
            ok: true,
            health: HealthReading {
                current: v.current_health,
                max,
            },
            needs: NeedsReading {
                hunger: clamp01(1.0 - v.nourishment),
                thirst: clamp01(1.0 - v.hydration),
                tiredness: clamp01((TIREDNESS_THRESHOLD - v.energy) / TIREDNESS_THRESHOLD),
                energy: clamp01(v.energy),
            },
            status: StatusReading {
                stinky: clamp01(1.0 - v.hygiene),
                cold: clamp01(1.0 - v.heat),
                wet: clamp01(v.wet),
                headache: clamp01(v.headache),
                bruised: clamp01(v.bruised),
                bleeding: clamp01(v.bleeding),
            },
        }
    }
}
