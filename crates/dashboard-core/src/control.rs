//! Shared control state for the owner-thread loop.
//!
//! Atomics only, so the loop reads them every tick without locking and
//! any thread (a signal handler, a test) can steer it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};

/// Controls for a running owner loop.
#[derive(Debug)]
pub struct OwnerControl {
    /// Whether the simulation step is suspended.
    paused: AtomicBool,

    /// Whether the loop should exit.
    stop_requested: AtomicBool,

    /// Current tick interval in milliseconds.
    tick_interval_ms: AtomicU64,

    /// Ticks completed so far.
    ticks: AtomicU64,

    /// Wall-clock time the control was created.
    started_at: DateTime<Utc>,
}

impl OwnerControl {
    /// Create controls for a loop ticking every `tick_interval_ms`.
    pub fn new(tick_interval_ms: u64) -> Self {
        Self {
            paused: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            tick_interval_ms: AtomicU64::new(tick_interval_ms),
            ticks: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Whether stepping is paused. Dispatched work still runs while paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Suspend stepping.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume stepping.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Ask the loop to exit after the current tick.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    // -----------------------------------------------------------------------
    // Speed
    // -----------------------------------------------------------------------

    /// Current tick interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Change the tick interval. Takes effect on the next tick.
    pub fn set_tick_interval_ms(&self, ms: u64) {
        self.tick_interval_ms.store(ms, Ordering::Release);
    }

    // -----------------------------------------------------------------------
    // Counters
    // -----------------------------------------------------------------------

    /// Count one completed tick and return the new total.
    pub fn record_tick(&self) -> u64 {
        self.ticks.fetch_add(1, Ordering::AcqRel).saturating_add(1)
    }

    /// Ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Wall-clock time the control was created.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}
