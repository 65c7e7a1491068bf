//! The owner-thread loop.
//!
//! [`run_owner_loop`] is the only place the live simulation is touched.
//! Each tick, in order:
//!
//! 1. drain the dispatcher, so queued closures see the current state
//! 2. advance the simulation one step (skipped while paused)
//! 3. hand the step's events to the [`TickCallback`]
//! 4. sleep for the tick interval
//!
//! When the loop exits the dispatcher is closed, so callers still
//! waiting get [`DispatchError::Abandoned`] instead of a timeout.

use std::thread;
use std::time::{Duration, Instant};

use tracing::info;

use crate::control::OwnerControl;
use crate::dispatcher::{DispatchError, Dispatcher};
use crate::simulation::{SimEvent, Simulation};

/// Errors that stop the owner loop from starting.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The dispatcher is already owned by another thread.
    #[error("dispatcher error: {source}")]
    Dispatch {
        /// The underlying dispatcher error.
        #[from]
        source: DispatchError,
    },
}

/// Totals reported when the owner loop exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopSummary {
    /// Simulation steps taken.
    pub steps: u64,
    /// Dispatched closures executed.
    pub tasks_run: u64,
    /// Queued closures dropped at shutdown.
    pub tasks_abandoned: usize,
}

/// Observer of each tick's events, run on the owner thread.
pub trait TickCallback: Send {
    /// Called after a step with the events it produced.
    fn on_tick(&mut self, events: &[SimEvent], sim: &dyn Simulation);
}

/// A tick callback that ignores everything.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _events: &[SimEvent], _sim: &dyn Simulation) {}
}

/// Drive `sim` on the calling thread until a stop is requested.
///
/// The calling thread becomes the dispatcher's owner thread.
///
/// # Errors
///
/// Returns [`RunnerError::Dispatch`] if the dispatcher is already bound
/// to another thread.
pub fn run_owner_loop<S>(
    sim: &mut S,
    dispatcher: &Dispatcher<dyn Simulation>,
    control: &OwnerControl,
    callback: &mut dyn TickCallback,
) -> Result<LoopSummary, RunnerError>
where
    S: Simulation + 'static,
{
    dispatcher.bind_owner()?;
    let mut summary = LoopSummary::default();
    let mut last_step = Instant::now();

    info!(
        tick_interval_ms = control.tick_interval_ms(),
        "Owner loop starting"
    );

    while !control.is_stop_requested() {
        let ran = dispatcher.drain(sim);
        summary.tasks_run = summary
            .tasks_run
            .saturating_add(u64::try_from(ran).unwrap_or(u64::MAX));

        let now = Instant::now();
        let dt = now.saturating_duration_since(last_step);
        last_step = now;

        if !control.is_paused() {
            let events = sim.step(dt);
            callback.on_tick(&events, sim);
            summary.steps = summary.steps.saturating_add(1);
            control.record_tick();
        }

        let interval_ms = control.tick_interval_ms();
        if interval_ms > 0 {
            thread::sleep(Duration::from_millis(interval_ms));
        }
    }

    // Work queued before the stop still runs; anything later is dropped.
    let ran = dispatcher.drain(sim);
    summary.tasks_run = summary
        .tasks_run
        .saturating_add(u64::try_from(ran).unwrap_or(u64::MAX));
    summary.tasks_abandoned = dispatcher.close();

    info!(
        steps = summary.steps,
        tasks_run = summary.tasks_run,
        tasks_abandoned = summary.tasks_abandoned,
        "Owner loop stopped"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::testing::ScriptedSim;

    struct Recorder {
        seen: Vec<SimEvent>,
    }

    impl TickCallback for Recorder {
        fn on_tick(&mut self, events: &[SimEvent], _sim: &dyn Simulation) {
            self.seen.extend_from_slice(events);
        }
    }

    #[test]
    fn dispatched_work_sees_state_before_the_step() {
        let dispatcher: Dispatcher<dyn Simulation> = Dispatcher::new();
        let control = Arc::new(OwnerControl::new(1));
        let seen = Arc::new(Mutex::new(None));

        {
            let control = Arc::clone(&control);
            let seen = Arc::clone(&seen);
            dispatcher
                .enqueue(move |sim| {
                    *seen.lock() = sim.time_text().ok();
                    control.request_stop();
                })
                .unwrap();
        }

        let mut sim = ScriptedSim::default();
        let summary = run_owner_loop(&mut sim, &dispatcher, &control, &mut NoOpCallback).unwrap();

        assert_eq!(seen.lock().as_deref(), Some("tick 0"));
        assert_eq!(summary.steps, 1);
        assert_eq!(summary.tasks_run, 1);
        assert!(dispatcher.is_closed());
    }

    #[test]
    fn events_reach_the_callback() {
        let dispatcher: Dispatcher<dyn Simulation> = Dispatcher::new();
        let control = Arc::new(OwnerControl::new(0));
        let mut sim = ScriptedSim::default();
        sim.script.push_back(vec![SimEvent::WorldLoaded]);
        sim.script.push_back(vec![SimEvent::Recovered { id: 4 }]);

        let watcher = {
            let control = Arc::clone(&control);
            thread::spawn(move || {
                while control.ticks() < 3 {
                    thread::sleep(Duration::from_millis(1));
                }
                control.request_stop();
            })
        };
        let mut recorder = Recorder { seen: Vec::new() };
        run_owner_loop(&mut sim, &dispatcher, &control, &mut recorder).unwrap();
        watcher.join().unwrap();

        assert_eq!(
            recorder.seen,
            vec![SimEvent::WorldLoaded, SimEvent::Recovered { id: 4 }]
        );
    }

    #[test]
    fn paused_loop_still_serves_dispatch() {
        let dispatcher: Dispatcher<dyn Simulation> = Dispatcher::new();
        let control = Arc::new(OwnerControl::new(1));
        control.pause();

        let caller = {
            let dispatcher = dispatcher.clone();
            let control = Arc::clone(&control);
            thread::spawn(move || {
                let presets = dispatcher
                    .run_sync(|sim| sim.spawnable_presets().len(), Duration::from_secs(5))
                    .unwrap();
                control.request_stop();
                presets
            })
        };

        let mut sim = ScriptedSim::default();
        let summary = run_owner_loop(&mut sim, &dispatcher, &control, &mut NoOpCallback).unwrap();
        assert_eq!(caller.join().unwrap(), 3);
        assert_eq!(summary.steps, 0);
        assert_eq!(sim.steps, 0);
    }

    #[test]
    fn second_owner_is_rejected() {
        let dispatcher: Dispatcher<dyn Simulation> = Dispatcher::new();
        let other = dispatcher.clone();
        thread::spawn(move || other.bind_owner().unwrap())
            .join()
            .unwrap();
        let control = OwnerControl::new(0);
        let result = run_owner_loop(
            &mut ScriptedSim::default(),
            &dispatcher,
            &control,
            &mut NoOpCallback,
        );
        assert!(matches!(
            result,
            Err(RunnerError::Dispatch {
                source: DispatchError::AlreadyBound
            })
        ));
    }
}
