//! Host binary for the dashboard control plane.
//!
//! Runs a generated demo city on a dedicated owner thread and serves the
//! dashboard over loopback HTTP. The owner thread is the only thread that
//! ever touches the simulation: the server reads snapshot caches, and
//! reaches the city itself only through the dispatcher.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `dashboard.yaml` (or the path given as the
//!    first argument, or `DASHBOARD_CONFIG`)
//! 2. Initialize structured logging: stdout, the host log file, and the
//!    in-memory runtime buffer served by `/api/runtime-logs`
//! 3. Create the snapshot caches and the dispatcher
//! 4. Spawn the owner thread running the demo city
//! 5. Start the dashboard server
//! 6. Wait for Ctrl-C, then stop the server and the owner thread

mod demo_city;
mod error;

use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;

use dashboard_core::caches::Caches;
use dashboard_core::config::{DashboardConfig, LogsConfig};
use dashboard_core::control::OwnerControl;
use dashboard_core::dispatcher::Dispatcher;
use dashboard_core::hooks::CacheSync;
use dashboard_core::log_buffer::{RuntimeLogBuffer, RuntimeLogLayer};
use dashboard_core::runner::run_owner_loop;
use dashboard_core::simulation::Simulation;
use dashboard_server::startup::spawn_dashboard;
use dashboard_server::state::AppState;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

use crate::demo_city::DemoCity;
use crate::error::HostError;

/// Config file used when neither an argument nor `DASHBOARD_CONFIG` names one.
const DEFAULT_CONFIG_PATH: &str = "dashboard.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, logging, the owner thread or the
/// server fails to start, or if the owner thread dies.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = config_path();
    let config = DashboardConfig::load_or_default(&config_path).map_err(HostError::from)?;

    // 2. Initialize structured logging.
    let runtime_logs = Arc::new(RuntimeLogBuffer::new(config.caches.runtime_log_capacity));
    let log_file = open_log_file(&config.logs)?;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(log_file.map(|file| {
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(file))
        }))
        .with(RuntimeLogLayer::new(Arc::clone(&runtime_logs)))
        .init();

    info!("dashboard-host starting");
    info!(
        config = %config_path.display(),
        host = config.server.host,
        port = config.server.port,
        static_root = %config.server.static_root.display(),
        tick_interval_ms = config.simulation.tick_interval_ms,
        citizen_count = config.simulation.citizen_count,
        "Configuration loaded"
    );

    // 3. Caches and dispatcher.
    let caches = Arc::new(Caches::new(config.caches.death_log_capacity));
    let dispatcher: Dispatcher<dyn Simulation> = Dispatcher::new();
    let control = Arc::new(OwnerControl::new(config.simulation.tick_interval_ms));

    // 4. Owner thread.
    let owner = {
        let dispatcher = dispatcher.clone();
        let control = Arc::clone(&control);
        let mut sync = CacheSync::new(Arc::clone(&caches));
        let sim_config = config.simulation;
        thread::Builder::new()
            .name(String::from("sim-owner"))
            .spawn(move || {
                let mut city = DemoCity::generate(&sim_config);
                run_owner_loop(&mut city, &dispatcher, &control, &mut sync)
            })
            .map_err(|e| HostError::OwnerThread {
                message: format!("spawn failed: {e}"),
            })?
    };
    info!("Owner thread started");

    // 5. Dashboard server.
    let state = Arc::new(AppState::new(caches, runtime_logs, dispatcher, &config));
    let server = spawn_dashboard(state).map_err(HostError::from)?;

    // 6. Run until interrupted.
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Ctrl-C handler unavailable, shutting down");
    }
    info!("Shutdown requested");

    if let Some(server) = server {
        server.stop().await;
    }
    control.request_stop();
    let joined = tokio::task::spawn_blocking(move || owner.join())
        .await
        .map_err(|e| HostError::OwnerThread {
            message: format!("join task failed: {e}"),
        })?;
    let summary = joined
        .map_err(|_panic| HostError::OwnerThread {
            message: String::from("owner thread panicked"),
        })?
        .map_err(HostError::from)?;

    info!(
        steps = summary.steps,
        tasks_run = summary.tasks_run,
        tasks_abandoned = summary.tasks_abandoned,
        ticks = control.ticks(),
        "dashboard-host shutdown complete"
    );

    Ok(())
}

/// First argument, then `DASHBOARD_CONFIG`, then [`DEFAULT_CONFIG_PATH`].
fn config_path() -> PathBuf {
    std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os("DASHBOARD_CONFIG"))
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Open the first configured log file for appending, creating its directory.
fn open_log_file(logs: &LogsConfig) -> Result<Option<File>, HostError> {
    let Some(target) = logs.files.first() else {
        return Ok(None);
    };
    if let Some(dir) = target.path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| HostError::LogFile {
            message: format!("cannot create {}: {e}", dir.display()),
        })?;
    }
    File::options()
        .create(true)
        .append(true)
        .open(&target.path)
        .map(Some)
        .map_err(|e| HostError::LogFile {
            message: format!("cannot open {}: {e}", target.path.display()),
        })
}
