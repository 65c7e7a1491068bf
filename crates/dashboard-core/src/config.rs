//! Configuration loading and typed config structures for the dashboard.
//!
//! The configuration lives in a YAML file, `dashboard.yaml` by default.
//! Every section and field is optional; anything left out takes the
//! default documented on the field. A few values can be overridden from
//! the environment:
//!
//! - `DASHBOARD_HOST` overrides `server.host`
//! - `DASHBOARD_PORT` overrides `server.port`
//! - `DASHBOARD_STATIC_ROOT` overrides `server.static_root`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level dashboard configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DashboardConfig {
    /// Request server settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// Owner-thread call timeouts.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Cache capacities.
    #[serde(default)]
    pub caches: CacheConfig,

    /// Log endpoints.
    #[serde(default)]
    pub logs: LogsConfig,

    /// Demonstration simulation driven by the host binary.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl DashboardConfig {
    /// Load configuration from a YAML file and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Like [`DashboardConfig::from_file`], but a missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unreadable or malformed files.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::from_file(path);
        }
        info!(path = %path.display(), "Config file not found, using defaults");
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides read through `lookup`.
    ///
    /// An unparsable `DASHBOARD_PORT` is logged and ignored.
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("DASHBOARD_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("DASHBOARD_PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(e) => warn!(value = %port, error = %e, "Ignoring invalid DASHBOARD_PORT"),
            }
        }
        if let Some(root) = lookup("DASHBOARD_STATIC_ROOT") {
            self.server.static_root = PathBuf::from(root);
        }
    }
}

/// Request server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSettings {
    /// Whether the host starts the server at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Interface to bind. Loopback unless you mean it.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port; 0 picks an ephemeral port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served for non-API paths.
    #[serde(default = "default_static_root")]
    pub static_root: PathBuf,

    /// Value of the `Server` response header.
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// Largest accepted request line plus headers, in bytes.
    #[serde(default = "default_max_header_bytes")]
    pub max_header_bytes: usize,

    /// Largest request body drained before responding, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// How long a client has to send a complete request, in milliseconds.
    #[serde(default = "default_request_read_timeout_ms")]
    pub request_read_timeout_ms: u64,
}

impl ServerSettings {
    /// [`ServerSettings::request_read_timeout_ms`] as a [`Duration`].
    pub const fn request_read_timeout(&self) -> Duration {
        Duration::from_millis(self.request_read_timeout_ms)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            host: default_host(),
            port: default_port(),
            static_root: default_static_root(),
            server_name: default_server_name(),
            max_header_bytes: default_max_header_bytes(),
            max_body_bytes: default_max_body_bytes(),
            request_read_timeout_ms: default_request_read_timeout_ms(),
        }
    }
}

/// How long request handlers wait for the owner thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DispatchConfig {
    /// Reads of live state (player status).
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Actions that create or move objects, and preset listing.
    #[serde(default = "default_action_timeout_ms")]
    pub action_timeout_ms: u64,

    /// Map rendering calls.
    #[serde(default = "default_render_timeout_ms")]
    pub render_timeout_ms: u64,
}

impl DispatchConfig {
    /// Timeout for reads of live state.
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Timeout for mutating actions.
    pub const fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }

    /// Timeout for map rendering.
    pub const fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: default_read_timeout_ms(),
            action_timeout_ms: default_action_timeout_ms(),
            render_timeout_ms: default_render_timeout_ms(),
        }
    }
}

/// Cache capacities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CacheConfig {
    /// Deaths kept by the death log.
    #[serde(default = "default_death_log_capacity")]
    pub death_log_capacity: usize,

    /// Lines kept by the runtime log buffer.
    #[serde(default = "default_runtime_log_capacity")]
    pub runtime_log_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            death_log_capacity: default_death_log_capacity(),
            runtime_log_capacity: default_runtime_log_capacity(),
        }
    }
}

/// A log file that `GET /api/logs` may tail.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogFileConfig {
    /// Short name reported as `source`.
    pub label: String,
    /// File path.
    pub path: PathBuf,
}

/// Log endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogsConfig {
    /// Candidate files; the most recently modified existing one is read.
    #[serde(default = "default_log_files")]
    pub files: Vec<LogFileConfig>,

    /// Lines returned when `tail` is absent or invalid.
    #[serde(default = "default_tail")]
    pub default_tail: usize,

    /// Smallest accepted `tail`.
    #[serde(default = "default_min_tail")]
    pub min_tail: usize,

    /// Largest accepted `tail`.
    #[serde(default = "default_max_tail")]
    pub max_tail: usize,
}

impl LogsConfig {
    /// Resolve a requested tail length: default when absent, then clamped.
    pub fn tail_lines(&self, requested: Option<usize>) -> usize {
        let lo = self.min_tail.min(self.max_tail);
        requested
            .unwrap_or(self.default_tail)
            .clamp(lo, self.max_tail)
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            files: default_log_files(),
            default_tail: default_tail(),
            min_tail: default_min_tail(),
            max_tail: default_max_tail(),
        }
    }
}

/// Parameters of the host's demonstration simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Real-time milliseconds per owner-thread tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Number of citizens generated.
    #[serde(default = "default_citizen_count")]
    pub citizen_count: u32,

    /// Random seed.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            citizen_count: default_citizen_count(),
            seed: default_seed(),
        }
    }
}

const fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

const fn default_port() -> u16 {
    17856
}

fn default_static_root() -> PathBuf {
    PathBuf::from("wwwroot")
}

fn default_server_name() -> String {
    "SOD-Dashboard".to_owned()
}

const fn default_max_header_bytes() -> usize {
    16_384
}

const fn default_max_body_bytes() -> usize {
    65_536
}

const fn default_request_read_timeout_ms() -> u64 {
    5_000
}

const fn default_read_timeout_ms() -> u64 {
    5000
}

const fn default_action_timeout_ms() -> u64 {
    10_000
}

const fn default_render_timeout_ms() -> u64 {
    8000
}

const fn default_death_log_capacity() -> usize {
    crate::death_log::DEFAULT_DEATH_LOG_CAPACITY
}

const fn default_runtime_log_capacity() -> usize {
    crate::log_buffer::DEFAULT_RUNTIME_LOG_CAPACITY
}

fn default_log_files() -> Vec<LogFileConfig> {
    vec![LogFileConfig {
        label: "host".to_owned(),
        path: PathBuf::from("logs/dashboard.log"),
    }]
}

const fn default_tail() -> usize {
    500
}

const fn default_min_tail() -> usize {
    50
}

const fn default_max_tail() -> usize {
    5000
}

const fn default_tick_interval_ms() -> u64 {
    50
}

const fn default_citizen_count() -> u32 {
    120
}

const fn default_seed() -> u64 {
    7
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::collections::HashMap;

    use super::*;

    #[test]
    fn default_config_matches_documented_values() {
        let config = DashboardConfig::default();
        assert!(config.server.enabled);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 17856);
        assert_eq!(config.server.static_root, PathBuf::from("wwwroot"));
        assert_eq!(config.server.request_read_timeout(), Duration::from_secs(5));
        assert_eq!(config.dispatch.read_timeout(), Duration::from_secs(5));
        assert_eq!(config.dispatch.action_timeout(), Duration::from_secs(10));
        assert_eq!(config.dispatch.render_timeout(), Duration::from_secs(8));
        assert_eq!(config.caches.death_log_capacity, 50);
        assert_eq!(config.logs.default_tail, 500);
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = r"
server:
  port: 9000
logs:
  files:
    - label: game
      path: /tmp/game.log
  max_tail: 1000
";
        let config = DashboardConfig::parse(yaml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.request_read_timeout_ms, 5_000);
        assert_eq!(config.logs.files.len(), 1);
        assert_eq!(config.logs.max_tail, 1000);
        assert_eq!(config.logs.min_tail, 50);
        assert_eq!(config.dispatch, DispatchConfig::default());
    }

    #[test]
    fn empty_yaml_is_all_defaults() {
        let config = DashboardConfig::parse("{}").unwrap();
        assert_eq!(config, DashboardConfig::default());
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        let result = DashboardConfig::parse("server: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DASHBOARD_PORT", "18000"),
            ("DASHBOARD_HOST", "0.0.0.0"),
            ("DASHBOARD_STATIC_ROOT", "/srv/www"),
        ]);
        let mut config = DashboardConfig::default();
        config.apply_env_overrides_from(|k| env.get(k).map(|v| (*v).to_owned()));
        assert_eq!(config.server.port, 18000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.static_root, PathBuf::from("/srv/www"));
    }

    #[test]
    fn invalid_port_override_is_ignored() {
        let mut config = DashboardConfig::default();
        config.apply_env_overrides_from(|k| (k == "DASHBOARD_PORT").then(|| "http".to_owned()));
        assert_eq!(config.server.port, 17856);
    }

    #[test]
    fn tail_is_defaulted_and_clamped() {
        let logs = LogsConfig::default();
        assert_eq!(logs.tail_lines(None), 500);
        assert_eq!(logs.tail_lines(Some(3)), 50);
        assert_eq!(logs.tail_lines(Some(1_000_000)), 5000);
        assert_eq!(logs.tail_lines(Some(800)), 800);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig::load_or_default(&dir.path().join("nope.yaml")).unwrap();
        assert_eq!(config.server.server_name, "SOD-Dashboard");
    }
}
