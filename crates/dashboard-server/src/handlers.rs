//! Cache-read and log endpoints.
//!
//! None of these touch the owner thread: they copy a snapshot out of a
//! cache, or read a file, and serialize it.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/health` | Liveness, port and server time |
//! | `GET` | `/api/info` | Server name and version |
//! | `GET` | `/api/game` | Session metadata |
//! | `GET` | `/api/npcs` | All citizens, by name |
//! | `GET` | `/api/npc/{id}` | One citizen |
//! | `GET` | `/api/addresses` | All addresses, summarized |
//! | `GET` | `/api/address/{id}` | One address with residents |
//! | `GET` | `/api/deaths?count=N` | Recent deaths, newest first |
//! | `GET` | `/api/murder` | Current murderer and victim |
//! | `GET` | `/api/logs?tail=N` | Tail of the newest log file |
//! | `GET` | `/api/runtime-logs?tail=N` | Tail of the in-memory log |

use chrono::Local;
use dashboard_core::log_tail;
use dashboard_types::{DeathList, HealthReport, InfoReport, RuntimeLogTail};
use tracing::warn;

use crate::error::ApiError;
use crate::http::{Method, Request};
use crate::query::Query;
use crate::response::{Response, StatusCode};
use crate::state::AppState;

/// Result type of every API handler.
pub type ApiResult = Result<Response, ApiError>;

/// Deaths returned when `count` is absent.
pub const DEFAULT_DEATH_COUNT: usize = 10;

/// Refuse anything but `GET` and `HEAD`.
pub(crate) fn require_get(request: &Request) -> Result<(), ApiError> {
    if request.method.is_read() {
        Ok(())
    } else {
        Err(ApiError::method_not_allowed("Use GET for this endpoint"))
    }
}

/// Refuse anything but `POST`.
pub(crate) fn require_post(request: &Request) -> Result<(), ApiError> {
    if request.method == Method::Post {
        Ok(())
    } else {
        Err(ApiError::method_not_allowed("Use POST for this endpoint"))
    }
}

/// Parse an entity id path segment.
pub(crate) fn parse_id(segment: &str, invalid: &'static str) -> Result<i32, ApiError> {
    segment
        .trim()
        .parse()
        .map_err(|_invalid| ApiError::bad_request(invalid))
}

/// `GET /api/health`
pub fn health(state: &AppState) -> ApiResult {
    let report = HealthReport {
        status: String::from("ok"),
        port: state.port(),
        time: Local::now().to_rfc3339(),
    };
    Ok(Response::json(StatusCode::OK, &report)?)
}

/// `GET /api/info`
pub fn info(state: &AppState) -> ApiResult {
    let report = InfoReport {
        name: state.settings.server_name.clone(),
        version: String::from(env!("CARGO_PKG_VERSION")),
    };
    Ok(Response::json(StatusCode::OK, &report)?)
}

/// `GET /api/game`
pub fn game(state: &AppState) -> ApiResult {
    Ok(Response::json(StatusCode::OK, &state.caches.game.snapshot())?)
}

/// `GET /api/npcs`
pub fn npcs(state: &AppState) -> ApiResult {
    Ok(Response::json(StatusCode::OK, &state.caches.npcs.sorted_by_name())?)
}

/// `GET /api/npc/{id}`
pub fn npc(state: &AppState, id: &str) -> ApiResult {
    let id = parse_id(id, "Invalid NPC id")?;
    let record = state
        .caches
        .npcs
        .get(id)
        .ok_or_else(|| ApiError::not_found("NPC not found"))?;
    Ok(Response::json(StatusCode::OK, &record)?)
}

/// `GET /api/addresses`
pub fn addresses(state: &AppState) -> ApiResult {
    Ok(Response::json(StatusCode::OK, &state.caches.addresses.summaries())?)
}

/// `GET /api/address/{id}`
pub fn address(state: &AppState, id: &str) -> ApiResult {
    let id = parse_id(id, "Invalid address id")?;
    let record = state
        .caches
        .addresses
        .get(id)
        .ok_or_else(|| ApiError::not_found("Address not found"))?;
    Ok(Response::json(StatusCode::OK, &record)?)
}

/// `GET /api/deaths?count=N`, count clamped to the log capacity.
pub fn deaths(state: &AppState, query: &Query) -> ApiResult {
    let log = &state.caches.deaths;
    let count = query
        .parsed::<usize>("count")
        .unwrap_or(DEFAULT_DEATH_COUNT)
        .clamp(1, log.capacity());
    let body = DeathList {
        total: log.total(),
        deaths: log.recent(count),
    };
    Ok(Response::json(StatusCode::OK, &body)?)
}

/// `GET /api/murder`
pub fn murder(state: &AppState) -> ApiResult {
    Ok(Response::json(StatusCode::OK, &state.caches.murder.current())?)
}

/// `GET /api/runtime-logs?tail=N`
pub fn runtime_logs(state: &AppState, query: &Query) -> ApiResult {
    let lines = state.logs.tail_lines(query.parsed("tail"));
    let entries = state.runtime_logs.tail(lines);
    let body = RuntimeLogTail {
        source: String::from("runtime"),
        count: entries.len(),
        entries,
    };
    Ok(Response::json(StatusCode::OK, &body)?)
}

/// `GET /api/logs?tail=N`
///
/// File reads run on the blocking pool.
pub async fn log_file(state: &AppState, query: &Query) -> ApiResult {
    let lines = state.logs.tail_lines(query.parsed("tail"));
    let files = state.logs.files.clone();
    let report = tokio::task::spawn_blocking(move || log_tail::read_latest(&files, lines))
        .await
        .map_err(|e| ApiError::Internal(format!("Log reader failed: {e}")))?
        .map_err(|e| {
            warn!(error = %e, "Log file unreadable");
            ApiError::Internal(format!("Failed to read log file: {e}"))
        })?;
    Ok(Response::json(StatusCode::OK, &report)?)
}
