//! Endpoints that run on the owner thread.
//!
//! Each handler body is a closure handed to the dispatcher with a
//! timeout suited to the call. Failures never surface as transport
//! errors: NPC and player actions answer `{success, message}`, reads and
//! map calls answer `{ok: false, message}`.
//!
//! # Endpoints
//!
//! | Method | Path | Timeout |
//! |--------|------|---------|
//! | `POST` | `/api/npc/{id}/teleport-player` | action |
//! | `POST` | `/api/npc/{id}/teleport-npc` | action |
//! | `GET` | `/api/player/status` | read |
//! | `GET` | `/api/player/presets` | action |
//! | `POST` | `/api/player/spawn-item?preset=NAME` | action |
//! | `POST` | `/api/player/spawn-default` | action |
//! | `GET` | `/api/map/capture?ord&w&h&mb` | render |
//! | `GET` | `/api/map/capture64?ord&w&h&mb` | render |
//! | `GET` | `/api/map/layers` | render |
//! | `POST` | `/api/map/activate?index=N` | render |

use dashboard_core::actions::{self, MapRequest};
use dashboard_core::dispatcher::DispatchError;
use dashboard_core::extract::png_data_url;
use dashboard_core::simulation::ActionError;
use dashboard_types::{ActionOutcome, MapCapture, ReadFailure};
use tracing::warn;

use crate::error::ApiError;
use crate::handlers::{self, ApiResult, parse_id, require_get, require_post};
use crate::http::{Method, Request};
use crate::response::{Response, StatusCode};
use crate::state::AppState;

const MAP_CAPTURE_FAILED: &str = "Failed to capture minimap";
const MAP_UNAVAILABLE: &str = "Map unavailable";

fn action_status(error: &ActionError) -> StatusCode {
    match error {
        ActionError::NpcNotFound => StatusCode::NOT_FOUND,
        ActionError::PlayerUnavailable
        | ActionError::PresetNotFound(_)
        | ActionError::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Map an action's result to `{success, message}`.
fn action_response(
    what: &'static str,
    outcome: Result<Result<String, ActionError>, DispatchError>,
) -> ApiResult {
    let (status, body) = match outcome {
        Ok(Ok(message)) => (StatusCode::OK, ActionOutcome::succeeded(message)),
        Ok(Err(e)) => (action_status(&e), ActionOutcome::failed(e.to_string())),
        Err(e) => {
            warn!(action = what, error = %e, "Owner-thread action failed");
            (StatusCode::INTERNAL_SERVER_ERROR, ActionOutcome::failed(e.to_string()))
        }
    };
    Ok(Response::json(status, &body)?)
}

fn read_failure(message: impl Into<String>) -> ApiResult {
    Ok(Response::json(
        StatusCode::INTERNAL_SERVER_ERROR,
        &ReadFailure::new(message),
    )?)
}

fn dispatch_failure(what: &'static str, error: &DispatchError, message: &str) -> ApiResult {
    warn!(call = what, error = %error, "Owner-thread call failed");
    read_failure(message)
}

// ---------------------------------------------------------------------------
// /api/npc/...
// ---------------------------------------------------------------------------

/// `/api/npc/{id}` reads and `/api/npc/{id}/{action}` actions.
pub async fn npc(state: &AppState, request: &Request, rest: &[&str]) -> ApiResult {
    if let [id] = rest {
        if request.method.is_read() {
            return handlers::npc(state, id);
        }
    }
    if request.method != Method::Post {
        return Err(ApiError::method_not_allowed("Use POST for NPC actions"));
    }
    let [id, action, ..] = rest else {
        return Err(ApiError::bad_request(
            "NPC action requires /api/npc/{id}/{action}",
        ));
    };
    let id = parse_id(id, "Invalid NPC id")?;
    let timeout = state.dispatch.action_timeout();
    let outcome = match *action {
        "teleport-player" => {
            state
                .dispatcher
                .run(move |sim| actions::teleport_player(sim, id), timeout)
                .await
        }
        "teleport-npc" => {
            state
                .dispatcher
                .run(move |sim| actions::teleport_npc(sim, id), timeout)
                .await
        }
        _ => return Err(ApiError::not_found("Unknown NPC action")),
    };
    action_response("teleport", outcome)
}

// ---------------------------------------------------------------------------
// /api/player/...
// ---------------------------------------------------------------------------

/// `/api/player/{endpoint}`
pub async fn player(state: &AppState, request: &Request, rest: &[&str]) -> ApiResult {
    let dispatcher = &state.dispatcher;
    match rest {
        ["status"] => {
            require_get(request)?;
            let result = dispatcher
                .run(|sim| actions::player_status(sim), state.dispatch.read_timeout())
                .await;
            match result {
                Ok(Ok(status)) => Ok(Response::json(StatusCode::OK, &status)?),
                Ok(Err(e)) => read_failure(e.to_string()),
                Err(e) => dispatch_failure("player status", &e, &e.to_string()),
            }
        }
        ["presets"] => {
            require_get(request)?;
            let result = dispatcher
                .run(|sim| actions::sorted_presets(sim), state.dispatch.action_timeout())
                .await;
            match result {
                Ok(presets) => Ok(Response::json(StatusCode::OK, &presets)?),
                Err(e) => dispatch_failure("presets", &e, &e.to_string()),
            }
        }
        ["spawn-item"] => {
            require_post(request)?;
            let Some(preset) = request
                .query
                .get("preset")
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_owned)
            else {
                return Ok(Response::json(
                    StatusCode::BAD_REQUEST,
                    &ActionOutcome::failed("Missing preset parameter"),
                )?);
            };
            let outcome = dispatcher
                .run(
                    move |sim| actions::spawn_item(sim, &preset),
                    state.dispatch.action_timeout(),
                )
                .await;
            action_response("spawn item", outcome)
        }
        ["spawn-default"] => {
            require_post(request)?;
            let outcome = dispatcher
                .run(|sim| actions::spawn_default(sim), state.dispatch.action_timeout())
                .await;
            action_response("spawn default", outcome)
        }
        _ => Err(ApiError::not_found("Unknown player API endpoint")),
    }
}

// ---------------------------------------------------------------------------
// /api/map/...
// ---------------------------------------------------------------------------

fn map_request(request: &Request) -> MapRequest {
    let query = &request.query;
    MapRequest::new(
        query.parsed("ord"),
        query.parsed("w"),
        query.parsed("h"),
        query.flag("mb"),
    )
}

/// `/api/map/{endpoint}`
pub async fn map(state: &AppState, request: &Request, rest: &[&str]) -> ApiResult {
    let dispatcher = &state.dispatcher;
    let timeout = state.dispatch.render_timeout();
    match rest {
        [kind @ ("capture" | "capture64")] => {
            require_get(request)?;
            let map = map_request(request);
            let result = dispatcher
                .run(move |sim| actions::capture_map(sim, map), timeout)
                .await;
            let png = match result {
                Ok(Some(png)) => png,
                Ok(None) => return read_failure(MAP_CAPTURE_FAILED),
                Err(e) => return dispatch_failure("map capture", &e, MAP_CAPTURE_FAILED),
            };
            if *kind == "capture" {
                return Ok(Response::png(png));
            }
            let body = MapCapture {
                ok: true,
                ordinal: map.ordinal,
                w: map.width,
                h: map.height,
                data_url: png_data_url(&png),
            };
            Ok(Response::json(StatusCode::OK, &body)?)
        }
        ["layers"] => {
            require_get(request)?;
            let result = dispatcher
                .run(|sim| actions::map_layers(sim), timeout)
                .await;
            match result {
                Ok(Some(layers)) => Ok(Response::json(StatusCode::OK, &layers)?),
                Ok(None) => read_failure(MAP_UNAVAILABLE),
                Err(e) => dispatch_failure("map layers", &e, MAP_UNAVAILABLE),
            }
        }
        ["activate"] => {
            require_post(request)?;
            let Some(index) = request.query.parsed::<i32>("index") else {
                return Ok(Response::json(
                    StatusCode::BAD_REQUEST,
                    &ReadFailure::new("Missing index parameter"),
                )?);
            };
            let result = dispatcher
                .run(move |sim| actions::activate_map_layer(sim, index), timeout)
                .await;
            match result {
                Ok(Some(active)) => Ok(Response::json(StatusCode::OK, &active)?),
                Ok(None) => read_failure(MAP_UNAVAILABLE),
                Err(e) => dispatch_failure("map activate", &e, MAP_UNAVAILABLE),
            }
        }
        _ => Err(ApiError::not_found("Unknown API endpoint")),
    }
}
