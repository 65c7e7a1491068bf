//! Request routing.
//!
//! Routes are matched on decoded path segments rather than registered in
//! a table:
//! - `OPTIONS` anything -- CORS preflight
//! - `/api/...` -- JSON API ([`crate::handlers`], [`crate::actions`])
//! - everything else -- static files under the configured root
//!
//! API errors become JSON `{error, status}` bodies; static-file errors
//! become small HTML pages.

use crate::actions;
use crate::error::ApiError;
use crate::handlers::{self, ApiResult, require_get};
use crate::http::{Method, Request};
use crate::response::{Response, StatusCode};
use crate::state::AppState;
use crate::static_files;

/// Produce the response for one parsed request.
pub async fn route(state: &AppState, request: &Request) -> Response {
    if request.method == Method::Options {
        return Response::preflight();
    }
    if let Some(rest) = api_path(&request.path) {
        return api(state, request, rest)
            .await
            .unwrap_or_else(ApiError::into_response);
    }
    if !request.method.is_read() {
        return Response::html_error(
            StatusCode::METHOD_NOT_ALLOWED,
            "Only GET/HEAD/OPTIONS supported",
        );
    }
    static_files::serve(&state.settings.static_root, &request.path).await
}

fn api_path(path: &str) -> Option<&str> {
    if path == "/api" {
        return Some("");
    }
    path.strip_prefix("/api/")
}

async fn api(state: &AppState, request: &Request, rest: &str) -> ApiResult {
    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        ["health"] => {
            require_get(request)?;
            handlers::health(state)
        }
        ["info"] => {
            require_get(request)?;
            handlers::info(state)
        }
        ["game"] => {
            require_get(request)?;
            handlers::game(state)
        }
        ["npcs"] => {
            require_get(request)?;
            handlers::npcs(state)
        }
        ["npc", rest @ ..] => actions::npc(state, request, rest).await,
        ["addresses"] => {
            require_get(request)?;
            handlers::addresses(state)
        }
        ["address", id] => {
            require_get(request)?;
            handlers::address(state, id)
        }
        ["deaths"] => {
            require_get(request)?;
            handlers::deaths(state, &request.query)
        }
        ["murder"] => {
            require_get(request)?;
            handlers::murder(state)
        }
        ["logs"] => {
            require_get(request)?;
            handlers::log_file(state, &request.query).await
        }
        ["runtime-logs"] => {
            require_get(request)?;
            handlers::runtime_logs(state, &request.query)
        }
        ["player", rest @ ..] => actions::player(state, request, rest).await,
        ["map", rest @ ..] => actions::map(state, request, rest).await,
        _ => Err(ApiError::not_found("Unknown API endpoint")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_prefix_is_exact() {
        assert_eq!(api_path("/api/health"), Some("health"));
        assert_eq!(api_path("/api"), Some(""));
        assert_eq!(api_path("/apiary/index.html"), None);
        assert_eq!(api_path("/index.html"), None);
    }
}
