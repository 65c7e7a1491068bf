//! Serving the static front end with traversal protection.
//!
//! A request path is first checked lexically: `..` segments, backslashes,
//! drive separators, NUL bytes and `//` prefixes are refused outright.
//! The surviving path is then joined to the canonical root, canonicalized
//! again, and must still lie under the root, which also catches symlinks
//! pointing outside it.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::response::{Response, StatusCode, content_type_for};

/// File served for `/` and for directory paths.
pub const INDEX_FILE: &str = "index.html";

/// Why a static path could not be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StaticError {
    /// The path escapes, or tries to escape, the root.
    #[error("Access denied")]
    Forbidden,

    /// Nothing exists at the path.
    #[error("File not found")]
    NotFound,
}

impl StaticError {
    /// HTTP status for this error.
    pub const fn status(self) -> StatusCode {
        match self {
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

/// Turn a decoded request path into a path relative to the root.
///
/// # Errors
///
/// [`StaticError::Forbidden`] for anything that could address a file
/// outside the root.
pub fn relative_path(request_path: &str) -> Result<PathBuf, StaticError> {
    if request_path.starts_with("//")
        || request_path.contains(['\\', '\0', ':'])
    {
        return Err(StaticError::Forbidden);
    }
    let mut relative = PathBuf::new();
    for segment in request_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Err(StaticError::Forbidden),
            name => relative.push(name),
        }
    }
    if relative.as_os_str().is_empty() {
        relative.push(INDEX_FILE);
    }
    Ok(relative)
}

/// Resolve `request_path` to a canonical file path under `root`.
///
/// # Errors
///
/// - [`StaticError::Forbidden`] if the path escapes the root
/// - [`StaticError::NotFound`] if the root or the file does not exist
pub async fn resolve(root: &Path, request_path: &str) -> Result<PathBuf, StaticError> {
    let relative = relative_path(request_path)?;
    let root = tokio::fs::canonicalize(root)
        .await
        .map_err(|_missing| StaticError::NotFound)?;
    let mut candidate = root.join(relative);
    if tokio::fs::metadata(&candidate)
        .await
        .is_ok_and(|meta| meta.is_dir())
    {
        candidate.push(INDEX_FILE);
    }
    let resolved = tokio::fs::canonicalize(&candidate)
        .await
        .map_err(|_missing| StaticError::NotFound)?;
    if !resolved.starts_with(&root) {
        return Err(StaticError::Forbidden);
    }
    Ok(resolved)
}

/// Serve `request_path` from `root`, as an HTML error page on failure.
pub async fn serve(root: &Path, request_path: &str) -> Response {
    let path = match resolve(root, request_path).await {
        Ok(path) => path,
        Err(e) => {
            debug!(path = request_path, error = %e, "Static request refused");
            return Response::html_error(e.status(), &e.to_string());
        }
    };
    let opened = match tokio::fs::File::open(&path).await {
        Ok(file) => file.metadata().await.map(|meta| (file, meta)),
        Err(e) => Err(e),
    };
    match opened {
        Ok((file, meta)) if meta.is_file() => {
            Response::file(file, meta.len(), content_type_for(&path))
        }
        Ok(_) => Response::html_error(StatusCode::NOT_FOUND, "File not found"),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Static file unreadable");
            Response::html_error(StatusCode::NOT_FOUND, "File not found")
        }
    }
}
