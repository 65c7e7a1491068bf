//! Response construction and manual HTTP/1.1 framing.
//!
//! Every response carries the same fixed header set: server identity,
//! permissive CORS, cache-disabling headers, content type and length,
//! and `Connection: close`. The connection is closed after one response.

use std::fmt::Write as _;
use std::io;
use std::path::Path;

use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// An HTTP status code with its reason phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(u16);

impl StatusCode {
    /// `200 OK`
    pub const OK: Self = Self(200);
    /// `204 No Content`
    pub const NO_CONTENT: Self = Self(204);
    /// `400 Bad Request`
    pub const BAD_REQUEST: Self = Self(400);
    /// `403 Forbidden`
    pub const FORBIDDEN: Self = Self(403);
    /// `404 Not Found`
    pub const NOT_FOUND: Self = Self(404);
    /// `405 Method Not Allowed`
    pub const METHOD_NOT_ALLOWED: Self = Self(405);
    /// `500 Internal Server Error`
    pub const INTERNAL_SERVER_ERROR: Self = Self(500);

    /// Numeric code.
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Reason phrase for the status line.
    pub const fn reason(self) -> &'static str {
        match self.0 {
            200 => "OK",
            204 => "No Content",
            400 => "Bad Request",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            500 => "Internal Server Error",
            _ => "Unknown",
        }
    }
}

/// Response payload.
#[derive(Debug)]
pub enum Body {
    /// No body.
    Empty,
    /// In-memory bytes.
    Bytes(Vec<u8>),
    /// A file streamed from disk.
    File {
        /// Open file handle.
        file: tokio::fs::File,
        /// File length in bytes.
        len: u64,
    },
}

impl Body {
    /// Length sent as `Content-Length`.
    pub fn len(&self) -> u64 {
        match self {
            Self::Empty => 0,
            Self::Bytes(bytes) => u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            Self::File { len, .. } => *len,
        }
    }

    /// Whether the body is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A response waiting to be written.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    content_type: Option<&'static str>,
    headers: Vec<(&'static str, String)>,
    body: Body,
}

/// Content type of JSON bodies.
pub const JSON: &str = "application/json; charset=utf-8";
/// Content type of HTML bodies.
pub const HTML: &str = "text/html; charset=utf-8";
/// Content type of plain text bodies.
pub const TEXT: &str = "text/plain; charset=utf-8";
/// Content type of PNG images.
pub const PNG: &str = "image/png";

impl Response {
    /// A response with `body` of `content_type`.
    pub const fn new(status: StatusCode, content_type: &'static str, body: Body) -> Self {
        Self {
            status,
            content_type: Some(content_type),
            headers: Vec::new(),
            body,
        }
    }

    /// Serialize `value` as a JSON response.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error.
    pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(status, JSON, Body::Bytes(serde_json::to_vec(value)?)))
    }

    /// A plain text response.
    pub fn text(status: StatusCode, text: String) -> Self {
        Self::new(status, TEXT, Body::Bytes(text.into_bytes()))
    }

    /// Raw PNG bytes.
    pub const fn png(bytes: Vec<u8>) -> Self {
        Self::new(StatusCode::OK, PNG, Body::Bytes(bytes))
    }

    /// A file streamed from disk.
    pub const fn file(file: tokio::fs::File, len: u64, content_type: &'static str) -> Self {
        Self::new(StatusCode::OK, content_type, Body::File { file, len })
    }

    /// Minimal HTML error page.
    pub fn html_error(status: StatusCode, message: &str) -> Self {
        let page = format!(
            "<html><head><meta charset=\"utf-8\"></head><body><h1>{} {}</h1><p>{}</p></body></html>",
            status.as_u16(),
            status.reason(),
            escape_html(message),
        );
        Self::new(status, HTML, Body::Bytes(page.into_bytes()))
    }

    /// `204` answer to a CORS preflight.
    pub fn preflight() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            content_type: None,
            headers: vec![
                ("Access-Control-Allow-Methods", String::from("GET, HEAD, OPTIONS, POST")),
                ("Access-Control-Allow-Headers", String::from("Content-Type")),
                ("Access-Control-Max-Age", String::from("600")),
            ],
            body: Body::Empty,
        }
    }

    /// Status of this response.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Content type, if any.
    pub const fn content_type(&self) -> Option<&'static str> {
        self.content_type
    }

    /// Body bytes, when held in memory.
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.body {
            Body::Bytes(bytes) => Some(bytes),
            Body::Empty | Body::File { .. } => None,
        }
    }

    fn head(&self, server_name: &str) -> String {
        let mut head = String::with_capacity(320);
        let _ = write!(
            head,
            "HTTP/1.1 {} {}\r\n\
             Server: {server_name}\r\n\
             Access-Control-Allow-Origin: *\r\n\
             Cache-Control: no-cache, no-store, must-revalidate\r\n\
             Pragma: no-cache\r\n\
             Expires: 0\r\n",
            self.status.as_u16(),
            self.status.reason(),
        );
        for (name, value) in &self.headers {
            let _ = write!(head, "{name}: {value}\r\n");
        }
        if let Some(content_type) = self.content_type {
            let _ = write!(head, "Content-Type: {content_type}\r\n");
        }
        let _ = write!(
            head,
            "Content-Length: {}\r\nConnection: close\r\n\r\n",
            self.body.len()
        );
        head
    }

    /// Write the status line, headers and, unless `head_only`, the body.
    ///
    /// # Errors
    ///
    /// Returns any write error from `out`.
    pub async fn write_to<W>(self, out: &mut W, server_name: &str, head_only: bool) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        out.write_all(self.head(server_name).as_bytes()).await?;
        if !head_only {
            match self.body {
                Body::Empty => {}
                Body::Bytes(bytes) => out.write_all(&bytes).await?,
                Body::File { mut file, .. } => {
                    tokio::io::copy(&mut file, out).await?;
                }
            }
        }
        out.flush().await
    }
}

/// Escape text for inclusion in HTML.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Content type for a file, chosen by extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => HTML,
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript; charset=utf-8",
        "json" => JSON,
        "svg" => "image/svg+xml",
        "png" => PNG,
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    async fn render(response: Response, head_only: bool) -> String {
        let mut out = Vec::new();
        response
            .write_to(&mut out, "SOD-Dashboard", head_only)
            .await
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn json_framing() {
        let response = Response::json(StatusCode::OK, &serde_json::json!({"a": 1})).unwrap();
        let text = render(response, false).await;
        assert!(text.starts_with("HTTP/1.1 200 OK\r\nServer: SOD-Dashboard\r\n"));
        assert!(text.contains("Access-Control-Allow-Origin: *\r\n"));
        assert!(text.contains("Cache-Control: no-cache, no-store, must-revalidate\r\n"));
        assert!(text.contains("Pragma: no-cache\r\nExpires: 0\r\n"));
        assert!(text.contains("Content-Type: application/json; charset=utf-8\r\n"));
        assert!(text.contains("Content-Length: 7\r\nConnection: close\r\n\r\n"));
        assert!(text.ends_with("{\"a\":1}"));
    }

    #[tokio::test]
    async fn head_only_keeps_length() {
        let response = Response::text(StatusCode::OK, String::from("hello"));
        let text = render(response, true).await;
        assert!(text.contains("Content-Length: 5\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[tokio::test]
    async fn preflight_has_cors_and_no_body() {
        let text = render(Response::preflight(), false).await;
        assert!(text.starts_with("HTTP/1.1 204 No Content\r\n"));
        assert!(text.contains("Access-Control-Allow-Methods: GET, HEAD, OPTIONS, POST\r\n"));
        assert!(text.contains("Access-Control-Allow-Headers: Content-Type\r\n"));
        assert!(text.contains("Access-Control-Max-Age: 600\r\n"));
        assert!(!text.contains("Content-Type:"));
        assert!(text.contains("Content-Length: 0\r\n"));
    }

    #[test]
    fn error_page_escapes_message() {
        let response = Response::html_error(StatusCode::FORBIDDEN, "<b>nope</b>");
        let body = String::from_utf8(response.bytes().unwrap().to_vec()).unwrap();
        assert_eq!(
            body,
            "<html><head><meta charset=\"utf-8\"></head><body><h1>403 Forbidden</h1>\
             <p>&lt;b&gt;nope&lt;/b&gt;</p></body></html>"
        );
    }

    #[test]
    fn content_types_by_extension() {
        assert_eq!(content_type_for(Path::new("index.HTML")), HTML);
        assert_eq!(content_type_for(Path::new("app.js")), "application/javascript; charset=utf-8");
        assert_eq!(content_type_for(Path::new("font.woff2")), "font/woff2");
        assert_eq!(content_type_for(Path::new("photo.jpeg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("README")), "application/octet-stream");
    }
}
