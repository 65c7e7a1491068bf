//! Reading one HTTP/1.1 request off a connection.
//!
//! Parsing is by hand and single-pass: a request line of exactly
//! method, target and an `HTTP/` version, headers up to a blank line,
//! then a `Content-Length` body if one is declared. The
//! request line and headers together are bounded by
//! [`Limits::max_header_bytes`].

use std::fmt;
use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::query::{Query, percent_decode};

/// Errors that can occur while reading a request.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The connection failed or closed mid-request.
    #[error("connection error: {0}")]
    Io(#[from] io::Error),

    /// The request is not valid HTTP.
    #[error("{0}")]
    BadRequest(&'static str),
}

/// Request method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `HEAD`
    Head,
    /// `POST`
    Post,
    /// `OPTIONS`
    Options,
    /// Anything else, upper-cased.
    Other(String),
}

impl Method {
    /// Parse a method token, ignoring ASCII case.
    pub fn parse(token: &str) -> Self {
        match token.to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "HEAD" => Self::Head,
            "POST" => Self::Post,
            "OPTIONS" => Self::Options,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Whether this is `GET` or `HEAD`.
    pub const fn is_read(&self) -> bool {
        matches!(self, Self::Get | Self::Head)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Head => f.write_str("HEAD"),
            Self::Post => f.write_str("POST"),
            Self::Options => f.write_str("OPTIONS"),
            Self::Other(token) => f.write_str(token),
        }
    }
}

/// Size limits applied while reading a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Request line plus headers, in bytes.
    pub max_header_bytes: usize,
    /// Declared body length, in bytes.
    pub max_body_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_header_bytes: 16_384,
            max_body_bytes: 65_536,
        }
    }
}

/// One parsed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Method.
    pub method: Method,
    /// Raw request target as sent.
    pub target: String,
    /// Percent-decoded path, without the query.
    pub path: String,
    /// Parsed query string.
    pub query: Query,
    /// Protocol version token.
    pub version: String,
    /// Headers in arrival order.
    pub headers: Vec<(String, String)>,
    /// Body bytes.
    pub body: Vec<u8>,
}

impl Request {
    /// First value of header `name`, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn too_large(line: &str, remaining: u64) -> bool {
    remaining == 0 && !line.ends_with('\n')
}

fn io_to_http(e: io::Error) -> HttpError {
    if e.kind() == io::ErrorKind::InvalidData {
        HttpError::BadRequest("Request is not valid UTF-8")
    } else {
        HttpError::Io(e)
    }
}

/// Read one request from `reader`.
///
/// Returns `Ok(None)` when the peer sends nothing or a blank request
/// line; such connections are closed without a response.
///
/// # Errors
///
/// - [`HttpError::BadRequest`] for a malformed request line or header,
///   oversized headers or body, or a bad `Content-Length`
/// - [`HttpError::Io`] if the connection fails
pub async fn read_request<R>(reader: &mut R, limits: Limits) -> Result<Option<Request>, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    let budget = u64::try_from(limits.max_header_bytes).unwrap_or(u64::MAX);
    let mut head = (&mut *reader).take(budget);
    let mut line = String::new();

    head.read_line(&mut line).await.map_err(io_to_http)?;
    if too_large(&line, head.limit()) {
        return Err(HttpError::BadRequest("Request header too large"));
    }
    let request_line = line.trim();
    if request_line.is_empty() {
        return Ok(None);
    }
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(HttpError::BadRequest("Invalid request line"));
    };
    if !version.starts_with("HTTP/") {
        return Err(HttpError::BadRequest("Invalid request line"));
    }
    let method = Method::parse(method);
    let target = target.to_owned();
    let version = version.to_owned();

    let mut headers = Vec::new();
    loop {
        line.clear();
        let read = head.read_line(&mut line).await.map_err(io_to_http)?;
        if too_large(&line, head.limit()) {
            return Err(HttpError::BadRequest("Request header too large"));
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if read == 0 || trimmed.is_empty() {
            break;
        }
        let Some((name, value)) = trimmed.split_once(':') else {
            return Err(HttpError::BadRequest("Malformed header line"));
        };
        headers.push((name.trim().to_owned(), value.trim().to_owned()));
    }

    let length = match headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
    {
        Some((_, value)) => value
            .parse::<usize>()
            .map_err(|_invalid| HttpError::BadRequest("Invalid Content-Length"))?,
        None => 0,
    };
    if length > limits.max_body_bytes {
        return Err(HttpError::BadRequest("Request body too large"));
    }
    let mut body = vec![0_u8; length];
    reader.read_exact(&mut body).await?;

    let (raw_path, raw_query) = target.split_once('?').unwrap_or((target.as_str(), ""));
    let path = percent_decode(raw_path);
    let query = Query::parse(raw_query);
    Ok(Some(Request {
        method,
        target,
        path,
        query,
        version,
        headers,
        body,
    }))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    async fn parse(raw: &str) -> Result<Option<Request>, HttpError> {
        let mut bytes = raw.as_bytes();
        read_request(&mut bytes, Limits::default()).await
    }

    #[tokio::test]
    async fn parses_request_line_headers_and_query() {
        let request = parse("get /api/player/spawn-item?preset=Hot%20Dog HTTP/1.1\r\nHost: x\r\nX-Thing:  a:b \r\n\r\n")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.path, "/api/player/spawn-item");
        assert_eq!(request.query.get("preset"), Some("Hot Dog"));
        assert_eq!(request.version, "HTTP/1.1");
        assert_eq!(request.header("host"), Some("x"));
        assert_eq!(request.header("x-thing"), Some("a:b"));
    }

    #[tokio::test]
    async fn path_is_percent_decoded() {
        let request = parse("GET /%2e%2e/secret HTTP/1.1\r\n\r\n").await.unwrap().unwrap();
        assert_eq!(request.path, "/../secret");
        assert_eq!(request.target, "/%2e%2e/secret");
    }

    #[tokio::test]
    async fn blank_request_is_none() {
        assert!(parse("").await.unwrap().is_none());
        assert!(parse("\r\n").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn short_request_line_is_rejected() {
        let err = parse("GET /\r\n\r\n").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid request line");
    }

    #[tokio::test]
    async fn version_must_be_http_and_last() {
        for line in ["GET / banana", "GET / HTTP/1.1 extra", "GET / http"] {
            let err = parse(&format!("{line}\r\n\r\n")).await.unwrap_err();
            assert!(
                matches!(err, HttpError::BadRequest("Invalid request line")),
                "{line}"
            );
        }
        assert!(parse("GET / HTTP/1.0\r\n\r\n").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn budget_ending_on_line_boundary_is_too_large() {
        // Request line (16 bytes) and one header (9 bytes) use the whole budget.
        let raw = "GET / HTTP/1.1\r\nHost: x\r\nX-More: y\r\n\r\n";
        let limits = Limits {
            max_header_bytes: 25,
            ..Limits::default()
        };
        let mut bytes = raw.as_bytes();
        let err = read_request(&mut bytes, limits).await.unwrap_err();
        assert!(matches!(err, HttpError::BadRequest("Request header too large")));
    }

    #[tokio::test]
    async fn header_without_colon_is_rejected() {
        let err = parse("GET / HTTP/1.1\r\nnonsense\r\n\r\n").await.unwrap_err();
        assert!(matches!(err, HttpError::BadRequest("Malformed header line")));
    }

    #[tokio::test]
    async fn body_is_read_by_length() {
        let request = parse("POST /api/x HTTP/1.1\r\nContent-Length: 4\r\n\r\nabcdEXTRA")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(request.body, b"abcd");
    }

    #[tokio::test]
    async fn oversized_headers_are_rejected() {
        let raw = format!("GET / HTTP/1.1\r\nX-Big: {}\r\n\r\n", "a".repeat(20_000));
        let err = parse(&raw).await.unwrap_err();
        assert!(matches!(err, HttpError::BadRequest("Request header too large")));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let err = parse("POST / HTTP/1.1\r\nContent-Length: 999999\r\n\r\n")
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::BadRequest("Request body too large")));
    }

    #[test]
    fn method_parsing() {
        assert_eq!(Method::parse("options"), Method::Options);
        assert_eq!(Method::parse("PUT"), Method::Other(String::from("PUT")));
        assert!(Method::Head.is_read());
        assert!(!Method::Post.is_read());
    }
}
