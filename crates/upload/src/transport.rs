//! Transport seam: one HTTP request in, one reduced response out.
//!
//! The upload core never touches sockets. It builds [`Request`] values and
//! hands them to a [`Transport`], which `covesync-client` implements on
//! reqwest and tests implement with scripted responses.

use std::future::Future;
use std::pin::Pin;

use covesync_protocol::types::ErrorBody;
use tracing::debug;

use crate::error::ClientError;

/// HTTP method of a [`Request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// A single API request.
///
/// `path` is appended to the transport's base URL. Headers are ordered and
/// repeatable: `If-Match` appears once per asserted version.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Appends a header (names may repeat).
    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// First value of `name`, if present.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A response reduced to the status, the body, and the headers this protocol
/// reads (`Upload-ID`, `Range`, `ETag`).
#[derive(Debug, Clone, Default)]
pub struct Response {
    pub status: u16,
    pub upload_id: Option<String>,
    pub range: Option<String>,
    pub etag: Option<String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Abstract request executor.
///
/// Implementations map network-level failures (connect, TLS, timeout) to
/// [`ClientError::Transport`] and never interpret status codes; status
/// interpretation belongs to the protocol layer.
pub trait Transport: Send + Sync {
    /// Executes a single request and waits for the response.
    fn execute(
        &self,
        req: Request,
    ) -> Pin<Box<dyn Future<Output = Result<Response, ClientError>> + Send + '_>>;
}

/// Maps a non-2xx response to the error taxonomy.
///
/// `id_bearing` marks requests that carried an `Upload-ID`: only those can
/// observe session expiry as 404/410. A 5xx leaves the write outcome as
/// unknown as a dropped connection does, so it maps to `Transport`.
pub fn status_error(resp: &Response, id_bearing: bool) -> ClientError {
    if let Some(err) = ErrorBody::from_slice(&resp.body) {
        debug!(status = resp.status, kind = %err.kind, message = %err.message, "API error body");
    }

    match resp.status {
        412 | 409 => ClientError::VersionConflict {
            status: resp.status,
        },
        404 | 410 if id_bearing => ClientError::UploadExpired {
            status: resp.status,
        },
        500..=599 => ClientError::Transport(format!("HTTP {}", resp.status)),
        status => ClientError::Api {
            status,
            body: resp.body_text(),
        },
    }
}
