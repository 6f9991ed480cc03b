//! Error taxonomy shared by the upload core and the HTTP client.

use covesync_transfer::TransferError;

/// Errors produced by the client.
///
/// Only `Transport` is ever worth retrying, and only through the explicit
/// reconciliation path: a transport failure leaves the outcome of the request
/// unknown, so the server must be asked before any byte range is re-sent.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Network-level failure (connect, TLS, timeout) or a 5xx response. The
    /// outcome of the request is unknown.
    #[error("transport error: {0}")]
    Transport(String),

    /// HTTP 412 or 409: the asserted entity version no longer matches. The
    /// caller must re-read the file and re-decide; never retried here.
    #[error("version conflict: HTTP {status}")]
    VersionConflict { status: u16 },

    /// HTTP 404 or 410 on a request carrying an `Upload-ID`: the id's
    /// validity window has elapsed. The upload must restart from `begin`.
    #[error("upload session expired: HTTP {status}")]
    UploadExpired { status: u16 },

    /// The source cannot reposition to the server-reported offset.
    #[error("source cannot be repositioned to byte {offset}")]
    NonResumableSource { offset: i64 },

    /// The caller omitted a required entity version assertion.
    #[error("missing precondition: {0}")]
    PreconditionMissing(String),

    /// The server response is missing or mangles an expected header.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// Any other non-2xx response.
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The cancellation token fired.
    #[error("upload cancelled")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),
}
