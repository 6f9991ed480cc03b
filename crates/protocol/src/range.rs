//! Content-Range grammar for the resumable upload protocol.
//!
//! # Wire format
//!
//! ```text
//! BEGIN (PUT, empty body):   Content-Range: bytes */*        -> Upload-ID header
//! STATUS (PUT, empty body):  Content-Range: bytes /*/        -> Range: bytes 0-<n>
//! CHUNK (PUT, payload):      Content-Range: bytes <s>-<e>/*
//! FINAL CHUNK (PUT):         Content-Range: bytes <s>-<e>/<e>
//! ```
//!
//! Ranges are inclusive. The concrete total of the final chunk is the final
//! byte index, so a stream of 2,500,000 bytes ends with
//! `bytes 2000000-2499999/2499999`. A final chunk may be empty when the
//! stream length is an exact multiple of the chunk size; its range is then
//! `bytes <len>-<len-1>/<len-1>`, which for the empty stream degenerates to
//! `bytes 0--1/-1`. `<n>` in the status response is the count of bytes the
//! server has durably received.

/// `Content-Range` value that opens an upload session.
pub const UPLOAD_BEGIN_RANGE: &str = "bytes */*";

/// `Content-Range` value that queries the received byte count of a session.
pub const UPLOAD_STATUS_RANGE: &str = "bytes /*/";

/// Error returned when a range header does not match the expected grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed range header: {0:?}")]
pub struct RangeError(pub String);

/// Formats the `Content-Range` value for a chunk covering `[start, end]`.
///
/// `total` is `None` for every chunk except the final one, where it carries
/// the final byte index of the whole stream.
pub fn chunk_content_range(start: i64, end: i64, total: Option<i64>) -> String {
    match total {
        Some(t) => format!("bytes {start}-{end}/{t}"),
        None => format!("bytes {start}-{end}/*"),
    }
}

/// Formats a `Range` request value for a partial content read: `bytes=<s>-<e>`.
pub fn read_range(start: i64, end: i64) -> String {
    format!("bytes={start}-{end}")
}

/// Parses the `Range` response of a status query: `bytes 0-<n>`.
///
/// Returns `<n>`, the count of bytes durably received (0 means nothing has
/// been persisted yet).
pub fn parse_received_range(value: &str) -> Result<i64, RangeError> {
    let malformed = || RangeError(value.to_string());

    let rest = value.trim().strip_prefix("bytes").ok_or_else(malformed)?;
    let rest = rest.trim_start();
    let count = rest.strip_prefix("0-").ok_or_else(malformed)?;
    let received: i64 = count.trim().parse().map_err(|_| malformed())?;
    if received < 0 {
        return Err(malformed());
    }
    Ok(received)
}
