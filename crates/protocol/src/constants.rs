//! Route builders and header names for the appliance API.

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

/// Path prefix of the appliance REST API, appended to `https://{host}/`.
pub const API_PREFIX: &str = "api/v1.3";

/// Collection route for file resources.
pub const FILES_ROUTE: &str = "/files";

// ---------------------------------------------------------------------------
// Header names
// ---------------------------------------------------------------------------

pub const CONTENT_RANGE: &str = "Content-Range";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const UPLOAD_ID: &str = "Upload-ID";
pub const RANGE: &str = "Range";
pub const ETAG: &str = "ETag";
pub const IF_MATCH: &str = "If-Match";
pub const IF_NONE_MATCH: &str = "If-None-Match";
pub const IF_RANGE: &str = "If-Range";

/// Consistency mode header sent on every request.
pub const ENDPOINT_CONSISTENCY: &str = "Endpoint-Consistency";

/// Value of [`ENDPOINT_CONSISTENCY`]: reads reflect prior writes.
pub const CONSISTENCY_STRICT: &str = "strict";

pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";

// ---------------------------------------------------------------------------
// Route builders
// ---------------------------------------------------------------------------

/// Percent-encodes an opaque id for use as a path segment.
fn encode_segment(id: &str) -> String {
    utf8_percent_encode(id, NON_ALPHANUMERIC).to_string()
}

/// Route for a single file resource.
pub fn file_route(file_id: &str) -> String {
    format!("{FILES_ROUTE}/{}", encode_segment(file_id))
}

/// Route for a file's content (reads, uploads and upload session requests).
pub fn file_content_route(file_id: &str) -> String {
    format!("{FILES_ROUTE}/{}/content", encode_segment(file_id))
}
