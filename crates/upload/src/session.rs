//! Upload session lifecycle against a [`Transport`].
//!
//! A session is opened with `begin`, fed with `send_chunk`, interrogated
//! with `bytes_received` after ambiguous failures, and discarded with
//! `abort`. All four requests target the file's content route; the session
//! replays the same version assertions on every one of them.

use covesync_protocol::constants::{
    APPLICATION_OCTET_STREAM, CONTENT_RANGE, CONTENT_TYPE, IF_MATCH, UPLOAD_ID,
    file_content_route,
};
use covesync_protocol::range::{
    UPLOAD_BEGIN_RANGE, UPLOAD_STATUS_RANGE, chunk_content_range, parse_received_range,
};
use covesync_transfer::Chunk;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::transport::{Method, Request, Transport, status_error};

/// An open upload session for one file.
#[derive(Debug, Clone)]
pub struct UploadSession {
    pub file_id: String,
    pub upload_id: String,
    versions: Vec<String>,
}

impl UploadSession {
    /// Opens a session on the file's content route.
    ///
    /// The request is an empty-body `PUT` with `Content-Range: bytes */*`;
    /// the response must carry the session id in `Upload-ID`. This request
    /// is never retried: a failure here has cost nothing and the caller can
    /// simply begin again.
    pub async fn begin(
        transport: &dyn Transport,
        file_id: &str,
        versions: Vec<String>,
    ) -> Result<Self, ClientError> {
        let mut req = Request::new(Method::Put, file_content_route(file_id))
            .header(CONTENT_RANGE, UPLOAD_BEGIN_RANGE);
        for v in &versions {
            req = req.header(IF_MATCH, v.clone());
        }

        let resp = transport.execute(req).await?;
        if !resp.is_success() {
            return Err(status_error(&resp, false));
        }
        let upload_id = resp.upload_id.ok_or_else(|| {
            ClientError::ProtocolViolation("upload begin response missing Upload-ID".into())
        })?;

        debug!(file = %file_id, upload = %upload_id, "upload session opened");
        Ok(Self {
            file_id: file_id.to_string(),
            upload_id,
            versions,
        })
    }

    /// Rebuilds a session handle from a previously obtained id.
    pub fn resume(
        file_id: impl Into<String>,
        upload_id: impl Into<String>,
        versions: Vec<String>,
    ) -> Self {
        Self {
            file_id: file_id.into(),
            upload_id: upload_id.into(),
            versions,
        }
    }

    /// Version assertions replayed on every request of this session.
    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    /// Asks the server how many bytes of this session it has durably
    /// received.
    ///
    /// The answer arrives as `Range: bytes 0-<n>` where `<n>` is the count,
    /// so the next chunk starts at offset `<n>`. A missing or malformed
    /// header is a protocol violation, not a zero.
    pub async fn bytes_received(&self, transport: &dyn Transport) -> Result<i64, ClientError> {
        let req = self.request().header(CONTENT_RANGE, UPLOAD_STATUS_RANGE);

        let resp = transport.execute(req).await?;
        if !resp.is_success() {
            return Err(status_error(&resp, true));
        }
        let range = resp
            .range
            .as_deref()
            .ok_or_else(|| ClientError::ProtocolViolation("status response missing Range".into()))?;
        let received =
            parse_received_range(range).map_err(|e| ClientError::ProtocolViolation(e.to_string()))?;

        debug!(upload = %self.upload_id, received, "status query answered");
        Ok(received)
    }

    /// Sends one chunk. Returns the new entity version iff the chunk was
    /// final; the final response must carry it in `ETag`.
    pub async fn send_chunk(
        &self,
        transport: &dyn Transport,
        chunk: Chunk,
    ) -> Result<Option<String>, ClientError> {
        let total = chunk.is_final.then(|| chunk.end());
        let range = chunk_content_range(chunk.start, chunk.end(), total);
        let is_final = chunk.is_final;

        let req = self
            .request()
            .header(CONTENT_RANGE, range)
            .header(CONTENT_TYPE, APPLICATION_OCTET_STREAM)
            .body(chunk.data);

        let resp = transport.execute(req).await?;
        if !resp.is_success() {
            return Err(status_error(&resp, true));
        }

        if is_final {
            let etag = resp.etag.ok_or_else(|| {
                ClientError::ProtocolViolation("final chunk response missing ETag".into())
            })?;
            Ok(Some(etag))
        } else {
            Ok(None)
        }
    }

    /// Discards the session server-side. Best effort: the local outcome does
    /// not depend on it, so failures are logged and swallowed.
    pub async fn abort(&self, transport: &dyn Transport) {
        let req = Request::new(Method::Delete, file_content_route(&self.file_id))
            .header(UPLOAD_ID, self.upload_id.clone());

        match transport.execute(req).await {
            Ok(resp) if resp.is_success() => {
                debug!(upload = %self.upload_id, "upload session discarded");
            }
            Ok(resp) => {
                warn!(upload = %self.upload_id, status = resp.status, "abort request refused");
            }
            Err(err) => {
                warn!(upload = %self.upload_id, error = %err, "abort request failed");
            }
        }
    }

    /// `PUT` on the content route with `Upload-ID` and the session's version
    /// assertions.
    fn request(&self) -> Request {
        let mut req = Request::new(Method::Put, file_content_route(&self.file_id))
            .header(UPLOAD_ID, self.upload_id.clone());
        for v in &self.versions {
            req = req.header(IF_MATCH, v.clone());
        }
        req
    }
}
