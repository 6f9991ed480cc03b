//! File operations of the appliance REST API.
//!
//! Metadata, content reads, create, move and delete speak JSON over the
//! `/files` routes; content writes go through the resumable upload engine.
//! Overwrite, move and delete insist on at least one asserted entity
//! version before anything reaches the wire.

use std::path::Path;

use covesync_protocol::constants::{
    APPLICATION_JSON, CONTENT_TYPE, FILES_ROUTE, IF_RANGE, RANGE, file_content_route, file_route,
};
use covesync_protocol::range::read_range;
use covesync_protocol::types::{File, FileLocation};
use covesync_transfer::{ChunkSource, FileSource};
use covesync_upload::preconditions::{self, Access};
use covesync_upload::transport::status_error;
use covesync_upload::{
    ClientError, Method, Request, Transport, UploadEngine, UploadEvent, UploadOptions,
    UploadSession,
};
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::ClientConfig;
use crate::http::HttpTransport;

/// Result of a content read.
#[derive(Debug, Clone, PartialEq)]
pub enum FileContent {
    /// The requested bytes, with the entity version they belong to when the
    /// server sent one.
    Full { body: Vec<u8>, etag: Option<String> },
    /// Every asserted version still matches; the caller's copy is current.
    NotModified,
}

/// High-level file API for one appliance.
pub struct FileClient {
    transport: HttpTransport,
    config: ClientConfig,
}

impl FileClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self { transport, config })
    }

    /// Sets a custom base URL (for testing).
    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, url: String) -> Self {
        self.transport = self.transport.with_base_url(url);
        self
    }

    /// Fetches metadata, optionally restricted to a field subset.
    pub async fn metadata(&self, file_id: &str, fields: &[&str]) -> Result<File, ClientError> {
        let mut path = file_route(file_id);
        if !fields.is_empty() {
            path = format!("{path}?fields={}", fields.join(","));
        }

        let resp = self
            .transport
            .execute(Request::new(Method::Get, path))
            .await?;
        if !resp.is_success() {
            return Err(status_error(&resp, false));
        }
        Ok(serde_json::from_slice(&resp.body)?)
    }

    /// Reads the byte range `[start, end]` of the file's content.
    ///
    /// `range_etag` makes the range conditional: the server falls back to
    /// full content when the version changed. `versions` turn the read into
    /// an `If-None-Match` poll answered with [`FileContent::NotModified`]
    /// while any of them still matches.
    pub async fn content(
        &self,
        file_id: &str,
        start: i64,
        end: i64,
        range_etag: Option<&str>,
        versions: &[String],
    ) -> Result<FileContent, ClientError> {
        let mut req = Request::new(Method::Get, file_content_route(file_id))
            .header(RANGE, read_range(start, end));
        if let Some(etag) = range_etag {
            req = req.header(IF_RANGE, etag.to_string());
        }
        for (name, value) in preconditions::conditional_headers(Access::Read, versions)? {
            req = req.header(name, value);
        }

        let resp = self.transport.execute(req).await?;
        if resp.status == 304 {
            return Ok(FileContent::NotModified);
        }
        if !resp.is_success() {
            return Err(status_error(&resp, false));
        }
        Ok(FileContent::Full {
            body: resp.body,
            etag: resp.etag,
        })
    }

    /// Creates an empty file named `name` under `parent_id`.
    pub async fn create(&self, parent_id: &str, name: &str) -> Result<File, ClientError> {
        let body = serde_json::to_vec(&FileLocation::new(parent_id, name))?;
        let req = Request::new(Method::Post, FILES_ROUTE)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .body(body);

        let resp = self.transport.execute(req).await?;
        if !resp.is_success() {
            return Err(status_error(&resp, false));
        }
        let file: File = serde_json::from_slice(&resp.body)?;
        debug!(id = %file.id, name = %name, "file created");
        Ok(file)
    }

    /// Renames or reparents a file. Requires at least one asserted version.
    pub async fn move_to(
        &self,
        file_id: &str,
        parent_id: &str,
        name: &str,
        versions: &[String],
    ) -> Result<File, ClientError> {
        let mut req =
            Request::new(Method::Put, file_route(file_id)).header(CONTENT_TYPE, APPLICATION_JSON);
        for (header, value) in preconditions::conditional_headers(Access::Overwrite, versions)? {
            req = req.header(header, value);
        }
        let body = serde_json::to_vec(&FileLocation::new(parent_id, name))?;

        let resp = self.transport.execute(req.body(body)).await?;
        if !resp.is_success() {
            return Err(status_error(&resp, false));
        }
        Ok(serde_json::from_slice(&resp.body)?)
    }

    /// Deletes a file. Requires at least one asserted version.
    pub async fn delete(&self, file_id: &str, versions: &[String]) -> Result<(), ClientError> {
        let mut req = Request::new(Method::Delete, file_route(file_id));
        for (header, value) in preconditions::conditional_headers(Access::Delete, versions)? {
            req = req.header(header, value);
        }

        let resp = self.transport.execute(req).await?;
        if !resp.is_success() {
            return Err(status_error(&resp, false));
        }
        debug!(file = %file_id, "file deleted");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Content uploads
    // -----------------------------------------------------------------------

    /// Uploads `source` as the file's new content. Returns the new entity
    /// version.
    pub async fn upload(
        &self,
        file_id: &str,
        versions: &[String],
        source: &mut dyn ChunkSource,
    ) -> Result<String, ClientError> {
        let options = self.upload_options(versions, None, CancellationToken::new());
        let mut engine = UploadEngine::new(&self.transport, options);
        engine.run(file_id, source).await
    }

    /// Same as [`FileClient::upload`], with progress events and cooperative
    /// cancellation.
    pub async fn upload_with_events(
        &self,
        file_id: &str,
        versions: &[String],
        source: &mut dyn ChunkSource,
        events: Sender<UploadEvent>,
        cancel: CancellationToken,
    ) -> Result<String, ClientError> {
        let options = self.upload_options(versions, Some(events), cancel);
        let mut engine = UploadEngine::new(&self.transport, options);
        engine.run(file_id, source).await
    }

    /// Uploads a file from disk.
    pub async fn upload_path(
        &self,
        file_id: &str,
        versions: &[String],
        path: &Path,
    ) -> Result<String, ClientError> {
        let mut source = FileSource::open(path)?;
        self.upload(file_id, versions, &mut source).await
    }

    /// Picks up an interrupted upload in an existing session: asks the
    /// server how much it holds and streams the rest of `source`.
    pub async fn resume_upload(
        &self,
        file_id: &str,
        upload_id: &str,
        versions: &[String],
        source: &mut dyn ChunkSource,
    ) -> Result<String, ClientError> {
        let session = UploadSession::resume(file_id, upload_id, versions.to_vec());
        let options = self.upload_options(&[], None, CancellationToken::new());
        let mut engine = UploadEngine::new(&self.transport, options);
        engine.resume(session, source).await
    }

    /// Discards an upload session server-side. Best effort: failures are
    /// logged, never returned.
    pub async fn abort_upload(&self, file_id: &str, upload_id: &str) {
        UploadSession::resume(file_id, upload_id, Vec::new())
            .abort(&self.transport)
            .await;
    }

    fn upload_options(
        &self,
        versions: &[String],
        events: Option<Sender<UploadEvent>>,
        cancel: CancellationToken,
    ) -> UploadOptions {
        UploadOptions {
            versions: versions.to_vec(),
            chunk_size: self.config.chunk_size,
            retry: self.config.retry,
            events,
            cancel,
        }
    }
}
