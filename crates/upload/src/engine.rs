//! The upload state machine.
//!
//! [`UploadEngine`] drives a [`ChunkSource`] through an [`UploadSession`]:
//! one request in flight at a time, chunks in strict offset order, and a
//! reconciliation round after every ambiguous transport failure. Nothing
//! here retries a write blindly; the server's durable byte count decides
//! where sending continues.

use covesync_transfer::{Chunk, ChunkSource, DEFAULT_CHUNK_SIZE, TransferError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::preconditions::{self, Access};
use crate::progress::{UploadEvent, emit};
use crate::reconcile::{Reconciler, RetryConfig};
use crate::session::UploadSession;
use crate::transport::Transport;

/// Where an upload currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    /// No request has been made yet.
    Idle,
    /// Chunks are flowing.
    Sending,
    /// The final chunk is in flight.
    Finalizing,
    /// The final chunk was acknowledged with a new entity version.
    Completed,
    /// Cancelled; the session was discarded best-effort.
    Aborted,
    /// A non-recoverable error ended the upload.
    Failed,
}

/// Knobs for one upload run.
pub struct UploadOptions {
    /// Entity versions asserted on every request. At least one is required.
    pub versions: Vec<String>,
    /// Payload size of every chunk except the final one.
    pub chunk_size: usize,
    /// Backoff policy for reconciliation, and the no-progress bound.
    pub retry: RetryConfig,
    /// Optional progress consumer.
    pub events: Option<tokio::sync::mpsc::Sender<UploadEvent>>,
    /// Cooperative cancellation.
    pub cancel: CancellationToken,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            versions: Vec::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            retry: RetryConfig::default(),
            events: None,
            cancel: CancellationToken::new(),
        }
    }
}

/// Drives one upload to a terminal state.
pub struct UploadEngine<'a> {
    transport: &'a dyn Transport,
    options: UploadOptions,
    state: UploadState,
}

impl<'a> UploadEngine<'a> {
    pub fn new(transport: &'a dyn Transport, options: UploadOptions) -> Self {
        Self {
            transport,
            options,
            state: UploadState::Idle,
        }
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    /// Uploads `source` as the new content of `file_id`.
    ///
    /// Opens a fresh session and streams from byte 0. Returns the file's new
    /// entity version. The begin request is never retried: if it fails,
    /// nothing has been spent and the caller can run again.
    pub async fn run(
        &mut self,
        file_id: &str,
        source: &mut dyn ChunkSource,
    ) -> Result<String, ClientError> {
        self.check_options()?;
        if let Err(err) = preconditions::check(Access::Overwrite, &self.options.versions) {
            return self.fail(err);
        }
        if self.options.cancel.is_cancelled() {
            self.state = UploadState::Aborted;
            return Err(ClientError::Cancelled);
        }

        let session = match UploadSession::begin(
            self.transport,
            file_id,
            self.options.versions.clone(),
        )
        .await
        {
            Ok(session) => session,
            Err(err) => return self.fail(err),
        };
        emit(
            self.options.events.as_ref(),
            UploadEvent::Started {
                upload_id: session.upload_id.clone(),
            },
        );

        if let Err(err) = seek_source(source, 0) {
            return self.fail(err);
        }
        self.state = UploadState::Sending;
        self.complete(session, source).await
    }

    /// Continues an interrupted upload in an existing session.
    ///
    /// Queries the server's durable byte count first, repositions `source`
    /// there and streams the rest.
    pub async fn resume(
        &mut self,
        session: UploadSession,
        source: &mut dyn ChunkSource,
    ) -> Result<String, ClientError> {
        self.check_options()?;
        if let Err(err) = preconditions::check(Access::Overwrite, session.versions()) {
            return self.fail(err);
        }
        if self.options.cancel.is_cancelled() {
            self.state = UploadState::Aborted;
            return Err(ClientError::Cancelled);
        }
        emit(
            self.options.events.as_ref(),
            UploadEvent::Started {
                upload_id: session.upload_id.clone(),
            },
        );

        let reconciler = Reconciler::new(self.options.retry);
        let server_offset = match reconciler
            .server_offset(self.transport, &session, &self.options.cancel)
            .await
        {
            Ok(offset) => offset,
            Err(err) => return self.fail(err),
        };
        emit(
            self.options.events.as_ref(),
            UploadEvent::Reconciled { server_offset },
        );
        info!(
            upload = %session.upload_id,
            server_offset,
            "resuming upload from server offset"
        );

        if let Err(err) = seek_source(source, server_offset) {
            return self.fail(err);
        }
        self.state = UploadState::Sending;
        self.complete(session, source).await
    }

    fn check_options(&mut self) -> Result<(), ClientError> {
        if self.options.chunk_size == 0 {
            return self.fail(ClientError::Config("chunk size must be positive".into()));
        }
        Ok(())
    }

    fn fail<T>(&mut self, err: ClientError) -> Result<T, ClientError> {
        self.state = UploadState::Failed;
        Err(err)
    }

    /// Runs the chunk loop and settles the terminal state.
    async fn complete(
        &mut self,
        session: UploadSession,
        source: &mut dyn ChunkSource,
    ) -> Result<String, ClientError> {
        match self.pump(&session, source).await {
            Ok(etag) => {
                self.state = UploadState::Completed;
                emit(
                    self.options.events.as_ref(),
                    UploadEvent::Completed { etag: etag.clone() },
                );
                info!(
                    file = %session.file_id,
                    upload = %session.upload_id,
                    etag = %etag,
                    "upload complete"
                );
                Ok(etag)
            }
            Err(ClientError::Cancelled) => {
                session.abort(self.transport).await;
                self.state = UploadState::Aborted;
                Err(ClientError::Cancelled)
            }
            Err(err) => self.fail(err),
        }
    }

    /// Sends chunks from the source's current position until the final chunk
    /// is acknowledged.
    async fn pump(
        &mut self,
        session: &UploadSession,
        source: &mut dyn ChunkSource,
    ) -> Result<String, ClientError> {
        let transport = self.transport;
        let reconciler = Reconciler::new(self.options.retry);
        let mut buf = vec![0u8; self.options.chunk_size];
        let mut bytes_sent = source.position();
        let mut stalls = 0u32;

        loop {
            if self.options.cancel.is_cancelled() {
                return Err(ClientError::Cancelled);
            }

            let filled = source.read_full(&mut buf)?;
            let is_final = filled < buf.len();
            if is_final {
                self.state = UploadState::Finalizing;
            }
            let chunk = Chunk {
                start: bytes_sent,
                data: buf[..filled].to_vec(),
                is_final,
            };
            debug!(
                upload = %session.upload_id,
                start = chunk.start,
                len = filled,
                is_final,
                "sending chunk"
            );

            let sent = tokio::select! {
                biased;
                _ = self.options.cancel.cancelled() => return Err(ClientError::Cancelled),
                result = session.send_chunk(transport, chunk) => result,
            };

            match sent {
                Ok(Some(etag)) => {
                    bytes_sent += filled as i64;
                    emit(
                        self.options.events.as_ref(),
                        UploadEvent::ChunkSent { bytes_sent },
                    );
                    return Ok(etag);
                }
                Ok(None) => {
                    bytes_sent += filled as i64;
                    stalls = 0;
                    emit(
                        self.options.events.as_ref(),
                        UploadEvent::ChunkSent { bytes_sent },
                    );
                }
                Err(ClientError::Transport(reason)) => {
                    warn!(
                        upload = %session.upload_id,
                        offset = bytes_sent,
                        reason = %reason,
                        "chunk outcome unknown, reconciling"
                    );
                    let server_offset = reconciler
                        .server_offset(transport, session, &self.options.cancel)
                        .await?;
                    emit(
                        self.options.events.as_ref(),
                        UploadEvent::Reconciled { server_offset },
                    );

                    seek_source(source, server_offset)?;
                    let progressed = server_offset > bytes_sent;
                    bytes_sent = server_offset;
                    if self.state == UploadState::Finalizing {
                        self.state = UploadState::Sending;
                    }

                    if progressed {
                        stalls = 0;
                    } else {
                        stalls += 1;
                        if stalls >= self.options.retry.max_attempts {
                            return Err(ClientError::Transport(format!(
                                "no forward progress after {stalls} reconciliations at offset {server_offset}"
                            )));
                        }
                        let delay = self.options.retry.delay_for_attempt(stalls - 1);
                        tokio::select! {
                            biased;
                            _ = self.options.cancel.cancelled() => return Err(ClientError::Cancelled),
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                }
                Err(other) => return Err(other),
            }
        }
    }
}

/// Repositions the source, mapping a refusal to the typed resume error.
fn seek_source(source: &mut dyn ChunkSource, offset: i64) -> Result<(), ClientError> {
    source.seek_to(offset).map_err(|err| match err {
        TransferError::Unseekable { .. } => ClientError::NonResumableSource { offset },
        other => ClientError::Transfer(other),
    })
}
