//! Progress events emitted while an upload runs.

use tokio::sync::mpsc::Sender;
use tracing::trace;

/// Progress of a running upload.
///
/// Events go through a bounded channel with `try_send`: a slow consumer
/// loses events, it never stalls the transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    /// A session is open and chunks are about to flow.
    Started { upload_id: String },

    /// A chunk was acknowledged. `bytes_sent` is the stream offset the
    /// server has confirmed so far.
    ChunkSent { bytes_sent: i64 },

    /// An ambiguous failure forced a status query; the server reported this
    /// durable offset.
    Reconciled { server_offset: i64 },

    /// The final chunk was acknowledged and the file has a new version.
    Completed { etag: String },
}

/// Sends `event` if a consumer is attached, dropping it when the channel is
/// full or closed.
pub(crate) fn emit(events: Option<&Sender<UploadEvent>>, event: UploadEvent) {
    if let Some(tx) = events {
        if tx.try_send(event).is_err() {
            trace!("progress consumer lagging, event dropped");
        }
    }
}
