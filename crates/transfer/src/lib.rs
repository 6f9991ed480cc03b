//! Chunk sources for resumable uploads.
//!
//! A [`ChunkSource`] hands out the byte stream an upload sends, one
//! fixed-size buffer fill at a time, and can reposition for resume.

mod source;
mod types;

pub use source::{BufferSource, ChunkSource, FileSource, ReaderSource};
pub use types::Chunk;

/// Default chunk size: 1 MB, the granularity the appliance expects.
pub const DEFAULT_CHUNK_SIZE: usize = 1_000_000;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot seek to byte {offset} on a forward-only stream")]
    Unseekable { offset: i64 },
}
