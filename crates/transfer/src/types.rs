use std::fmt;

/// A chunk of stream data for one upload request.
#[derive(Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Byte offset of the first payload byte.
    pub start: i64,
    /// Payload bytes. Empty only for a terminating chunk.
    pub data: Vec<u8>,
    /// Whether this chunk ends the stream.
    pub is_final: bool,
}

impl Chunk {
    /// Inclusive end index: `start + len - 1`, so `start - 1` when empty.
    pub fn end(&self) -> i64 {
        self.start + self.data.len() as i64 - 1
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` for a zero-length chunk.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("start", &self.start)
            .field("len", &self.data.len())
            .field("is_final", &self.is_final)
            .finish()
    }
}
