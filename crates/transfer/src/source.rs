use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::TransferError;

// ---------------------------------------------------------------------------
// ChunkSource
// ---------------------------------------------------------------------------

/// A byte stream an upload reads from.
///
/// `read_full` fills the buffer completely unless the stream ends first, so a
/// short fill signals end-of-stream. Implementations are synchronous; the
/// upload engine drives them between requests.
pub trait ChunkSource: Send {
    /// Reads until `buf` is full or the stream ends.
    ///
    /// Returns the number of bytes read; 0 means the stream is exhausted.
    fn read_full(&mut self, buf: &mut [u8]) -> Result<usize, TransferError>;

    /// Repositions the stream to the absolute byte `offset` (for resume).
    ///
    /// Sources that cannot reach `offset` return [`TransferError::Unseekable`].
    fn seek_to(&mut self, offset: i64) -> Result<(), TransferError>;

    /// Current absolute position.
    fn position(&self) -> i64;
}

/// Reads from `reader` until `buf` is full or EOF.
fn fill_from<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, TransferError> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

// ---------------------------------------------------------------------------
// FileSource
// ---------------------------------------------------------------------------

/// Reads an on-disk file. Fully seekable.
pub struct FileSource {
    file: std::fs::File,
    offset: i64,
}

impl FileSource {
    /// Opens `path` for upload.
    pub fn open(path: &Path) -> Result<Self, TransferError> {
        Ok(Self {
            file: std::fs::File::open(path)?,
            offset: 0,
        })
    }
}

impl ChunkSource for FileSource {
    fn read_full(&mut self, buf: &mut [u8]) -> Result<usize, TransferError> {
        let n = fill_from(&mut self.file, buf)?;
        self.offset += n as i64;
        Ok(n)
    }

    fn seek_to(&mut self, offset: i64) -> Result<(), TransferError> {
        self.file.seek(SeekFrom::Start(offset as u64))?;
        self.offset = offset;
        Ok(())
    }

    fn position(&self) -> i64 {
        self.offset
    }
}

// ---------------------------------------------------------------------------
// BufferSource
// ---------------------------------------------------------------------------

/// Reads from an in-memory buffer. Fully seekable.
pub struct BufferSource {
    data: Vec<u8>,
    offset: i64,
}

impl BufferSource {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, offset: 0 }
    }
}

impl ChunkSource for BufferSource {
    fn read_full(&mut self, buf: &mut [u8]) -> Result<usize, TransferError> {
        let pos = (self.offset as usize).min(self.data.len());
        let n = (self.data.len() - pos).min(buf.len());
        buf[..n].copy_from_slice(&self.data[pos..pos + n]);
        self.offset += n as i64;
        Ok(n)
    }

    fn seek_to(&mut self, offset: i64) -> Result<(), TransferError> {
        self.offset = offset;
        Ok(())
    }

    fn position(&self) -> i64 {
        self.offset
    }
}

// ---------------------------------------------------------------------------
// ReaderSource
// ---------------------------------------------------------------------------

/// Wraps a forward-only reader (socket, pipe, process output).
///
/// Forward repositioning is emulated by discarding bytes; rewinding fails
/// with [`TransferError::Unseekable`].
pub struct ReaderSource<R> {
    reader: R,
    offset: i64,
}

impl<R: Read + Send> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, offset: 0 }
    }
}

impl<R: Read + Send> ChunkSource for ReaderSource<R> {
    fn read_full(&mut self, buf: &mut [u8]) -> Result<usize, TransferError> {
        let n = fill_from(&mut self.reader, buf)?;
        self.offset += n as i64;
        Ok(n)
    }

    fn seek_to(&mut self, offset: i64) -> Result<(), TransferError> {
        if offset < self.offset {
            return Err(TransferError::Unseekable { offset });
        }

        let wanted = (offset - self.offset) as u64;
        let skipped = std::io::copy(&mut (&mut self.reader).take(wanted), &mut std::io::sink())?;
        self.offset += skipped as i64;
        if skipped < wanted {
            // Stream ended before the target offset.
            return Err(TransferError::Unseekable { offset });
        }
        Ok(())
    }

    fn position(&self) -> i64 {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(data).unwrap();
        path
    }

    #[test]
    fn file_source_fills_and_signals_eof() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(dir.path(), "test.bin", b"AABBCCDDEE"); // 10 bytes.

        let mut src = FileSource::open(&path).unwrap();
        let mut buf = [0u8; 4];

        assert_eq!(src.read_full(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"AABB");
        assert_eq!(src.position(), 4);

        assert_eq!(src.read_full(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"CCDD");

        // Short fill: stream exhausted.
        assert_eq!(src.read_full(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"EE");
        assert_eq!(src.position(), 10);

        assert_eq!(src.read_full(&mut buf).unwrap(), 0);
    }

    #[test]
    fn file_source_exact_multiple_reads_zero_after() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(dir.path(), "test.bin", b"01234567"); // 8 bytes.

        let mut src = FileSource::open(&path).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(src.read_full(&mut buf).unwrap(), 4);
        assert_eq!(src.read_full(&mut buf).unwrap(), 4);
        // The boundary case: a full final fill, then a zero read.
        assert_eq!(src.read_full(&mut buf).unwrap(), 0);
    }

    #[test]
    fn file_source_seek_and_resume() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(dir.path(), "test.bin", b"0123456789");

        let mut src = FileSource::open(&path).unwrap();
        let mut buf = [0u8; 4];
        src.read_full(&mut buf).unwrap();

        src.seek_to(6).unwrap();
        assert_eq!(src.position(), 6);
        assert_eq!(src.read_full(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"6789");
    }

    #[test]
    fn file_source_rewind() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(dir.path(), "test.bin", b"0123456789");

        let mut src = FileSource::open(&path).unwrap();
        let mut buf = [0u8; 8];
        src.read_full(&mut buf).unwrap();

        src.seek_to(2).unwrap();
        let mut rest = [0u8; 8];
        assert_eq!(src.read_full(&mut rest).unwrap(), 8);
        assert_eq!(&rest, b"23456789");
    }

    #[test]
    fn file_source_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(dir.path(), "empty.bin", b"");

        let mut src = FileSource::open(&path).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(src.read_full(&mut buf).unwrap(), 0);
        assert_eq!(src.position(), 0);
    }

    #[test]
    fn buffer_source_reads_and_seeks() {
        let mut src = BufferSource::new(b"hello world".to_vec());
        let mut buf = [0u8; 5];

        assert_eq!(src.read_full(&mut buf).unwrap(), 5);
        assert_eq!(&buf, b"hello");

        src.seek_to(6).unwrap();
        assert_eq!(src.read_full(&mut buf).unwrap(), 5);
        assert_eq!(&buf, b"world");

        assert_eq!(src.read_full(&mut buf).unwrap(), 0);
    }

    #[test]
    fn buffer_source_rewind() {
        let mut src = BufferSource::new(b"abcdef".to_vec());
        let mut buf = [0u8; 6];
        src.read_full(&mut buf).unwrap();

        src.seek_to(0).unwrap();
        assert_eq!(src.read_full(&mut buf).unwrap(), 6);
        assert_eq!(&buf, b"abcdef");
    }

    #[test]
    fn reader_source_skips_forward() {
        let mut src = ReaderSource::new(&b"0123456789"[..]);
        src.seek_to(6).unwrap();
        assert_eq!(src.position(), 6);

        let mut buf = [0u8; 4];
        assert_eq!(src.read_full(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"6789");
    }

    #[test]
    fn reader_source_seek_to_current_is_noop() {
        let mut src = ReaderSource::new(&b"0123456789"[..]);
        let mut buf = [0u8; 4];
        src.read_full(&mut buf).unwrap();

        src.seek_to(4).unwrap();
        assert_eq!(src.position(), 4);
        assert_eq!(src.read_full(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"4567");
    }

    #[test]
    fn reader_source_cannot_rewind() {
        let mut src = ReaderSource::new(&b"0123456789"[..]);
        let mut buf = [0u8; 4];
        src.read_full(&mut buf).unwrap();

        let err = src.seek_to(2).unwrap_err();
        assert!(matches!(err, TransferError::Unseekable { offset: 2 }));
    }

    #[test]
    fn reader_source_skip_past_end_fails() {
        let mut src = ReaderSource::new(&b"0123"[..]);
        let err = src.seek_to(10).unwrap_err();
        assert!(matches!(err, TransferError::Unseekable { offset: 10 }));
    }
}
