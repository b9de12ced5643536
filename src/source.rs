//! Byte sources - non-consuming lookahead over a stream
//!
//! Detectors run in sequence over one stream, so they only ever *peek*.
//! A peek reports how many bytes were actually available (short at end of
//! stream) and never moves the logical read position.

use std::future::Future;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// A stream that supports bounded, non-destructive lookahead.
pub trait ByteSource: Send {
    /// Logical read position (bytes consumed so far)
    fn position(&self) -> u64;

    /// Copy up to `buf.len()` bytes from the current position into `buf`.
    ///
    /// Returns the number of bytes copied, fewer than requested only at end
    /// of stream. The position is unchanged.
    fn peek(&mut self, buf: &mut [u8]) -> impl Future<Output = io::Result<usize>> + Send;

    /// Like [`peek`](Self::peek), starting `offset` bytes past the position.
    ///
    /// The default implementation peeks a growing prefix, doubling from
    /// [`PEEK_STEP`] until it covers `offset + buf.len()` or the stream comes
    /// up short, then copies the tail. Memory use is bounded by the stream's
    /// real length. Sources that can seek should override it.
    fn peek_at(
        &mut self,
        offset: u64,
        buf: &mut [u8],
    ) -> impl Future<Output = io::Result<usize>> + Send {
        async move {
            let Some(total) = offset.checked_add(buf.len() as u64) else {
                return Ok(0);
            };

            let mut prefix = Vec::new();
            let mut want = PEEK_STEP.min(total);
            let read = loop {
                let len = usize::try_from(want).map_err(|_| {
                    io::Error::new(io::ErrorKind::InvalidInput, "peek range overflows usize")
                })?;
                prefix
                    .try_reserve_exact(len - prefix.len())
                    .map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e))?;
                prefix.resize(len, 0);

                let read = self.peek(&mut prefix).await?;
                if read < len || want == total {
                    break read;
                }
                want = want.saturating_mul(2).min(total);
            };

            if read as u64 <= offset {
                return Ok(0);
            }
            // read > offset, so offset fits in usize
            let start = offset as usize;
            let avail = (read - start).min(buf.len());
            buf[..avail].copy_from_slice(&prefix[start..start + avail]);
            Ok(avail)
        }
    }
}

/// First prefix size tried by the default [`ByteSource::peek_at`]
pub const PEEK_STEP: u64 = 64 * 1024;

/// In-memory source over a borrowed buffer
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Consume `n` bytes (clamped to the end of the buffer)
    pub fn skip(&mut self, n: usize) {
        self.position = self.position.saturating_add(n).min(self.data.len());
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.position..]
    }

    fn copy_from(&self, start: u64, buf: &mut [u8]) -> usize {
        let rest = self.remaining();
        let Ok(start) = usize::try_from(start) else {
            return 0;
        };
        if start >= rest.len() {
            return 0;
        }
        let n = (rest.len() - start).min(buf.len());
        buf[..n].copy_from_slice(&rest[start..start + n]);
        n
    }
}

impl ByteSource for SliceSource<'_> {
    fn position(&self) -> u64 {
        self.position as u64
    }

    async fn peek(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.copy_from(0, buf))
    }

    async fn peek_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.copy_from(offset, buf))
    }
}

/// File-backed source. Peeks seek, read, then put the cursor back.
#[derive(Debug)]
pub struct FileSource {
    file: File,
    path: PathBuf,
    len: u64,
    position: u64,
}

impl FileSource {
    /// Open `path` read-only
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).await?;
        let len = file.metadata().await?.len();

        tracing::trace!(path = %path.display(), len, "Opened file source");

        Ok(Self {
            file,
            path,
            len,
            position: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File length at open time. Peeks are not limited by it: bytes
    /// appended after open are still visible.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Consume `n` bytes (clamped to the length at open time)
    pub async fn skip(&mut self, n: u64) -> io::Result<()> {
        self.position = self.position.saturating_add(n).min(self.len);
        self.file.seek(SeekFrom::Start(self.position)).await?;
        Ok(())
    }

    /// Actual OS cursor of the underlying handle
    pub async fn cursor(&mut self) -> io::Result<u64> {
        self.file.stream_position().await
    }

    /// Read at `at`, then put the cursor back on the logical position,
    /// also when the read fails.
    async fn read_at(&mut self, at: u64, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let result = self.fill_at(at, buf).await;
        let restored = self.file.seek(SeekFrom::Start(self.position)).await;

        let filled = result?;
        restored?;
        Ok(filled)
    }

    /// Read until `buf` is full or EOF
    async fn fill_at(&mut self, at: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.file.seek(SeekFrom::Start(at)).await?;
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.file.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }
}

impl ByteSource for FileSource {
    fn position(&self) -> u64 {
        self.position
    }

    async fn peek(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_at(self.position, buf).await
    }

    async fn peek_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        match self.position.checked_add(offset) {
            Some(at) => self.read_at(at, buf).await,
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Source that only implements `peek`, to exercise the default `peek_at`
    struct PrefixOnly<'a>(SliceSource<'a>);

    impl ByteSource for PrefixOnly<'_> {
        fn position(&self) -> u64 {
            self.0.position()
        }

        async fn peek(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.0.peek(buf).await
        }
    }

    #[test]
    fn test_slice_peek_does_not_advance() {
        tokio_test::block_on(async {
            let data = b"hello world";
            let mut src = SliceSource::new(data);

            let mut buf = [0u8; 5];
            assert_eq!(src.peek(&mut buf).await.unwrap(), 5);
            assert_eq!(&buf, b"hello");
            assert_eq!(src.peek(&mut buf).await.unwrap(), 5);
            assert_eq!(src.position(), 0);
        });
    }

    #[test]
    fn test_slice_short_reads() {
        tokio_test::block_on(async {
            let mut src = SliceSource::new(b"abc");
            let mut buf = [0u8; 8];
            assert_eq!(src.peek(&mut buf).await.unwrap(), 3);
            assert_eq!(src.peek_at(2, &mut buf).await.unwrap(), 1);
            assert_eq!(buf[0], b'c');
            assert_eq!(src.peek_at(3, &mut buf).await.unwrap(), 0);
            assert_eq!(src.peek_at(u64::MAX, &mut buf).await.unwrap(), 0);
        });
    }

    #[test]
    fn test_slice_skip_shifts_peeks() {
        tokio_test::block_on(async {
            let mut src = SliceSource::new(b"0123456789");
            src.skip(4);
            assert_eq!(src.position(), 4);

            let mut buf = [0u8; 3];
            assert_eq!(src.peek(&mut buf).await.unwrap(), 3);
            assert_eq!(&buf, b"456");
            assert_eq!(src.peek_at(4, &mut buf).await.unwrap(), 2);
            assert_eq!(&buf[..2], b"89");

            src.skip(100);
            assert_eq!(src.position(), 10);
            assert!(src.remaining().is_empty());
        });
    }

    #[test]
    fn test_default_peek_at_uses_prefix() {
        tokio_test::block_on(async {
            let mut src = PrefixOnly(SliceSource::new(b"0123456789"));
            let mut buf = [0u8; 4];
            assert_eq!(src.peek_at(3, &mut buf).await.unwrap(), 4);
            assert_eq!(&buf, b"3456");
            assert_eq!(src.peek_at(8, &mut buf).await.unwrap(), 2);
            assert_eq!(&buf[..2], b"89");
            assert_eq!(src.peek_at(10, &mut buf).await.unwrap(), 0);
            assert_eq!(src.position(), 0);
        });
    }

    /// Peek-only source that records the largest buffer it was asked to fill
    struct Recording<'a> {
        inner: SliceSource<'a>,
        largest: usize,
    }

    impl ByteSource for Recording<'_> {
        fn position(&self) -> u64 {
            self.inner.position()
        }

        async fn peek(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.largest = self.largest.max(buf.len());
            self.inner.peek(buf).await
        }
    }

    #[test]
    fn test_default_peek_at_far_offset_stays_small() {
        tokio_test::block_on(async {
            let data = [7u8; 52];
            let mut src = Recording {
                inner: SliceSource::new(&data),
                largest: 0,
            };

            let mut buf = [0u8; 16];
            // Would be ~2 GiB if the whole prefix were allocated up front
            assert_eq!(src.peek_at(500_000 * 4096 + 512, &mut buf).await.unwrap(), 0);
            assert_eq!(src.largest as u64, PEEK_STEP);

            assert_eq!(src.peek_at(u64::MAX - 4, &mut buf).await.unwrap(), 0);
            assert_eq!(src.largest as u64, PEEK_STEP);
        });
    }

    #[test]
    fn test_default_peek_at_grows_past_first_step() {
        tokio_test::block_on(async {
            let mut data = vec![0u8; 3 * PEEK_STEP as usize];
            let at = 2 * PEEK_STEP as usize + 100;
            data[at..at + 4].copy_from_slice(b"CLSI");
            let mut src = Recording {
                inner: SliceSource::new(&data),
                largest: 0,
            };

            let mut buf = [0u8; 4];
            assert_eq!(src.peek_at(at as u64, &mut buf).await.unwrap(), 4);
            assert_eq!(&buf, b"CLSI");
            assert_eq!(src.largest, at + 4);
        });
    }

    #[tokio::test]
    async fn test_file_peek_sees_appended_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("growing.bin");
        std::fs::write(&path, b"0123").unwrap();

        let mut src = FileSource::open(&path).await.unwrap();
        assert_eq!(src.len(), 4);

        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        std::io::Write::write_all(&mut file, b"4567").unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(src.peek_at(4, &mut buf).await.unwrap(), 4);
        assert_eq!(&buf, b"4567");
        assert_eq!(src.cursor().await.unwrap(), 0);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_file_failed_read_restores_cursor() {
        // Opening a directory succeeds on Linux, reading it fails with EISDIR
        let dir = tempdir().unwrap();
        let mut src = FileSource::open(dir.path()).await.unwrap();

        let mut buf = [0u8; 16];
        assert!(src.peek_at(2, &mut buf).await.is_err());
        assert_eq!(src.cursor().await.unwrap(), src.position());
    }

    #[tokio::test]
    async fn test_file_peek_restores_cursor() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"0123456789").unwrap();

        let mut src = FileSource::open(&path).await.unwrap();
        assert_eq!(src.len(), 10);
        assert_eq!(src.path(), path.as_path());

        let mut buf = [0u8; 4];
        assert_eq!(src.peek_at(6, &mut buf).await.unwrap(), 4);
        assert_eq!(&buf, b"6789");
        assert_eq!(src.cursor().await.unwrap(), 0);

        src.skip(2).await.unwrap();
        assert_eq!(src.peek(&mut buf).await.unwrap(), 4);
        assert_eq!(&buf, b"2345");
        assert_eq!(src.position(), 2);
        assert_eq!(src.cursor().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_file_short_and_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        std::fs::write(&path, b"").unwrap();

        let mut src = FileSource::open(&path).await.unwrap();
        assert!(src.is_empty());
        let mut buf = [0u8; 52];
        assert_eq!(src.peek(&mut buf).await.unwrap(), 0);
        assert_eq!(src.peek_at(u64::MAX, &mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_file_open_missing_is_error() {
        let dir = tempdir().unwrap();
        assert!(FileSource::open(dir.path().join("missing.doc")).await.is_err());
    }
}
