//! Sources of block data.
//!
//! A [`RangeFetcher`] supplies the bytes for one aligned block when the
//! cache misses. Fetchers may be slow or unreliable; the cache never retries,
//! so any retry or timeout policy belongs inside the fetcher.

use bytes::Bytes;
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Positional byte source consulted on cache misses.
///
/// `fetch` fills `buf` with the bytes starting at `offset` and returns the
/// number of bytes written. Returning fewer than `buf.len()` bytes is a
/// short read, which the reader reports as a fetch failure. Callers only
/// request ranges that lie within the source.
///
/// Implementations must be safe to call from several threads at once.
pub trait RangeFetcher: Send + Sync {
    /// Fill `buf` with source bytes starting at `offset`.
    fn fetch(&self, buf: &mut [u8], offset: u64) -> io::Result<usize>;
}

impl<F: RangeFetcher + ?Sized> RangeFetcher for &F {
    fn fetch(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        (**self).fetch(buf, offset)
    }
}

impl<F: RangeFetcher + ?Sized> RangeFetcher for Arc<F> {
    fn fetch(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        (**self).fetch(buf, offset)
    }
}

impl<F: RangeFetcher + ?Sized> RangeFetcher for Box<F> {
    fn fetch(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        (**self).fetch(buf, offset)
    }
}

impl RangeFetcher for [u8] {
    fn fetch(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        if offset >= self.len() as u64 {
            return Ok(0);
        }
        let start = offset as usize;
        let n = buf.len().min(self.len() - start);
        buf[..n].copy_from_slice(&self[start..start + n]);
        Ok(n)
    }
}

impl RangeFetcher for Vec<u8> {
    fn fetch(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        self.as_slice().fetch(buf, offset)
    }
}

impl RangeFetcher for Bytes {
    fn fetch(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        (**self).fetch(buf, offset)
    }
}

/// Serves ranges of a local file.
///
/// Fetches use positional reads, so concurrent misses on different blocks
/// do not serialize on a shared cursor. Platforms without positional reads
/// fall back to seek + read under a lock.
#[derive(Debug)]
pub struct FileFetcher {
    file: File,
    len: u64,
    #[cfg(not(any(unix, windows)))]
    cursor: parking_lot::Mutex<()>,
}

impl FileFetcher {
    /// Open the file at `path` for ranged reads.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Self::new(File::open(path)?)
    }

    /// Wrap an already open file.
    pub fn new(file: File) -> io::Result<Self> {
        let len = file.metadata()?.len();
        Ok(Self {
            file,
            len,
            #[cfg(not(any(unix, windows)))]
            cursor: parking_lot::Mutex::new(()),
        })
    }

    /// Length of the file when it was opened.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns true if the file was empty when opened.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[cfg(unix)]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        std::os::unix::fs::FileExt::read_at(&self.file, buf, offset)
    }

    #[cfg(windows)]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        std::os::windows::fs::FileExt::seek_read(&self.file, buf, offset)
    }

    #[cfg(not(any(unix, windows)))]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        use std::io::{Read, Seek, SeekFrom};

        let _cursor = self.cursor.lock();
        let mut file = &self.file;
        file.seek(SeekFrom::Start(offset))?;
        file.read(buf)
    }
}

impl RangeFetcher for FileFetcher {
    fn fetch(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read_at(&mut buf[filled..], offset + filled as u64) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_slice_fetch() {
        let data: Vec<u8> = (0u8..32).collect();
        let mut buf = [0u8; 8];

        assert_eq!(data.fetch(&mut buf, 4).unwrap(), 8);
        assert_eq!(buf, [4, 5, 6, 7, 8, 9, 10, 11]);
    }

    #[test]
    fn test_slice_fetch_short_at_end() {
        let data = Bytes::from_static(b"abcdef");
        let mut buf = [0u8; 4];

        assert_eq!(data.fetch(&mut buf, 4).unwrap(), 2);
        assert_eq!(&buf[..2], b"ef");
        assert_eq!(data.fetch(&mut buf, 6).unwrap(), 0);
    }

    #[test]
    fn test_arc_fetcher_delegates() {
        let data: Arc<Vec<u8>> = Arc::new(vec![9u8; 16]);
        let mut buf = [0u8; 4];
        assert_eq!(data.fetch(&mut buf, 12).unwrap(), 4);
        assert_eq!(buf, [9; 4]);
    }

    #[test]
    fn test_file_fetcher() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(b"hello, ranged world").unwrap();
        tmp.flush().unwrap();

        let fetcher = FileFetcher::open(tmp.path()).unwrap();
        assert_eq!(fetcher.len(), 19);
        assert!(!fetcher.is_empty());

        let mut buf = [0u8; 6];
        assert_eq!(fetcher.fetch(&mut buf, 7).unwrap(), 6);
        assert_eq!(&buf, b"ranged");

        // Short read at end of file
        let mut buf = [0u8; 10];
        assert_eq!(fetcher.fetch(&mut buf, 14).unwrap(), 5);
        assert_eq!(&buf[..5], b"world");
    }

    #[test]
    fn test_file_fetcher_concurrent_offsets() {
        use std::thread;

        let data: Vec<u8> = (0..64 * 1024).map(|i| (i % 241) as u8).collect();
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(&data).unwrap();
        tmp.flush().unwrap();

        let fetcher = Arc::new(FileFetcher::open(tmp.path()).unwrap());
        let data = Arc::new(data);
        let mut handles = vec![];

        for thread_id in 0..8usize {
            let fetcher = Arc::clone(&fetcher);
            let data = Arc::clone(&data);
            handles.push(thread::spawn(move || {
                let mut buf = vec![0u8; 1000];
                for i in 0..50usize {
                    let offset = (thread_id * 4001 + i * 997) % (data.len() - 1000);
                    assert_eq!(fetcher.fetch(&mut buf, offset as u64).unwrap(), 1000);
                    assert_eq!(&buf[..], &data[offset..offset + 1000]);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
