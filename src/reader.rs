//! Positional reads through the block cache.
//!
//! [`CachedReader`] turns an arbitrary `(offset, len)` request into a walk
//! over aligned blocks: hits are copied straight from the cache, misses are
//! fetched as whole (clipped) blocks, admitted, then copied.

use crate::cache::{Block, BlockCache, CacheStats};
use crate::config::CacheOptions;
use crate::error::{Error, Result};
use crate::fetcher::RangeFetcher;
use bytes::BytesMut;
use std::io;
use std::sync::Arc;

/// Random-access reader over a fetcher, backed by a [`BlockCache`].
///
/// Usage:
/// ```
/// use rangecache::{CacheOptions, CachedReader};
///
/// let source: Vec<u8> = (0..4096u32).map(|i| i as u8).collect();
/// let options = CacheOptions::new().block_size(512).max_blocks(4);
/// let reader = CachedReader::new(source, 4096, &options).unwrap();
///
/// let mut buf = [0u8; 16];
/// assert_eq!(reader.read_at(&mut buf, 1020).unwrap(), 16);
/// assert_eq!(buf[0], (1020 % 256) as u8);
/// ```
///
/// # Thread Safety
///
/// `read_at` takes `&self` and may be called from many threads at once.
/// Two callers missing on the same block may both fetch it; only one copy
/// is kept by the cache, and each caller still serves its own read from
/// the bytes it fetched or the cached copy.
#[derive(Debug)]
pub struct CachedReader<F> {
    fetcher: F,
    cache: Arc<BlockCache>,
}

impl<F: RangeFetcher> CachedReader<F> {
    /// Create a reader over `fetcher` for a source of `total_size` bytes.
    pub fn new(fetcher: F, total_size: u64, options: &CacheOptions) -> Result<Self> {
        let cache = BlockCache::new(options, total_size)?;
        Ok(Self::with_cache(fetcher, Arc::new(cache)))
    }

    /// Create a reader that populates an existing cache.
    ///
    /// The cache's `total_size` must describe the source `fetcher` reads.
    pub fn with_cache(fetcher: F, cache: Arc<BlockCache>) -> Self {
        Self { fetcher, cache }
    }

    /// Read bytes starting at `offset` into `buf`.
    ///
    /// Returns the number of bytes read. This is `buf.len()` unless the
    /// request runs past the end of the source, in which case the read is
    /// clipped there. An empty `buf` returns `Ok(0)` immediately.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRange`] if `offset` is at or beyond the end of the source.
    /// - [`Error::Fetch`] if the fetcher fails or returns a short read. The
    ///   bytes already copied into `buf` stay valid and their count is
    ///   available through [`Error::assembled`].
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let total_size = self.cache.total_size();
        if offset >= total_size {
            return Err(Error::InvalidRange { offset, total_size });
        }

        let want = buf.len().min((total_size - offset).min(usize::MAX as u64) as usize);
        let block_size = self.cache.block_size() as u64;
        let mut n = 0;
        let mut aligned = self.cache.align(offset);

        while n < want {
            let block = match self.cache.lookup(aligned) {
                Some(block) => {
                    log::trace!("Cache hit for block at offset {}", aligned);
                    block
                }
                None => self.fetch_block(aligned).map_err(|source| {
                    log::warn!(
                        "Fetch of block at offset {} failed after {} bytes: {}",
                        aligned,
                        n,
                        source
                    );
                    Error::Fetch { offset: aligned, assembled: n, source }
                })?,
            };

            let copied = block.copy_from(offset + n as u64, &mut buf[n..want]);
            if copied == 0 {
                // Block does not cover the cursor, which admit() rules out.
                return Err(Error::Fetch {
                    offset: aligned,
                    assembled: n,
                    source: io::Error::new(
                        io::ErrorKind::InvalidData,
                        "cached block does not cover requested offset",
                    ),
                });
            }
            n += copied;
            aligned += block_size;
        }

        Ok(n)
    }

    /// Fetch the block at `aligned` and admit it to the cache.
    ///
    /// Returns the block to copy from: the cached instance if another caller
    /// admitted the same offset first, otherwise the freshly fetched one.
    fn fetch_block(&self, aligned: u64) -> io::Result<Block> {
        let len = self.cache.block_len(aligned);
        log::debug!("Cache miss, fetching {} bytes at offset {}", len, aligned);

        let mut data = BytesMut::zeroed(len);
        let read = self.fetcher.fetch(&mut data, aligned)?;
        if read < len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("short read at offset {}: got {} of {} bytes", aligned, read, len),
            ));
        }

        let fetched = Block::new(aligned, data.freeze());
        match self.cache.admit(fetched.clone()) {
            Ok(cached) => {
                if cached.data().as_ptr() != fetched.data().as_ptr() {
                    log::debug!("Discarded duplicate fetch of block at offset {}", aligned);
                }
                Ok(cached)
            }
            Err(e) => Err(io::Error::from(e)),
        }
    }

    /// Logical length of the source.
    pub fn size(&self) -> u64 {
        self.cache.total_size()
    }

    /// The cache backing this reader.
    pub fn cache(&self) -> &Arc<BlockCache> {
        &self.cache
    }

    /// Current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// The fetcher consulted on cache misses.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }
}
