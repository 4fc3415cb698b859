//! Configuration options for the block cache.

/// Default block size in bytes (32KB).
pub const DEFAULT_BLOCK_SIZE: usize = 32 * 1024;

/// Default cache capacity in blocks.
pub const DEFAULT_MAX_BLOCKS: usize = 100;

/// Configuration options for a [`BlockCache`](crate::cache::BlockCache).
///
/// The logical length of the source is not an option; it is supplied when
/// the cache is constructed and stays fixed for the cache's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    /// Bytes per block. Every cached block starts at a multiple of this.
    /// Default: 32KB
    pub block_size: usize,

    /// Maximum number of blocks held at once.
    /// Default: 100
    pub max_blocks: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self { block_size: DEFAULT_BLOCK_SIZE, max_blocks: DEFAULT_MAX_BLOCKS }
    }
}

impl CacheOptions {
    /// Creates a new CacheOptions with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the block size.
    pub fn block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self
    }

    /// Sets the cache capacity in blocks.
    pub fn max_blocks(mut self, count: usize) -> Self {
        self.max_blocks = count;
        self
    }

    /// Upper bound on the bytes held by a cache built from these options.
    pub fn memory_budget(&self) -> usize {
        self.block_size.saturating_mul(self.max_blocks)
    }

    /// Validates the options and returns an error if any are invalid.
    pub fn validate(&self) -> crate::Result<()> {
        if self.block_size == 0 {
            return Err(crate::Error::invalid_argument("block_size must be > 0"));
        }
        if self.max_blocks == 0 {
            return Err(crate::Error::invalid_argument("max_blocks must be > 0"));
        }
        Ok(())
    }
}
