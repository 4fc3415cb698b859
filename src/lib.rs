//! # rangecache - Cached Random Access over Remote Byte Ranges
//!
//! rangecache provides random-access reads over a large byte sequence that
//! can only be reached through coarse, possibly expensive range fetches
//! (for example HTTP range requests). Reads are served from a fixed-size
//! block cache with a bounded number of blocks and least-recently-used
//! eviction.
//!
//! ## Architecture
//!
//! - **RangeFetcher**: Supplies the bytes of one aligned block on a cache miss
//! - **HttpFetcher**: Range-request fetcher for remote HTTP(S) resources (`http` feature)
//! - **BlockCache**: Capacity-bounded, thread-safe LRU store of aligned blocks
//! - **CachedReader**: Splits arbitrary reads into block lookups and fetches
//! - **SeekableReader**: Cursor adapter implementing `Read` and `Seek`
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use rangecache::{CacheOptions, CachedReader, FileFetcher, SeekableReader};
//! use std::io::Read;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = FileFetcher::open("./large.bin")?;
//! let size = fetcher.len();
//!
//! let options = CacheOptions::default().block_size(64 * 1024).max_blocks(32);
//! let reader = CachedReader::new(fetcher, size, &options)?;
//!
//! // Positional reads
//! let mut header = [0u8; 16];
//! reader.read_at(&mut header, 0)?;
//!
//! // Sequential reads
//! let mut stream = SeekableReader::new(reader);
//! let mut contents = Vec::new();
//! stream.read_to_end(&mut contents)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
#[cfg(feature = "http")]
pub mod http;
pub mod reader;
pub mod stream;

// Re-exports
pub use cache::{Block, BlockCache, CacheStats};
pub use config::CacheOptions;
pub use error::{Error, Result};
pub use fetcher::{FileFetcher, RangeFetcher};
#[cfg(feature = "http")]
pub use http::HttpFetcher;
pub use reader::CachedReader;
pub use stream::SeekableReader;
