//! Block cache for remote byte ranges.
//!
//! Provides a capacity-bounded LRU (Least Recently Used) cache of
//! fixed-size, block-aligned chunks of the source so repeated and
//! overlapping reads are served without going back to the fetcher.

mod block;
mod lru;

pub use block::Block;
pub use lru::{BlockCache, CacheStats};
