//! LRU (Least Recently Used) cache implementation for block caching.
//!
//! This module provides a thread-safe LRU cache of block-aligned chunks of
//! a fixed-length source. Recency is tracked with an index-linked list over
//! a node arena, so touching a block and evicting the oldest one are both O(1).

use super::block::Block;
use crate::config::CacheOptions;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Statistics for cache performance monitoring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of cache lookups
    pub lookups: u64,
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of blocks inserted
    pub insertions: u64,
    /// Number of admissions discarded because the offset was already cached
    pub duplicates: u64,
    /// Number of evictions
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.hits as f64 / self.lookups as f64
        }
    }

    /// Reset all statistics to zero
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A node in the recency list.
#[derive(Debug)]
struct Node {
    block: Block,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Mapping plus recency order, always mutated together under one lock.
#[derive(Debug, Default)]
struct LruList {
    /// Map from aligned offset to node index.
    index: HashMap<u64, usize>,
    /// Node storage (indices instead of pointers).
    nodes: Vec<Option<Node>>,
    /// Free list of node indices.
    free: Vec<usize>,
    /// Most recently used.
    head: Option<usize>,
    /// Least recently used.
    tail: Option<usize>,
    stats: CacheStats,
}

impl LruList {
    fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.min(1024) + 1;
        Self {
            index: HashMap::with_capacity(capacity),
            nodes: Vec::with_capacity(capacity),
            ..Default::default()
        }
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn block(&self, idx: usize) -> Option<&Block> {
        self.nodes[idx].as_ref().map(|n| &n.block)
    }

    fn push_front(&mut self, block: Block) {
        let offset = block.offset();
        let node = Node { block, prev: None, next: self.head };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = Some(node);
                idx
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };

        if let Some(head) = self.head {
            if let Some(ref mut head_node) = self.nodes[head] {
                head_node.prev = Some(idx);
            }
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }

        self.index.insert(offset, idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match self.nodes[idx].as_ref() {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            Some(p) => {
                if let Some(ref mut prev_node) = self.nodes[p] {
                    prev_node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(ref mut next_node) = self.nodes[n] {
                    next_node.prev = prev;
                }
            }
            None => self.tail = prev,
        }

        if let Some(ref mut node) = self.nodes[idx] {
            node.prev = None;
            node.next = None;
        }
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }

        self.unlink(idx);

        if let Some(ref mut node) = self.nodes[idx] {
            node.next = self.head;
        }
        if let Some(head) = self.head {
            if let Some(ref mut head_node) = self.nodes[head] {
                head_node.prev = Some(idx);
            }
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn pop_back(&mut self) -> Option<Block> {
        let idx = self.tail?;
        self.unlink(idx);
        let node = self.nodes[idx].take()?;
        self.free.push(idx);
        self.index.remove(&node.block.offset());
        Some(node.block)
    }

    fn offsets(&self) -> Vec<u64> {
        let mut out = Vec::with_capacity(self.len());
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            match self.nodes[idx].as_ref() {
                Some(node) => {
                    out.push(node.block.offset());
                    cursor = node.next;
                }
                None => break,
            }
        }
        out
    }
}

/// Thread-safe LRU cache of block-aligned chunks of a fixed-length source.
///
/// Blocks are keyed by aligned offset. The final block of the source is
/// clipped to end at `total_size`, so the cache never holds bytes past the
/// logical end of the source.
///
/// # Thread Safety
///
/// Both [`lookup`](Self::lookup) and [`admit`](Self::admit) reorder the
/// recency list, so every operation takes the same exclusive lock. Blocks
/// returned from either are immutable and can be used after the lock is
/// released. Share the cache across threads with `Arc<BlockCache>`.
#[derive(Debug)]
pub struct BlockCache {
    block_size: u64,
    max_blocks: usize,
    total_size: u64,
    inner: Mutex<LruList>,
}

impl BlockCache {
    /// Create a new BlockCache for a source of `total_size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `block_size` or `max_blocks` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use rangecache::{BlockCache, CacheOptions};
    ///
    /// // 100 blocks of 32KB over a 10MB source
    /// let cache = BlockCache::new(&CacheOptions::default(), 10 * 1024 * 1024).unwrap();
    /// assert_eq!(cache.align(40_000), 32_768);
    /// ```
    pub fn new(options: &CacheOptions, total_size: u64) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            block_size: options.block_size as u64,
            max_blocks: options.max_blocks,
            total_size,
            inner: Mutex::new(LruList::with_capacity(options.max_blocks)),
        })
    }

    /// Round `offset` down to the start of the block containing it.
    pub fn align(&self, offset: u64) -> u64 {
        offset / self.block_size * self.block_size
    }

    /// Length of the block starting at `aligned_offset`.
    ///
    /// This is `block_size` except for the final block, which is clipped at
    /// `total_size`. Offsets at or past the end yield 0.
    pub fn block_len(&self, aligned_offset: u64) -> usize {
        if aligned_offset >= self.total_size {
            return 0;
        }
        (self.total_size - aligned_offset).min(self.block_size) as usize
    }

    /// Get a block from the cache.
    ///
    /// Returns `Some(block)` on a hit and marks the block most recently used,
    /// or `None` on a miss.
    pub fn lookup(&self, aligned_offset: u64) -> Option<Block> {
        let mut inner = self.inner.lock();
        inner.stats.lookups += 1;

        match inner.index.get(&aligned_offset).copied() {
            Some(idx) => {
                inner.move_to_front(idx);
                inner.stats.hits += 1;
                inner.block(idx).cloned()
            }
            None => {
                inner.stats.misses += 1;
                None
            }
        }
    }

    /// Insert a freshly fetched block.
    ///
    /// If a block is already cached at the same offset (a concurrent fetch
    /// won the race), the cached block is marked most recently used and
    /// returned, and `block` is dropped. Otherwise `block` becomes the most
    /// recently used entry and, if the cache now exceeds `max_blocks`, the
    /// least recently used block is evicted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the offset is not aligned, lies at
    /// or past `total_size`, or the payload length differs from
    /// [`block_len`](Self::block_len) for that offset.
    pub fn admit(&self, block: Block) -> Result<Block> {
        let offset = block.offset();
        if offset % self.block_size != 0 {
            return Err(Error::invalid_argument(format!(
                "block offset {} is not aligned to {}",
                offset, self.block_size
            )));
        }
        let expected = self.block_len(offset);
        if expected == 0 {
            return Err(Error::invalid_argument(format!(
                "block offset {} is beyond end of source ({} bytes)",
                offset, self.total_size
            )));
        }
        if block.len() != expected {
            return Err(Error::invalid_argument(format!(
                "block at offset {} has {} bytes, expected {}",
                offset,
                block.len(),
                expected
            )));
        }

        let mut inner = self.inner.lock();

        if let Some(idx) = inner.index.get(&offset).copied() {
            inner.move_to_front(idx);
            inner.stats.duplicates += 1;
            if let Some(existing) = inner.block(idx) {
                return Ok(existing.clone());
            }
        }

        inner.push_front(block.clone());
        inner.stats.insertions += 1;

        if inner.len() > self.max_blocks {
            if let Some(evicted) = inner.pop_back() {
                inner.stats.evictions += 1;
                log::trace!("Evicted block at offset {}", evicted.offset());
            }
        }

        Ok(block)
    }

    /// Check whether a block is cached without touching its recency.
    pub fn contains(&self, aligned_offset: u64) -> bool {
        self.inner.lock().index.contains_key(&aligned_offset)
    }

    /// Cached offsets ordered from most to least recently used.
    pub fn offsets(&self) -> Vec<u64> {
        self.inner.lock().offsets()
    }

    /// Get current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats.clone()
    }

    /// Reset cache statistics to zero.
    pub fn reset_stats(&self) {
        self.inner.lock().stats.reset();
    }

    /// Bytes per block.
    pub fn block_size(&self) -> usize {
        self.block_size as usize
    }

    /// Maximum number of cached blocks.
    pub fn max_blocks(&self) -> usize {
        self.max_blocks
    }

    /// Logical length of the source.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Get the number of blocks in the cache.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
