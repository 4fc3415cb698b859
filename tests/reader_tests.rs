// Reader Tests for rangecache
// These tests exercise block assembly, end-of-source handling and fetch failures

use rangecache::{CacheOptions, CachedReader, Error, FileFetcher, RangeFetcher, SeekableReader};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::NamedTempFile;

const BLOCK_SIZE: usize = 512;

/// Source where each block starts with a "blockN" marker
fn marked_source(blocks: usize) -> Vec<u8> {
    let mut buf = vec![0u8; blocks * BLOCK_SIZE];
    for i in 0..blocks {
        let marker = format!("block{}", i);
        buf[i * BLOCK_SIZE..i * BLOCK_SIZE + marker.len()].copy_from_slice(marker.as_bytes());
    }
    buf
}

/// Fails every fetch after the first `allowed` calls
struct FlakyFetcher {
    data: Vec<u8>,
    allowed: usize,
    calls: AtomicUsize,
}

impl RangeFetcher for FlakyFetcher {
    fn fetch(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        if self.calls.fetch_add(1, Ordering::SeqCst) >= self.allowed {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "remote timed out"));
        }
        self.data.fetch(buf, offset)
    }
}

#[test]
fn test_read_every_block() {
    let data = marked_source(32);
    let options = CacheOptions::new().block_size(BLOCK_SIZE).max_blocks(8);
    let reader = CachedReader::new(data.clone(), data.len() as u64, &options).unwrap();

    let mut buf = vec![0u8; BLOCK_SIZE];
    for i in 0..32 {
        let n = reader.read_at(&mut buf, (i * BLOCK_SIZE) as u64).unwrap();
        assert_eq!(n, BLOCK_SIZE);
        let marker = format!("block{}", i);
        assert_eq!(&buf[..marker.len()], marker.as_bytes());
    }
    assert!(reader.cache().len() <= 8);
}

#[test]
fn test_read_spanning_adjacent_blocks_hit_or_miss() {
    let data: Vec<u8> = (0..4096u32).map(|i| (i * 7 % 256) as u8).collect();
    let options = CacheOptions::new().block_size(BLOCK_SIZE).max_blocks(2);
    let reader = CachedReader::new(data.clone(), 4096, &options).unwrap();

    let offset = 1000u64;
    let mut cold = vec![0u8; 300];
    let mut warm = vec![0u8; 300];

    reader.read_at(&mut cold, offset).unwrap();
    reader.read_at(&mut warm, offset).unwrap();

    let expected = [&data[1000..1024], &data[1024..1300]].concat();
    assert_eq!(cold, expected);
    assert_eq!(warm, expected);
    assert_eq!(reader.stats().hits, 2);
}

#[test]
fn test_read_ending_exactly_at_end() {
    let data = vec![3u8; 1300];
    let options = CacheOptions::new().block_size(BLOCK_SIZE).max_blocks(4);
    let reader = CachedReader::new(data, 1300, &options).unwrap();

    let mut buf = vec![0u8; 300];
    assert_eq!(reader.read_at(&mut buf, 1000).unwrap(), 300);

    let err = reader.read_at(&mut buf, 1300).unwrap_err();
    assert!(err.is_eof());
}

#[test]
fn test_multi_block_failure_returns_partial_count() {
    env_logger::try_init().ok();

    let fetcher =
        FlakyFetcher { data: marked_source(8), allowed: 2, calls: AtomicUsize::new(0) };
    let options = CacheOptions::new().block_size(BLOCK_SIZE).max_blocks(8);
    let reader = CachedReader::new(fetcher, (8 * BLOCK_SIZE) as u64, &options).unwrap();

    let mut buf = vec![0u8; 4 * BLOCK_SIZE];
    let err = reader.read_at(&mut buf, 0).unwrap_err();

    assert_eq!(err.assembled(), 2 * BLOCK_SIZE);
    match err {
        Error::Fetch { offset, source, .. } => {
            assert_eq!(offset, 2 * BLOCK_SIZE as u64);
            assert_eq!(source.kind(), io::ErrorKind::TimedOut);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(&buf[..6], b"block0");
    assert_eq!(&buf[BLOCK_SIZE..BLOCK_SIZE + 6], b"block1");

    // The blocks that made it are still served from cache
    let mut again = vec![0u8; 2 * BLOCK_SIZE];
    assert_eq!(reader.read_at(&mut again, 0).unwrap(), 2 * BLOCK_SIZE);
}

#[test]
fn test_file_fetcher_through_stream() {
    let data = marked_source(16);
    let mut tmp = NamedTempFile::new().unwrap();
    tmp.write_all(&data).unwrap();
    tmp.flush().unwrap();

    let fetcher = FileFetcher::open(tmp.path()).unwrap();
    let size = fetcher.len();
    let options = CacheOptions::new().block_size(BLOCK_SIZE).max_blocks(4);
    let mut stream = SeekableReader::new(CachedReader::new(fetcher, size, &options).unwrap());

    // Twice to hit the cache on the second pass for the tail blocks
    for _ in 0..2 {
        stream.seek(SeekFrom::Start(0)).unwrap();
        let mut out = Vec::new();
        assert_eq!(stream.read_to_end(&mut out).unwrap(), data.len());
        assert_eq!(out, data);
    }

    assert_eq!(stream.size(), (16 * BLOCK_SIZE) as u64);
}

#[test]
fn test_stream_surfaces_fetch_error() {
    let fetcher = FlakyFetcher { data: marked_source(4), allowed: 0, calls: AtomicUsize::new(0) };
    let options = CacheOptions::new().block_size(BLOCK_SIZE).max_blocks(4);
    let mut stream = SeekableReader::new(
        CachedReader::new(fetcher, (4 * BLOCK_SIZE) as u64, &options).unwrap(),
    );

    let mut buf = [0u8; 16];
    let err = stream.read(&mut buf).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    assert_eq!(stream.position(), 0);
}
