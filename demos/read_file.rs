// Read a local file or HTTP(S) URL through the block cache and report cache statistics.
//
// Usage: cargo run --example read_file -- <path|url> [block_size] [max_blocks]

use anyhow::{bail, Context};
use rangecache::{CacheOptions, CachedReader, FileFetcher, RangeFetcher, SeekableReader};
use std::io::{Read, Seek, SeekFrom};

fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: read_file <path|url> [block_size] [max_blocks]");
    };

    let mut options = CacheOptions::default();
    if let Some(block_size) = args.next() {
        options = options.block_size(block_size.parse().context("invalid block_size")?);
    }
    if let Some(max_blocks) = args.next() {
        options = options.max_blocks(max_blocks.parse().context("invalid max_blocks")?);
    }

    let (fetcher, size) = open_source(&path)?;
    let reader = CachedReader::new(fetcher, size, &options)?;
    let mut stream = SeekableReader::new(reader);

    println!(
        "Reading {} ({} bytes, {} byte blocks, {} blocks cached)",
        path, size, options.block_size, options.max_blocks
    );

    // Twice to hit the cache
    let mut buf = vec![0u8; 8192];
    for pass in 1..=2 {
        stream.seek(SeekFrom::Start(0))?;
        let mut total = 0u64;
        loop {
            let n = stream.read(&mut buf)?;
            if n == 0 {
                break;
            }
            total += n as u64;
        }
        println!("Pass {}: read {} bytes", pass, total);
    }

    let stats = stream.get_ref().stats();
    println!("Cache statistics:");
    println!("  Lookups:    {}", stats.lookups);
    println!("  Hits:       {}", stats.hits);
    println!("  Misses:     {}", stats.misses);
    println!("  Insertions: {}", stats.insertions);
    println!("  Evictions:  {}", stats.evictions);
    println!("  Hit rate:   {:.2}%", stats.hit_rate() * 100.0);

    Ok(())
}

fn open_source(path: &str) -> anyhow::Result<(Box<dyn RangeFetcher>, u64)> {
    #[cfg(feature = "http")]
    if path.starts_with("http://") || path.starts_with("https://") {
        let fetcher = rangecache::HttpFetcher::open(path)
            .with_context(|| format!("failed to open {}", path))?;
        let size = fetcher.len();
        return Ok((Box::new(fetcher), size));
    }

    let fetcher = FileFetcher::open(path).with_context(|| format!("failed to open {}", path))?;
    let size = fetcher.len();
    Ok((Box::new(fetcher), size))
}
