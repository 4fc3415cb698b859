//! HTTP range-request fetcher.
//!
//! [`HttpFetcher`] reads a remote resource from servers that support
//! `Range` requests. The resource length is taken from a `HEAD` request's
//! `Content-Length`. If the server does not answer `HEAD` with a length,
//! it falls back to the total in the `Content-Range` of a one-byte ranged `GET`.

use crate::fetcher::RangeFetcher;
use std::io::{self, Read};
use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches block ranges from an HTTP(S) URL.
///
/// Every fetch is a `GET` with `Range: bytes=<start>-<end>` (inclusive end).
/// Responses other than `206 Partial Content` are errors, and a body
/// shorter than the requested range is reported as a short read.
///
/// Usage:
/// ```no_run
/// use rangecache::{CacheOptions, CachedReader, HttpFetcher};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = HttpFetcher::open("https://example.com/large.bin")?;
/// let size = fetcher.len();
/// let reader = CachedReader::new(fetcher, size, &CacheOptions::default())?;
///
/// let mut buf = [0u8; 512];
/// reader.read_at(&mut buf, 4096)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct HttpFetcher {
    agent: ureq::Agent,
    url: String,
    len: u64,
}

impl HttpFetcher {
    /// Connect to `url` with the default timeout and read the resource size.
    pub fn open(url: impl Into<String>) -> io::Result<Self> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    /// Connect to `url` with a custom per-request timeout.
    ///
    /// # Errors
    ///
    /// Fails if the server is unreachable or reports no usable length
    /// (`io::ErrorKind::Unsupported`).
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> io::Result<Self> {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        let url = url.into();
        let len = remote_size(&agent, &url)?;
        log::debug!("Opened {} ({} bytes)", url, len);
        Ok(Self { agent, url, len })
    }

    /// Size of the remote resource as reported when the fetcher was opened.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns true if the remote resource is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The URL being fetched.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RangeFetcher for HttpFetcher {
    fn fetch(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let last = offset.saturating_add(buf.len() as u64 - 1);
        log::debug!("GET {} bytes={}-{}", self.url, offset, last);

        let response = self
            .agent
            .get(&self.url)
            .set("Range", &format!("bytes={}-{}", offset, last))
            .call()
            .map_err(to_io_error)?;

        if response.status() != 206 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("expected 206 Partial Content, got {}", response.status()),
            ));
        }
        if let Some(range) = response.header("Content-Range") {
            match parse_content_range(range) {
                Some((start, _)) if start == offset => {}
                _ => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("unexpected Content-Range {:?} for offset {}", range, offset),
                    ))
                }
            }
        }

        let mut body = response.into_reader();
        let mut filled = 0;
        while filled < buf.len() {
            match body.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

/// Determine the resource length via `HEAD`, then via a one-byte ranged `GET`.
fn remote_size(agent: &ureq::Agent, url: &str) -> io::Result<u64> {
    match agent.head(url).call() {
        Ok(response) => {
            if let Some(len) = response.header("Content-Length").and_then(|v| v.parse().ok()) {
                return Ok(len);
            }
        }
        Err(ureq::Error::Status(code, _)) => {
            log::debug!("HEAD {} returned {}, retrying with ranged GET", url, code);
        }
        Err(e) => return Err(to_io_error(e)),
    }

    let response = agent.get(url).set("Range", "bytes=0-0").call().map_err(to_io_error)?;
    if response.status() == 206 {
        let range = response.header("Content-Range").and_then(parse_content_range);
        if let Some((_, Some(total))) = range {
            return Ok(total);
        }
    }
    Err(io::Error::new(io::ErrorKind::Unsupported, format!("unseekable content at {}", url)))
}

/// Parse `bytes <start>-<end>/<total>` into the start offset and the total, if known.
fn parse_content_range(value: &str) -> Option<(u64, Option<u64>)> {
    let rest = value.trim().strip_prefix("bytes ")?;
    let (range, total) = rest.split_once('/')?;
    let (start, _) = range.split_once('-')?;
    let total = match total.trim() {
        "*" => None,
        n => Some(n.parse().ok()?),
    };
    Some((start.trim().parse().ok()?, total))
}

fn to_io_error(err: ureq::Error) -> io::Error {
    match err {
        ureq::Error::Status(code, _) => {
            io::Error::new(io::ErrorKind::Other, format!("HTTP status {}", code))
        }
        ureq::Error::Transport(transport) => {
            io::Error::new(io::ErrorKind::Other, transport.to_string())
        }
    }
}
