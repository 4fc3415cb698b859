//! Sequential access on top of [`CachedReader`].

use crate::error::{Error, Result};
use crate::fetcher::RangeFetcher;
use crate::reader::CachedReader;
use std::io::{self, Read, Seek, SeekFrom};

/// A cursor over a [`CachedReader`], implementing [`Read`] and [`Seek`].
///
/// Seeking past the end is allowed; reads from there return `Ok(0)`.
/// The cursor only advances when a read succeeds, so a failed read can be
/// retried from the same position.
#[derive(Debug)]
pub struct SeekableReader<F> {
    inner: CachedReader<F>,
    position: u64,
}

impl<F: RangeFetcher> SeekableReader<F> {
    /// Wrap `inner` with a cursor at position 0.
    pub fn new(inner: CachedReader<F>) -> Self {
        Self { inner, position: 0 }
    }

    /// Current cursor position.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Logical length of the source.
    pub fn size(&self) -> u64 {
        self.inner.size()
    }

    /// Positional read that leaves the cursor untouched.
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        self.inner.read_at(buf, offset)
    }

    /// Borrow the underlying positional reader.
    pub fn get_ref(&self) -> &CachedReader<F> {
        &self.inner
    }

    /// Unwrap into the underlying positional reader.
    pub fn into_inner(self) -> CachedReader<F> {
        self.inner
    }
}

impl<F: RangeFetcher> Read for SeekableReader<F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.read_at(buf, self.position) {
            Ok(n) => {
                self.position += n as u64;
                Ok(n)
            }
            Err(Error::InvalidRange { .. }) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

impl<F: RangeFetcher> Seek for SeekableReader<F> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (base, delta) = match pos {
            SeekFrom::Start(offset) => {
                self.position = offset;
                return Ok(offset);
            }
            SeekFrom::Current(delta) => (self.position, delta),
            SeekFrom::End(delta) => (self.size(), delta),
        };

        match base.checked_add_signed(delta) {
            Some(position) => {
                self.position = position;
                Ok(position)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }
}
