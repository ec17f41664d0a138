//! Byte streams.
//!
//! [`Stream`] is the capability every connection type implements: reads
//! and writes return promises, so a coroutine can wait on them in blocking
//! style while other coroutines keep running.
//!
//! [`BufReader`] layers the usual framing helpers (read an exact number of
//! bytes, read one line) on top of any stream, keeping bytes read past the
//! end of a frame for the next call.

mod buffered;

pub use buffered::BufReader;

use crate::promise::Promise;

/// A bidirectional byte stream.
pub trait Stream {
    /// Reads up to `max_len` bytes.
    ///
    /// Resolves with the bytes read, which may be fewer than `max_len`.
    /// An empty buffer means end of stream, not a failure.
    fn read(&self, max_len: usize) -> Promise<Vec<u8>>;

    /// Writes all of `data`.
    ///
    /// Resolves with the number of bytes written, which equals
    /// `data.len()` unless the write failed.
    fn write(&self, data: &[u8]) -> Promise<usize>;

    /// Closes the stream.
    ///
    /// Pending reads and writes are rejected with
    /// [`Cancelled`](crate::Error::Cancelled).
    fn close(&self);
}
