use super::Stream;
use crate::error::Result;

/// Default number of bytes requested from the stream per read.
const DEFAULT_CHUNK: usize = 4096;

/// Adds framing helpers to a [`Stream`].
///
/// Every method waits on the underlying stream, so it must be called from
/// a coroutine (or the thread driving a [`Runtime`](crate::Runtime)).
/// Bytes read past the end of a frame are kept and returned first by the
/// next call.
///
/// # Examples
///
/// ```rust,ignore
/// let mut reader = BufReader::new(stream.clone());
///
/// loop {
///     let line = reader.read_line(4096)?;
///     if line.is_empty() {
///         break;
///     }
///     stream.write(&line).wait()?;
/// }
/// ```
pub struct BufReader<S> {
    inner: S,
    buffer: Vec<u8>,
    offset: usize,
    chunk: usize,
}

impl<S: Stream> BufReader<S> {
    /// Wraps `inner`.
    pub fn new(inner: S) -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK, inner)
    }

    /// Wraps `inner`, requesting `chunk` bytes per underlying read.
    ///
    /// # Panics
    ///
    /// Panics if `chunk == 0`.
    pub fn with_chunk_size(chunk: usize, inner: S) -> Self {
        assert!(chunk > 0, "chunk size must be > 0");

        Self {
            inner,
            buffer: Vec::new(),
            offset: 0,
            chunk,
        }
    }

    /// Returns a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Returns the underlying stream, discarding any buffered bytes.
    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Returns the bytes read from the stream but not yet consumed.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer[self.offset..]
    }

    /// Reads up to `max_len` bytes.
    ///
    /// Buffered bytes are returned first without touching the stream. An
    /// empty result means end of stream.
    pub fn read(&mut self, max_len: usize) -> Result<Vec<u8>> {
        if max_len == 0 {
            return Ok(Vec::new());
        }

        if !self.buffer().is_empty() {
            return Ok(self.take_buffered(max_len));
        }

        self.inner.read(max_len).wait()
    }

    /// Reads exactly `len` bytes, unless the stream ends first.
    ///
    /// The result is shorter than `len` only at end of stream.
    pub fn read_exact(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(len);

        while out.len() < len {
            let chunk = self.read(len - out.len())?;
            if chunk.is_empty() {
                break;
            }
            out.extend_from_slice(&chunk);
        }

        Ok(out)
    }

    /// Reads one line, up to and including the next `\n`.
    ///
    /// The line is cut short at end of stream, or after `max_len` bytes if
    /// no newline appears before that. An empty result means end of
    /// stream.
    pub fn read_line(&mut self, max_len: usize) -> Result<Vec<u8>> {
        let mut line = Vec::new();

        while line.len() < max_len {
            if self.buffer().is_empty() {
                let chunk = self.inner.read(self.chunk).wait()?;
                if chunk.is_empty() {
                    break;
                }
                self.buffer = chunk;
                self.offset = 0;
            }

            let available = self.buffer();
            let wanted = (max_len - line.len()).min(available.len());

            match available[..wanted].iter().position(|&b| b == b'\n') {
                Some(newline) => {
                    line.extend(self.take_buffered(newline + 1));
                    break;
                }
                None => line.extend(self.take_buffered(wanted)),
            }
        }

        Ok(line)
    }

    fn take_buffered(&mut self, max_len: usize) -> Vec<u8> {
        let available = &self.buffer[self.offset..];
        let n = available.len().min(max_len);
        let out = available[..n].to_vec();

        self.offset += n;
        if self.offset == self.buffer.len() {
            self.buffer.clear();
            self.offset = 0;
        }

        out
    }
}
