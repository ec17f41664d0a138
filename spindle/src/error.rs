//! Error type carried by rejected promises.

use std::io;
use std::sync::Arc;

use thiserror::Error;

/// A specialized [`Result`](std::result::Result) whose error is [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// The structured error value a [`Promise`](crate::Promise) is rejected with.
///
/// `Error` is cheap to clone so that every observer of a rejected promise
/// (waiting coroutines, `except` callbacks, combinators) receives the same
/// value.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The promise was dropped, or its producer torn down, before it settled.
    #[error("operation cancelled")]
    Cancelled,

    /// A deadline elapsed before the operation completed.
    #[error("operation timed out")]
    TimedOut,

    /// An operating system I/O failure.
    #[error(transparent)]
    Io(Arc<io::Error>),

    /// A failure raised explicitly by user code.
    #[error("{0}")]
    Message(String),
}

impl Error {
    /// Creates an error carrying a free-form message.
    ///
    /// This is the usual way for a spawned function to reject its promise:
    ///
    /// ```rust,ignore
    /// spawn(|| Err(Error::msg("bad request")));
    /// ```
    pub fn msg(message: impl Into<String>) -> Self {
        Error::Message(message.into())
    }

    /// Returns `true` if this is [`Error::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Returns `true` if this is [`Error::TimedOut`].
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Error::TimedOut)
    }

    /// Returns the kind of the underlying I/O error, if any.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Error::Io(err) => Some(err.kind()),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(Arc::new(err))
    }
}

impl From<io::ErrorKind> for Error {
    fn from(kind: io::ErrorKind) -> Self {
        Error::Io(Arc::new(io::Error::from(kind)))
    }
}
