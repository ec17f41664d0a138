use super::Completion;
use crate::reactor::poller::common::Interest;

use std::os::fd::RawFd;

/// A file descriptor registered with the reactor.
///
/// A source keeps the callbacks of every operation waiting on it. The
/// reactor only watches the descriptor while some operation waits, and
/// only in the directions that are waited on.
pub(crate) struct IoSource {
    /// The underlying file descriptor.
    pub(crate) fd: RawFd,

    /// Interest currently registered with the poller, if any.
    pub(crate) registered: Option<Interest>,

    /// Operations waiting for the descriptor to become readable.
    pub(crate) readers: Vec<Completion>,

    /// Operations waiting for the descriptor to become writable.
    pub(crate) writers: Vec<Completion>,
}

impl IoSource {
    pub(crate) fn new(fd: RawFd) -> Self {
        Self {
            fd,
            registered: None,
            readers: Vec::new(),
            writers: Vec::new(),
        }
    }

    /// Returns the interest required by the current waiters.
    pub(crate) fn interest(&self) -> Interest {
        Interest {
            read: !self.readers.is_empty(),
            write: !self.writers.is_empty(),
        }
    }

    /// Returns the number of waiting operations.
    pub(crate) fn waiters(&self) -> usize {
        self.readers.len() + self.writers.len()
    }
}
