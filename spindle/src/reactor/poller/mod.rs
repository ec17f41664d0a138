//! Platform-specific I/O poller abstraction.
//!
//! The poller is used by the reactor to:
//! - register file descriptors with read/write interests,
//! - wait for I/O readiness events, bounded by the next timer deadline.
//!
//! Only the Linux `epoll` backend exists; the runtime's context switching
//! is Linux-only as well.

pub(crate) mod common;

mod epoll;

pub(crate) type Poller = epoll::EpollPoller;

pub(crate) mod unix;

pub(crate) use unix as platform;
