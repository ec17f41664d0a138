//! Reactor core and event handling.
//!
//! This module implements the reactor owned by each scheduler.
//! The reactor is responsible for:
//! - driving I/O readiness through the platform poller,
//! - managing timers,
//! - handing completions to the idle coroutine one at a time.
//!
//! A completion is a plain callback. Reactor callbacks settle promises,
//! and settling a promise schedules whatever coroutine waits on it.
//!
//! Most runtime users do not interact with the reactor directly;
//! it is an internal component used by timers and sockets.

mod core;
mod event;
mod io;
mod poller;
mod source;
mod timer;

pub(crate) use core::Reactor;
pub(crate) use poller::platform;
pub(crate) use source::{Direction, Source};

/// A callback run by the reactor when a timer fires or a descriptor
/// becomes ready.
pub(crate) type Completion = Box<dyn FnOnce()>;
