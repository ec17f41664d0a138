//! Core runtime components.
//!
//! This module contains the building blocks that execute coroutines on a
//! single thread:
//! - coroutines with their own stacks and execution contexts,
//! - the per-thread scheduler with its ready queue and idle loop,
//! - the runtime handle that installs and tears down a scheduler,
//! - spawning and cooperative yielding.
//!
//! Most users will interact with [`Runtime`], [`spawn`](crate::spawn) and
//! the promise API rather than with the scheduler directly.

mod core;
mod scheduler;

pub(crate) mod builder;
pub(crate) mod context;
pub(crate) mod coroutine;
pub(crate) mod yield_now;

pub mod sched;
pub mod task;

pub use core::Runtime;

use std::fmt;
use std::process;

/// Reports an unrecoverable runtime failure and aborts the process.
///
/// Used where unwinding is impossible or meaningless: on coroutine stacks,
/// during teardown, and when the thread is deadlocked. The message goes to
/// the installed logger, or to stderr if none accepts errors.
pub(crate) fn fatal(args: fmt::Arguments<'_>) -> ! {
    if log::log_enabled!(log::Level::Error) {
        log::error!("{args}");
    } else {
        eprintln!("spindle: fatal: {args}");
    }

    process::abort()
}
