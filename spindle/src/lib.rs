//! # Spindle
//!
//! **Spindle** is a single-threaded runtime built on stackful coroutines.
//! Network code is written in plain blocking style, while the I/O
//! underneath stays non-blocking: waiting on a [`Promise`] suspends the
//! calling coroutine and lets the others run until the promise settles.
//!
//! Spindle provides:
//!
//! - **Stackful coroutines** with their own guarded stacks, scheduled
//!   cooperatively from a FIFO ready queue on each thread
//! - **Promises** with `then` / `except` / `finally` callbacks, blocking
//!   [`wait`](Promise::wait), and the combinators [`all`], [`any`],
//!   [`race`] and [`all_settled`]
//! - **Timers** (`Timer`, `sleep`, `timeout`) and **TCP networking** driven
//!   by a per-thread epoll reactor
//! - **Macros** like `#[spindle::main]`, `#[spindle::test]` and
//!   `all!` / `any!` / `race!` / `all_settled!`
//!
//! Spindle targets Linux with glibc.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use spindle::time::sleep;
//! use std::time::Duration;
//!
//! #[spindle::main]
//! fn main() -> spindle::Result<()> {
//!     // Spawn a coroutine; it runs as soon as this one waits.
//!     let greeting = spindle::spawn(|| {
//!         sleep(Duration::from_millis(100)).wait()?;
//!         Ok("done")
//!     });
//!
//!     // Suspend until the coroutine finishes.
//!     println!("{}", greeting.wait()?);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`io`]: The `Stream` trait and buffered framing helpers
//! - [`net`]: TCP listener and stream
//! - [`time`]: Timers, sleep, and timeout
//! - [`sched`]: Direct access to the scheduler
//! - [`task`]: Spawning coroutines

mod error;
mod promise;
mod reactor;
mod runtime;
mod utils;

pub mod io;
pub mod net;
pub mod time;

pub use error::{Error, Result};
pub use promise::{Observable, Promise, WeakPromise, Winner, all, all_settled, any, race};
pub use runtime::Runtime;
pub use runtime::builder::RuntimeBuilder;
pub use runtime::sched;
pub use runtime::task::{self, spawn, spawn_with_stack_size};
pub use runtime::yield_now::yield_now;

pub use spindle_macros::*;
