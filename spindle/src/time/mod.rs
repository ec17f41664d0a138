//! Time utilities.
//!
//! This module provides timers that integrate with the reactor of the
//! current thread's runtime. Each returns a [`Promise`](crate::Promise)
//! that settles when the deadline is reached.
//!
//! It includes:
//! - [`Timer`], a re-armable timer,
//! - [`SystemTimer`], the same with wall-clock deadlines,
//! - [`sleep`] and [`sleep_until`] for one-shot delays,
//! - [`timeout`] for bounding how long a promise may stay pending.

mod sleep;
mod system_timer;
mod timeout;
mod timer;

#[doc(inline)]
pub use sleep::{sleep, sleep_until};

#[doc(inline)]
pub use timeout::timeout;

#[doc(inline)]
pub use system_timer::SystemTimer;

#[doc(inline)]
pub use timer::Timer;
