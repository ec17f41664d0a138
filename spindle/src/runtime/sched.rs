//! Direct access to the current thread's scheduler.
//!
//! These are the primitives [`Promise::wait`](crate::Promise::wait) and
//! [`spawn`](crate::spawn) are built from. They are public so that other
//! suspension points can be built the same way: take a handle to the
//! [`current`] coroutine, arrange for something to [`schedule`] it later,
//! then [`block`].
//!
//! ```rust,ignore
//! let me = sched::current();
//! let timer = Timer::new();
//! timer.expire_after(Duration::from_millis(5)).then(move |_| sched::schedule(me));
//! sched::block();
//! ```
//!
//! Every function panics if no [`Runtime`](crate::Runtime) is running on the
//! calling thread.

use super::context::with_scheduler;

pub use super::coroutine::{Coroutine, CoroutineHandle, DEFAULT_STACK_SIZE, MIN_STACK_SIZE, State};

/// Returns a handle to the running coroutine.
pub fn current() -> CoroutineHandle {
    with_scheduler(|scheduler| scheduler.current())
}

/// Appends `coroutine` to the tail of the ready queue.
///
/// This is how a blocked coroutine is woken and how a newly created one is
/// started.
///
/// # Panics
///
/// Panics if the coroutine is already ready, running, or dead.
pub fn schedule(coroutine: CoroutineHandle) {
    with_scheduler(|scheduler| scheduler.schedule(coroutine));
}

/// Suspends the running coroutine until something calls [`schedule`] on it.
///
/// Control passes to the head of the ready queue, or to the idle loop when
/// the queue is empty.
///
/// # Panics
///
/// Panics if called from the idle coroutine.
pub fn block() {
    with_scheduler(|scheduler| scheduler.block());
}

/// Returns the number of coroutines waiting in the ready queue.
pub fn ready_len() -> usize {
    with_scheduler(|scheduler| scheduler.ready_len())
}

/// Returns the number of blocked coroutines.
pub fn blocked() -> usize {
    with_scheduler(|scheduler| scheduler.blocked())
}

pub use super::yield_now::yield_now;
