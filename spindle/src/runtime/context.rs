use crate::reactor::Reactor;
use crate::runtime::scheduler::Scheduler;

use std::cell::Cell;
use std::ptr::NonNull;

thread_local! {
    /// The scheduler installed on this thread by a [`Runtime`](crate::Runtime).
    ///
    /// Stored as a raw pointer rather than a counted handle: coroutines
    /// that exit abandon their stack frames, so nothing reachable from a
    /// coroutine stack may own a reference count on the scheduler.
    static CURRENT_SCHEDULER: Cell<Option<NonNull<Scheduler>>> = const { Cell::new(None) };
}

/// Installs `scheduler` as the current thread's scheduler.
///
/// # Panics
///
/// Panics if a scheduler is already installed on this thread.
pub(crate) fn enter(scheduler: &Scheduler) {
    CURRENT_SCHEDULER.with(|current| {
        assert!(
            current.get().is_none(),
            "a spindle runtime is already running on this thread"
        );

        current.set(Some(NonNull::from(scheduler)));
    });
}

/// Removes the current thread's scheduler.
pub(crate) fn leave() {
    CURRENT_SCHEDULER.with(|current| current.set(None));
}

/// Returns `true` if a scheduler is installed on this thread.
pub(crate) fn is_entered() -> bool {
    CURRENT_SCHEDULER.with(|current| current.get().is_some())
}

/// Runs `f` with the current thread's scheduler.
///
/// # Panics
///
/// Panics if called outside of a running runtime.
pub(crate) fn with_scheduler<R>(f: impl FnOnce(&Scheduler) -> R) -> R {
    match try_with_scheduler(f) {
        Some(out) => out,
        None => panic!("no spindle runtime is running on this thread"),
    }
}

/// Runs `f` with the current thread's scheduler, if there is one.
pub(crate) fn try_with_scheduler<R>(f: impl FnOnce(&Scheduler) -> R) -> Option<R> {
    let scheduler = CURRENT_SCHEDULER.with(Cell::get)?;

    // SAFETY: the pointer is installed by `Runtime`, which keeps the
    // scheduler boxed at a fixed address and removes the pointer before
    // dropping it. Schedulers are never shared across threads.
    Some(f(unsafe { scheduler.as_ref() }))
}

/// Runs `f` with the reactor of the current thread's scheduler.
///
/// # Panics
///
/// Panics if called outside of a running runtime.
pub(crate) fn with_reactor<R>(f: impl FnOnce(&Reactor) -> R) -> R {
    with_scheduler(|scheduler| f(scheduler.reactor()))
}
