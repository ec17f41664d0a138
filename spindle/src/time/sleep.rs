use crate::promise::Promise;
use crate::runtime::context::with_reactor;

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Returns a promise that resolves after the given duration.
///
/// # Panics
///
/// Panics if called outside of a running runtime.
///
/// # Examples
///
/// ```rust,ignore
/// use std::time::Duration;
///
/// sleep(Duration::from_millis(10)).wait()?;
/// ```
pub fn sleep(duration: Duration) -> Promise<()> {
    sleep_until(Instant::now() + duration)
}

/// Returns a promise that resolves once `deadline` is reached.
///
/// A deadline in the past resolves on the reactor's next turn, never
/// synchronously.
///
/// # Panics
///
/// Panics if called outside of a running runtime.
pub fn sleep_until(deadline: Instant) -> Promise<()> {
    let promise = Promise::new();
    let producer = promise.clone();

    with_reactor(|reactor| {
        reactor.add_timer(
            deadline,
            Rc::new(Cell::new(false)),
            Box::new(move || producer.resolve(())),
        );
    });

    promise
}
