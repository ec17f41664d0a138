use crate::error::Error;
use crate::promise::Promise;
use crate::runtime::context::with_reactor;

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Bounds how long `promise` may stay pending.
///
/// The returned promise settles like `promise` if it settles within
/// `duration`, and is rejected with [`Error::TimedOut`] otherwise. The
/// timer is cancelled as soon as `promise` settles.
///
/// # Panics
///
/// Panics if called outside of a running runtime.
///
/// # Examples
///
/// ```rust,ignore
/// match timeout(Duration::from_secs(1), stream.read(1024)).wait() {
///     Ok(bytes) => handle(bytes),
///     Err(err) if err.is_timed_out() => println!("peer too slow"),
///     Err(err) => return Err(err),
/// }
/// ```
pub fn timeout<T>(duration: Duration, promise: Promise<T>) -> Promise<T>
where
    T: Clone + 'static,
{
    let result = Promise::new();
    let cancelled = Rc::new(Cell::new(false));

    if !promise.is_settled() {
        let expired = result.downgrade();

        with_reactor(|reactor| {
            reactor.add_timer(
                Instant::now() + duration,
                cancelled.clone(),
                Box::new(move || {
                    if let Some(result) = expired.upgrade()
                        && !result.is_settled()
                    {
                        log::debug!("promise timed out after {duration:?}");
                        result.reject(Error::TimedOut);
                    }
                }),
            );
        });
    }

    {
        let result = result.clone();

        promise.observe(move |outcome| {
            cancelled.set(true);

            if !result.is_settled() {
                result.settle(outcome.clone());
            }
        });
    }

    result
}
