use crate::error::Error;
use crate::promise::{Promise, WeakPromise};
use crate::runtime::context::with_reactor;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// The expiry a timer is currently armed with.
struct Armed {
    /// Shared with the reactor's timer entry.
    cancelled: Rc<Cell<bool>>,

    /// The promise handed out for this expiry. Held weakly: the reactor
    /// entry owns it until the deadline.
    promise: WeakPromise<()>,
}

/// A re-armable timer.
///
/// Each call to [`expire_at`](Self::expire_at) or
/// [`expire_after`](Self::expire_after) returns a promise that resolves at
/// the deadline. A timer has at most one pending expiry: arming it again,
/// calling [`cancel`](Self::cancel), or dropping the timer rejects the
/// previous pending promise with [`Error::Cancelled`].
///
/// # Examples
///
/// ```rust,ignore
/// let timer = Timer::new();
///
/// let first = timer.expire_after(Duration::from_secs(5));
/// let second = timer.expire_after(Duration::from_millis(10));
///
/// assert!(first.wait().unwrap_err().is_cancelled());
/// second.wait()?;
/// ```
#[derive(Default)]
pub struct Timer {
    armed: RefCell<Option<Armed>>,
}

impl Timer {
    /// Creates a timer that is not armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the timer to expire at `deadline`.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a running runtime.
    pub fn expire_at(&self, deadline: Instant) -> Promise<()> {
        self.cancel();

        let promise = Promise::new();
        let producer = promise.clone();
        let cancelled = Rc::new(Cell::new(false));

        with_reactor(|reactor| {
            reactor.add_timer(
                deadline,
                cancelled.clone(),
                Box::new(move || producer.resolve(())),
            );
        });

        *self.armed.borrow_mut() = Some(Armed {
            cancelled,
            promise: promise.downgrade(),
        });

        promise
    }

    /// Arms the timer to expire after `duration`.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a running runtime.
    pub fn expire_after(&self, duration: Duration) -> Promise<()> {
        self.expire_at(Instant::now() + duration)
    }

    /// Returns `true` if the timer has an expiry that has not fired yet.
    pub fn is_armed(&self) -> bool {
        self.armed
            .borrow()
            .as_ref()
            .and_then(|armed| armed.promise.upgrade())
            .is_some_and(|promise| !promise.is_settled())
    }

    /// Cancels the pending expiry, rejecting its promise with
    /// [`Error::Cancelled`]. Does nothing if the timer is not armed.
    pub fn cancel(&self) {
        let armed = self.armed.borrow_mut().take();
        let Some(armed) = armed else {
            return;
        };

        armed.cancelled.set(true);

        if let Some(promise) = armed.promise.upgrade()
            && !promise.is_settled()
        {
            log::debug!("timer cancelled before expiry");
            promise.reject(Error::Cancelled);
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();
    }
}
