use super::Timer;
use crate::promise::Promise;

use std::time::{Duration, Instant, SystemTime};

/// A re-armable timer with wall-clock deadlines.
///
/// Behaves like [`Timer`], but [`expire_at`](Self::expire_at) takes a
/// [`SystemTime`]. The deadline is converted to the monotonic clock when
/// the timer is armed, so later adjustments of the system clock do not
/// move it. A deadline already in the past expires on the next reactor
/// turn.
///
/// # Examples
///
/// ```rust,ignore
/// let timer = SystemTimer::new();
/// timer.expire_at(SystemTime::now() + Duration::from_secs(1)).wait()?;
/// ```
#[derive(Default)]
pub struct SystemTimer {
    inner: Timer,
}

impl SystemTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the timer to expire at the wall-clock time `deadline`.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a running runtime.
    pub fn expire_at(&self, deadline: SystemTime) -> Promise<()> {
        let remaining = deadline
            .duration_since(SystemTime::now())
            .unwrap_or(Duration::ZERO);

        self.inner.expire_at(Instant::now() + remaining)
    }

    /// Arms the timer to expire after `duration`.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a running runtime.
    pub fn expire_after(&self, duration: Duration) -> Promise<()> {
        self.inner.expire_after(duration)
    }

    pub fn is_armed(&self) -> bool {
        self.inner.is_armed()
    }

    /// Cancels the pending expiry. See [`Timer::cancel`].
    pub fn cancel(&self) {
        self.inner.cancel();
    }
}
