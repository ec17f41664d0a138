use super::Runtime;
use super::coroutine::{DEFAULT_STACK_SIZE, MIN_STACK_SIZE};

/// Default number of readiness events collected per poll.
const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Default stack size of the idle coroutine.
///
/// The idle coroutine only runs reactor callbacks, which settle promises
/// and schedule coroutines, so it needs far less than a spawned coroutine.
const DEFAULT_IDLE_STACK_SIZE: usize = 64 * 1024;

/// Builder for configuring and creating a runtime.
///
/// `RuntimeBuilder` allows customizing runtime parameters before
/// installing the runtime on the current thread.
///
/// # Examples
///
/// ```rust,ignore
/// let runtime = RuntimeBuilder::new()
///     .stack_size(1024 * 1024)
///     .event_capacity(256)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct RuntimeBuilder {
    /// Stack size of coroutines created by [`spawn`](crate::spawn).
    pub(crate) stack_size: usize,

    /// Stack size of the idle coroutine.
    pub(crate) idle_stack_size: usize,

    /// Maximum number of readiness events handled per poll.
    pub(crate) event_capacity: usize,
}

impl RuntimeBuilder {
    /// Creates a new `RuntimeBuilder` with default configuration.
    ///
    /// Spawned coroutines get a 256 KiB stack and the reactor collects up
    /// to 64 events per poll.
    pub fn new() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            idle_stack_size: DEFAULT_IDLE_STACK_SIZE,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Sets the default stack size of spawned coroutines.
    ///
    /// The size is rounded up to a multiple of the page size.
    ///
    /// # Panics
    ///
    /// Panics if `size` is smaller than [`MIN_STACK_SIZE`].
    pub fn stack_size(mut self, size: usize) -> Self {
        assert!(
            size >= MIN_STACK_SIZE,
            "stack_size must be at least {MIN_STACK_SIZE} bytes"
        );

        self.stack_size = size;
        self
    }

    /// Sets the stack size of the idle coroutine.
    ///
    /// # Panics
    ///
    /// Panics if `size` is smaller than [`MIN_STACK_SIZE`].
    pub fn idle_stack_size(mut self, size: usize) -> Self {
        assert!(
            size >= MIN_STACK_SIZE,
            "idle_stack_size must be at least {MIN_STACK_SIZE} bytes"
        );

        self.idle_stack_size = size;
        self
    }

    /// Sets how many readiness events the reactor collects per poll.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn event_capacity(mut self, n: usize) -> Self {
        assert!(n > 0, "event_capacity must be > 0");

        self.event_capacity = n;
        self
    }

    /// Builds the runtime and installs it on the current thread.
    ///
    /// # Panics
    ///
    /// Panics if a runtime is already running on this thread, or if the
    /// reactor cannot be created.
    pub fn build(self) -> Runtime {
        Runtime::with_config(self)
    }
}

impl Default for RuntimeBuilder {
    /// Creates a default `RuntimeBuilder`.
    fn default() -> Self {
        Self::new()
    }
}
