use super::builder::RuntimeBuilder;
use super::context;
use super::scheduler::Scheduler;
use crate::reactor::Reactor;

use std::marker::PhantomData;
use std::rc::Rc;
use std::thread;

/// The main runtime handle.
///
/// A `Runtime` installs a scheduler on the thread that creates it. While it
/// exists, that thread can:
/// - spawn coroutines with [`spawn`](crate::spawn),
/// - wait on promises from any coroutine, including the thread itself,
/// - use timers and TCP sockets driven by the thread's reactor.
///
/// Dropping the runtime tears the scheduler down. At that point the thread
/// must be back on its own stack with no coroutine ready or blocked;
/// anything else is a fatal error.
///
/// A runtime is bound to its thread and cannot be sent to another one.
pub struct Runtime {
    /// Boxed so the thread-local pointer to it stays valid.
    scheduler: Box<Scheduler>,

    _not_send: PhantomData<Rc<()>>,
}

impl Runtime {
    /// Creates a runtime with the default configuration.
    ///
    /// # Panics
    ///
    /// Panics if a runtime is already running on this thread, or if the
    /// reactor cannot be created.
    pub fn new() -> Self {
        RuntimeBuilder::new().build()
    }

    pub(crate) fn with_config(config: RuntimeBuilder) -> Self {
        assert!(
            !context::is_entered(),
            "a spindle runtime is already running on this thread"
        );

        let reactor = match Reactor::new(config.event_capacity) {
            Ok(reactor) => reactor,
            Err(err) => panic!("failed to create reactor: {err}"),
        };

        let scheduler = Box::new(Scheduler::new(
            reactor,
            config.stack_size,
            config.idle_stack_size,
        ));

        context::enter(&scheduler);

        log::debug!(
            "runtime started (stack size {}, event capacity {})",
            config.stack_size,
            config.event_capacity
        );

        Self {
            scheduler,
            _not_send: PhantomData,
        }
    }

    /// Runs `f` on the current thread, then lets every coroutine that is
    /// ready run until the ready queue is empty.
    ///
    /// `f` may spawn coroutines and wait on promises: waiting suspends the
    /// thread's own stack and lets other coroutines run until the promise
    /// settles.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let runtime = Runtime::new();
    /// let answer = runtime.block_on(|| spawn(|| Ok(42)).wait());
    /// assert_eq!(answer.unwrap(), 42);
    /// ```
    pub fn block_on<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let output = f();

        while self.scheduler.ready_len() > 0 {
            self.scheduler.yield_now();
        }

        output
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Runtime {
    /// Tears the scheduler down.
    ///
    /// This performs the following steps:
    /// 1. Checks that no coroutine is left ready or blocked (skipped while
    ///    the thread is already panicking)
    /// 2. Frees the last dead coroutine and drops every pending timer and
    ///    I/O waiter
    /// 3. Uninstalls the scheduler from the thread
    fn drop(&mut self) {
        if thread::panicking() {
            self.scheduler.abandon();
        } else {
            self.scheduler.shutdown();
        }

        context::leave();
    }
}
