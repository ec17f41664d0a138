use super::context::with_scheduler;
use super::coroutine::{Coroutine, CoroutineHandle, State};
use super::fatal;
use crate::reactor::Reactor;

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// The per-thread coroutine scheduler.
///
/// The scheduler owns:
/// - the bootstrap coroutine standing for the thread's own stack,
/// - the idle coroutine that drives the reactor when nothing is ready,
/// - a FIFO queue of ready coroutines,
/// - the currently running coroutine,
/// - at most one dead coroutine waiting to be freed,
/// - the reactor.
///
/// Exactly one coroutine is current at any time. Coroutines never migrate
/// to another thread, so no state here is synchronized.
pub(crate) struct Scheduler {
    /// The running coroutine.
    current: RefCell<CoroutineHandle>,

    /// The thread's own stack.
    bootstrap: CoroutineHandle,

    /// Runs only when the ready queue is empty.
    idle: CoroutineHandle,

    /// Coroutines waiting to run, in scheduling order.
    ready: RefCell<VecDeque<CoroutineHandle>>,

    /// A coroutine that exited and whose stack can be freed.
    dead: RefCell<Option<CoroutineHandle>>,

    /// Number of coroutines suspended by [`block`](Self::block).
    blocked: Cell<usize>,

    /// Default stack size for spawned coroutines.
    stack_size: usize,

    reactor: Reactor,
}

impl Scheduler {
    /// Creates a scheduler whose current coroutine is the calling thread.
    pub(crate) fn new(reactor: Reactor, stack_size: usize, idle_stack_size: usize) -> Self {
        let bootstrap = Coroutine::bootstrap();
        let idle = Coroutine::new(idle_loop, idle_stack_size);
        idle.set_state(State::Parked);

        log::debug!(
            "scheduler created (bootstrap {}, idle {})",
            bootstrap.id(),
            idle.id()
        );

        Self {
            current: RefCell::new(bootstrap.clone()),
            bootstrap,
            idle,
            ready: RefCell::new(VecDeque::new()),
            dead: RefCell::new(None),
            blocked: Cell::new(0),
            stack_size,
            reactor,
        }
    }

    pub(crate) fn reactor(&self) -> &Reactor {
        &self.reactor
    }

    pub(crate) fn stack_size(&self) -> usize {
        self.stack_size
    }

    /// Returns a handle to the running coroutine.
    pub(crate) fn current(&self) -> CoroutineHandle {
        self.current.borrow().clone()
    }

    /// Runs `f` on the running coroutine without cloning its handle.
    pub(crate) fn current_ref<R>(&self, f: impl FnOnce(&Coroutine) -> R) -> R {
        f(&self.current.borrow())
    }

    pub(crate) fn ready_len(&self) -> usize {
        self.ready.borrow().len()
    }

    pub(crate) fn blocked(&self) -> usize {
        self.blocked.get()
    }

    fn is_current(&self, coroutine: &CoroutineHandle) -> bool {
        Rc::ptr_eq(&self.current.borrow(), coroutine)
    }

    /// Appends `coroutine` to the ready queue.
    ///
    /// A blocked coroutine is woken; a freshly created one is started on
    /// its first turn.
    ///
    /// # Panics
    ///
    /// Panics if the coroutine is already ready, running, dead, or is the
    /// idle coroutine.
    pub(crate) fn schedule(&self, coroutine: CoroutineHandle) {
        match coroutine.state() {
            State::Created => {}
            State::Blocked => self.blocked.set(self.blocked.get() - 1),
            State::Ready => panic!("coroutine {} is already scheduled", coroutine.id()),
            State::Running => panic!("coroutine {} is already running", coroutine.id()),
            State::Parked => panic!("the idle coroutine cannot be scheduled"),
            State::Dead => panic!("cannot schedule dead coroutine {}", coroutine.id()),
        }

        log::trace!("coroutine {} scheduled", coroutine.id());

        coroutine.set_state(State::Ready);
        self.ready.borrow_mut().push_back(coroutine);
    }

    /// Lets every ready coroutine run once before the caller continues.
    ///
    /// Does nothing when the ready queue is empty, and always does nothing
    /// on the idle coroutine.
    pub(crate) fn yield_now(&self) {
        if self.is_current(&self.idle) {
            return;
        }

        let next = self.ready.borrow_mut().pop_front();
        let Some(next) = next else {
            return;
        };

        log::trace!("coroutine {} yields to {}", self.current.borrow().id(), next.id());

        let prev = self.current.replace(next);
        prev.set_state(State::Ready);
        self.ready.borrow_mut().push_back(prev.clone());

        self.resume_current(&prev);
    }

    /// Suspends the running coroutine until something schedules it again.
    ///
    /// # Panics
    ///
    /// Panics if called on the idle coroutine.
    pub(crate) fn block(&self) {
        if self.is_current(&self.idle) {
            panic!("the idle coroutine cannot block");
        }

        self.blocked.set(self.blocked.get() + 1);

        let next = self.next_runnable();
        log::trace!(
            "coroutine {} blocked, switching to {}",
            self.current.borrow().id(),
            next.id()
        );

        let prev = self.current.replace(next);
        prev.set_state(State::Blocked);

        self.resume_current(&prev);
    }

    /// Switches from `caller` into the coroutine in the current slot.
    ///
    /// The callee is reached through the slot rather than a cloned handle:
    /// a clone left on the caller's stack would keep the callee alive past
    /// its exit, until the caller itself runs again.
    fn resume_current(&self, caller: &Coroutine) {
        let next: *const Coroutine = Rc::as_ptr(&self.current.borrow());

        // SAFETY: `next` is kept alive by the current slot until the switch,
        // and `resume` does not touch it afterwards.
        unsafe { (*next).resume(caller) };
    }

    /// Marks the running coroutine dead and switches away for good.
    ///
    /// Every handle involved is moved into a scheduler slot before the
    /// switch: this frame is abandoned, so a local holding a reference
    /// count would leak it. The dead coroutine is freed by whichever
    /// coroutine runs next.
    pub(crate) fn exit(&self) -> ! {
        let next = self.next_runnable();
        let prev = self.current.replace(next);
        prev.set_state(State::Dead);

        log::trace!("coroutine {} exited", prev.id());

        let caller: *const Coroutine = Rc::as_ptr(&prev);
        let stale = self.dead.replace(Some(prev));
        drop(stale);

        // SAFETY: `caller` is kept alive by the dead slot until the next
        // coroutine frees it, which happens after the switch completes.
        self.resume_current(unsafe { &*caller });

        fatal(format_args!("a dead coroutine was resumed"))
    }

    /// Frees the pending dead coroutine, if any.
    pub(crate) fn free_dead(&self) {
        let dead = self.dead.borrow_mut().take();

        if let Some(dead) = dead {
            log::trace!("freeing coroutine {}", dead.id());
        }
    }

    fn next_runnable(&self) -> CoroutineHandle {
        let next = self.ready.borrow_mut().pop_front();
        next.unwrap_or_else(|| self.idle.clone())
    }

    /// One turn of the idle loop.
    ///
    /// Hands the thread to the head of the ready queue, or asks the reactor
    /// to dispatch one completion. The idle coroutine keeps no handle on its
    /// own stack: the runtime drops it at teardown while it is suspended.
    fn idle_turn(&self) {
        let next = self.ready.borrow_mut().pop_front();

        if let Some(next) = next {
            let idle = self.current.replace(next);
            idle.set_state(State::Parked);
            drop(idle);

            self.resume_current(&self.idle);
            return;
        }

        match self.reactor.run_one() {
            Ok(true) => {}
            Ok(false) => fatal(format_args!(
                "deadlock: {} coroutine(s) blocked with no pending timers or I/O",
                self.blocked.get()
            )),
            Err(err) => fatal(format_args!("reactor failed: {err}")),
        }
    }

    /// Checks that the thread may be torn down and releases what is left.
    ///
    /// Teardown must happen on the bootstrap coroutine with nothing ready
    /// and nothing blocked; anything else is fatal.
    pub(crate) fn shutdown(&self) {
        if !self.is_current(&self.bootstrap) {
            fatal(format_args!(
                "runtime dropped from inside coroutine {}",
                self.current.borrow().id()
            ));
        }

        let ready = self.ready_len();
        let blocked = self.blocked();

        if ready > 0 || blocked > 0 {
            fatal(format_args!(
                "runtime dropped with outstanding work: {ready} ready, {blocked} blocked"
            ));
        }

        self.free_dead();
        self.reactor.clear();

        log::debug!("scheduler shut down");
    }

    /// Releases everything without checks.
    ///
    /// Used when the thread is already unwinding from a panic.
    pub(crate) fn abandon(&self) {
        if self.ready_len() > 0 || self.blocked() > 0 {
            log::warn!(
                "runtime dropped while panicking: abandoning {} ready and {} blocked coroutine(s)",
                self.ready_len(),
                self.blocked()
            );
        }

        self.free_dead();
        self.reactor.clear();

        // Dropping a coroutine may cancel promises whose waiters then get
        // scheduled, so keep draining until nothing comes back.
        loop {
            let ready = std::mem::take(&mut *self.ready.borrow_mut());
            if ready.is_empty() {
                break;
            }
            drop(ready);
        }
    }
}

/// Body of the idle coroutine.
fn idle_loop() {
    loop {
        with_scheduler(Scheduler::idle_turn);
    }
}
