//! Stackful coroutines.
//!
//! A [`Coroutine`] owns a function, a [`Stack`](stack::Stack) and an
//! [`ExecutionContext`](switch::ExecutionContext). It runs its function to
//! completion exactly once, suspending and resuming only when the
//! scheduler switches between coroutines.
//!
//! Lifecycle:
//!
//! ```text
//! created -> ready -> running -> (ready | blocked) -> running -> dead
//! ```
//!
//! A dead coroutine is freed by whichever coroutine runs after it, never by
//! itself, since its own stack is still in use while it exits.

pub(crate) mod stack;
mod switch;

use crate::runtime::context::with_scheduler;
use crate::runtime::fatal;
use stack::Stack;
use switch::ExecutionContext;

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

pub use stack::{DEFAULT_STACK_SIZE, MIN_STACK_SIZE};

/// Shared handle to a coroutine.
///
/// Handles are held by the scheduler's ready queue and by any closure that
/// needs to wake the coroutine later (for example an observer registered by
/// [`Promise::wait`](crate::Promise::wait)).
pub type CoroutineHandle = Rc<Coroutine>;

/// Scheduling state of a coroutine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Created but never scheduled.
    Created,
    /// Waiting in the ready queue.
    Ready,
    /// Currently executing.
    Running,
    /// Suspended until something schedules it again.
    Blocked,
    /// The idle coroutine, switched out while other coroutines run.
    Parked,
    /// Finished; its stack is freed by the next coroutine to run.
    Dead,
}

/// A cooperatively scheduled unit of execution with its own call stack.
pub struct Coroutine {
    id: u64,
    func: Cell<Option<Box<dyn FnOnce()>>>,
    context: ExecutionContext,
    stack: Option<Stack>,
    state: Cell<State>,
}

thread_local! {
    static NEXT_ID: Cell<u64> = const { Cell::new(0) };
}

fn next_id() -> u64 {
    NEXT_ID.with(|id| {
        let next = id.get();
        id.set(next + 1);
        next
    })
}

impl Coroutine {
    /// Creates a coroutine that will run `func` on a fresh stack of
    /// `stack_size` bytes.
    ///
    /// The coroutine does not run until it is passed to
    /// [`schedule`](crate::sched::schedule).
    ///
    /// # Panics
    ///
    /// Panics if `stack_size` is smaller than [`MIN_STACK_SIZE`].
    pub fn new<F>(func: F, stack_size: usize) -> CoroutineHandle
    where
        F: FnOnce() + 'static,
    {
        let stack = Stack::allocate(stack_size);
        let context = ExecutionContext::new(&stack, trampoline);
        let id = next_id();

        log::trace!("coroutine {id} created with a {} byte stack", stack.size());

        Rc::new(Self {
            id,
            func: Cell::new(Some(Box::new(func))),
            context,
            stack: Some(stack),
            state: Cell::new(State::Created),
        })
    }

    /// Creates the pseudo-coroutine standing for the thread's own stack.
    ///
    /// It has no function and no stack of its own; its context is filled in
    /// the first time the thread switches away.
    pub(crate) fn bootstrap() -> CoroutineHandle {
        Rc::new(Self {
            id: next_id(),
            func: Cell::new(None),
            context: ExecutionContext::empty(),
            stack: None,
            state: Cell::new(State::Running),
        })
    }

    /// Returns the identifier of this coroutine, unique per thread.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the current scheduling state.
    pub fn state(&self) -> State {
        self.state.get()
    }

    pub(crate) fn set_state(&self, state: State) {
        self.state.set(state);
    }

    /// Returns the size of the coroutine's stack, or `None` for the
    /// bootstrap coroutine.
    pub fn stack_size(&self) -> Option<usize> {
        self.stack.as_ref().map(Stack::size)
    }

    /// Switches from `caller` into this coroutine.
    ///
    /// The caller's state is saved by the switch itself. When control later
    /// comes back to `caller`, any coroutine that died in the meantime is
    /// freed.
    ///
    /// # Panics
    ///
    /// Panics if this coroutine is dead.
    pub(crate) fn resume(&self, caller: &Coroutine) {
        if self.state() == State::Dead {
            panic!("attempted to resume dead coroutine {}", self.id);
        }

        self.set_state(State::Running);

        // SAFETY: `caller` is the running coroutine and stays alive until it
        // is resumed again. `self` is kept alive by the scheduler's current
        // slot until it is entered; once it exits it may be freed before
        // control comes back here, so it is not used after the switch.
        unsafe { ExecutionContext::switch(&caller.context, &self.context) };

        with_scheduler(|scheduler| scheduler.free_dead());
    }

    fn take_func(&self) -> Option<Box<dyn FnOnce()>> {
        self.func.take()
    }
}

impl fmt::Debug for Coroutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coroutine")
            .field("id", &self.id)
            .field("state", &self.state.get())
            .field("stack_size", &self.stack_size())
            .finish()
    }
}

/// Entry point of every coroutine stack.
///
/// Nothing with a destructor may still be alive when the scheduler's exit
/// path is taken: this stack is abandoned at that point and its frames are
/// never unwound.
extern "C" fn trampoline() {
    with_scheduler(|scheduler| scheduler.free_dead());

    let func = with_scheduler(|scheduler| scheduler.current_ref(Coroutine::take_func));

    if let Some(func) = func {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(func)) {
            fatal(format_args!(
                "coroutine function panicked: {}",
                panic_message(payload.as_ref())
            ));
        }
    }

    with_scheduler(|scheduler| scheduler.exit())
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "Box<dyn Any>"
    }
}
