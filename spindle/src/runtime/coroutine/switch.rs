//! Execution context switching.
//!
//! This is the only place in the crate that saves and restores machine
//! state. It is built on the `ucontext` family from glibc: `getcontext` and
//! `makecontext` prepare a context that starts at an entry function on a
//! given stack, and `swapcontext` saves the running context while jumping
//! into another one.
//!
//! The rest of the runtime sees three operations: create a context for a
//! fresh stack, create an empty context for a stack the thread already runs
//! on, and switch from one context to another.

#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
compile_error!("spindle's context switching requires Linux with glibc");

use super::stack::Stack;
use crate::runtime::fatal;

use libc::{c_void, getcontext, makecontext, swapcontext, ucontext_t};
use std::cell::UnsafeCell;
use std::{io, mem, ptr};

/// Saved machine state of a suspended coroutine.
///
/// The state is boxed: glibc's `ucontext_t` holds pointers into itself, so
/// its address must not change once it has been filled in.
pub(crate) struct ExecutionContext {
    state: Box<UnsafeCell<ucontext_t>>,
}

impl ExecutionContext {
    /// Creates an empty context.
    ///
    /// Used for the thread's own stack: the context is filled in the first
    /// time the thread switches away from it.
    pub(crate) fn empty() -> Self {
        // SAFETY: `ucontext_t` is a plain C struct for which all-zero is a
        // valid bit pattern.
        let state = unsafe { mem::zeroed() };

        Self {
            state: Box::new(UnsafeCell::new(state)),
        }
    }

    /// Creates a context that starts executing `entry` on `stack` the first
    /// time it is switched to.
    ///
    /// `entry` must never return: there is no linked context to fall back
    /// to, so returning would terminate the thread.
    pub(crate) fn new(stack: &Stack, entry: extern "C" fn()) -> Self {
        debug_assert_eq!(stack.bottom() as usize + stack.size(), stack.top() as usize);

        let context = Self::empty();
        let state = context.state.get();

        // SAFETY: `state` points to a live, boxed `ucontext_t`, and the
        // stack region stays mapped for as long as the owning coroutine
        // (which also owns this context) exists.
        unsafe {
            if getcontext(state) != 0 {
                fatal(format_args!(
                    "getcontext failed: {}",
                    io::Error::last_os_error()
                ));
            }

            (*state).uc_stack.ss_sp = stack.bottom() as *mut c_void;
            (*state).uc_stack.ss_size = stack.size();
            (*state).uc_stack.ss_flags = 0;
            (*state).uc_link = ptr::null_mut();

            makecontext(state, entry, 0);
        }

        context
    }

    /// Saves the running state into `from` and resumes `to`.
    ///
    /// Returns when some other context switches back into `from`.
    ///
    /// # Safety
    ///
    /// - `from` must describe the context that is currently executing.
    /// - `to` must have been created by [`new`](Self::new) and not yet
    ///   finished, or been saved by an earlier call to `switch`.
    /// - `from` and its stack must stay alive until control comes back to
    ///   it. `to` only has to stay alive until it is entered; it may be
    ///   freed before control returns, and is not touched afterwards.
    pub(crate) unsafe fn switch(from: &Self, to: &Self) {
        let rc = unsafe { swapcontext(from.state.get(), to.state.get()) };

        if rc != 0 {
            fatal(format_args!(
                "swapcontext failed: {}",
                io::Error::last_os_error()
            ));
        }
    }
}
