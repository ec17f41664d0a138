use super::{Completion, Reactor};
use super::platform::sys_close;
use crate::error::Error;
use crate::promise::Promise;
use crate::runtime::context::{try_with_scheduler, with_reactor};

use std::cell::Cell;
use std::io;
use std::os::fd::RawFd;
use std::rc::{Rc, Weak};

/// Direction an operation waits in when it would block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Read,
    Write,
}

/// A non-blocking file descriptor registered with the current reactor.
///
/// Operations on the descriptor are attempted immediately and retried each
/// time the reactor reports the descriptor ready, until they stop failing
/// with `WouldBlock`. Closing the source wakes every pending operation,
/// which then rejects with [`Error::Cancelled`].
///
/// A source belongs to the reactor that registered it. Once that runtime
/// is gone, operations reject with [`Error::Cancelled`] and closing only
/// releases the descriptor, even if a newer reactor reuses the token.
pub(crate) struct Source {
    fd: RawFd,
    token: usize,
    generation: u64,
    closed: Cell<bool>,
}

impl Source {
    /// Registers `fd` with the current thread's reactor and takes
    /// ownership of it.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a running runtime.
    pub(crate) fn new(fd: RawFd) -> Rc<Self> {
        let (token, generation) =
            with_reactor(|reactor| (reactor.add_source(fd), reactor.generation()));

        Rc::new(Self {
            fd,
            token,
            generation,
            closed: Cell::new(false),
        })
    }

    pub(crate) fn fd(&self) -> RawFd {
        self.fd
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.get()
    }

    fn registered_with(&self, reactor: &Reactor) -> bool {
        reactor.generation() == self.generation
    }

    /// Deregisters and closes the descriptor. Idempotent.
    pub(crate) fn close(&self) {
        if self.closed.replace(true) {
            return;
        }

        try_with_scheduler(|scheduler| {
            let reactor = scheduler.reactor();
            if self.registered_with(reactor) {
                reactor.remove_source(self.token);
            }
        });
        sys_close(self.fd);

        log::debug!("fd {} closed", self.fd);
    }

    /// Starts `op` on this source and returns a promise for its result.
    ///
    /// `op` runs right away. If it fails with `WouldBlock`, it runs again
    /// once the descriptor is ready in `direction`, as many times as
    /// needed. `op` keeps its own state across attempts, so partial
    /// progress (such as a partially written buffer) is not lost.
    pub(crate) fn submit<T, F>(self: &Rc<Self>, direction: Direction, op: F) -> Promise<T>
    where
        T: 'static,
        F: FnMut(RawFd) -> io::Result<T> + 'static,
    {
        let promise = Promise::new();
        attempt(Rc::downgrade(self), direction, Box::new(op), promise.clone());
        promise
    }
}

impl Drop for Source {
    fn drop(&mut self) {
        self.close();
    }
}

type Operation<T> = Box<dyn FnMut(RawFd) -> io::Result<T>>;

/// Runs `op` once and settles `promise`, or parks it on the reactor.
fn attempt<T: 'static>(
    source: Weak<Source>,
    direction: Direction,
    mut op: Operation<T>,
    promise: Promise<T>,
) {
    let usable = |s: &Rc<Source>| !s.is_closed() && with_reactor(|r| s.registered_with(r));

    let Some(strong) = source.upgrade().filter(usable) else {
        promise.reject(Error::Cancelled);
        return;
    };

    let result = loop {
        match op(strong.fd) {
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            result => break result,
        }
    };

    match result {
        Ok(value) => promise.resolve(value),
        Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
            let token = strong.token;
            drop(strong);

            let retry = promise.clone();
            let callback: Completion = Box::new(move || attempt(source, direction, op, retry));

            let registered = with_reactor(|reactor| match direction {
                Direction::Read => reactor.wait_readable(token, callback),
                Direction::Write => reactor.wait_writable(token, callback),
            });

            if let Err(err) = registered {
                promise.reject(err.into());
            }
        }
        Err(err) => promise.reject(err.into()),
    }
}
