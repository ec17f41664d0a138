//! Single-assignment promises.
//!
//! A [`Promise<T>`] is settled exactly once, either resolved with a `T` or
//! rejected with an [`Error`]. Code interested in the outcome either
//! registers an observer ([`then`](Promise::then), [`except`](Promise::except),
//! [`finally`](Promise::finally)) or suspends the calling coroutine until
//! the outcome is known ([`wait`](Promise::wait)).
//!
//! Observers run synchronously, in registration order, at the moment the
//! promise settles, or immediately if it already has.
//!
//! Handles are reference counted. When the last handle to a pending promise
//! is dropped, the promise is rejected with [`Error::Cancelled`] so that
//! nobody waits forever on a result that can no longer arrive. For this
//! reason [`wait`](Promise::wait) consumes its handle: the producer side
//! (a spawned coroutine, a reactor callback) keeps the promise alive, and
//! tearing the producer down wakes the waiter.

mod combinator;

pub use combinator::{Winner, all, all_settled, any, race};

use crate::error::{Error, Result};
use crate::runtime::context::with_scheduler;
use crate::runtime::fatal;

use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::mem;
use std::rc::{Rc, Weak};

type Observer<T> = Box<dyn FnOnce(&Result<T>)>;

struct Shared<T> {
    outcome: OnceCell<Result<T>>,
    observers: RefCell<Vec<Observer<T>>>,
}

impl<T> Shared<T> {
    fn settle(&self, outcome: Result<T>) {
        if self.outcome.set(outcome).is_err() {
            panic!("promise settled twice");
        }

        let observers = mem::take(&mut *self.observers.borrow_mut());

        if let Some(outcome) = self.outcome.get() {
            for observer in observers {
                observer(outcome);
            }
        }
    }
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        if self.outcome.get().is_some() {
            return;
        }

        let observers = mem::take(self.observers.get_mut());
        if observers.is_empty() {
            return;
        }

        let cancelled: Result<T> = Err(Error::Cancelled);
        for observer in observers {
            observer(&cancelled);
        }
    }
}

/// A value that becomes available later, or an error explaining why it
/// never will.
///
/// # Examples
///
/// ```rust,ignore
/// let promise = Promise::new();
///
/// promise
///     .then(|value: &u32| println!("got {value}"))
///     .except(|err| println!("failed: {err}"))
///     .finally(|| println!("done"));
///
/// promise.resolve(7);
/// ```
pub struct Promise<T> {
    shared: Rc<Shared<T>>,
}

impl<T: 'static> Promise<T> {
    /// Creates a pending promise.
    pub fn new() -> Self {
        Self {
            shared: Rc::new(Shared {
                outcome: OnceCell::new(),
                observers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Creates a promise that is already resolved with `value`.
    pub fn resolved(value: T) -> Self {
        let promise = Self::new();
        promise.resolve(value);
        promise
    }

    /// Creates a promise that is already rejected with `error`.
    pub fn rejected(error: Error) -> Self {
        let promise = Self::new();
        promise.reject(error);
        promise
    }

    /// Resolves the promise with `value` and runs every observer.
    ///
    /// # Panics
    ///
    /// Panics if the promise has already settled.
    pub fn resolve(&self, value: T) {
        self.shared.settle(Ok(value));
    }

    /// Rejects the promise with `error` and runs every observer.
    ///
    /// # Panics
    ///
    /// Panics if the promise has already settled.
    pub fn reject(&self, error: Error) {
        self.shared.settle(Err(error));
    }

    /// Settles the promise with `outcome`.
    ///
    /// # Panics
    ///
    /// Panics if the promise has already settled.
    pub fn settle(&self, outcome: Result<T>) {
        self.shared.settle(outcome);
    }

    /// Returns `true` once the promise has been resolved or rejected.
    pub fn is_settled(&self) -> bool {
        self.shared.outcome.get().is_some()
    }

    /// Returns `true` if the promise has been rejected.
    pub fn is_rejected(&self) -> bool {
        matches!(self.shared.outcome.get(), Some(Err(_)))
    }

    /// Registers `observer` to run with the outcome.
    ///
    /// Runs immediately if the promise has already settled.
    pub fn observe<F>(&self, observer: F) -> &Self
    where
        F: FnOnce(&Result<T>) + 'static,
    {
        match self.shared.outcome.get() {
            Some(outcome) => observer(outcome),
            None => self.shared.observers.borrow_mut().push(Box::new(observer)),
        }

        self
    }

    /// Registers `callback` to run with the value if the promise resolves.
    pub fn then<F>(&self, callback: F) -> &Self
    where
        F: FnOnce(&T) + 'static,
    {
        self.observe(move |outcome| {
            if let Ok(value) = outcome {
                callback(value);
            }
        })
    }

    /// Registers `callback` to run with the error if the promise rejects.
    pub fn except<F>(&self, callback: F) -> &Self
    where
        F: FnOnce(&Error) + 'static,
    {
        self.observe(move |outcome| {
            if let Err(err) = outcome {
                callback(err);
            }
        })
    }

    /// Registers `callback` to run once the promise settles either way.
    pub fn finally<F>(&self, callback: F) -> &Self
    where
        F: FnOnce() + 'static,
    {
        self.observe(move |_| callback())
    }

    /// Suspends the calling coroutine until the promise settles, then
    /// returns its outcome.
    ///
    /// Returns immediately, without switching, if the promise has already
    /// settled. Otherwise the handle is released while waiting: if every
    /// other handle is dropped before the promise settles, the wait ends
    /// with [`Error::Cancelled`].
    ///
    /// # Panics
    ///
    /// Panics if the promise is pending and no runtime is running on this
    /// thread, or if called from the idle coroutine.
    pub fn wait(self) -> Result<T>
    where
        T: Clone,
    {
        if let Some(outcome) = self.shared.outcome.get() {
            return outcome.clone();
        }

        let slot: Rc<RefCell<Option<Result<T>>>> = Rc::new(RefCell::new(None));
        let parked = Rc::new(Cell::new(false));
        let waiter = with_scheduler(|scheduler| scheduler.current());

        {
            let slot = slot.clone();
            let parked = parked.clone();

            self.observe(move |outcome| {
                *slot.borrow_mut() = Some(outcome.clone());

                if parked.get() {
                    with_scheduler(|scheduler| scheduler.schedule(waiter));
                }
            });
        }

        drop(self);

        let early = slot.borrow_mut().take();
        if let Some(outcome) = early {
            return outcome;
        }

        parked.set(true);
        with_scheduler(|scheduler| scheduler.block());

        let outcome = slot.borrow_mut().take();
        match outcome {
            Some(outcome) => outcome,
            None => fatal(format_args!("coroutine woken before its promise settled")),
        }
    }

    /// Creates a handle that does not keep the promise alive.
    pub fn downgrade(&self) -> WeakPromise<T> {
        WeakPromise {
            shared: Rc::downgrade(&self.shared),
        }
    }
}

impl<T: 'static> Default for Promise<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.shared.outcome.get() {
            Some(outcome) => f.debug_tuple("Promise").field(outcome).finish(),
            None => f.write_str("Promise(<pending>)"),
        }
    }
}

/// A non-owning handle to a [`Promise`].
///
/// Holding a `WeakPromise` does not prevent the promise from being
/// cancelled when its last strong handle is dropped.
pub struct WeakPromise<T> {
    shared: Weak<Shared<T>>,
}

impl<T> WeakPromise<T> {
    /// Returns a strong handle if the promise is still alive.
    pub fn upgrade(&self) -> Option<Promise<T>> {
        self.shared.upgrade().map(|shared| Promise { shared })
    }
}

impl<T> Clone for WeakPromise<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

/// A promise whose value type has been erased.
///
/// Combinators accept any mix of promises through this trait, since they
/// only care about whether and when each input succeeds or fails.
pub trait Observable {
    /// Registers `observer` to run with the outcome, without the value.
    fn subscribe(&self, observer: Box<dyn FnOnce(Result<()>)>);

    /// Returns `true` once the underlying promise has settled.
    fn is_settled(&self) -> bool;
}

impl<T: 'static> Observable for Promise<T> {
    fn subscribe(&self, observer: Box<dyn FnOnce(Result<()>)>) {
        self.observe(move |outcome| observer(outcome.as_ref().map(|_| ()).map_err(Clone::clone)));
    }

    fn is_settled(&self) -> bool {
        Promise::is_settled(self)
    }
}
