use super::Completion;
use super::event::Event;
use super::io::IoSource;
use super::poller::Poller;
use super::timer::TimerEntry;
use crate::utils::Slab;

use std::cell::{Cell, RefCell};
use std::collections::{BinaryHeap, VecDeque};
use std::io;
use std::mem;
use std::os::fd::RawFd;
use std::rc::Rc;
use std::time::Instant;

/// Initial number of I/O source slots.
const INITIAL_SOURCES: usize = 64;

/// Smallest timer queue size at which cancelled entries are swept out.
const MIN_COMPACT_AT: usize = 64;

thread_local! {
    /// Generation of the next reactor created on this thread.
    static NEXT_GENERATION: Cell<u64> = const { Cell::new(0) };
}

/// The reactor.
///
/// The reactor lives inside the scheduler of one thread and is driven by
/// that thread's idle coroutine. It is responsible for:
/// - polling OS I/O readiness events,
/// - managing timers,
/// - running the callbacks of timers and I/O waiters, one per call to
///   [`run_one`](Self::run_one).
///
/// Callbacks may register new timers and waiters, so no internal borrow is
/// ever held while one runs.
pub(crate) struct Reactor {
    /// Platform-specific poller.
    poller: RefCell<Poller>,

    /// Buffer used to collect I/O events from the poller.
    events: RefCell<Vec<Event>>,

    /// Callbacks ready to run, in the order they became ready.
    completions: RefCell<VecDeque<Completion>>,

    /// Min-heap of pending timers ordered by deadline.
    timers: RefCell<BinaryHeap<TimerEntry>>,

    /// Sequence number of the next timer.
    sequence: Cell<u64>,

    /// Timer queue size that triggers the next sweep of cancelled entries.
    compact_at: Cell<usize>,

    /// Slab storing registered I/O sources indexed by poller tokens.
    sources: RefCell<Slab<IoSource>>,

    /// Number of callbacks waiting on I/O sources.
    waiting: Cell<usize>,

    /// Distinguishes this reactor from earlier ones on the same thread.
    /// Source tokens are only meaningful to the reactor that issued them.
    generation: u64,
}

impl Reactor {
    /// Creates a new reactor collecting up to `event_capacity` readiness
    /// events per poll.
    pub(crate) fn new(event_capacity: usize) -> io::Result<Self> {
        let poller = Poller::new(event_capacity)?;
        let generation = NEXT_GENERATION.with(|next| next.replace(next.get() + 1));

        Ok(Self {
            poller: RefCell::new(poller),
            events: RefCell::new(Vec::with_capacity(event_capacity)),
            completions: RefCell::new(VecDeque::new()),
            timers: RefCell::new(BinaryHeap::new()),
            sequence: Cell::new(0),
            compact_at: Cell::new(MIN_COMPACT_AT),
            sources: RefCell::new(Slab::new(INITIAL_SOURCES)),
            waiting: Cell::new(0),
            generation,
        })
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Registers a file descriptor and returns its token.
    ///
    /// The descriptor is not watched until an operation waits on it.
    pub(crate) fn add_source(&self, fd: RawFd) -> usize {
        let token = self.sources.borrow_mut().insert(IoSource::new(fd));
        log::debug!("fd {fd} registered as source {token}");
        token
    }

    /// Removes a source.
    ///
    /// The callbacks still waiting on it are queued to run, so every pending
    /// operation observes that its source is gone. Removing an unknown token
    /// does nothing.
    pub(crate) fn remove_source(&self, token: usize) {
        let source = self.sources.borrow_mut().try_remove(token);
        let Some(mut source) = source else {
            return;
        };

        if source.registered.is_some() {
            self.poller.borrow().deregister(source.fd);
        }

        let waiters = source.waiters();
        self.waiting.set(self.waiting.get() - waiters);

        log::debug!(
            "source {token} (fd {}) removed with {waiters} waiter(s)",
            source.fd
        );

        let mut completions = self.completions.borrow_mut();
        completions.extend(source.readers.drain(..));
        completions.extend(source.writers.drain(..));
    }

    /// Runs `callback` once the source becomes readable.
    ///
    /// Fails with `NotConnected` if the source has been removed.
    pub(crate) fn wait_readable(&self, token: usize, callback: Completion) -> io::Result<()> {
        self.add_waiter(token, callback, true)
    }

    /// Runs `callback` once the source becomes writable.
    ///
    /// Fails with `NotConnected` if the source has been removed.
    pub(crate) fn wait_writable(&self, token: usize, callback: Completion) -> io::Result<()> {
        self.add_waiter(token, callback, false)
    }

    fn add_waiter(&self, token: usize, callback: Completion, read: bool) -> io::Result<()> {
        let mut sources = self.sources.borrow_mut();
        let Some(source) = sources.get_mut(token) else {
            return Err(io::ErrorKind::NotConnected.into());
        };

        let mut interest = source.interest();
        if read {
            interest.read = true;
        } else {
            interest.write = true;
        }

        let poller = self.poller.borrow();
        match source.registered {
            None => poller.register(source.fd, token, interest)?,
            Some(current) if current != interest => {
                poller.reregister(source.fd, token, interest)?
            }
            Some(_) => {}
        }
        source.registered = Some(interest);

        if read {
            source.readers.push(callback);
        } else {
            source.writers.push(callback);
        }

        self.waiting.set(self.waiting.get() + 1);

        Ok(())
    }

    /// Runs `callback` at `deadline`, unless `cancelled` is set by then.
    pub(crate) fn add_timer(&self, deadline: Instant, cancelled: Rc<Cell<bool>>, callback: Completion) {
        let sequence = self.sequence.get();
        self.sequence.set(sequence + 1);

        if self.timers.borrow().len() >= self.compact_at.get() {
            self.compact_timers();
        }

        self.timers.borrow_mut().push(TimerEntry {
            deadline,
            sequence,
            cancelled,
            callback,
        });
    }

    /// Drops every cancelled timer, wherever it sits in the queue.
    ///
    /// Cancelled entries are otherwise only discarded once they reach the
    /// front, and each one holds its callback until then. The next sweep
    /// happens once the queue has doubled again.
    fn compact_timers(&self) {
        let cancelled: Vec<TimerEntry> = {
            let mut timers = self.timers.borrow_mut();
            let (live, cancelled): (Vec<_>, Vec<_>) = mem::take(&mut *timers)
                .into_vec()
                .into_iter()
                .partition(|timer| !timer.cancelled.get());

            self.compact_at.set((live.len() * 2).max(MIN_COMPACT_AT));
            *timers = BinaryHeap::from(live);
            cancelled
        };

        log::trace!("swept {} cancelled timer(s)", cancelled.len());
    }

    #[cfg(test)]
    pub(crate) fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Runs exactly one completion, polling the OS as long as needed.
    ///
    /// Returns `Ok(false)` without blocking when there is nothing to run
    /// and nothing that could ever produce a completion: no pending timer
    /// and no I/O waiter.
    pub(crate) fn run_one(&self) -> io::Result<bool> {
        loop {
            let completion = self.completions.borrow_mut().pop_front();
            if let Some(completion) = completion {
                completion();
                return Ok(true);
            }

            if self.fire_timers() {
                continue;
            }

            let timeout = self
                .timers
                .borrow()
                .peek()
                .map(|t| t.deadline.saturating_duration_since(Instant::now()));

            if timeout.is_none() && self.waiting.get() == 0 {
                return Ok(false);
            }

            let mut events = self.events.borrow_mut();
            self.poller.borrow_mut().poll(&mut events, timeout)?;

            for event in events.drain(..) {
                self.handle_event(event)?;
            }
        }
    }

    /// Moves every expired timer's callback to the completion queue.
    ///
    /// Returns `true` if at least one callback was queued.
    fn fire_timers(&self) -> bool {
        let now = Instant::now();
        let mut expired = Vec::new();

        {
            let mut timers = self.timers.borrow_mut();

            // Cancelled timers at the front are dropped too, so they
            // neither wake the poller nor count as pending work.
            while let Some(timer) = timers.peek() {
                if timer.deadline > now && !timer.cancelled.get() {
                    break;
                }

                if let Some(timer) = timers.pop() {
                    expired.push(timer);
                }
            }
        }

        let mut fired = false;
        let mut completions = Vec::new();

        for timer in expired {
            if timer.cancelled.get() {
                continue;
            }

            fired = true;
            completions.push(timer.callback);
        }

        self.completions.borrow_mut().extend(completions);

        fired
    }

    /// Handles a single I/O event from the poller.
    ///
    /// Moves the callbacks of every direction that became ready to the
    /// completion queue, then narrows or drops the registration to what
    /// the remaining waiters need.
    fn handle_event(&self, event: Event) -> io::Result<()> {
        let woken = {
            let mut sources = self.sources.borrow_mut();
            let Some(source) = sources.get_mut(event.token) else {
                return Ok(());
            };

            let mut woken = Vec::new();
            if event.readable {
                woken.append(&mut source.readers);
            }
            if event.writable {
                woken.append(&mut source.writers);
            }

            let interest = source.interest();
            let poller = self.poller.borrow();

            if interest.is_empty() {
                poller.deregister(source.fd);
                source.registered = None;
            } else if source.registered != Some(interest) {
                poller.reregister(source.fd, event.token, interest)?;
                source.registered = Some(interest);
            }

            woken
        };

        self.waiting.set(self.waiting.get() - woken.len());
        self.completions.borrow_mut().extend(woken);

        Ok(())
    }

    /// Drops every pending completion, timer and source.
    ///
    /// Called at teardown. Callbacks are dropped without running, which
    /// cancels the promises they hold. Dropping them can release sockets
    /// that queue more callbacks, so this repeats until nothing is left.
    pub(crate) fn clear(&self) {
        loop {
            let completions = mem::take(&mut *self.completions.borrow_mut());
            let timers = mem::take(&mut *self.timers.borrow_mut());
            let sources = mem::replace(&mut *self.sources.borrow_mut(), Slab::new(0));

            if completions.is_empty() && timers.is_empty() && sources.len() == 0 {
                break;
            }

            log::debug!(
                "reactor cleared ({} completion(s), {} timer(s), {} source(s))",
                completions.len(),
                timers.len(),
                sources.len()
            );

            drop(completions);
            drop(timers);
            drop(sources);
        }

        self.waiting.set(0);
    }
}
