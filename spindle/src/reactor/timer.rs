use super::Completion;

use std::cell::Cell;
use std::cmp::Ordering;
use std::rc::Rc;
use std::time::Instant;

/// An entry in the reactor timer queue.
///
/// `TimerEntry` represents a callback to run at a specific deadline. It is
/// stored inside a binary heap ordered by deadline, then by insertion
/// order, so timers with equal deadlines fire in the order they were set.
///
/// The entry may be cancelled before it fires; a cancelled entry is
/// discarded when it reaches the front of the queue or when the reactor
/// sweeps the queue.
pub(crate) struct TimerEntry {
    /// The time at which the timer should fire.
    pub(crate) deadline: Instant,

    /// Insertion sequence number, used as a tie-breaker.
    pub(crate) sequence: u64,

    /// Cancellation flag shared with the owner of the timer.
    pub(crate) cancelled: Rc<Cell<bool>>,

    /// Callback to run when the deadline is reached.
    pub(crate) callback: Completion,
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    /// Two timer entries are equal if they were inserted together.
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.sequence == other.sequence
    }
}

impl Ord for TimerEntry {
    /// Orders timer entries by deadline, then by sequence.
    ///
    /// Note that the comparison is **reversed** so that a
    /// `BinaryHeap<TimerEntry>` behaves as a min-heap,
    /// where the earliest deadline is popped first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for TimerEntry {
    /// Partial ordering consistent with [`Ord`].
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
