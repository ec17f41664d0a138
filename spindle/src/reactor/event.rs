/// An I/O event reported by the poller.
///
/// An `Event` represents readiness information for a registered
/// file descriptor. It is produced by the poller and consumed
/// by the reactor to wake the waiters of that descriptor.
///
/// Errors and hang-ups are reported as both readable and writable, so
/// every waiter retries its operation and observes the failure.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Event {
    /// Token associated with the registered file descriptor.
    ///
    /// This token is the slab index of the I/O source inside the reactor.
    pub(crate) token: usize,

    /// Indicates that the file descriptor is readable.
    pub(crate) readable: bool,

    /// Indicates that the file descriptor is writable.
    pub(crate) writable: bool,
}
