//! Spawning coroutines.
//!
//! [`spawn`] runs a function on a new coroutine and hands back a
//! [`Promise`] for its result. The coroutine is only queued: the caller
//! keeps running until it waits or yields.

use super::context::with_scheduler;
use super::coroutine::Coroutine;
use crate::error::Result;
use crate::promise::Promise;

/// Spawns `f` on a new coroutine with the runtime's default stack size.
///
/// The returned promise resolves with `f`'s value if it returns `Ok`, and
/// rejects with its error if it returns `Err`. A panic inside `f` is fatal:
/// it aborts the process.
///
/// # Panics
///
/// Panics if no runtime is running on this thread.
///
/// # Examples
///
/// ```rust,ignore
/// let greeting = spawn(|| {
///     sleep(Duration::from_millis(10)).wait()?;
///     Ok("hello")
/// });
///
/// assert_eq!(greeting.wait().unwrap(), "hello");
/// ```
pub fn spawn<F, T>(f: F) -> Promise<T>
where
    F: FnOnce() -> Result<T> + 'static,
    T: 'static,
{
    let stack_size = with_scheduler(|scheduler| scheduler.stack_size());
    spawn_with_stack_size(stack_size, f)
}

/// Spawns `f` on a new coroutine with a stack of `stack_size` bytes.
///
/// # Panics
///
/// Panics if no runtime is running on this thread, or if `stack_size` is
/// smaller than [`MIN_STACK_SIZE`](crate::sched::MIN_STACK_SIZE).
pub fn spawn_with_stack_size<F, T>(stack_size: usize, f: F) -> Promise<T>
where
    F: FnOnce() -> Result<T> + 'static,
    T: 'static,
{
    let promise = Promise::new();
    let producer = promise.clone();

    let coroutine = Coroutine::new(
        move || match f() {
            Ok(value) => producer.resolve(value),
            Err(err) => producer.reject(err),
        },
        stack_size,
    );

    log::trace!("spawned coroutine {}", coroutine.id());

    with_scheduler(|scheduler| scheduler.schedule(coroutine));

    promise
}
