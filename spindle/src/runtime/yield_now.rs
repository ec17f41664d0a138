use super::context::with_scheduler;

/// Yields execution back to the scheduler.
///
/// Every coroutine that is ready when this is called runs before the
/// caller continues. If nothing else is ready, this returns immediately
/// without switching.
///
/// # Examples
///
/// ```rust,ignore
/// spawn(|| {
///     for chunk in work {
///         process(chunk);
///         // Allow other coroutines to make progress
///         yield_now();
///     }
///     Ok(())
/// });
/// ```
pub fn yield_now() {
    with_scheduler(|scheduler| scheduler.yield_now());
}
