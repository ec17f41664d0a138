use crate::runtime::fatal;

use libc::{
    MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, MAP_STACK, PROT_NONE, PROT_READ, PROT_WRITE,
    _SC_PAGESIZE, c_void, mmap, mprotect, munmap, sysconf,
};
use std::ptr;

/// Smallest stack a coroutine may be created with.
pub const MIN_STACK_SIZE: usize = 16 * 1024;

/// Default stack size for spawned coroutines.
pub const DEFAULT_STACK_SIZE: usize = 256 * 1024;

/// The call stack of one coroutine.
///
/// The region is mapped with `mmap` and its lowest page is protected with
/// `PROT_NONE`, so running off the end of the stack faults instead of
/// silently corrupting a neighbouring allocation.
///
/// The memory is unmapped exactly once, when the `Stack` is dropped. The
/// owning coroutine guarantees that this never happens while the stack is
/// in use.
pub(crate) struct Stack {
    /// Lowest address of the mapping (the guard page).
    base: *mut u8,

    /// Total length of the mapping, guard page included.
    len: usize,

    /// Size of the guard page.
    guard: usize,
}

impl Stack {
    /// Maps a new stack with at least `size` usable bytes.
    ///
    /// `size` is rounded up to a multiple of the page size. Failing to map
    /// the stack is fatal: a coroutine cannot exist without one.
    ///
    /// # Panics
    ///
    /// Panics if `size` is smaller than [`MIN_STACK_SIZE`].
    pub(crate) fn allocate(size: usize) -> Self {
        assert!(
            size >= MIN_STACK_SIZE,
            "stack size must be at least {MIN_STACK_SIZE} bytes"
        );

        let page = page_size();
        let usable = size.div_ceil(page) * page;
        let len = usable + page;

        let base = unsafe {
            mmap(
                ptr::null_mut(),
                len,
                PROT_READ | PROT_WRITE,
                MAP_PRIVATE | MAP_ANONYMOUS | MAP_STACK,
                -1,
                0,
            )
        };

        if base == MAP_FAILED {
            fatal(format_args!(
                "failed to map a {len} byte coroutine stack: {}",
                std::io::Error::last_os_error()
            ));
        }

        if unsafe { mprotect(base, page, PROT_NONE) } != 0 {
            fatal(format_args!(
                "failed to protect coroutine stack guard page: {}",
                std::io::Error::last_os_error()
            ));
        }

        Self {
            base: base as *mut u8,
            len,
            guard: page,
        }
    }

    /// Returns the top of the stack (its highest address).
    ///
    /// The stack grows downward from here.
    pub(crate) fn top(&self) -> *mut u8 {
        unsafe { self.base.add(self.len) }
    }

    /// Returns the lowest usable address, just above the guard page.
    pub(crate) fn bottom(&self) -> *mut u8 {
        unsafe { self.base.add(self.guard) }
    }

    /// Returns the number of usable bytes.
    pub(crate) fn size(&self) -> usize {
        self.len - self.guard
    }

    /// Unmaps the stack.
    fn free(&mut self) {
        let rc = unsafe { munmap(self.base as *mut c_void, self.len) };
        debug_assert_eq!(rc, 0);
    }
}

impl Drop for Stack {
    fn drop(&mut self) {
        self.free();
    }
}

fn page_size() -> usize {
    let page = unsafe { sysconf(_SC_PAGESIZE) };
    if page <= 0 { 4096 } else { page as usize }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_rounds_up_to_pages() {
        let stack = Stack::allocate(MIN_STACK_SIZE + 1);
        let page = page_size();

        assert_eq!(stack.size() % page, 0);
        assert!(stack.size() > MIN_STACK_SIZE);
        assert_eq!(stack.top() as usize - stack.bottom() as usize, stack.size());
    }

    #[test]
    fn usable_region_is_writable() {
        let stack = Stack::allocate(MIN_STACK_SIZE);

        unsafe {
            stack.bottom().write(0xAB);
            stack.top().sub(1).write(0xCD);

            assert_eq!(stack.bottom().read(), 0xAB);
            assert_eq!(stack.top().sub(1).read(), 0xCD);
        }
    }

    #[test]
    #[should_panic(expected = "stack size must be at least")]
    fn tiny_stack_is_rejected() {
        let _ = Stack::allocate(1024);
    }
}
