//! Small data structures used internally by the runtime.
//!
//! The [`Slab`] hands out the tokens the reactor registers I/O sources
//! under.

mod slab;

pub(crate) use slab::Slab;
