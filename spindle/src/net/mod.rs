//! TCP networking primitives.
//!
//! This module provides TCP types built on top of the runtime reactor.
//! Every operation that may block returns a [`Promise`](crate::Promise)
//! instead, so a coroutine waits on it while others keep running.
//!
//! It exposes:
//! - [`listen`] and [`TcpListener`] for accepting incoming connections,
//! - [`connect`] for establishing outbound connections,
//! - [`TcpStream`], which implements [`Stream`](crate::io::Stream).
//!
//! These types must be used on a thread with a running
//! [`Runtime`](crate::Runtime), and should be used instead of blocking
//! `std::net` sockets.

mod tcp;

pub use tcp::listener::{TcpListener, listen};
pub use tcp::stream::{TcpStream, connect};
