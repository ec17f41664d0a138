//! TCP networking implementation.
//!
//! It is split into:
//! - [`listener`]: accepting incoming TCP connections,
//! - [`stream`]: connected TCP streams.

pub mod listener;
pub mod stream;

use crate::error::{Error, Result};

use std::io;
use std::net::{SocketAddr, ToSocketAddrs};

/// Resolves `host:port` to the first matching socket address.
///
/// Host names go through the system resolver, which blocks the thread.
fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    let mut addrs = (host, port).to_socket_addrs()?;

    addrs.next().ok_or_else(|| {
        Error::from(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("no address found for {host}:{port}"),
        ))
    })
}
