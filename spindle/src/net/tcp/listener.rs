use super::resolve;
use super::stream::TcpStream;
use crate::error::Result;
use crate::promise::Promise;
use crate::reactor::platform::{
    domain_of, sys_accept, sys_bind, sys_close, sys_ipv6_is_necessary, sys_listen,
    sys_set_reuseaddr, sys_socket, sys_sockname,
};
use crate::reactor::{Direction, Source};

use std::io;
use std::net::SocketAddr;
use std::rc::Rc;

/// A TCP listener.
///
/// `TcpListener` listens for incoming TCP connections and integrates
/// with the runtime reactor to accept connections without blocking the
/// thread.
///
/// # Examples
///
/// ```rust,ignore
/// let listener = listen("127.0.0.1", 8080)?;
///
/// loop {
///     let stream = listener.accept().wait()?;
///     spawn(move || handle(stream));
/// }
/// ```
pub struct TcpListener {
    source: Rc<Source>,
}

/// Binds a TCP listener to `host:port`.
///
/// Port `0` picks a free port; see [`TcpListener::local_addr`].
///
/// # Panics
///
/// Panics if called outside of a running runtime.
pub fn listen(host: &str, port: u16) -> Result<TcpListener> {
    let addr = resolve(host, port)?;
    Ok(TcpListener::bind(addr)?)
}

impl TcpListener {
    /// Binds a TCP listener to the given address.
    ///
    /// This function:
    /// - creates a non-blocking socket,
    /// - enables `SO_REUSEADDR`,
    /// - configures IPv6 dual-stack if applicable,
    /// - binds and starts listening,
    /// - registers the socket with the reactor.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a running runtime.
    pub fn bind(addr: SocketAddr) -> io::Result<Self> {
        let domain = domain_of(&addr);
        let fd = sys_socket(domain)?;

        let setup = sys_set_reuseaddr(fd)
            .and_then(|()| sys_ipv6_is_necessary(fd, domain))
            .and_then(|()| sys_bind(fd, &addr))
            .and_then(|()| sys_listen(fd));

        if let Err(err) = setup {
            sys_close(fd);
            return Err(err);
        }

        log::debug!("listening on {addr} (fd {fd})");

        Ok(Self {
            source: Source::new(fd),
        })
    }

    /// Accepts an incoming TCP connection.
    ///
    /// The promise resolves with the connected stream once a client
    /// connects. It is rejected with [`Cancelled`](crate::Error::Cancelled)
    /// if the listener is closed first.
    pub fn accept(&self) -> Promise<TcpStream> {
        self.source.submit(Direction::Read, |fd| {
            let (client, peer) = sys_accept(fd)?;
            log::debug!("accepted connection from {peer} (fd {client})");
            Ok(TcpStream::from_fd(client))
        })
    }

    /// Returns the local socket address of this listener.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        sys_sockname(self.source.fd())
    }

    /// Stops listening and rejects pending accepts.
    pub fn close(&self) {
        self.source.close();
    }
}
