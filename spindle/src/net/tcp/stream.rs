use super::resolve;
use crate::io::Stream;
use crate::promise::Promise;
use crate::reactor::platform::{
    domain_of, sys_close, sys_connect, sys_peername, sys_read, sys_shutdown, sys_sockname,
    sys_socket, sys_take_error, sys_write,
};
use crate::reactor::{Direction, Source};

use std::fmt;
use std::io;
use std::net::{Shutdown, SocketAddr};
use std::os::fd::RawFd;
use std::rc::Rc;

/// A connected TCP stream.
///
/// `TcpStream` is a non-blocking TCP connection registered with the
/// current thread's reactor. Reads and writes are attempted immediately
/// and, if the socket is not ready, retried when the reactor reports it
/// ready.
///
/// Clones share the same socket. The socket is closed by
/// [`close`](Stream::close) or when the last clone is dropped.
///
/// A `TcpStream` must be created and used **inside a running runtime**.
#[derive(Clone)]
pub struct TcpStream {
    source: Rc<Source>,
}

/// Opens a TCP connection to `host:port`.
///
/// The promise resolves once the connection is established, or rejects
/// with the I/O error that prevented it.
///
/// # Panics
///
/// Panics if called outside of a running runtime.
///
/// # Examples
///
/// ```rust,ignore
/// let stream = connect("127.0.0.1", 8080).wait()?;
/// stream.write(b"ping\n").wait()?;
/// ```
pub fn connect(host: &str, port: u16) -> Promise<TcpStream> {
    match resolve(host, port) {
        Ok(addr) => TcpStream::connect(addr),
        Err(err) => Promise::rejected(err),
    }
}

impl TcpStream {
    /// Wraps a connected, non-blocking socket and registers it with the
    /// reactor.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a running runtime.
    pub(crate) fn from_fd(fd: RawFd) -> Self {
        Self {
            source: Source::new(fd),
        }
    }

    /// Opens a TCP connection to `addr`.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a running runtime.
    pub fn connect(addr: SocketAddr) -> Promise<TcpStream> {
        let fd = match sys_socket(domain_of(&addr)) {
            Ok(fd) => fd,
            Err(err) => return Promise::rejected(err.into()),
        };

        match sys_connect(fd, &addr) {
            Ok(()) => return Promise::resolved(Self::from_fd(fd)),
            Err(err) if err.raw_os_error() == Some(libc::EINPROGRESS) => {}
            Err(err) => {
                sys_close(fd);
                return Promise::rejected(err.into());
            }
        }

        log::debug!("connecting fd {fd} to {addr}");

        let stream = Self::from_fd(fd);
        let connected = stream.clone();

        stream.source.submit(Direction::Write, move |fd| {
            if let Some(err) = sys_take_error(fd)? {
                return Err(err);
            }

            match sys_peername(fd) {
                Ok(_) => Ok(connected.clone()),
                Err(err) if err.kind() == io::ErrorKind::NotConnected => {
                    Err(io::ErrorKind::WouldBlock.into())
                }
                Err(err) => Err(err),
            }
        })
    }

    /// Returns the local address of this connection.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        sys_sockname(self.source.fd())
    }

    /// Returns the address of the remote peer.
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        sys_peername(self.source.fd())
    }

    /// Shuts down the read, write, or both halves of this connection.
    pub fn shutdown(&self, how: Shutdown) -> io::Result<()> {
        sys_shutdown(self.source.fd(), how)
    }

    /// Returns `true` once the stream has been closed.
    pub fn is_closed(&self) -> bool {
        self.source.is_closed()
    }
}

impl Stream for TcpStream {
    fn read(&self, max_len: usize) -> Promise<Vec<u8>> {
        self.source.submit(Direction::Read, move |fd| {
            let mut buffer = vec![0; max_len];
            let n = sys_read(fd, &mut buffer)?;
            buffer.truncate(n);
            Ok(buffer)
        })
    }

    fn write(&self, data: &[u8]) -> Promise<usize> {
        let data = data.to_vec();
        let mut written = 0;

        self.source.submit(Direction::Write, move |fd| {
            while written < data.len() {
                match sys_write(fd, &data[written..])? {
                    0 => return Err(io::ErrorKind::WriteZero.into()),
                    n => written += n,
                }
            }

            Ok(written)
        })
    }

    fn close(&self) {
        self.source.close();
    }
}

impl fmt::Debug for TcpStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpStream")
            .field("fd", &self.source.fd())
            .field("closed", &self.source.is_closed())
            .finish()
    }
}
