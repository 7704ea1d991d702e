//! Blocking TCP transport.
//!
//! Resolves the collector's host name to an IPv4 address, opens a
//! [`std::net::TcpStream`] and exposes it through the crate's connection
//! traits. Reads are bounded by an optional timeout so a silent broker cannot
//! hang the handshake forever.

use std::io::{ErrorKind, Read as _, Write as _};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use super::error::Error;
use super::{Close, Connect, Connection, Read, Write};

/// Opens [`TcpConnection`]s.
#[derive(Debug, Clone, Default)]
pub struct TcpConnector {
    read_timeout: Option<Duration>,
}

impl TcpConnector {
    /// A connector whose connections block on reads without a deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound every read on the produced connections by `timeout`.
    ///
    /// `None` or a zero duration leaves reads unbounded.
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout.filter(|t| !t.is_zero());
        self
    }
}

impl Connect for TcpConnector {
    type Connection = TcpConnection;
    type Error = Error;

    fn connect(&mut self, remote: &str) -> Result<Self::Connection, Self::Error> {
        let (host, port) = split_host_port(remote)?;
        connect(host, port, self.read_timeout)
    }
}

/// Resolve `host` to its first IPv4 address and open a TCP stream to it.
pub fn connect(host: &str, port: u16, read_timeout: Option<Duration>) -> Result<TcpConnection, Error> {
    let addr = resolve_ipv4(host, port)?;
    let stream = TcpStream::connect(addr).map_err(|e| match e.kind() {
        ErrorKind::ConnectionRefused => Error::ConnectionRefused,
        _ => Error::Io(e),
    })?;
    stream.set_read_timeout(read_timeout.filter(|t| !t.is_zero()))?;
    debug!(%addr, host, "tcp connection established");
    Ok(TcpConnection { stream, peer: addr })
}

fn resolve_ipv4(host: &str, port: u16) -> Result<SocketAddr, Error> {
    (host, port)
        .to_socket_addrs()
        .map_err(|_| Error::HostResolution(host.to_string()))?
        .find(SocketAddr::is_ipv4)
        .ok_or_else(|| Error::HostResolution(host.to_string()))
}

fn split_host_port(remote: &str) -> Result<(&str, u16), Error> {
    let (host, port) = remote
        .rsplit_once(':')
        .ok_or_else(|| Error::InvalidAddress(remote.to_string()))?;
    let port = port
        .parse::<u16>()
        .map_err(|_| Error::InvalidAddress(remote.to_string()))?;
    if host.is_empty() {
        return Err(Error::InvalidAddress(remote.to_string()));
    }
    Ok((host, port))
}

/// An open TCP stream to the collector.
#[derive(Debug)]
pub struct TcpConnection {
    stream: TcpStream,
    peer: SocketAddr,
}

impl TcpConnection {
    /// Address of the remote end.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl Read for TcpConnection {
    type Error = Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        loop {
            match self.stream.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Err(Error::Timeout);
                }
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }
}

impl Write for TcpConnection {
    type Error = Error;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        loop {
            match self.stream.write(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.stream.flush().map_err(Error::Io)
    }
}

impl Close for TcpConnection {
    type Error = Error;

    fn close(self) -> Result<(), Self::Error> {
        match self.stream.shutdown(Shutdown::Both) {
            Err(e) if e.kind() != ErrorKind::NotConnected => Err(Error::Io(e)),
            _ => {
                debug!(peer = %self.peer, "tcp connection closed");
                Ok(())
            }
        }
    }
}

impl Connection for TcpConnection {}

impl From<TcpConnection> for TcpStream {
    fn from(conn: TcpConnection) -> Self {
        conn.stream
    }
}
