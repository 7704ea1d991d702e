//! A network abstraction layer for the telemetry uplink
//!
//! The MQTT client never touches a socket directly. It talks to anything that
//! implements the small set of blocking traits below, which keeps the packet
//! logic testable against in-memory connections and portable to targets
//! without `std::net`.
//!

#![deny(unsafe_code)]

/// Common error types for network operations
pub mod error;

/// TCP transport backed by `std::net`
#[cfg(feature = "std")]
pub mod tcp;

/// Application layer protocols
pub mod application;

use error::Error;

/// Re-exports of common traits
pub mod prelude {
    pub use super::{Close, Connect, Connection, Read, Write};
}

/// Blocking read half of a connection.
pub trait Read {
    /// Associated error type
    type Error: core::fmt::Debug + Into<Error>;
    /// Read data from the connection. `Ok(0)` means the peer closed the stream.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Blocking write half of a connection.
pub trait Write {
    /// Associated error type
    type Error: core::fmt::Debug + Into<Error>;
    /// Write data to the connection, returning how many bytes were accepted.
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error>;
    /// Flush the write buffer
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Releases the underlying descriptor.
pub trait Close {
    /// Associated error type
    type Error: core::fmt::Debug + Into<Error>;
    /// Close the connection
    fn close(self) -> Result<(), Self::Error>;
}

/// A synchronous connection
pub trait Connection: Read + Write + Close {}

/// A synchronous connector (client)
pub trait Connect {
    /// Associated connection type
    type Connection: Connection;
    /// Associated error type
    type Error: core::fmt::Debug + Into<Error>;
    /// Open a connection to `remote`, given as `host:port`.
    fn connect(&mut self, remote: &str) -> Result<Self::Connection, Self::Error>;
}

/// Write the whole of `buf`, retrying short writes until every byte is
/// accepted, then flush.
///
/// A write that accepts zero bytes can never make progress and is reported as
/// [`Error::PartialWrite`].
pub fn write_all<W: Write + ?Sized>(writer: &mut W, buf: &[u8]) -> Result<(), Error> {
    let mut written = 0;
    while written < buf.len() {
        match writer.write(&buf[written..]).map_err(Into::<Error>::into)? {
            0 => {
                return Err(Error::PartialWrite {
                    written,
                    expected: buf.len(),
                });
            }
            n => written += n,
        }
    }
    writer.flush().map_err(Into::into)
}
