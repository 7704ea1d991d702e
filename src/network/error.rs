//! Common error types for network operations

use alloc::string::String;

/// A common error type for network operations.
///
/// Covers every way the transport underneath the MQTT client can fail, from
/// name resolution through to a peer that stops accepting bytes. Under the
/// `std` feature the underlying OS error is kept in [`Error::Io`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An operation was attempted on a connection that is not open.
    #[error("connection is not open")]
    NotOpen,
    /// The host name did not resolve to any IPv4 address.
    #[error("failed to resolve host `{0}`")]
    HostResolution(String),
    /// An address could not be parsed as `host:port`.
    #[error("invalid address `{0}`")]
    InvalidAddress(String),
    /// A connection attempt was refused.
    #[error("connection refused")]
    ConnectionRefused,
    /// The peer closed the connection.
    #[error("connection closed by peer")]
    ConnectionClosed,
    /// A read did not complete before the configured deadline.
    #[error("operation timed out")]
    Timeout,
    /// The connection stopped accepting bytes before a packet was fully sent.
    #[error("partial write: {written} of {expected} bytes sent")]
    PartialWrite {
        /// Bytes accepted before the connection stalled.
        written: usize,
        /// Length of the packet being sent.
        expected: usize,
    },
    /// An error occurred during a write operation.
    #[error("write failed")]
    WriteError,
    /// An error occurred during a read operation.
    #[error("read failed")]
    ReadError,
    /// A socket call failed with an OS error.
    #[cfg(feature = "std")]
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
}
