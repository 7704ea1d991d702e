//! Error types for the MQTT client.

use crate::network::error::Error as TransportError;

/// Result type alias for MQTT operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Everything that can go wrong while framing packets or talking to the broker.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A remaining length does not fit in four variable-byte digits.
    #[error("remaining length {0} exceeds the MQTT maximum of 268435455")]
    Encoding(usize),

    /// A field or the whole packet is larger than allowed.
    #[error("{field} is {len} bytes, limit is {max}")]
    SizeLimit {
        /// Which part of the packet overflowed.
        field: &'static str,
        /// Its encoded size.
        len: usize,
        /// The configured or protocol limit.
        max: usize,
    },

    /// Received bytes do not form the expected packet.
    #[error("protocol error: {0}")]
    Protocol(&'static str),

    /// A PUBLISH was attempted before the broker accepted the connection.
    #[error("not connected: CONNECT has not been accepted")]
    NotConnected,

    /// The broker answered CONNECT with a nonzero return code.
    #[error("connection rejected by broker (return code {0})")]
    Rejected(u8),

    /// The transport underneath failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl Error {
    /// Convert any transport-level error into [`Error::Transport`].
    pub(crate) fn transport<E: Into<TransportError>>(err: E) -> Self {
        Error::Transport(err.into())
    }
}
