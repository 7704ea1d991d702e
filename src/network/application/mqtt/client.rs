//! MQTT 3.1.1 publish-only client.
//!
//! The client drives a single blocking connection through two phases:
//!
//! 1. **Handshake**: send CONNECT, perform one receive, and accept the
//!    session only if the reply is a CONNACK with return code 0.
//! 2. **Publish**: send any number of QoS 0 PUBLISH packets, strictly in
//!    call order, each written in full before the call returns.
//!
//! There is no keep-alive servicing, no acknowledgement flow and no
//! reconnection; any failure is returned to the caller, who owns the
//! decision to close the connection.
//!
//! # Examples
//!
//! ```rust,no_run
//! use rtklink::network::application::mqtt::{Client, Options};
//! use rtklink::network::tcp;
//! use std::time::Duration;
//!
//! let connection = tcp::connect("127.0.0.1", 1883, Some(Duration::from_secs(5)))?;
//! let options = Options {
//!     client_id: "bds_rtk_client",
//!     username: Some("mqttgnss"),
//!     password: Some("secret"),
//!     ..Options::default()
//! };
//!
//! let mut client = Client::connect(connection, &options)?;
//! client.publish("BDS-RTK/test", b"BDS-RTKtest")?;
//! client.close()?;
//! # Ok::<(), rtklink::network::application::mqtt::Error>(())
//! ```

use alloc::string::String;

use tracing::{debug, trace, warn};

use super::error::{Error, Result};
use super::packet::{parse_connack, ConnAckResult, ConnectRequest, PacketBuilder, PublishRequest};
use crate::network::error::Error as TransportError;
use crate::network::{write_all, Connection};

/// Size of the single receive performed for CONNACK.
const CONNACK_BUF_LEN: usize = 16;

/// Default keep-alive advertised in CONNECT, in seconds.
pub const DEFAULT_KEEP_ALIVE_SECONDS: u16 = 20;

/// Default limit on the encoded size of any outgoing packet.
pub const DEFAULT_MAX_PACKET_SIZE: usize = 4096;

/// Configuration options for the MQTT session.
///
/// # Examples
///
/// ```rust
/// use rtklink::network::application::mqtt::Options;
///
/// let options = Options {
///     client_id: "bds_rtk_client",
///     username: Some("mqttgnss"),
///     password: Some("secret"),
///     ..Options::default()
/// };
///
/// assert_eq!(options.keep_alive_seconds, 20);
/// assert_eq!(options.connect_request().connect_flags(), 0xC0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options<'a> {
    /// The client identifier, must be unique within the broker.
    pub client_id: &'a str,

    /// User name sent in CONNECT, if any.
    pub username: Option<&'a str>,

    /// Password sent in CONNECT, if any.
    pub password: Option<&'a str>,

    /// The keep-alive interval in seconds.
    ///
    /// Advertised to the broker only; this client never sends PINGREQ, so a
    /// broker that enforces it will drop an idle connection after 1.5x this
    /// interval.
    pub keep_alive_seconds: u16,

    /// Whether to ask the broker for a clean session.
    pub clean_session: bool,

    /// Largest packet the client will put on the wire, in bytes.
    pub max_packet_size: usize,
}

impl Default for Options<'_> {
    fn default() -> Self {
        Self {
            client_id: "",
            username: None,
            password: None,
            keep_alive_seconds: DEFAULT_KEEP_ALIVE_SECONDS,
            clean_session: false,
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
        }
    }
}

impl<'a> Options<'a> {
    /// The CONNECT contents these options describe.
    pub fn connect_request(&self) -> ConnectRequest<'a> {
        ConnectRequest {
            client_id: self.client_id.as_bytes(),
            username: self.username.map(str::as_bytes),
            password: self.password.map(str::as_bytes),
            keep_alive_seconds: self.keep_alive_seconds,
            clean_session: self.clean_session,
        }
    }
}

/// A publish-only MQTT 3.1.1 client over any [`Connection`].
#[derive(Debug)]
pub struct Client<C: Connection> {
    connection: C,
    builder: PacketBuilder,
    is_connected: bool,
}

impl<C: Connection> Client<C> {
    /// Wrap an open connection without performing the handshake.
    ///
    /// Call [`Client::send_connect`] before publishing.
    pub fn new(connection: C, builder: PacketBuilder) -> Self {
        Self {
            connection,
            builder,
            is_connected: false,
        }
    }

    /// Perform the CONNECT/CONNACK handshake and return a ready client.
    ///
    /// On any failure the connection is closed before the error is returned.
    ///
    /// # Errors
    ///
    /// * [`Error::Rejected`] - the broker returned a nonzero CONNACK code
    /// * [`Error::Protocol`] - the reply is not a CONNACK
    /// * [`Error::SizeLimit`] - the CONNECT packet exceeds `max_packet_size`
    /// * [`Error::Transport`] - the socket failed, timed out or was closed
    pub fn connect(connection: C, options: &Options<'_>) -> Result<Self> {
        let mut client = Self::new(connection, PacketBuilder::new(options.max_packet_size));
        match client.send_connect(&options.connect_request()) {
            Ok(ConnAckResult::Accepted) => Ok(client),
            Ok(ConnAckResult::Rejected(code)) => {
                client.abort();
                Err(Error::Rejected(code))
            }
            Err(e) => {
                client.abort();
                Err(e)
            }
        }
    }

    /// Send CONNECT and read the broker's answer.
    ///
    /// Exactly one receive is performed. The reply must hold at least four
    /// bytes and start with a CONNACK header; its return code decides the
    /// result. A rejection is reported as [`ConnAckResult::Rejected`], not as
    /// an error, and leaves the connection open. A receive of zero bytes is
    /// reported as [`Error::Transport`] with `ConnectionClosed` rather than as
    /// a malformed CONNACK.
    pub fn send_connect(&mut self, request: &ConnectRequest<'_>) -> Result<ConnAckResult> {
        let packet = self.builder.connect(request)?;
        debug!(
            client_id = %String::from_utf8_lossy(request.client_id),
            keep_alive = request.keep_alive_seconds,
            flags = request.connect_flags(),
            bytes = packet.len(),
            "sending CONNECT"
        );
        write_all(&mut self.connection, &packet)?;

        let mut buf = [0u8; CONNACK_BUF_LEN];
        let received = match self.connection.read(&mut buf).map_err(Error::transport)? {
            0 => return Err(TransportError::ConnectionClosed.into()),
            n => n,
        };

        let result = parse_connack(&buf[..received])?;
        match result {
            ConnAckResult::Accepted => {
                debug!("CONNACK accepted");
                self.is_connected = true;
            }
            ConnAckResult::Rejected(code) => warn!(code, "CONNACK rejected"),
        }
        Ok(result)
    }

    /// Publish `payload` to `topic` at QoS 0.
    ///
    /// The whole packet is written before this returns; a connection that
    /// stops accepting bytes yields a partial-write transport error.
    ///
    /// # Errors
    ///
    /// * [`Error::NotConnected`] - the handshake has not succeeded
    /// * [`Error::SizeLimit`] - topic or packet too large
    /// * [`Error::Transport`] - the socket failed mid-write
    pub fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<()> {
        if !self.is_connected {
            return Err(Error::NotConnected);
        }
        let packet = self.builder.publish(&PublishRequest {
            topic: topic.as_bytes(),
            payload,
        })?;
        write_all(&mut self.connection, &packet)?;
        trace!(topic, payload = payload.len(), bytes = packet.len(), "sent PUBLISH");
        Ok(())
    }

    /// Whether the broker has accepted this session.
    pub fn is_connected(&self) -> bool {
        self.is_connected
    }

    /// Borrow the underlying connection.
    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// Send DISCONNECT, then close the connection.
    pub fn disconnect(mut self) -> Result<()> {
        let packet = self.builder.disconnect();
        if let Err(e) = write_all(&mut self.connection, &packet) {
            self.abort();
            return Err(e.into());
        }
        debug!("sent DISCONNECT");
        self.close()
    }

    /// Close the connection without sending DISCONNECT.
    pub fn close(self) -> Result<()> {
        self.connection.close().map_err(Error::transport)
    }

    fn abort(self) {
        if let Err(e) = self.connection.close() {
            debug!(error = ?e, "close after failure also failed");
        }
    }
}
