//! MQTT 3.1.1 publish-only client for telemetry uplinks.
//!
//! This module frames MQTT packets by hand on top of the crate's
//! [`Connection`](crate::network::Connection) traits; no external protocol
//! library is involved. It is deliberately narrow:
//!
//! - CONNECT with optional username and password, and CONNACK validation
//! - QoS 0 PUBLISH, written in full in call order
//! - DISCONNECT on request
//!
//! Subscriptions, acknowledged QoS levels, keep-alive pings and reconnection
//! are out of scope. The broker sees a client that connects, publishes and
//! goes away.
//!
//! # Layers
//!
//! - [`codec`]: remaining-length variable-byte integers and length-prefixed fields
//! - [`packet`]: [`PacketBuilder`] for outgoing packets, [`Packet::decode`] for incoming ones
//! - [`client`]: the handshake and publish session over a live connection
//!
//! ```rust
//! use rtklink::network::application::mqtt::{PacketBuilder, PublishRequest};
//!
//! let packet = PacketBuilder::default()
//!     .publish(&PublishRequest { topic: b"t", payload: b"hi" })
//!     .unwrap();
//! assert_eq!(packet, [0x30, 0x05, 0x00, 0x01, b't', b'h', b'i']);
//! ```

/// Wire primitives: variable-byte integers and length-prefixed fields.
pub mod codec;

/// Packet assembly and decoding.
pub mod packet;

/// The publish-only client.
pub mod client;

mod error;

pub use client::{Client, Options, DEFAULT_KEEP_ALIVE_SECONDS, DEFAULT_MAX_PACKET_SIZE};
pub use error::{Error, Result};
pub use packet::{
    parse_connack, ConnAckResult, ConnectRequest, FixedHeader, Packet, PacketBuilder,
    PacketType, PublishRequest,
};
