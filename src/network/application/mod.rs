//! # Application Layer Protocols
//!
//! Protocols that run over a [`Connection`](crate::network::Connection).
//! Each client wraps a connection it owns and speaks a single wire format on
//! it; none of them know whether the bytes travel over TCP, a modem or an
//! in-memory test double.
//!
//! ## Available Protocols
//!
//! - **[`mqtt`]**: MQTT 3.1.1 publish-only client

/// MQTT client implementation.
///
/// Hand-built MQTT 3.1.1 framing for the telemetry uplink: CONNECT,
/// CONNACK validation and QoS 0 PUBLISH.
pub mod mqtt;
