//! # rtklink - BDS-RTK telemetry uplink
//!
//! Connects a field device to a telemetry collector and publishes messages
//! over MQTT 3.1.1. The MQTT framing is built by hand directly on a TCP
//! socket, so the protocol core has no dependency on an MQTT library and
//! runs in `no_std` environments with `alloc`.
//!
//! ## Features
//!
//! ### Network
//! - **Transport traits**: [`network::Read`], [`network::Write`],
//!   [`network::Close`] and [`network::Connection`] decouple protocols from
//!   the socket implementation
//! - **TCP transport** (`std`): IPv4 resolution, read deadline, orderly close
//! - **MQTT client**: CONNECT/CONNACK handshake, QoS 0 PUBLISH, DISCONNECT
//!
//! ### Configuration
//! - [`config::Config`] holds the collector address, credentials and topic,
//!   with device defaults and JSON loading
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rtklink::config::Config;
//! use rtklink::network::application::mqtt::Client;
//! use rtklink::network::tcp;
//!
//! let config = Config {
//!     password: Some("secret"),
//!     ..Config::default()
//! };
//!
//! let connection = tcp::connect(config.host, config.port, config.read_timeout())?;
//! let mut client = Client::connect(connection, &config.options())?;
//! client.publish(config.topic, config.message.as_bytes())?;
//! client.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Optional Features
//!
//! - `std` (default): TCP transport, the `rtk-publish` binary, `std::error::Error` impls
//! - `defmt`: `defmt::Format` impls for packet types

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

extern crate alloc;

/// Network abstraction layer: transport traits, the TCP transport and the
/// MQTT client.
pub mod network;

/// Uplink configuration with device defaults.
pub mod config;
