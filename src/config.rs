//! Uplink configuration.
//!
//! Everything the device used to compile in (collector address, credentials,
//! topic, keep-alive) lives in [`Config`]. It can be built in code or parsed
//! from a small JSON document; string fields borrow from the input buffer so
//! parsing does not allocate.
//!
//! ```rust
//! use rtklink::config::Config;
//!
//! let json = br#"{"host":"collector.local","port":1884,"password":"secret"}"#;
//! let config = Config::from_json(json).unwrap();
//!
//! assert_eq!(config.host, "collector.local");
//! assert_eq!(config.port, 1884);
//! assert_eq!(config.topic, "BDS-RTK/test");
//! ```

use core::time::Duration;

use serde::Deserialize;

use crate::network::application::mqtt::{
    ConnectRequest, Options, DEFAULT_KEEP_ALIVE_SECONDS, DEFAULT_MAX_PACKET_SIZE,
};

/// Default collector host.
pub const DEFAULT_HOST: &str = "www.bjfzkj.com.cn";
/// Default MQTT port.
pub const DEFAULT_PORT: u16 = 1883;
/// Default client identifier.
pub const DEFAULT_CLIENT_ID: &str = "bds_rtk_client";
/// Default user name.
pub const DEFAULT_USERNAME: &str = "mqttgnss";
/// Default topic for telemetry.
pub const DEFAULT_TOPIC: &str = "BDS-RTK/test";
/// Default test message.
pub const DEFAULT_MESSAGE: &str = "BDS-RTKtest";

/// Errors produced while loading or checking a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    #[error("malformed config: {0}")]
    Parse(serde_json_core::de::Error),
    /// A field holds a value the uplink cannot use.
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Connection and publishing parameters for the uplink.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config<'a> {
    /// Collector host name or IPv4 address.
    pub host: &'a str,
    /// Collector TCP port.
    pub port: u16,
    /// MQTT client identifier.
    pub client_id: &'a str,
    /// MQTT user name.
    #[serde(borrow)]
    pub username: Option<&'a str>,
    /// MQTT password. Not defaulted; supply it through the config file or
    /// the environment.
    #[serde(borrow)]
    pub password: Option<&'a str>,
    /// Topic every message is published to.
    pub topic: &'a str,
    /// Keep-alive advertised in CONNECT.
    pub keep_alive_seconds: u16,
    /// Clean-session flag in CONNECT.
    pub clean_session: bool,
    /// Upper bound on any packet put on the wire.
    pub max_packet_size: usize,
    /// Deadline for the CONNACK receive, in milliseconds. 0 waits forever.
    pub read_timeout_ms: u32,
    /// Message published by the `rtk-publish` tool.
    pub message: &'a str,
    /// How many times the tool publishes the message.
    pub publish_count: u32,
    /// Pause between publishes, in milliseconds.
    pub publish_interval_ms: u32,
    /// Send DISCONNECT before closing the socket.
    pub send_disconnect: bool,
}

impl Default for Config<'_> {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST,
            port: DEFAULT_PORT,
            client_id: DEFAULT_CLIENT_ID,
            username: Some(DEFAULT_USERNAME),
            password: None,
            topic: DEFAULT_TOPIC,
            keep_alive_seconds: DEFAULT_KEEP_ALIVE_SECONDS,
            clean_session: false,
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            read_timeout_ms: 5_000,
            message: DEFAULT_MESSAGE,
            publish_count: 5,
            publish_interval_ms: 1_000,
            send_disconnect: false,
        }
    }
}

impl<'a> Config<'a> {
    /// Parse a JSON document. Missing fields keep their defaults.
    ///
    /// Strings are borrowed from `json` and therefore must not contain
    /// escape sequences.
    pub fn from_json(json: &'a [u8]) -> Result<Self, ConfigError> {
        let (config, _) =
            serde_json_core::from_slice::<Config<'a>>(json).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the fields the uplink cannot work without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::Invalid("host is empty"));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("port is 0"));
        }
        if self.topic.is_empty() {
            return Err(ConfigError::Invalid("topic is empty"));
        }
        if self.topic.contains(['+', '#']) {
            return Err(ConfigError::Invalid("topic contains a wildcard"));
        }
        if self.username.is_none() && self.password.is_some() {
            return Err(ConfigError::Invalid("password set without username"));
        }
        if self.max_packet_size < 2 {
            return Err(ConfigError::Invalid("max_packet_size is below 2 bytes"));
        }
        Ok(())
    }

    /// The MQTT session options described by this config.
    pub fn options(&self) -> Options<'a> {
        Options {
            client_id: self.client_id,
            username: self.username,
            password: self.password,
            keep_alive_seconds: self.keep_alive_seconds,
            clean_session: self.clean_session,
            max_packet_size: self.max_packet_size,
        }
    }

    /// The CONNECT contents for this config.
    pub fn connect_request(&self) -> ConnectRequest<'a> {
        self.options().connect_request()
    }

    /// Read deadline for the handshake, `None` when disabled.
    pub fn read_timeout(&self) -> Option<Duration> {
        match self.read_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms.into())),
        }
    }

    /// Pause between publishes.
    pub fn publish_interval(&self) -> Duration {
        Duration::from_millis(self.publish_interval_ms.into())
    }
}
