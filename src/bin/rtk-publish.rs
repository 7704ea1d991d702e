//! Publish the configured test message to the telemetry collector.
//!
//! ```bash
//! RTKLINK_PASSWORD=secret rtk-publish uplink.json
//! RUST_LOG=rtklink=trace rtk-publish
//! ```
//!
//! The config path is taken from the first argument or `RTKLINK_CONFIG`;
//! without either the device defaults are used. `RTKLINK_PASSWORD` overrides
//! the password from the file. A `.env` file in the working directory is
//! loaded first.

use std::env;
use std::fs;
use std::process::ExitCode;
use std::thread;

use rtklink::config::{Config, ConfigError};
use rtklink::network::application::mqtt::{self, Client};
use rtklink::network::error::Error as NetError;
use rtklink::network::tcp;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// The step of the publish sequence that failed.
#[derive(Debug, thiserror::Error)]
enum Failure {
    #[error("failed to read config `{path}`: {source}")]
    ReadConfig {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("resolve/connect failed: {0}")]
    Connect(#[source] NetError),
    #[error("handshake failed: {0}")]
    Handshake(#[source] mqtt::Error),
    #[error("publish #{index} failed: {source}")]
    Publish { index: u32, source: mqtt::Error },
    #[error("closing the connection failed: {0}")]
    Close(#[source] mqtt::Error),
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "uplink failed");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Failure> {
    let password = env::var("RTKLINK_PASSWORD").ok();
    let path = env::args().nth(1).or_else(|| env::var("RTKLINK_CONFIG").ok());
    let contents = match &path {
        Some(path) => fs::read(path).map_err(|source| Failure::ReadConfig {
            path: path.clone(),
            source,
        })?,
        None => Vec::new(),
    };

    let mut config = match path {
        Some(_) => Config::from_json(&contents)?,
        None => Config::default(),
    };
    if let Some(password) = password.as_deref() {
        config.password = Some(password);
    }
    config.validate()?;
    if config.password.is_none() {
        warn!("no password configured, set RTKLINK_PASSWORD");
    }

    info!(host = config.host, port = config.port, "connecting");
    let connection =
        tcp::connect(config.host, config.port, config.read_timeout()).map_err(Failure::Connect)?;
    let mut client = Client::connect(connection, &config.options()).map_err(Failure::Handshake)?;
    info!(client_id = config.client_id, "session accepted");

    for index in 1..=config.publish_count {
        if index > 1 {
            thread::sleep(config.publish_interval());
        }
        client
            .publish(config.topic, config.message.as_bytes())
            .map_err(|source| Failure::Publish { index, source })?;
        info!(index, topic = config.topic, "published");
    }

    if config.send_disconnect {
        client.disconnect().map_err(Failure::Close)?;
    } else {
        client.close().map_err(Failure::Close)?;
    }
    info!(count = config.publish_count, "done");
    Ok(())
}
