use std::path::Path;

use anyhow::Result;
use serde::de::DeserializeOwned;

use crate::logging;

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// The log level to use, this is a tracing env filter
    pub level: String,

    /// What logging mode we should use
    pub mode: logging::Mode,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            mode: logging::Mode::Default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// The database URL to use
    pub uri: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: "postgres://localhost:5432/innotter_dev".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct NatsConfig {
    /// The servers to use for connecting to Nats
    pub servers: Vec<String>,

    /// The username to use for authentication (user-pass auth)
    pub username: Option<String>,

    /// The password to use for authentication (user-pass auth)
    pub password: Option<String>,

    /// The token to use for authentication (token auth)
    pub token: Option<String>,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            servers: vec!["localhost:4222".into()],
            username: None,
            password: None,
            token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct RmqConfig {
    /// The AMQP URI to use for connecting to RabbitMQ
    pub uri: String,
}

impl Default for RmqConfig {
    fn default() -> Self {
        Self {
            uri: "amqp://localhost:5672/%2f".to_string(),
        }
    }
}

/// Parses an application config from an optional file layered with
/// `INNOTTER_`-prefixed environment variables. Returns the config and the
/// path of the file that was actually found, if any.
pub fn parse<C: DeserializeOwned>(
    enable_env: bool,
    config_file: Option<String>,
) -> Result<(C, Option<String>)> {
    let mut builder = config::Config::builder();

    let mut loaded_file = None;
    if let Some(file) = config_file {
        builder = builder.add_source(config::File::with_name(&file).required(false));

        loaded_file = [file.clone(), format!("{file}.toml")]
            .into_iter()
            .find(|f| Path::new(f).is_file());
    }

    if enable_env {
        builder = builder.add_source(config::Environment::with_prefix("INNOTTER").separator("__"));
    }

    let config = builder.build()?.try_deserialize()?;

    Ok((config, loaded_file))
}
