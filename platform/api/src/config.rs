use anyhow::Result;
use common::config::{DatabaseConfig, LoggingConfig, NatsConfig, RmqConfig};

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
/// The API is the backend for the Innotter service
pub struct AppConfig {
    /// The path to the config file
    pub config_file: Option<String>,

    /// Name of this instance
    pub name: String,

    /// The logging config
    pub logging: LoggingConfig,

    /// Database Config
    pub database: DatabaseConfig,

    /// Nats configuration
    pub nats: NatsConfig,

    /// Stats sink configuration
    pub stats: StatsConfig,

    /// Notification dispatch configuration
    pub notifications: NotificationsConfig,

    /// Maintenance sweep configuration
    pub maintenance: MaintenanceConfig,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// The RabbitMQ connection to use
    pub rmq: RmqConfig,

    /// The queue stats events are published to
    pub queue: String,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            rmq: RmqConfig::default(),
            queue: "stats".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// The NATS subject notification jobs are published to
    pub subject: String,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            subject: "innotter.notifications".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// Seconds between unblock sweeps
    pub interval_secs: u64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: Some("config".to_string()),
            name: "innotter-api".to_string(),
            logging: LoggingConfig::default(),
            database: DatabaseConfig::default(),
            nats: NatsConfig::default(),
            stats: StatsConfig::default(),
            notifications: NotificationsConfig::default(),
            maintenance: MaintenanceConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn parse() -> Result<Self> {
        let (mut config, config_file) =
            common::config::parse::<Self>(!cfg!(test), Self::default().config_file)?;

        config.config_file = config_file;

        Ok(config)
    }
}
