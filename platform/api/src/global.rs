use std::io;
use std::sync::Arc;
use std::time::Duration;

use common::context::Context;

use crate::config::AppConfig;
use crate::events::EventBus;
use crate::store::Store;

pub struct GlobalState {
    pub config: AppConfig,
    pub ctx: Context,
    pub store: Arc<dyn Store>,
    pub events: EventBus,
}

impl GlobalState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>, events: EventBus, ctx: Context) -> Self {
        Self {
            config,
            ctx,
            store,
            events,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SetupNatsError {
    #[error("failed to parse address: {0}")]
    AddressParse(io::Error),
    #[error("connect error: {0}")]
    ConnectError(#[from] async_nats::ConnectError),
}

pub async fn setup_nats(config: &AppConfig) -> Result<async_nats::Client, SetupNatsError> {
    let mut options = async_nats::ConnectOptions::new()
        .connection_timeout(Duration::from_secs(5))
        .name(&config.name)
        .retry_on_initial_connect();

    if let Some(user) = &config.nats.username {
        options = options.user_and_password(
            user.clone(),
            config.nats.password.clone().unwrap_or_default(),
        )
    } else if let Some(token) = &config.nats.token {
        options = options.token(token.clone())
    }

    let nats_addrs = config
        .nats
        .servers
        .iter()
        .map(|s| s.parse::<async_nats::ServerAddr>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(SetupNatsError::AddressParse)?;

    let nats = options.connect(nats_addrs).await?;

    tracing::info!("connected to nats");

    Ok(nats)
}
