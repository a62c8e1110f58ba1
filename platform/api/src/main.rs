use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use common::{context::Context, logging, signal};
use innotter_api::{config::AppConfig, events, global, maintenance, notifications, pages, stats, store};
use sqlx::postgres::PgConnectOptions;
use sqlx::ConnectOptions;
use tokio::{select, signal::unix::SignalKind, time};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::parse()?;

    logging::init(&config.logging.level, config.logging.mode)?;

    if let Some(file) = &config.config_file {
        tracing::info!(file = file, "loaded config from file");
    }

    tracing::debug!("config: {:#?}", config);

    let db = Arc::new(
        sqlx::PgPool::connect_with(
            PgConnectOptions::from_str(&config.database.uri)?
                .disable_statement_logging()
                .to_owned(),
        )
        .await?,
    );

    let (ctx, handler) = Context::new();

    let nats = global::setup_nats(&config).await?;

    let stats_sink = Arc::new(
        stats::RmqStatsSink::connect(&config.stats.rmq.uri, &config.stats.queue).await?,
    );
    let notifier = Arc::new(notifications::NatsNotifier::new(
        nats,
        config.notifications.subject.clone(),
    ));

    let store: Arc<dyn store::Store> = Arc::new(store::PgStore::new(db));

    let events = events::EventBus::new()
        .with_handler(Arc::new(pages::PageBlockCascade::new(store.clone())))
        .with_handler(Arc::new(notifications::FollowerNotifier::new(
            store.clone(),
            notifier,
        )))
        .with_handler(Arc::new(stats::StatsRelay::new(store.clone(), stats_sink)));

    let global = Arc::new(global::GlobalState::new(config, store, events, ctx));

    let maintenance_future = tokio::spawn(maintenance::run(global.clone()));

    // Listen on both sigint and sigterm and cancel the context when either is received
    let mut signal_handler = signal::SignalHandler::new()
        .with_signal(SignalKind::interrupt())
        .with_signal(SignalKind::terminate());

    select! {
        r = maintenance_future => tracing::error!("maintenance stopped unexpectedly: {:?}", r),
        _ = signal_handler.recv() => tracing::info!("shutting down"),
    }

    // We cannot have a context in scope when we cancel the handler, otherwise it will deadlock.
    drop(global);

    tracing::info!("waiting for tasks to finish");

    select! {
        _ = time::sleep(Duration::from_secs(60)) => tracing::warn!("force shutting down"),
        _ = signal_handler.recv() => tracing::warn!("force shutting down"),
        _ = handler.cancel() => tracing::info!("shutting down"),
    }

    Ok(())
}
