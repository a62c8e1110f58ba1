//! Aggregate counters pushed to the external stats service whenever
//! engagement changes. Delivery is fire-and-forget; the triggering
//! mutation never waits on an acknowledgment.

use std::sync::Arc;

use async_trait::async_trait;
use common::database::Ulid;
use lapin::options::{BasicPublishOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::BasicProperties;

use crate::events::{Event, EventHandler};
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatsEvent {
    PageRegistered {
        owner_id: Ulid,
        page_id: Ulid,
        posts: i64,
        followers: i64,
        likes: i64,
    },
    PostCount {
        owner_id: Ulid,
        page_id: Ulid,
        posts: i64,
    },
    LikeCount {
        owner_id: Ulid,
        page_id: Ulid,
        likes: i64,
    },
    FollowerCount {
        owner_id: Ulid,
        page_id: Ulid,
        followers: i64,
    },
}

#[async_trait]
pub trait StatsSink: Send + Sync {
    async fn send(&self, event: &StatsEvent) -> anyhow::Result<()>;
}

/// Publishes stats events as JSON onto a RabbitMQ work queue.
pub struct RmqStatsSink {
    // Held so the channel's connection outlives the sink.
    _connection: lapin::Connection,
    channel: lapin::Channel,
    queue: String,
}

impl RmqStatsSink {
    pub async fn connect(uri: &str, queue: &str) -> anyhow::Result<Self> {
        let connection =
            lapin::Connection::connect(uri, lapin::ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;

        channel
            .queue_declare(queue, QueueDeclareOptions::default(), FieldTable::default())
            .await?;

        tracing::info!(queue = queue, "connected to rabbitmq");

        Ok(Self {
            _connection: connection,
            channel,
            queue: queue.to_string(),
        })
    }
}

#[async_trait]
impl StatsSink for RmqStatsSink {
    async fn send(&self, event: &StatsEvent) -> anyhow::Result<()> {
        let payload = serde_json::to_vec(event)?;

        self.channel
            .basic_publish(
                "",
                &self.queue,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default(),
            )
            .await?
            .await?;

        Ok(())
    }
}

/// Recomputes the affected aggregate and forwards it to the sink.
pub struct StatsRelay {
    store: Arc<dyn Store>,
    sink: Arc<dyn StatsSink>,
}

impl StatsRelay {
    pub fn new(store: Arc<dyn Store>, sink: Arc<dyn StatsSink>) -> Self {
        Self { store, sink }
    }
}

#[async_trait]
impl EventHandler for StatsRelay {
    fn name(&self) -> &'static str {
        "stats-relay"
    }

    async fn handle(&self, event: &Event) -> anyhow::Result<()> {
        let stats = match event {
            Event::PageCreated { page } => StatsEvent::PageRegistered {
                owner_id: page.owner_id,
                page_id: page.id,
                posts: 0,
                followers: 0,
                likes: 0,
            },
            Event::PostCreated { page, .. } => StatsEvent::PostCount {
                owner_id: page.owner_id,
                page_id: page.id,
                posts: self.store.post_count(page.id).await?,
            },
            Event::LikesChanged { page } => StatsEvent::LikeCount {
                owner_id: page.owner_id,
                page_id: page.id,
                likes: self.store.like_count_for_page(page.id).await?,
            },
            Event::FollowersChanged { page } => StatsEvent::FollowerCount {
                owner_id: page.owner_id,
                page_id: page.id,
                followers: self.store.follower_count(page.id).await?,
            },
            Event::UserSaved { .. } => return Ok(()),
        };

        self.sink.send(&stats).await
    }
}
