//! Per-follower notification jobs for new posts. The core's
//! responsibility ends at the dispatch boundary: jobs are published
//! fire-and-forget and an external worker delivers the email.

use std::sync::Arc;

use async_trait::async_trait;
use common::database::Ulid;

use crate::events::{Event, EventHandler};
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NewPostNotice {
    pub post_id: Ulid,
    pub content: String,
    pub page_owner_username: String,
    pub page_id: Ulid,
}

/// One queued delivery, addressed to a single follower.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NotificationJob {
    pub username: String,
    pub email: String,
    pub subject: String,
    pub body: String,
}

pub fn render_subject(username: &str) -> String {
    format!("Dear {username}!")
}

pub fn render_body(notice: &NewPostNotice) -> String {
    format!(
        "{owner} just published a new post!\n\n{content}\n\nRead it at /pages/{page}/posts/{post}/\n",
        owner = notice.page_owner_username,
        content = notice.content,
        page = notice.page_id,
        post = notice.post_id,
    )
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn dispatch(&self, job: &NotificationJob) -> anyhow::Result<()>;
}

/// Publishes jobs to a NATS subject consumed by the delivery worker.
pub struct NatsNotifier {
    client: async_nats::Client,
    subject: String,
}

impl NatsNotifier {
    pub fn new(client: async_nats::Client, subject: String) -> Self {
        Self { client, subject }
    }
}

#[async_trait]
impl Notifier for NatsNotifier {
    async fn dispatch(&self, job: &NotificationJob) -> anyhow::Result<()> {
        let payload = serde_json::to_vec(job)?;

        self.client
            .publish(self.subject.clone(), payload.into())
            .await?;

        Ok(())
    }
}

/// Fans a new post out to every follower of its page. Dispatch is
/// isolated per follower: one failed delivery is logged and the rest
/// still go out.
pub struct FollowerNotifier {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
}

impl FollowerNotifier {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }
}

#[async_trait]
impl EventHandler for FollowerNotifier {
    fn name(&self) -> &'static str {
        "follower-notifier"
    }

    async fn handle(&self, event: &Event) -> anyhow::Result<()> {
        let Event::PostCreated { post, page } = event else {
            return Ok(());
        };

        let owner = self
            .store
            .user_by_id(page.owner_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("page owner missing"))?;

        let notice = NewPostNotice {
            post_id: post.id,
            content: post.content.clone(),
            page_owner_username: owner.username,
            page_id: page.id,
        };

        for follower in self.store.followers_of(page.id).await? {
            let job = NotificationJob {
                subject: render_subject(&follower.username),
                body: render_body(&notice),
                username: follower.username,
                email: follower.email,
            };

            if let Err(err) = self.notifier.dispatch(&job).await {
                tracing::error!(recipient = %job.email, error = %err, "failed to dispatch notification");
            }
        }

        Ok(())
    }
}
