//! Reactions to committed mutations. Each core operation emits its events
//! explicitly after the state change has been applied; handlers run
//! best-effort and a failing handler never affects the triggering
//! operation or its sibling handlers.

use std::sync::Arc;

use async_trait::async_trait;

use crate::database::{Page, Post, User};

#[derive(Debug, Clone)]
pub enum Event {
    UserSaved { user: User },
    PageCreated { page: Page },
    PostCreated { post: Post, page: Page },
    LikesChanged { page: Page },
    FollowersChanged { page: Page },
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &Event) -> anyhow::Result<()>;
}

#[derive(Default)]
pub struct EventBus {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Runs every registered handler against the event. Handler failures
    /// are logged and swallowed.
    pub async fn emit(&self, event: Event) {
        for handler in &self.handlers {
            if let Err(err) = handler.handle(&event).await {
                tracing::error!(handler = handler.name(), error = %err, "event handler failed");
            }
        }
    }
}
