//! Periodic sweep clearing expired page blocks.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::global::GlobalState;
use crate::store::{Store, StoreError};

/// Unblocks every page whose `unblock_date` has passed, clearing the flag
/// and the date in one update per page. A failure on one page does not
/// stop the sweep. Returns how many pages were unblocked.
pub async fn unblock_due_pages(store: &dyn Store, now: DateTime<Utc>) -> Result<u64, StoreError> {
    let due = store.pages_due_unblock(now).await?;

    let mut unblocked = 0;
    for page in due {
        match store.unblock_page(page.id).await {
            Ok(true) => {
                tracing::info!(page = %page.id, owner = %page.owner_id, "page unblocked");
                unblocked += 1;
            }
            // Raced with a manual update, last write wins.
            Ok(false) => {}
            Err(err) => {
                tracing::error!(page = %page.id, error = %err, "failed to unblock page");
            }
        }
    }

    Ok(unblocked)
}

pub async fn run(global: Arc<GlobalState>) -> anyhow::Result<()> {
    let mut timer = tokio::time::interval(Duration::from_secs(
        global.config.maintenance.interval_secs,
    ));

    loop {
        tokio::select! {
            _ = global.ctx.done() => return Ok(()),
            _ = timer.tick() => {}
        }

        tracing::debug!("unblock sweep");

        if let Err(err) = unblock_due_pages(global.store.as_ref(), Utc::now()).await {
            tracing::error!(error = %err, "unblock sweep failed");
        }
    }
}
