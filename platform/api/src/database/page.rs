use chrono::{DateTime, Utc};
use common::database::Ulid;

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct Page {
    /// The unique identifier for the page.
    pub id: Ulid,
    /// Public immutable handle for the page, distinct from the row id.
    pub uuid: uuid::Uuid,
    /// The name of the page.
    pub name: String,
    /// The description of the page.
    pub description: String,
    /// The user that owns the page.
    pub owner_id: Ulid,
    /// Storage path of the page image, if one has been uploaded.
    pub image_path: Option<String>,
    /// Whether following this page requires owner approval.
    pub is_private: bool,
    /// Whether the page is blocked. Set by an authority, or mirrored from
    /// the owner's blocked state.
    pub is_blocked: bool,
    /// When an authority-set block expires. Owner-driven blocks carry no
    /// expiry and keep this unset.
    pub unblock_date: Option<DateTime<Utc>>,
}

impl Page {
    /// Validates a page name.
    pub fn validate_name(name: &str) -> Result<(), &'static str> {
        if name.is_empty() {
            return Err("Page name must not be empty");
        }

        if name.len() > 80 {
            return Err("Page name must be at most 80 characters long");
        }

        Ok(())
    }
}
