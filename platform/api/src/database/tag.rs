use common::database::Ulid;

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct Tag {
    /// The unique identifier for the tag.
    pub id: Ulid,
    /// The name of the tag. Unique; tags are created lazily by name.
    pub name: String,
}

impl Tag {
    /// Validates a tag name.
    pub fn validate_name(name: &str) -> Result<(), &'static str> {
        if name.is_empty() {
            return Err("Tag name must not be empty");
        }

        if name.len() > 30 {
            return Err("Tag name must be at most 30 characters long");
        }

        Ok(())
    }
}
