use std::borrow::Cow;

use crate::store::StoreError;

/// Client-visible outcomes of a core operation. Denials, missing entities
/// and invalid transitions are ordinary return values; only the `Store`
/// variant indicates a system fault.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0} does not exist")]
    NotFound(&'static str),
    #[error("{0}")]
    Invalid(Cow<'static, str>),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl Error {
    pub fn invalid(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Invalid(message.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
