use std::str::FromStr;

use anyhow::Result;
use once_cell::sync::OnceCell;
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload::Handle;
use tracing_subscriber::{EnvFilter, Registry};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Default,
    Compact,
    Pretty,
    Json,
}

static RELOAD_HANDLE: OnceCell<Handle<EnvFilter, Registry>> = OnceCell::new();

/// Initializes the global tracing subscriber. Calling it again with a new
/// level reloads the filter without replacing the subscriber.
pub fn init(level: &str, mode: Mode) -> Result<()> {
    let reload = RELOAD_HANDLE.get_or_try_init(|| {
        let env_filter = EnvFilter::from_str(level)?;

        let (filter, handle) = tracing_subscriber::reload::Layer::new(env_filter);

        let registry = tracing_subscriber::registry().with(filter);

        let fmt = tracing_subscriber::fmt::layer()
            .with_file(true)
            .with_line_number(true);

        match mode {
            Mode::Default => registry.with(fmt).try_init()?,
            Mode::Compact => registry.with(fmt.compact()).try_init()?,
            Mode::Pretty => registry.with(fmt.pretty()).try_init()?,
            Mode::Json => registry.with(fmt.json()).try_init()?,
        }

        anyhow::Ok(handle)
    })?;

    reload.reload(EnvFilter::from_str(level)?)?;

    Ok(())
}
