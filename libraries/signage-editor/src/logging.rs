//! Tracing setup for hosts embedding the editor

use crate::error::{EditorError, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter: `RUST_LOG` when set, otherwise `default_directives`
pub fn filter(default_directives: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_directives)
            .map_err(|e| EditorError::Logging(format!("{default_directives:?}: {e}"))),
    }
}

/// Install the global subscriber (fmt layer + filter). Fails if one is
/// already installed.
pub fn init(default_directives: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(filter(default_directives)?)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .map_err(|e| EditorError::Logging(e.to_string()))
}
