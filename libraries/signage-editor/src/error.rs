/// Editor error types
use thiserror::Error;

/// Result type alias for editor operations
pub type Result<T> = std::result::Result<T, EditorError>;

/// Errors surfaced by the playlist editor
#[derive(Error, Debug)]
pub enum EditorError {
    /// Store call failed
    #[error(transparent)]
    Store(#[from] signage_core::Error),

    /// Local edit refused (unknown item, stale asset, ...)
    #[error(transparent)]
    Timeline(#[from] signage_timeline::TimelineError),

    /// Catalog request failed; the catalog keeps its previous view
    #[error(transparent)]
    Catalog(#[from] signage_catalog::CatalogError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    /// The persistence worker is gone (editor closed)
    #[error("Editor is closed")]
    Closed,

    /// A fetch was abandoned because the editor is being left
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<config::ConfigError> for EditorError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
