/// Catalog error types
use thiserror::Error;

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// A failed catalog request; the previously loaded view stays intact
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Failed to load page {page}: {source}")]
    Page {
        page: usize,
        #[source]
        source: signage_core::Error,
    },

    #[error("Failed to open folder: {0}")]
    Navigate(#[source] signage_core::Error),

    #[error("Failed to apply filter: {0}")]
    Filter(#[source] signage_core::Error),

    #[error("Nothing to retry")]
    NothingToRetry,
}

impl CatalogError {
    /// Underlying store error, if any
    pub fn store_error(&self) -> Option<&signage_core::Error> {
        match self {
            Self::Page { source, .. } | Self::Navigate(source) | Self::Filter(source) => {
                Some(source)
            }
            Self::NothingToRetry => None,
        }
    }
}
