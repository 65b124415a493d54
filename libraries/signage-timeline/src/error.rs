//! Error types for timeline operations

use signage_core::{AssetId, PlaylistItemId};
use thiserror::Error;

/// Timeline errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    /// No item with this ID in the list
    #[error("Item not found: {0}")]
    ItemNotFound(PlaylistItemId),

    /// Position outside of the list
    #[error("Position {position} out of bounds (len {len})")]
    PositionOutOfBounds { position: usize, len: usize },

    /// Blank asset reference
    #[error("Invalid asset reference: {0:?}")]
    InvalidAsset(AssetId),

    /// The item's asset was deleted; the item can only be removed
    #[error("Item {0} references a deleted asset")]
    StaleReference(PlaylistItemId),

    /// Positions are not a contiguous 0-based permutation
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// Result type for timeline operations
pub type Result<T> = std::result::Result<T, TimelineError>;

impl From<TimelineError> for signage_core::Error {
    fn from(err: TimelineError) -> Self {
        match err {
            TimelineError::ItemNotFound(id) => Self::not_found("playlist item", id.as_str()),
            TimelineError::StaleReference(id) => Self::StaleReference(id.to_string()),
            TimelineError::InvariantViolation(msg) => Self::InvariantViolation(msg),
            other => Self::invalid_input(other.to_string()),
        }
    }
}
