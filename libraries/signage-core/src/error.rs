/// Core error types for the playlist editor
use thiserror::Error;

/// Result type alias using the core `Error`
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type shared by the editor crates and store implementations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Entity not found (stale reference, deleted elsewhere)
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Network or store hiccup; the request did not take effect
    #[error("Transient store error: {0}")]
    Transient(String),

    /// The store rejected the request outright (validation, permission)
    #[error("Rejected by store: {0}")]
    Rejected(String),

    /// The outcome of the request is unknown (timeout after send)
    #[error("Ambiguous outcome: {0}")]
    Ambiguous(String),

    /// A batched write was only partly applied
    #[error("Partial batch: {applied} applied, {failed} failed")]
    PartialBatch { applied: usize, failed: usize },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Item references an asset that no longer exists
    #[error("Item {0} references a missing asset")]
    StaleReference(String),

    /// Computed positions failed the contiguity/uniqueness check
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// The operation was abandoned (editor closed, navigation)
    #[error("Operation cancelled")]
    Cancelled,

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a transient error
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    /// Create a rejection error
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// True for stale references: remove from the local view, do not retry
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True when retrying later may succeed and nothing was applied
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// True when local state can no longer be trusted and must be re-fetched
    pub fn requires_resync(&self) -> bool {
        matches!(
            self,
            Self::Ambiguous(_) | Self::PartialBatch { .. } | Self::InvariantViolation(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
