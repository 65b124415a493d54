//! Error types for the store client.

use thiserror::Error;

/// Errors that can occur when talking to the signage store API.
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Record does not exist on the server
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Server returned an error response
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Server applied only part of a batched write
    #[error("Batch partly applied: {applied} applied, {failed} failed")]
    PartialBatch { applied: usize, failed: usize },

    /// Invalid base URL
    #[error("Invalid store URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse server response
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Result type for store client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

impl From<ClientError> for signage_core::Error {
    fn from(err: ClientError) -> Self {
        use signage_core::Error;

        match err {
            ClientError::Request(e) if e.is_timeout() => Error::Ambiguous(e.to_string()),
            ClientError::Request(e) => Error::Transient(e.to_string()),
            ClientError::NotFound { entity, id } => Error::not_found(entity, id),
            // Gateway timeouts may have reached the origin
            ClientError::ServerError { status, message } if status == 408 || status == 504 => {
                Error::Ambiguous(format!("{status}: {message}"))
            }
            ClientError::ServerError { status, message } if status == 429 || status >= 500 => {
                Error::Transient(format!("{status}: {message}"))
            }
            ClientError::ServerError { status, message } => {
                Error::Rejected(format!("{status}: {message}"))
            }
            ClientError::PartialBatch { applied, failed } => Error::PartialBatch { applied, failed },
            ClientError::InvalidUrl(msg) => Error::InvalidInput(msg),
            // The request went through but its result is unreadable
            ClientError::ParseError(msg) => Error::Ambiguous(msg),
        }
    }
}
