//! Types for the signage store API requests and responses.

use serde::{Deserialize, Serialize};
use signage_core::{AssetId, PositionUpdate};
use std::time::Duration;

/// Configuration for connecting to the store API.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the API (e.g., "https://cms.example.com")
    pub url: String,
    /// API key sent as a bearer token
    pub api_key: Option<String>,
    /// Whole-request timeout; expiry after send leaves the outcome unknown
    pub request_timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
}

impl StoreConfig {
    /// Create a new store config with just the URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            request_timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
        }
    }

    /// Create a config with an API key.
    pub fn with_api_key(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::new(url)
        }
    }
}

/// Request body for inserting a playlist item.
#[derive(Debug, Serialize, Deserialize)]
pub struct InsertItemRequest {
    pub asset_id: AssetId,
    pub position: u32,
    pub override_duration_seconds: Option<u32>,
}

/// Request body for a batched position update.
#[derive(Debug, Serialize, Deserialize)]
pub struct PositionBatchRequest {
    pub updates: Vec<PositionUpdate>,
}

/// Body of a 207 response to a batched write.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResult {
    pub applied: usize,
    pub failed: usize,
}

/// Request body for setting or clearing a duration override.
///
/// Only this field is sent; `null` clears the override.
#[derive(Debug, Serialize, Deserialize)]
pub struct DurationRequest {
    pub override_duration_seconds: Option<u32>,
}
