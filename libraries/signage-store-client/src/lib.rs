//! Signage Studio Store Client
//!
//! Implementations of the `MediaStore` and `PlaylistStore` traits.
//!
//! # Features
//!
//! - **RemoteStore**: REST client for the CMS API (reqwest)
//! - **MemoryStore**: in-process store with failure and latency injection
//!
//! HTTP failures are classified once, when a [`ClientError`] is converted
//! into `signage_core::Error`:
//!
//! | Response | Core error |
//! |----------|------------|
//! | 404 | `NotFound` |
//! | 408, 504, client timeout, unreadable body | `Ambiguous` |
//! | 429, 5xx, connection failure | `Transient` |
//! | other 4xx | `Rejected` |
//! | 207 on a batch | `PartialBatch` |
//!
//! # Example
//!
//! ```ignore
//! use signage_core::PlaylistStore;
//! use signage_store_client::{RemoteStore, StoreConfig};
//!
//! let store = RemoteStore::new(StoreConfig::new("https://cms.example.com"))?;
//! let items = store.list_items(&"lobby".into()).await?;
//! println!("{} items", items.len());
//! ```

mod client;
mod error;
mod memory;
mod types;

pub use client::RemoteStore;
pub use error::{ClientError, Result};
pub use memory::{MemoryStore, StoreCall, StoreOp};
pub use types::{BatchResult, DurationRequest, InsertItemRequest, PositionBatchRequest, StoreConfig};
