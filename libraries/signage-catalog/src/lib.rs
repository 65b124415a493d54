//! Signage Studio - Media Catalog
//!
//! Folder-scoped, filterable view over the media library that never loads
//! the whole library at once.
//!
//! - Pages are fetched on demand as the visible window reaches them
//! - Navigation keeps the type filters, clears the search and remembers
//!   each folder's scroll offset
//! - A failed request keeps everything already on screen and can be retried
//!
//! # Example
//!
//! ```ignore
//! use signage_catalog::{CatalogIndex, CatalogSettings};
//!
//! let mut catalog = CatalogIndex::new(store, CatalogSettings::default());
//! catalog.load().await?;
//!
//! let update = catalog.on_scroll(4_000.0);
//! if !update.missing_pages.is_empty() {
//!     catalog.ensure_loaded().await?;
//! }
//! for (row, asset) in catalog.visible_rows() {
//!     // render `asset`, or a loading placeholder for `None`
//! }
//! ```

mod error;
mod index;
pub mod window;

pub use error::{CatalogError, Result};
pub use index::{usage_count, CatalogIndex, CatalogSettings, PageFetch, ScrollUpdate};
pub use window::{pages_for_range, visible_range};
