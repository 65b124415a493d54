mod ids;
mod media;
mod playlist;

pub use ids::{AssetId, FolderId, PlaylistId, PlaylistItemId};
pub use media::{AssetFilter, AssetPage, Folder, MediaAsset, MediaType, PageRequest};
pub use playlist::{Playlist, PlaylistItem, Transition};
