//! Media library types
//!
//! Assets and folders are owned by the media catalog; playlists only hold
//! references to them.

use crate::types::{AssetId, FolderId};
use serde::{Deserialize, Serialize};

/// Kind of media asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Image,
    Video,
    Audio,
    Document,
    WebPage,
    App,
    Design,
}

impl MediaType {
    /// Convert to string for query parameters
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
            Self::WebPage => "web_page",
            Self::App => "app",
            Self::Design => "design",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            "document" => Some(Self::Document),
            "web_page" => Some(Self::WebPage),
            "app" => Some(Self::App),
            "design" => Some(Self::Design),
            _ => None,
        }
    }

    /// Whether assets of this kind carry an intrinsic running time
    pub fn is_timed(&self) -> bool {
        matches!(self, Self::Video | Self::Audio)
    }
}

/// Media asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub id: AssetId,
    pub name: String,
    pub media_type: MediaType,
    pub url: String,

    #[serde(default)]
    pub thumbnail_url: Option<String>,

    /// Intrinsic duration in seconds (audio/video)
    #[serde(default)]
    pub duration_seconds: Option<u32>,

    /// Containing folder (`None` = root)
    #[serde(default)]
    pub folder_id: Option<FolderId>,

    /// Created with the in-app designer ("my designs")
    #[serde(default)]
    pub is_design: bool,
}

impl MediaAsset {
    /// Create an asset with a generated ID
    pub fn new(name: impl Into<String>, media_type: MediaType, url: impl Into<String>) -> Self {
        Self {
            id: AssetId::generate(),
            name: name.into(),
            media_type,
            url: url.into(),
            thumbnail_url: None,
            duration_seconds: None,
            folder_id: None,
            is_design: media_type == MediaType::Design,
        }
    }
}

/// Media folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,

    /// Parent folder (`None` = root)
    #[serde(default)]
    pub parent_id: Option<FolderId>,

    /// Number of assets directly inside
    #[serde(default)]
    pub media_count: u64,
}

/// Catalog filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFilter {
    /// Free-text name search
    #[serde(default)]
    pub search: Option<String>,

    /// Restrict to one media type
    #[serde(default)]
    pub media_type: Option<MediaType>,

    /// Only assets created with the designer
    #[serde(default)]
    pub my_designs: bool,
}

impl AssetFilter {
    /// Whether an asset passes this filter
    pub fn matches(&self, asset: &MediaAsset) -> bool {
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            if !asset.name.to_lowercase().contains(&term.to_lowercase()) {
                return false;
            }
        }
        if let Some(kind) = self.media_type {
            if asset.media_type != kind {
                return false;
            }
        }
        !self.my_designs || asset.is_design
    }
}

/// Page request (zero-based page number)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl PageRequest {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self { page, page_size }
    }

    /// Index of the first row on this page
    pub fn offset(&self) -> usize {
        self.page * self.page_size
    }
}

/// One page of catalog results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPage {
    pub items: Vec<MediaAsset>,
    pub total_count: usize,
    /// Immediate child folders of the listed folder
    #[serde(default)]
    pub subfolders: Vec<Folder>,
}
