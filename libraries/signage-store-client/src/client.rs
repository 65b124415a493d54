//! REST client for the signage store API.

use crate::error::{ClientError, Result};
use crate::types::{
    BatchResult, DurationRequest, InsertItemRequest, PositionBatchRequest, StoreConfig,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use signage_core::{
    AssetFilter, AssetId, AssetPage, Folder, FolderId, MediaAsset, MediaStore, PageRequest,
    Playlist, PlaylistId, PlaylistItem, PlaylistItemId, PlaylistStore, PositionUpdate,
};
use tracing::{debug, warn};
use url::Url;

/// Store backed by the CMS REST API.
///
/// Implements both [`MediaStore`] and [`PlaylistStore`]. Every write sends
/// only the fields it changes.
///
/// # Example
///
/// ```ignore
/// use signage_store_client::{RemoteStore, StoreConfig};
///
/// let store = RemoteStore::new(StoreConfig::with_api_key("https://cms.example.com", "key"))?;
/// let playlist = store.get_playlist(&"lobby".into()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct RemoteStore {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl RemoteStore {
    /// Create a new client with the given configuration.
    pub fn new(config: StoreConfig) -> Result<Self> {
        if config.url.trim().is_empty() {
            return Err(ClientError::InvalidUrl("URL cannot be empty".into()));
        }

        let mut base_url =
            Url::parse(config.url.trim()).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        if base_url.scheme() != "http" && base_url.scheme() != "https" {
            return Err(ClientError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(format!("SignageStudio/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key,
        })
    }

    /// Base URL all endpoints are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl("URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        entity: &'static str,
        id: &str,
    ) -> Result<T> {
        debug!(url = %url, "GET");
        let response = self.authorize(self.http.get(url)).send().await?;
        let response = check_status(response, entity, id).await?;
        parse_json(response, entity).await
    }

    async fn fetch_assets(
        &self,
        folder_id: Option<&FolderId>,
        filter: &AssetFilter,
        page: PageRequest,
    ) -> Result<AssetPage> {
        let mut query: Vec<(&str, String)> = vec![
            ("page", page.page.to_string()),
            ("page_size", page.page_size.to_string()),
        ];
        if let Some(folder) = folder_id {
            query.push(("folder_id", folder.to_string()));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query.push(("search", search.to_string()));
        }
        if let Some(kind) = filter.media_type {
            query.push(("type", kind.as_str().to_string()));
        }
        if filter.my_designs {
            query.push(("my_designs", "true".to_string()));
        }

        let url = self.endpoint(&["api", "media"])?;
        debug!(url = %url, page = page.page, folder = ?folder_id, "Listing assets");

        let response = self
            .authorize(self.http.get(url).query(&query))
            .send()
            .await?;
        let folder = folder_id.map(FolderId::as_str).unwrap_or("root");
        let response = check_status(response, "folder", folder).await?;
        let page: AssetPage = parse_json(response, "asset page").await?;

        debug!(
            items = page.items.len(),
            total = page.total_count,
            subfolders = page.subfolders.len(),
            "Fetched asset page"
        );
        Ok(page)
    }

    async fn create_item(
        &self,
        playlist_id: &PlaylistId,
        body: &InsertItemRequest,
    ) -> Result<PlaylistItem> {
        let url = self.endpoint(&["api", "playlists", playlist_id.as_str(), "items"])?;
        debug!(url = %url, asset = %body.asset_id, position = body.position, "Inserting item");

        let response = self
            .authorize(self.http.post(url).json(body))
            .send()
            .await?;
        let response = check_status(response, "playlist", playlist_id.as_str()).await?;
        parse_json(response, "playlist item").await
    }

    async fn remove_item(&self, item_id: &PlaylistItemId) -> Result<()> {
        let url = self.endpoint(&["api", "playlist-items", item_id.as_str()])?;
        debug!(url = %url, "Deleting item");

        let response = self.authorize(self.http.delete(url)).send().await?;
        check_status(response, "playlist item", item_id.as_str()).await?;
        Ok(())
    }

    async fn patch_positions(&self, updates: &[PositionUpdate]) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }
        let url = self.endpoint(&["api", "playlist-items", "positions"])?;
        debug!(url = %url, count = updates.len(), "Updating positions");

        let body = PositionBatchRequest {
            updates: updates.to_vec(),
        };
        let response = self
            .authorize(self.http.patch(url).json(&body))
            .send()
            .await?;

        if response.status() == StatusCode::MULTI_STATUS {
            let result: BatchResult = parse_json(response, "batch result").await?;
            warn!(
                applied = result.applied,
                failed = result.failed,
                "Position batch partly applied"
            );
            return Err(ClientError::PartialBatch {
                applied: result.applied,
                failed: result.failed,
            });
        }

        let first = updates
            .first()
            .map(|u| u.item_id.to_string())
            .unwrap_or_default();
        check_status(response, "playlist item", &first).await?;
        Ok(())
    }

    async fn patch_duration(&self, item_id: &PlaylistItemId, seconds: Option<u32>) -> Result<()> {
        let url = self.endpoint(&["api", "playlist-items", item_id.as_str(), "duration"])?;
        debug!(url = %url, seconds = ?seconds, "Updating duration");

        let body = DurationRequest {
            override_duration_seconds: seconds,
        };
        let response = self
            .authorize(self.http.patch(url).json(&body))
            .send()
            .await?;
        check_status(response, "playlist item", item_id.as_str()).await?;
        Ok(())
    }
}

/// Turn non-success statuses into errors; 404 carries the record it was about.
async fn check_status(response: Response, entity: &'static str, id: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound {
            entity,
            id: id.to_string(),
        });
    }
    let message = response.text().await.unwrap_or_default();
    Err(ClientError::ServerError {
        status: status.as_u16(),
        message,
    })
}

async fn parse_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    response
        .json()
        .await
        .map_err(|e| ClientError::ParseError(format!("Failed to parse {} response: {}", what, e)))
}

#[async_trait]
impl MediaStore for RemoteStore {
    async fn list_assets(
        &self,
        folder_id: Option<&FolderId>,
        filter: &AssetFilter,
        page: PageRequest,
    ) -> signage_core::Result<AssetPage> {
        Ok(self.fetch_assets(folder_id, filter, page).await?)
    }

    async fn get_asset(&self, id: &AssetId) -> signage_core::Result<MediaAsset> {
        let url = self.endpoint(&["api", "media", id.as_str()])?;
        Ok(self.get_json(url, "asset", id.as_str()).await?)
    }

    async fn get_folder(&self, id: &FolderId) -> signage_core::Result<Folder> {
        let url = self.endpoint(&["api", "folders", id.as_str()])?;
        Ok(self.get_json(url, "folder", id.as_str()).await?)
    }
}

#[async_trait]
impl PlaylistStore for RemoteStore {
    async fn get_playlist(&self, id: &PlaylistId) -> signage_core::Result<Playlist> {
        let url = self.endpoint(&["api", "playlists", id.as_str()])?;
        Ok(self.get_json(url, "playlist", id.as_str()).await?)
    }

    async fn list_items(&self, playlist_id: &PlaylistId) -> signage_core::Result<Vec<PlaylistItem>> {
        let url = self.endpoint(&["api", "playlists", playlist_id.as_str(), "items"])?;
        let mut items: Vec<PlaylistItem> = self
            .get_json(url, "playlist", playlist_id.as_str())
            .await?;
        items.sort_by_key(|i| i.position);
        Ok(items)
    }

    async fn insert_item(
        &self,
        playlist_id: &PlaylistId,
        asset_id: &AssetId,
        position: u32,
        override_duration_seconds: Option<u32>,
    ) -> signage_core::Result<PlaylistItem> {
        let body = InsertItemRequest {
            asset_id: asset_id.clone(),
            position,
            override_duration_seconds,
        };
        Ok(self.create_item(playlist_id, &body).await?)
    }

    async fn delete_item(&self, item_id: &PlaylistItemId) -> signage_core::Result<()> {
        Ok(self.remove_item(item_id).await?)
    }

    async fn update_item_positions(&self, updates: &[PositionUpdate]) -> signage_core::Result<()> {
        Ok(self.patch_positions(updates).await?)
    }

    async fn update_item_duration(
        &self,
        item_id: &PlaylistItemId,
        seconds: Option<u32>,
    ) -> signage_core::Result<()> {
        Ok(self.patch_duration(item_id, seconds).await?)
    }
}
