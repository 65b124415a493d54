//! Media catalog index
//!
//! A folder-scoped, filtered, paginated view over the media store. Pages are
//! fetched lazily as the visible window reaches them; everything already
//! loaded stays visible when a request fails.
//!
//! ```text
//! root / Menus / Breakfast        <- breadcrumb (walked via parent_id)
//! +-------------------------+
//! | page 0 (loaded)         |
//! | page 1 (loaded)  <----- | visible window -> pages 1..=2
//! | page 2 (missing) <----- |   fetch page 2 only
//! | page 3 (missing)        |
//! +-------------------------+
//! ```

use crate::error::{CatalogError, Result};
use crate::window::{pages_for_range, visible_range};
use signage_core::{
    AssetFilter, AssetId, AssetPage, Folder, FolderId, MediaAsset, MediaStore, MediaType,
    PageRequest, PlaylistItem,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Range;
use std::sync::Arc;

/// Catalog geometry and paging
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogSettings {
    pub page_size: usize,
    pub row_height: f32,
    pub viewport_height: f32,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            page_size: 50,
            row_height: 72.0,
            viewport_height: 720.0,
        }
    }
}

/// Result of a scroll event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollUpdate {
    /// Rows to render
    pub range: Range<usize>,
    /// Pages in that range that still need fetching
    pub missing_pages: Vec<usize>,
}

/// A page request bound to the view it was issued for.
///
/// The fetch itself needs no access to the index, so hosts can run it
/// elsewhere and hand the result back through [`CatalogIndex::apply_page`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFetch {
    pub generation: u64,
    pub folder: Option<FolderId>,
    pub filter: AssetFilter,
    pub request: PageRequest,
}

impl PageFetch {
    pub async fn run(&self, store: &dyn MediaStore) -> signage_core::Result<AssetPage> {
        store
            .list_assets(self.folder.as_ref(), &self.filter, self.request)
            .await
    }
}

/// What `retry` re-runs
#[derive(Debug, Clone, PartialEq, Eq)]
enum FailedRequest {
    Navigate(Option<FolderId>),
    Filter(AssetFilter),
    Page(usize),
}

/// Paginated, folder-scoped catalog view
pub struct CatalogIndex {
    store: Arc<dyn MediaStore>,
    settings: CatalogSettings,

    folder: Option<FolderId>,
    breadcrumb: Vec<Folder>,
    filter: AssetFilter,

    pages: BTreeMap<usize, Vec<MediaAsset>>,
    total_count: usize,
    subfolders: Vec<Folder>,

    /// Folders seen so far, for breadcrumb walks
    folder_cache: HashMap<FolderId, Folder>,
    /// Scroll offset to restore when returning to a folder
    saved_offsets: HashMap<Option<FolderId>, f32>,
    scroll_offset: f32,

    /// Bumped whenever the view is reset; older page results are dropped
    generation: u64,

    last_error: Option<CatalogError>,
    failed: Option<FailedRequest>,
}

impl std::fmt::Debug for CatalogIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogIndex")
            .field("folder", &self.folder)
            .field("filter", &self.filter)
            .field("loaded_pages", &self.pages.keys().collect::<Vec<_>>())
            .field("total_count", &self.total_count)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl CatalogIndex {
    /// Create an index scoped to the root folder; call [`CatalogIndex::load`]
    /// to fetch the first page
    pub fn new(store: Arc<dyn MediaStore>, settings: CatalogSettings) -> Self {
        Self {
            store,
            settings: CatalogSettings {
                page_size: settings.page_size.max(1),
                ..settings
            },
            folder: None,
            breadcrumb: Vec::new(),
            filter: AssetFilter::default(),
            pages: BTreeMap::new(),
            total_count: 0,
            subfolders: Vec::new(),
            folder_cache: HashMap::new(),
            saved_offsets: HashMap::new(),
            scroll_offset: 0.0,
            generation: 0,
            last_error: None,
            failed: None,
        }
    }

    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    /// Current folder (`None` = root)
    pub fn folder(&self) -> Option<&FolderId> {
        self.folder.as_ref()
    }

    /// Folders from the root down to the current one (root itself excluded)
    pub fn breadcrumb(&self) -> &[Folder] {
        &self.breadcrumb
    }

    pub fn filter(&self) -> &AssetFilter {
        &self.filter
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    /// Immediate child folders of the current folder
    pub fn subfolders(&self) -> &[Folder] {
        &self.subfolders
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_page_loaded(&self, page: usize) -> bool {
        self.pages.contains_key(&page)
    }

    pub fn loaded_pages(&self) -> Vec<usize> {
        self.pages.keys().copied().collect()
    }

    /// Last failed request, shown as a dismissible notice
    pub fn last_error(&self) -> Option<&CatalogError> {
        self.last_error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
        self.failed = None;
    }

    /// Asset at a global row index, if its page is loaded
    pub fn asset_at(&self, index: usize) -> Option<&MediaAsset> {
        if index >= self.total_count {
            return None;
        }
        let page_size = self.settings.page_size;
        self.pages
            .get(&(index / page_size))
            .and_then(|page| page.get(index % page_size))
    }

    /// Look an asset up among the loaded pages
    pub fn find_asset(&self, id: &AssetId) -> Option<&MediaAsset> {
        self.pages.values().flatten().find(|asset| &asset.id == id)
    }

    /// Rows to render right now; `None` marks a row whose page is still loading
    pub fn visible_rows(&self) -> Vec<(usize, Option<&MediaAsset>)> {
        self.visible_range()
            .map(|index| (index, self.asset_at(index)))
            .collect()
    }

    pub fn visible_range(&self) -> Range<usize> {
        visible_range(
            self.scroll_offset,
            self.settings.row_height,
            self.settings.viewport_height,
            self.total_count,
        )
    }

    /// Pages the visible window needs that are not loaded yet
    pub fn missing_pages(&self) -> Vec<usize> {
        pages_for_range(&self.visible_range(), self.settings.page_size)
            .into_iter()
            .filter(|page| !self.pages.contains_key(page))
            .collect()
    }

    /// Scroll event: recompute the window. Never fetches by itself.
    pub fn on_scroll(&mut self, offset: f32) -> ScrollUpdate {
        self.scroll_offset = if offset.is_finite() {
            offset.max(0.0)
        } else {
            0.0
        };
        ScrollUpdate {
            range: self.visible_range(),
            missing_pages: self.missing_pages(),
        }
    }

    /// Resize the viewport (window resize)
    pub fn set_viewport_height(&mut self, height: f32) -> ScrollUpdate {
        self.settings.viewport_height = height.max(0.0);
        self.on_scroll(self.scroll_offset)
    }

    /// Initial load of the current view
    pub async fn load(&mut self) -> Result<()> {
        self.refilter(self.filter.clone()).await
    }

    /// Enter a folder (`None` = root).
    ///
    /// Clears the search term but keeps the type and "my designs" filters.
    /// The offset of the folder being left is saved and the destination's
    /// saved offset restored. On failure nothing changes.
    pub async fn navigate(&mut self, folder: Option<FolderId>) -> Result<()> {
        let filter = AssetFilter {
            search: None,
            ..self.filter.clone()
        };

        let first = match self.fetch(folder.as_ref(), &filter, 0).await {
            Ok(page) => page,
            Err(err) => {
                return Err(self.fail(FailedRequest::Navigate(folder), CatalogError::Navigate(err)))
            }
        };
        self.remember_folders(&first.subfolders);

        let breadcrumb = match self.breadcrumb_for(folder.as_ref()).await {
            Ok(breadcrumb) => breadcrumb,
            Err(err) => {
                return Err(self.fail(FailedRequest::Navigate(folder), CatalogError::Navigate(err)))
            }
        };

        self.saved_offsets
            .insert(self.folder.clone(), self.scroll_offset);
        self.scroll_offset = self.saved_offsets.get(&folder).copied().unwrap_or(0.0);

        tracing::debug!(
            folder = ?folder,
            depth = breadcrumb.len(),
            total = first.total_count,
            "Catalog folder opened"
        );

        self.folder = folder;
        self.breadcrumb = breadcrumb;
        self.filter = filter;
        self.reset_with(first);

        // The restored offset may point past page 0
        self.ensure_loaded().await
    }

    /// Set or clear the free-text search
    pub async fn set_search(&mut self, term: Option<String>) -> Result<()> {
        let term = term
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let filter = AssetFilter {
            search: term,
            ..self.filter.clone()
        };
        self.refilter(filter).await
    }

    pub async fn set_media_type(&mut self, media_type: Option<MediaType>) -> Result<()> {
        let filter = AssetFilter {
            media_type,
            ..self.filter.clone()
        };
        self.refilter(filter).await
    }

    pub async fn set_my_designs(&mut self, my_designs: bool) -> Result<()> {
        let filter = AssetFilter {
            my_designs,
            ..self.filter.clone()
        };
        self.refilter(filter).await
    }

    /// Fetch every page the visible window needs
    pub async fn ensure_loaded(&mut self) -> Result<()> {
        for page in self.missing_pages() {
            let fetch = self.plan_page(page);
            let result = fetch.run(self.store.as_ref()).await;
            self.apply_page(fetch, result)?;
        }
        Ok(())
    }

    /// Describe the fetch of `page` for the current view
    pub fn plan_page(&self, page: usize) -> PageFetch {
        PageFetch {
            generation: self.generation,
            folder: self.folder.clone(),
            filter: self.filter.clone(),
            request: PageRequest::new(page, self.settings.page_size),
        }
    }

    /// Store the result of a planned fetch.
    ///
    /// Returns `Ok(false)` for a result issued before the view was last reset;
    /// it is dropped without touching anything.
    pub fn apply_page(
        &mut self,
        fetch: PageFetch,
        result: signage_core::Result<AssetPage>,
    ) -> Result<bool> {
        if fetch.generation != self.generation {
            tracing::trace!(
                page = fetch.request.page,
                issued = fetch.generation,
                current = self.generation,
                "Dropping stale catalog page"
            );
            return Ok(false);
        }

        let page = fetch.request.page;
        match result {
            Ok(loaded) => {
                self.total_count = loaded.total_count;
                self.remember_folders(&loaded.subfolders);
                self.subfolders = loaded.subfolders;
                self.pages.insert(page, loaded.items);
                if matches!(self.failed, Some(FailedRequest::Page(p)) if p == page) {
                    self.last_error = None;
                    self.failed = None;
                }
                Ok(true)
            }
            Err(source) => Err(self.fail(
                FailedRequest::Page(page),
                CatalogError::Page { page, source },
            )),
        }
    }

    /// Re-run the request that last failed
    pub async fn retry(&mut self) -> Result<()> {
        let Some(failed) = self.failed.clone() else {
            return Err(CatalogError::NothingToRetry);
        };
        tracing::debug!(request = ?failed, "Retrying catalog request");

        match failed {
            FailedRequest::Navigate(folder) => self.navigate(folder).await,
            FailedRequest::Filter(filter) => self.refilter(filter).await,
            FailedRequest::Page(page) => {
                let fetch = self.plan_page(page);
                let result = fetch.run(self.store.as_ref()).await;
                self.apply_page(fetch, result).map(|_| ())
            }
        }
    }

    async fn refilter(&mut self, filter: AssetFilter) -> Result<()> {
        let first = match self.fetch(self.folder.as_ref(), &filter, 0).await {
            Ok(page) => page,
            Err(err) => return Err(self.fail(FailedRequest::Filter(filter), CatalogError::Filter(err))),
        };
        self.remember_folders(&first.subfolders);
        self.filter = filter;
        self.scroll_offset = 0.0;
        self.reset_with(first);
        Ok(())
    }

    async fn fetch(
        &self,
        folder: Option<&FolderId>,
        filter: &AssetFilter,
        page: usize,
    ) -> signage_core::Result<AssetPage> {
        self.store
            .list_assets(folder, filter, PageRequest::new(page, self.settings.page_size))
            .await
    }

    /// Drop every loaded page and start over from `first` (page 0)
    fn reset_with(&mut self, first: AssetPage) {
        self.generation += 1;
        self.pages.clear();
        self.total_count = first.total_count;
        self.subfolders = first.subfolders;
        self.pages.insert(0, first.items);
        self.last_error = None;
        self.failed = None;
    }

    fn fail(&mut self, request: FailedRequest, error: CatalogError) -> CatalogError {
        tracing::warn!(request = ?request, error = %error, "Catalog request failed");
        self.failed = Some(request);
        self.last_error = Some(error.clone());
        error
    }

    fn remember_folders(&mut self, folders: &[Folder]) {
        for folder in folders {
            self.folder_cache.insert(folder.id.clone(), folder.clone());
        }
    }

    /// Walk `parent_id` from `folder` up to the root
    async fn breadcrumb_for(
        &mut self,
        folder: Option<&FolderId>,
    ) -> signage_core::Result<Vec<Folder>> {
        let mut path = Vec::new();
        let mut seen = HashSet::new();
        let mut next = folder.cloned();

        while let Some(id) = next {
            if !seen.insert(id.clone()) {
                tracing::warn!(folder = %id, "Folder cycle in breadcrumb, stopping");
                break;
            }
            let current = match self.folder_cache.get(&id) {
                Some(cached) => cached.clone(),
                None => {
                    let fetched = self.store.get_folder(&id).await?;
                    self.folder_cache.insert(id, fetched.clone());
                    fetched
                }
            };
            next = current.parent_id.clone();
            path.push(current);
        }

        path.reverse();
        Ok(path)
    }
}

/// How many playlist items reference `asset_id` (display annotation only)
pub fn usage_count(asset_id: &AssetId, items: &[PlaylistItem]) -> usize {
    items.iter().filter(|i| &i.asset_id == asset_id).count()
}
