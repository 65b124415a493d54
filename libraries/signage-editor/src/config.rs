/// Editor configuration
use crate::error::{EditorError, Result};
use serde::{Deserialize, Serialize};
use signage_catalog::CatalogSettings;
use signage_store_client::StoreConfig;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EditorConfig {
    #[serde(default = "default_store")]
    pub store: StoreSettings,

    #[serde(default = "default_editor")]
    pub editor: EditorSettings,

    #[serde(default = "default_catalog")]
    pub catalog: CatalogConfig,

    #[serde(default = "default_log")]
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreSettings {
    #[serde(default = "default_store_url")]
    pub url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EditorSettings {
    /// Duration writes to the same item inside this window reach the store once
    #[serde(default = "default_coalesce_window_ms")]
    pub coalesce_window_ms: u64,

    /// Pointer travel before a press becomes a drag
    #[serde(default = "default_drag_threshold_px")]
    pub drag_threshold_px: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default = "default_row_height")]
    pub row_height: f32,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogSettings {
    /// `tracing_subscriber::EnvFilter` directives; `RUST_LOG` wins when set
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl EditorConfig {
    /// Load configuration from an optional TOML file and the environment.
    ///
    /// Environment variables use the `SIGNAGE_` prefix and `__` between
    /// section and key, e.g. `SIGNAGE_STORE__API_KEY`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(EditorError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            settings = settings.add_source(config::File::from(path));
        }

        settings = settings.add_source(
            config::Environment::with_prefix("SIGNAGE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = self.store.url.trim();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(EditorError::Config(format!(
                "store.url must start with http:// or https:// (got {:?})",
                self.store.url
            )));
        }
        if self.store.request_timeout_ms == 0 {
            return Err(EditorError::Config(
                "store.request_timeout_ms must be positive".to_string(),
            ));
        }
        if self.catalog.page_size == 0 {
            return Err(EditorError::Config(
                "catalog.page_size must be positive".to_string(),
            ));
        }
        if !is_positive(self.catalog.row_height) || !is_positive(self.catalog.viewport_height) {
            return Err(EditorError::Config(
                "catalog.row_height and catalog.viewport_height must be positive".to_string(),
            ));
        }
        if self.editor.drag_threshold_px.is_nan() || self.editor.drag_threshold_px < 0.0 {
            return Err(EditorError::Config(
                "editor.drag_threshold_px cannot be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Connection settings for the REST store
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            url: self.store.url.clone(),
            api_key: self.store.api_key.clone(),
            request_timeout: Duration::from_millis(self.store.request_timeout_ms),
            connect_timeout: Duration::from_millis(self.store.connect_timeout_ms),
        }
    }
}

impl EditorSettings {
    pub fn coalesce_window(&self) -> Duration {
        Duration::from_millis(self.coalesce_window_ms)
    }
}

impl CatalogConfig {
    pub fn settings(&self) -> CatalogSettings {
        CatalogSettings {
            page_size: self.page_size,
            row_height: self.row_height,
            viewport_height: self.viewport_height,
        }
    }
}

fn is_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

// Default values
fn default_store() -> StoreSettings {
    StoreSettings {
        url: default_store_url(),
        api_key: None,
        request_timeout_ms: default_request_timeout_ms(),
        connect_timeout_ms: default_connect_timeout_ms(),
    }
}

fn default_store_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout_ms() -> u64 {
    15_000
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_editor() -> EditorSettings {
    EditorSettings {
        coalesce_window_ms: default_coalesce_window_ms(),
        drag_threshold_px: default_drag_threshold_px(),
    }
}

fn default_coalesce_window_ms() -> u64 {
    400
}

fn default_drag_threshold_px() -> f32 {
    signage_timeline::drag::DEFAULT_DRAG_THRESHOLD_PX
}

fn default_catalog() -> CatalogConfig {
    CatalogConfig {
        page_size: default_page_size(),
        row_height: default_row_height(),
        viewport_height: default_viewport_height(),
    }
}

fn default_page_size() -> usize {
    50
}

fn default_row_height() -> f32 {
    72.0
}

fn default_viewport_height() -> f32 {
    720.0
}

fn default_log() -> LogSettings {
    LogSettings {
        filter: default_log_filter(),
    }
}

fn default_log_filter() -> String {
    "signage=info,signage_editor=info".to_string()
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            store: default_store(),
            editor: default_editor(),
            catalog: default_catalog(),
            log: default_log(),
        }
    }
}
