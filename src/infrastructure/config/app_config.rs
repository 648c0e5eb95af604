//! Application configuration.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::errors::ConfigurationError;

const APP_NAME: &str = "avatar-picker";
const APP_QUALIFIER: &str = "com";
const APP_ORGANIZATION: &str = "kalibrado";

const IMAGES_BASE_URL: &str =
    "https://raw.githubusercontent.com/kalibrado/js-avatars-images/refs/heads/main";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Catalog sources and cache.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Image loading.
    #[serde(default)]
    pub loading: LoadingConfig,

    /// Grid geometry used to place slots.
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Media server the avatar is uploaded to.
    #[serde(default)]
    pub server: ServerConfig,

    /// Translations.
    #[serde(default)]
    pub i18n: I18nConfig,

    /// Generated avatars shown when nothing matches.
    #[serde(default)]
    pub placeholders: PlaceholderConfig,
}

/// Catalog configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// URL of the image metadata array.
    #[serde(default = "default_images_url")]
    pub images_url: String,

    /// URL of the category name array.
    #[serde(default = "default_categories_url")]
    pub categories_url: String,

    /// Catalog cache lifetime in hours.
    #[serde(default = "default_cache_max_age_hours")]
    pub cache_max_age_hours: i64,

    /// Prefix of every key written to the key-value store.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Category label meaning "every category", used when no translation provides one.
    #[serde(default = "default_all_label")]
    pub all_label: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            images_url: default_images_url(),
            categories_url: default_categories_url(),
            cache_max_age_hours: default_cache_max_age_hours(),
            key_prefix: default_key_prefix(),
            all_label: default_all_label(),
        }
    }
}

/// Image loading configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadingConfig {
    /// Maximum number of images loading at once.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Load images nearest the viewport center first.
    #[serde(default = "default_true")]
    pub prioritize_viewport: bool,

    /// Priority of every load when `prioritize_viewport` is off.
    #[serde(default = "default_static_priority")]
    pub static_priority: i64,

    /// Number of leading images loaded right after rendering.
    #[serde(default = "default_preload_count")]
    pub preload_count: usize,

    /// Delay between preloads in milliseconds.
    #[serde(default = "default_preload_stagger_ms")]
    pub preload_stagger_ms: u64,

    /// Capacity of the in-memory image cache.
    #[serde(default = "default_memory_cache_size")]
    pub memory_cache_size: usize,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            prioritize_viewport: true,
            static_priority: default_static_priority(),
            preload_count: default_preload_count(),
            preload_stagger_ms: default_preload_stagger_ms(),
            memory_cache_size: default_memory_cache_size(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Grid layout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Slots per row.
    #[serde(default = "default_columns")]
    pub columns: usize,

    /// Row height in pixels, gap included.
    #[serde(default = "default_row_height")]
    pub row_height: f64,

    /// Visible height of the grid in pixels.
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            columns: default_columns(),
            row_height: default_row_height(),
            viewport_height: default_viewport_height(),
        }
    }
}

/// Media server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server origin, e.g. `http://localhost:8096`.
    #[serde(default = "default_server_url")]
    pub base_url: String,

    /// Client name sent in the authorization header.
    #[serde(default = "default_client_name")]
    pub client_name: String,

    /// Device name sent in the authorization header.
    #[serde(default = "default_device_name")]
    pub device_name: String,

    /// Client version sent in the authorization header.
    #[serde(default = "default_client_version")]
    pub client_version: String,

    /// Key-value store key holding the credentials blob.
    #[serde(default = "default_credentials_key")]
    pub credentials_key: String,

    /// Prefix of the key-value store keys holding the device id.
    #[serde(default = "default_device_key_prefix")]
    pub device_key_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_server_url(),
            client_name: default_client_name(),
            device_name: default_device_name(),
            client_version: default_client_version(),
            credentials_key: default_credentials_key(),
            device_key_prefix: default_device_key_prefix(),
        }
    }
}

/// Translation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct I18nConfig {
    /// Preferred language. Falls back to `$LANG` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Language tried when the preferred one is unavailable.
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Base URL of locally served language files.
    /// Defaults to the plugin path on the media server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_base: Option<String>,

    /// Base URL of the published language files.
    #[serde(default = "default_fallback_base")]
    pub fallback_base: String,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            language: None,
            default_language: default_language(),
            local_base: None,
            fallback_base: default_fallback_base(),
        }
    }
}

/// Placeholder avatar configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceholderConfig {
    /// Show generated avatars when a filter matches nothing.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Number of generated avatars.
    #[serde(default = "default_placeholder_count")]
    pub count: usize,

    /// URL template; `{seed}` is replaced by the encoded seed.
    #[serde(default = "default_placeholder_template")]
    pub template: String,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            count: default_placeholder_count(),
            template: default_placeholder_template(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_images_url() -> String {
    format!("{IMAGES_BASE_URL}/images_metadata.json")
}

fn default_categories_url() -> String {
    format!("{IMAGES_BASE_URL}/folders_names.json")
}

fn default_cache_max_age_hours() -> i64 {
    24
}

fn default_key_prefix() -> String {
    "jf-avatars".to_string()
}

fn default_all_label() -> String {
    "All".to_string()
}

fn default_max_concurrency() -> usize {
    100
}

fn default_static_priority() -> i64 {
    10
}

fn default_preload_count() -> usize {
    6
}

fn default_preload_stagger_ms() -> u64 {
    50
}

fn default_memory_cache_size() -> usize {
    200
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_columns() -> usize {
    5
}

fn default_row_height() -> f64 {
    110.0
}

fn default_viewport_height() -> f64 {
    800.0
}

fn default_server_url() -> String {
    "http://localhost:8096".to_string()
}

fn default_client_name() -> String {
    "Jellyfin Web".to_string()
}

fn default_device_name() -> String {
    "Chrome".to_string()
}

fn default_client_version() -> String {
    "10.9.11".to_string()
}

fn default_credentials_key() -> String {
    "jellyfin_credentials".to_string()
}

fn default_device_key_prefix() -> String {
    "_device".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_fallback_base() -> String {
    "https://raw.githubusercontent.com/kalibrado/jf-avatars/refs/heads/main/src/lang".to_string()
}

fn default_placeholder_count() -> usize {
    12
}

fn default_placeholder_template() -> String {
    "https://api.dicebear.com/9.x/thumbs/png?seed={seed}".to_string()
}

use super::args::CliArgs;

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(config_path) = &args.config {
            self.config = Some(config_path.clone());
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(images_url) = &args.images_url {
            self.catalog.images_url.clone_from(images_url);
        }
        if let Some(categories_url) = &args.categories_url {
            self.catalog.categories_url.clone_from(categories_url);
        }
        if let Some(max_concurrency) = args.max_concurrency {
            self.loading.max_concurrency = max_concurrency;
        }
        if let Some(prioritize) = args.prioritize_viewport {
            self.loading.prioritize_viewport = prioritize;
        }
        if let Some(viewport_height) = args.viewport_height {
            self.layout.viewport_height = viewport_height;
        }
        if let Some(server_url) = &args.server_url {
            self.server.base_url.clone_from(server_url);
        }
        if let Some(language) = &args.language {
            self.i18n.language = Some(language.clone());
        }
    }

    /// Checks values that would make the picker unusable.
    ///
    /// # Errors
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.loading.max_concurrency == 0 {
            return Err(ConfigurationError::invalid(
                "loading.max_concurrency",
                "must be at least 1",
            ));
        }
        if self.catalog.cache_max_age_hours <= 0 {
            return Err(ConfigurationError::invalid(
                "catalog.cache_max_age_hours",
                "must be positive",
            ));
        }
        if self.catalog.images_url.trim().is_empty() {
            return Err(ConfigurationError::invalid(
                "catalog.images_url",
                "must not be empty",
            ));
        }
        if self.catalog.key_prefix.trim().is_empty() {
            return Err(ConfigurationError::invalid(
                "catalog.key_prefix",
                "must not be empty",
            ));
        }
        if self.layout.columns == 0 {
            return Err(ConfigurationError::invalid(
                "layout.columns",
                "must be at least 1",
            ));
        }
        if self.layout.row_height.is_nan() || self.layout.row_height <= 0.0 {
            return Err(ConfigurationError::invalid(
                "layout.row_height",
                "must be positive",
            ));
        }
        if self.layout.viewport_height.is_nan() || self.layout.viewport_height <= 0.0 {
            return Err(ConfigurationError::invalid(
                "layout.viewport_height",
                "must be positive",
            ));
        }
        if self.placeholders.enabled && !self.placeholders.template.contains("{seed}") {
            return Err(ConfigurationError::invalid(
                "placeholders.template",
                "must contain {seed}",
            ));
        }
        Ok(())
    }

    /// Catalog cache lifetime.
    #[must_use]
    pub fn cache_max_age(&self) -> chrono::Duration {
        chrono::Duration::hours(self.catalog.cache_max_age_hours)
    }

    /// Key-value store key of the cached catalog.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!("{}-images-cache", self.catalog.key_prefix)
    }

    /// Key-value store key of the last selected image.
    #[must_use]
    pub fn selected_image_key(&self) -> String {
        format!("{}-selected-img", self.catalog.key_prefix)
    }

    /// Base URL of language files served by the media server.
    #[must_use]
    pub fn local_translations_base(&self) -> String {
        self.i18n.local_base.clone().unwrap_or_else(|| {
            format!(
                "{}/web/{}/src/lang",
                self.server.base_url.trim_end_matches('/'),
                self.catalog.key_prefix
            )
        })
    }

    /// Preferred language: configured value, then `$LANG`, then the default language.
    #[must_use]
    pub fn preferred_language(&self) -> String {
        self.i18n
            .language
            .clone()
            .or_else(|| std::env::var("LANG").ok().filter(|l| !l.is_empty()))
            .unwrap_or_else(|| self.i18n.default_language.clone())
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default config file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("avatar-picker.log"))
    }

    /// Returns effective config path.
    #[must_use]
    pub fn effective_config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(Self::default_config_path)
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }
}
