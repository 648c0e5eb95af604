//! Application configuration.

/// Configuration model.
pub mod app_config;
/// Command-line arguments.
pub mod args;
/// Configuration file storage.
pub mod storage;

pub use app_config::{
    AppConfig, CatalogConfig, I18nConfig, LayoutConfig, LoadingConfig, LogLevel,
    PlaceholderConfig, ServerConfig,
};
pub use args::CliArgs;
pub use storage::StorageManager;
