//! Infrastructure layer with external service adapters.

/// Application configuration.
pub mod config;
/// HTTP clients for catalogs, images and profile uploads.
pub mod http;
/// Image loading (queue, caching, slot loads).
pub mod image;
/// Key-value store adapters.
pub mod storage;

pub use config::{AppConfig, CliArgs, LogLevel, StorageManager};
pub use http::{ClientIdentity, HttpClient, ProfileImageClient};
pub use image::{
    CacheStats, LoadQueue, LoadQueueConfig, MemoryImageCache, QueueEvent, QueueStats, SlotLoader,
};
pub use storage::{FileKeyValueStore, MemoryKeyValueStore};
