//! Image loading infrastructure.
//!
//! This module provides:
//! - The bounded-concurrency priority load queue
//! - Memory caching with LRU eviction
//! - Slot load tasks that report to the renderer

/// Bounded priority load queue.
pub mod load_queue;
/// In-memory image cache.
pub mod memory_cache;
/// Slot load tasks.
pub mod slot_loader;

pub use load_queue::{
    DEFAULT_MAX_CONCURRENT_LOADS, LoadFuture, LoadQueue, LoadQueueConfig, QueueEvent, QueueStats,
};
pub use memory_cache::{CacheStats, MemoryImageCache};
pub use slot_loader::SlotLoader;
