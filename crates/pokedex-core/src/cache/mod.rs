//! Response cache storage.
//!
//! This module provides the [`CacheStorage`] abstraction the caching worker
//! is built on, with two implementations:
//!
//! - [`MemoryCacheStorage`]: process-local, used in tests
//! - [`DiskCacheStorage`]: persisted under the user's cache directory, so
//!   cached responses survive a restart

pub mod disk;
pub mod memory;
pub mod storage;

pub use disk::DiskCacheStorage;
pub use memory::MemoryCacheStorage;
pub use storage::{CacheError, CacheStorage, CachedData, ResponseMeta};
