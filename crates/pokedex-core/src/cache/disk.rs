//! On-disk cache storage.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/<store>/<sha256(key)>.json   CachedData<ResponseMeta>
//! <root>/<store>/<sha256(key)>.body   raw response body
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::Context;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::net::Response;

use super::storage::{validate_store_name, CacheError, CacheStorage, CachedData, ResponseMeta};

const META_EXT: &str = "json";
const BODY_EXT: &str = "body";

pub struct DiskCacheStorage {
    root: PathBuf,
    // Serializes operations so readers never see a body without its metadata.
    guard: Mutex<()>,
}

impl DiskCacheStorage {
    pub fn new(root: PathBuf) -> anyhow::Result<Self> {
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create cache directory {}", root.display()))?;
        Ok(Self {
            root,
            guard: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.guard.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn store_dir(&self, store: &str) -> Result<PathBuf, CacheError> {
        validate_store_name(store)?;
        Ok(self.root.join(store))
    }

    /// Directory of a store found on disk. Stores left by other versions
    /// may use names `open` would reject; any single path component works.
    fn existing_store_dir(&self, store: &str) -> Result<PathBuf, CacheError> {
        let single_component = !store.is_empty()
            && store != "."
            && store != ".."
            && !store.contains(['/', '\\', '\0']);
        if single_component {
            Ok(self.root.join(store))
        } else {
            Err(CacheError::InvalidStoreName(store.to_string()))
        }
    }

    fn entry_stem(key: &str) -> String {
        format!("{:x}", Sha256::digest(key.as_bytes()))
    }
}

impl CacheStorage for DiskCacheStorage {
    fn keys(&self) -> Result<Vec<String>, CacheError> {
        let _lock = self.lock();
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn open(&self, store: &str) -> Result<(), CacheError> {
        let dir = self.store_dir(store)?;
        let _lock = self.lock();
        fs::create_dir_all(dir)?;
        Ok(())
    }

    fn delete(&self, store: &str) -> Result<bool, CacheError> {
        let dir = self.existing_store_dir(store)?;
        let _lock = self.lock();
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn match_in(&self, store: &str, key: &str) -> Result<Option<CachedData<Response>>, CacheError> {
        let dir = self.store_dir(store)?;
        let stem = Self::entry_stem(key);
        let meta_path = dir.join(format!("{}.{}", stem, META_EXT));
        let body_path = dir.join(format!("{}.{}", stem, BODY_EXT));

        let _lock = self.lock();
        let contents = match fs::read_to_string(&meta_path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let cached: CachedData<ResponseMeta> = serde_json::from_str(&contents)?;

        // Two keys hashing to the same stem would be a collision; treat as a miss.
        if cached.data.url != key {
            warn!(store, key, stored = %cached.data.url, "Cache entry key mismatch");
            return Ok(None);
        }

        let body = match fs::read(&body_path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(store, key, "Cache entry has no body file");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Some(CachedData {
            data: cached.data.into_response(body),
            cached_at: cached.cached_at,
        }))
    }

    fn put(&self, store: &str, key: &str, response: &Response) -> Result<(), CacheError> {
        let dir = self.store_dir(store)?;
        let stem = Self::entry_stem(key);
        let cached = CachedData::new(ResponseMeta::from_response(key, response));
        let contents = serde_json::to_string_pretty(&cached)?;

        let _lock = self.lock();
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(format!("{}.{}", stem, BODY_EXT)), &response.body)?;
        fs::write(dir.join(format!("{}.{}", stem, META_EXT)), contents)?;
        Ok(())
    }

    fn entries(&self, store: &str) -> Result<Vec<String>, CacheError> {
        let dir = self.store_dir(store)?;
        let _lock = self.lock();
        let read_dir = match fs::read_dir(&dir) {
            Ok(r) => r,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for entry in read_dir {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(META_EXT) {
                continue;
            }
            let contents = fs::read_to_string(&path)?;
            match serde_json::from_str::<CachedData<ResponseMeta>>(&contents) {
                Ok(cached) => keys.push(cached.data.url),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Skipping corrupt cache entry")
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}
