use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use crate::net::{Response, ResponseSource};

use super::storage::{validate_store_name, CacheError, CacheStorage, CachedData};

type Stores = BTreeMap<String, HashMap<String, CachedData<Response>>>;

/// Cache storage that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    stores: Mutex<Stores>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Stores> {
        // A panic while holding the lock cannot leave a half-written entry,
        // so a poisoned map is still usable.
        self.stores.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CacheStorage for MemoryCacheStorage {
    fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.lock().keys().cloned().collect())
    }

    fn open(&self, store: &str) -> Result<(), CacheError> {
        validate_store_name(store)?;
        self.lock().entry(store.to_string()).or_default();
        Ok(())
    }

    fn delete(&self, store: &str) -> Result<bool, CacheError> {
        Ok(self.lock().remove(store).is_some())
    }

    fn match_in(&self, store: &str, key: &str) -> Result<Option<CachedData<Response>>, CacheError> {
        Ok(self
            .lock()
            .get(store)
            .and_then(|entries| entries.get(key))
            .map(|hit| CachedData {
                data: hit.data.clone().with_source(ResponseSource::Cache),
                cached_at: hit.cached_at,
            }))
    }

    fn put(&self, store: &str, key: &str, response: &Response) -> Result<(), CacheError> {
        validate_store_name(store)?;
        self.lock()
            .entry(store.to_string())
            .or_default()
            .insert(key.to_string(), CachedData::new(response.clone()));
        Ok(())
    }

    fn entries(&self, store: &str) -> Result<Vec<String>, CacheError> {
        let mut keys: Vec<String> = self
            .lock()
            .get(store)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_put_and_match() {
        let caches = MemoryCacheStorage::new();
        let resp = Response::new(StatusCode::OK, "body");
        caches.put("runtime-v1", "https://a/1", &resp).unwrap();

        let hit = caches.match_in("runtime-v1", "https://a/1").unwrap().unwrap();
        assert_eq!(hit.data.text(), "body");
        assert_eq!(hit.data.source, ResponseSource::Cache);
        assert!(caches.match_in("static-v1", "https://a/1").unwrap().is_none());
    }

    #[test]
    fn test_match_any_searches_all_stores() {
        let caches = MemoryCacheStorage::new();
        caches.open("runtime-v1").unwrap();
        caches
            .put("static-v1", "/index.html", &Response::new(StatusCode::OK, "<html>"))
            .unwrap();

        let hit = caches.match_any("/index.html").unwrap().unwrap();
        assert_eq!(hit.data.text(), "<html>");
    }

    #[test]
    fn test_keys_and_delete() {
        let caches = MemoryCacheStorage::new();
        caches.open("b").unwrap();
        caches.open("a").unwrap();
        assert_eq!(caches.keys().unwrap(), vec!["a", "b"]);
        assert!(caches.has("a").unwrap());

        assert!(caches.delete("a").unwrap());
        assert!(!caches.delete("a").unwrap());
        assert_eq!(caches.keys().unwrap(), vec!["b"]);
    }

    #[test]
    fn test_put_replaces_entry() {
        let caches = MemoryCacheStorage::new();
        caches.put("s", "k", &Response::new(StatusCode::OK, "old")).unwrap();
        caches.put("s", "k", &Response::new(StatusCode::OK, "new")).unwrap();
        assert_eq!(caches.match_in("s", "k").unwrap().unwrap().data.text(), "new");
        assert_eq!(caches.entries("s").unwrap(), vec!["k"]);
    }
}
