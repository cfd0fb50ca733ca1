use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::net::{Response, ResponseSource};

/// Consider a cached entry stale after 1 hour.
/// Only used for the status display; strategies never expire entries.
const CACHE_STALE_MINUTES: i64 = 60;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache entry is corrupt: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid cache store name: {0}")]
    InvalidStoreName(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew (negative ages)
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() > CACHE_STALE_MINUTES
    }
}

/// A response as it was stored, minus its body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub url: String,
    pub status: u16,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
}

impl ResponseMeta {
    pub fn from_response(url: &str, response: &Response) -> Self {
        let headers = response
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        Self {
            url: url.to_string(),
            status: response.status.as_u16(),
            headers,
        }
    }

    /// Rebuild the response, marking it as served from cache.
    /// Headers that no longer parse are dropped.
    pub fn into_response(self, body: impl Into<bytes::Bytes>) -> Response {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.append(name, value);
            }
        }

        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        let mut response = Response::new(status, body).with_source(ResponseSource::Cache);
        response.headers = headers;
        response
    }
}

/// Named request → response stores, the equivalent of the browser's
/// cache storage.
///
/// Implementations are internally synchronized; each call is atomic with
/// respect to the entry it touches.
pub trait CacheStorage: Send + Sync {
    /// Names of every existing store.
    fn keys(&self) -> Result<Vec<String>, CacheError>;

    /// Create `store` if it does not exist yet.
    fn open(&self, store: &str) -> Result<(), CacheError>;

    /// Delete `store` and everything in it. Returns whether it existed.
    fn delete(&self, store: &str) -> Result<bool, CacheError>;

    /// Look up `key` in a single store.
    fn match_in(&self, store: &str, key: &str) -> Result<Option<CachedData<Response>>, CacheError>;

    /// Store a copy of `response` under `key`, replacing any previous entry.
    /// Creates the store when missing.
    fn put(&self, store: &str, key: &str, response: &Response) -> Result<(), CacheError>;

    /// Keys stored in `store` (empty when the store does not exist).
    fn entries(&self, store: &str) -> Result<Vec<String>, CacheError>;

    fn has(&self, store: &str) -> Result<bool, CacheError> {
        Ok(self.keys()?.iter().any(|k| k == store))
    }

    /// Look up `key` across every store, in store order.
    fn match_any(&self, key: &str) -> Result<Option<CachedData<Response>>, CacheError> {
        for store in self.keys()? {
            if let Some(hit) = self.match_in(&store, key)? {
                return Ok(Some(hit));
            }
        }
        Ok(None)
    }
}

/// Reject names that would escape the cache directory.
pub(crate) fn validate_store_name(store: &str) -> Result<(), CacheError> {
    let valid = !store.is_empty()
        && store != "."
        && store != ".."
        && store
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(CacheError::InvalidStoreName(store.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use reqwest::header::CONTENT_TYPE;

    #[test]
    fn test_cached_data_age_display_just_now() {
        let cached = CachedData::new(vec![1, 2, 3]);
        assert_eq!(cached.age_display(), "just now");
    }

    #[test]
    fn test_cached_data_age_display_hours_round_up() {
        let mut cached = CachedData::new(());
        cached.cached_at = Utc::now() - Duration::minutes(95);
        assert_eq!(cached.age_display(), "2h ago");
    }

    #[test]
    fn test_cached_data_is_stale() {
        let fresh = CachedData::new(vec![1]);
        assert!(!fresh.is_stale());

        let mut old = CachedData::new(vec![1]);
        old.cached_at = Utc::now() - Duration::minutes(61);
        assert!(old.is_stale());
    }

    #[test]
    fn test_response_meta_keeps_status_and_headers() {
        let resp = Response::new(StatusCode::NOT_FOUND, "missing")
            .with_content_type("text/plain; charset=utf-8");
        let meta = ResponseMeta::from_response("https://example.com/x", &resp);
        assert_eq!(meta.status, 404);

        let back = meta.into_response("missing");
        assert_eq!(back.status, StatusCode::NOT_FOUND);
        assert_eq!(back.source, ResponseSource::Cache);
        assert_eq!(
            back.headers.get(CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn test_validate_store_name() {
        assert!(validate_store_name("runtime-v1").is_ok());
        assert!(validate_store_name("static_v1.2").is_ok());
        assert!(validate_store_name("").is_err());
        assert!(validate_store_name("..").is_err());
        assert!(validate_store_name("../etc").is_err());
    }
}
