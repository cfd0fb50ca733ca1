//! Scripted network for worker tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;

use crate::net::{Fetch, FetchError, Request, Response};

/// Answers from a fixed table, counts calls per URL, and can be switched
/// offline. Unknown URLs answer 404.
#[derive(Default)]
pub struct FakeNetwork {
    routes: Mutex<HashMap<String, (StatusCode, Bytes)>>,
    calls: Mutex<HashMap<String, usize>>,
    offline: AtomicBool,
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, url: &str, status: StatusCode, body: impl Into<Bytes>) -> Self {
        self.set(url, status, body);
        self
    }

    pub fn set(&self, url: &str, status: StatusCode, body: impl Into<Bytes>) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), (status, body.into()));
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Fetch for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        let url = request.url.as_str().to_string();
        *self.calls.lock().unwrap().entry(url.clone()).or_default() += 1;

        if self.offline.load(Ordering::SeqCst) {
            return Err(FetchError::Offline);
        }
        let routes = self.routes.lock().unwrap();
        Ok(match routes.get(&url) {
            Some((status, body)) => Response::new(*status, body.clone()),
            None => Response::new(StatusCode::NOT_FOUND, "not found"),
        })
    }
}
