use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::debug;

use crate::worker::{CacheWorker, WorkerState};

use super::{Fetch, FetchError, Request, Response};

/// The page's view of the network.
///
/// While an activated worker controls this page, every request goes through
/// the worker; otherwise (no worker yet, or the worker stays out of a
/// request) it goes straight to the network.
pub struct ControlledFetcher {
    network: Arc<dyn Fetch>,
    client_id: String,
    worker: RwLock<Option<Arc<CacheWorker>>>,
}

impl ControlledFetcher {
    /// `client_id` is this page's id in the worker's client list.
    pub fn new(network: Arc<dyn Fetch>, client_id: impl Into<String>) -> Self {
        Self {
            network,
            client_id: client_id.into(),
            worker: RwLock::new(None),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn set_worker(&self, worker: Arc<CacheWorker>) {
        *self.worker.write().unwrap_or_else(|e| e.into_inner()) = Some(worker);
    }

    /// The worker answering this page's requests, if any.
    pub fn controller(&self) -> Option<Arc<CacheWorker>> {
        self.worker
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .filter(|w| {
                w.state() == WorkerState::Activated && w.clients().is_controlled(&self.client_id)
            })
            .cloned()
    }
}

#[async_trait]
impl Fetch for ControlledFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        if let Some(worker) = self.controller() {
            if let Some(result) = worker.handle_fetch(request).await {
                // Any background revalidation keeps running detached.
                return result.map(|outcome| outcome.response);
            }
            debug!(url = %request.url, "Worker bypassed request");
        }
        self.network.fetch(request).await
    }
}
