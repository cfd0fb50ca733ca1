//! Caching strategies.
//!
//! Each strategy answers a single request using the runtime store and the
//! network. Cache reads and writes are best effort: a failing store is logged
//! and treated as a miss, never as a failed request.

use std::sync::Arc;

use reqwest::StatusCode;
use tokio::task::JoinHandle;
use tracing::debug;
use url::Url;

use crate::cache::CacheStorage;
use crate::net::{Fetch, FetchError, Request, Response};

use super::Strategy;

/// Body of the placeholder served when the network is down and nothing is cached.
pub const OFFLINE_BODY: &str = "Offline and resource not cached.";

/// What the caches and the network look like to a strategy.
#[derive(Clone)]
pub struct StrategyContext {
    pub caches: Arc<dyn CacheStorage>,
    pub network: Arc<dyn Fetch>,
    pub runtime_cache: String,
    /// Full URL of the app-shell document.
    pub shell_document: Url,
}

/// The response for the page, plus any work that continues after it was sent.
#[derive(Debug)]
pub struct FetchOutcome {
    pub response: Response,
    /// Background cache refresh still running (stale-while-revalidate).
    /// Dropping the handle lets it finish on its own.
    pub revalidation: Option<JoinHandle<()>>,
}

impl FetchOutcome {
    fn ready(response: Response) -> Self {
        Self {
            response,
            revalidation: None,
        }
    }
}

impl StrategyContext {
    fn lookup(&self, key: &str) -> Option<Response> {
        match self.caches.match_in(&self.runtime_cache, key) {
            Ok(hit) => hit.map(|cached| cached.data),
            Err(e) => {
                debug!(key, error = %e, "Cache lookup failed, treating as miss");
                None
            }
        }
    }

    fn store(&self, key: &str, response: &Response) {
        if let Err(e) = self.caches.put(&self.runtime_cache, key, response) {
            debug!(key, error = %e, "Failed to cache response");
        }
    }
}

/// Answer `request` with `strategy`.
pub async fn respond(
    strategy: Strategy,
    ctx: &StrategyContext,
    request: &Request,
) -> Result<FetchOutcome, FetchError> {
    match strategy {
        Strategy::AppShell => app_shell(ctx, request).await,
        Strategy::CacheFirst => cache_first(ctx, request).await,
        Strategy::StaleWhileRevalidate => Ok(stale_while_revalidate(ctx, request).await),
        Strategy::NetworkFirst => Ok(network_first(ctx, request).await),
    }
}

/// Serve the shell document from any store; fall back to fetching the
/// original navigation request.
pub async fn app_shell(
    ctx: &StrategyContext,
    request: &Request,
) -> Result<FetchOutcome, FetchError> {
    match ctx.caches.match_any(ctx.shell_document.as_str()) {
        Ok(Some(cached)) => return Ok(FetchOutcome::ready(cached.data)),
        Ok(None) => {}
        Err(e) => debug!(error = %e, "Shell lookup failed"),
    }
    let response = ctx.network.fetch(request).await?;
    Ok(FetchOutcome::ready(response))
}

/// Cached copy if present; otherwise fetch, store a copy and return it.
/// A network failure on a miss is returned to the caller.
pub async fn cache_first(
    ctx: &StrategyContext,
    request: &Request,
) -> Result<FetchOutcome, FetchError> {
    let key = request.cache_key();
    if let Some(cached) = ctx.lookup(&key) {
        return Ok(FetchOutcome::ready(cached));
    }

    let response = ctx.network.fetch(request).await?;
    ctx.store(&key, &response);
    Ok(FetchOutcome::ready(response))
}

/// Cached copy right away while the network refreshes the store in the
/// background. Without a cached copy, wait for the network; if that fails
/// too, answer 504.
pub async fn stale_while_revalidate(ctx: &StrategyContext, request: &Request) -> FetchOutcome {
    let key = request.cache_key();

    match ctx.lookup(&key) {
        Some(cached) => {
            let ctx = ctx.clone();
            let request = request.clone();
            let revalidation = tokio::spawn(async move {
                refresh(&ctx, &request).await;
            });
            FetchOutcome {
                response: cached,
                revalidation: Some(revalidation),
            }
        }
        None => match refresh(ctx, request).await {
            Some(response) => FetchOutcome::ready(response),
            None => FetchOutcome::ready(Response::synthesized(
                StatusCode::GATEWAY_TIMEOUT,
                bytes::Bytes::new(),
            )),
        },
    }
}

/// Network first, storing what it returns; on failure the cached copy, or a
/// plain-text 503 when there is none.
pub async fn network_first(ctx: &StrategyContext, request: &Request) -> FetchOutcome {
    let key = request.cache_key();

    match ctx.network.fetch(request).await {
        Ok(response) => {
            ctx.store(&key, &response);
            FetchOutcome::ready(response)
        }
        Err(e) => {
            debug!(url = %request.url, error = %e, "Network failed, trying cache");
            match ctx.lookup(&key) {
                Some(cached) => FetchOutcome::ready(cached),
                None => FetchOutcome::ready(
                    Response::synthesized(StatusCode::SERVICE_UNAVAILABLE, OFFLINE_BODY)
                        .with_content_type("text/plain; charset=utf-8"),
                ),
            }
        }
    }
}

/// Fetch `request` and store the result. Failures are logged and swallowed.
async fn refresh(ctx: &StrategyContext, request: &Request) -> Option<Response> {
    match ctx.network.fetch(request).await {
        Ok(response) => {
            ctx.store(&request.cache_key(), &response);
            Some(response)
        }
        Err(e) => {
            debug!(url = %request.url, error = %e, "Revalidation failed");
            None
        }
    }
}
