//! Network access.
//!
//! [`Fetch`] is the seam every request goes through. [`HttpFetcher`] is the
//! real network (reqwest), optionally answering requests for the app's own
//! origin from bundled assets, and can be switched offline at runtime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, USER_AGENT};
use reqwest::Client;
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::{BundledAssets, Request, Response};

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

const USER_AGENT_VALUE: &str = concat!("pokedex-tui/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Network unreachable (offline mode)")]
    Offline,

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Something that can turn a request into a response.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError>;
}

/// Requests for the app's own origin, answered from bundled files.
#[derive(Debug, Clone)]
struct LocalOrigin {
    origin: Url,
    assets: BundledAssets,
}

/// The real network.
pub struct HttpFetcher {
    client: Client,
    offline: AtomicBool,
    local: Option<LocalOrigin>,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            offline: AtomicBool::new(false),
            local: None,
        })
    }

    /// Serve requests whose origin equals `origin` from `assets` instead of
    /// the network.
    pub fn with_local_origin(mut self, origin: Url, assets: BundledAssets) -> Self {
        self.local = Some(LocalOrigin { origin, assets });
        self
    }

    /// Simulate an unreachable network. Every remote fetch fails with
    /// [`FetchError::Offline`] while set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        if !request.is_http() {
            return Err(FetchError::UnsupportedScheme(
                request.url.scheme().to_string(),
            ));
        }

        // Bundled assets ship with the binary and stay reachable offline.
        if let Some(local) = &self.local {
            if request.url.origin() == local.origin.origin() {
                debug!(url = %request.url, "Serving bundled asset");
                return Ok(local.assets.serve(request.url.path()));
            }
        }
        if self.is_offline() {
            return Err(FetchError::Offline);
        }

        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .header(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE))
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        debug!(
            url = %request.url,
            status = status.as_u16(),
            bytes = body.len(),
            "Network response"
        );

        let mut resp = Response::new(status, body);
        resp.headers = headers;
        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn local_fetcher() -> HttpFetcher {
        let assets = BundledAssets::new().with_file("/index.html", "text/html", "<html></html>");
        HttpFetcher::new()
            .unwrap()
            .with_local_origin(Url::parse("http://localhost/").unwrap(), assets)
    }

    #[tokio::test]
    async fn test_local_origin_served_from_assets() {
        let fetcher = local_fetcher();
        let resp = fetcher
            .fetch(&Request::parse("http://localhost/index.html").unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.text(), "<html></html>");
    }

    #[tokio::test]
    async fn test_offline_fails_remote_but_not_bundled() {
        let fetcher = local_fetcher();
        fetcher.set_offline(true);
        assert!(fetcher.is_offline());

        let err = fetcher
            .fetch(&Request::parse("https://pokeapi.co/api/v2/pokemon").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Offline));

        let local = fetcher
            .fetch(&Request::parse("http://localhost/index.html").unwrap())
            .await
            .unwrap();
        assert_eq!(local.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let fetcher = local_fetcher();
        let err = fetcher
            .fetch(&Request::parse("data:text/plain,hi").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedScheme(s) if s == "data"));
    }
}
