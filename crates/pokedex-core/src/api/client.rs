//! Client for the PokeAPI listing endpoint and sprite images.
//!
//! Every request goes through the injected [`Fetch`] implementation, so when
//! a caching worker controls the page, the client transparently gets cached
//! answers.

use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::models::{sprite_url, PokemonPage, PokemonSummary, SPRITE_BASE_URL};
use crate::net::{Fetch, Request, Response};

use super::ApiError;

/// Base URL of the public PokeAPI.
pub const API_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// Page size of the catalog.
pub const ITEMS_PER_PAGE: u64 = 20;

/// Upper bound for the one-off full name index used by search.
pub const INDEX_LIMIT: u64 = 2000;

/// Clone is cheap; the fetcher is shared.
#[derive(Clone)]
pub struct PokeApiClient {
    fetcher: Arc<dyn Fetch>,
    api_base: String,
    sprite_base: String,
}

impl PokeApiClient {
    pub fn new(fetcher: Arc<dyn Fetch>) -> Self {
        Self::with_bases(fetcher, API_BASE_URL, SPRITE_BASE_URL)
    }

    pub fn with_bases(fetcher: Arc<dyn Fetch>, api_base: &str, sprite_base: &str) -> Self {
        Self {
            fetcher,
            api_base: api_base.trim_end_matches('/').to_string(),
            sprite_base: sprite_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn page_url(&self, limit: u64, offset: u64) -> Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}/pokemon", self.api_base))?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string());
        Ok(url)
    }

    pub fn sprite_url(&self, id: &str) -> String {
        sprite_url(&self.sprite_base, id)
    }

    /// Check if response is successful, returning an error with body if not.
    fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_status(response.status, &response.text()))
        }
    }

    async fn get(&self, url: Url) -> Result<Response, ApiError> {
        let request = Request::get(url);
        let response = self.fetcher.fetch(&request).await?;
        debug!(
            url = %request.url,
            status = response.status.as_u16(),
            source = ?response.source,
            "API response"
        );
        Self::check_response(response)
    }

    /// One page of the listing.
    pub async fn fetch_page(&self, limit: u64, offset: u64) -> Result<PokemonPage, ApiError> {
        let response = self.get(self.page_url(limit, offset)?).await?;
        Ok(response.json()?)
    }

    /// Every name in the catalog (up to [`INDEX_LIMIT`]), for search.
    pub async fn fetch_index(&self) -> Result<Vec<PokemonSummary>, ApiError> {
        Ok(self.fetch_page(INDEX_LIMIT, 0).await?.results)
    }

    /// Raw sprite image for an entry id.
    pub async fn fetch_sprite(&self, id: &str) -> Result<Response, ApiError> {
        if id.is_empty() {
            return Err(ApiError::InvalidResponse("entry has no id".to_string()));
        }
        let url = Url::parse(&self.sprite_url(id))?;
        self.get(url).await
    }
}
