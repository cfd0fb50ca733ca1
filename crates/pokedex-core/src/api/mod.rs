//! PokeAPI client and its error type.

pub mod client;
pub mod error;

pub use client::{PokeApiClient, API_BASE_URL, INDEX_LIMIT, ITEMS_PER_PAGE};
pub use error::ApiError;
