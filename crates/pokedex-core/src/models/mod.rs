//! Data models for PokeAPI entities.
//!
//! - `PokemonSummary`: a catalog entry (name + detail URL)
//! - `PokemonPage`: one page of the listing endpoint

pub mod pokemon;

pub use pokemon::{sprite_url, PokemonPage, PokemonSummary, SPRITE_BASE_URL};
