use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default location of the front-facing sprite images.
pub const SPRITE_BASE_URL: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon";

/// Matches the numeric id in detail URLs such as `.../pokemon/25/`.
static ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/pokemon/(\d+)/").unwrap_or_else(|e| panic!("invalid id pattern: {e}"))
});

/// A catalog entry as returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonSummary {
    pub name: String,
    pub url: String,
}

impl PokemonSummary {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Numeric identifier taken from the detail URL, or an empty string
    /// when the URL does not carry one.
    pub fn id(&self) -> &str {
        ID_PATTERN
            .captures(&self.url)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .unwrap_or("")
    }

    /// Name with the first letter upper-cased, for display.
    pub fn display_name(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Case-insensitive substring match against the name.
    /// `term` must already be lower-cased.
    pub fn matches(&self, term: &str) -> bool {
        self.name.to_lowercase().contains(term)
    }
}

/// One page of `GET /pokemon?limit=N&offset=M`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonPage {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub results: Vec<PokemonSummary>,
}

/// Sprite image URL for an entry id under the given base.
pub fn sprite_url(base: &str, id: &str) -> String {
    format!("{}/{}.png", base.trim_end_matches('/'), id)
}
