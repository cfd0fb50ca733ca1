//! App-shell files compiled into the binary and served for the app origin.

use pokedex_core::net::BundledAssets;
use serde::Deserialize;

const INDEX_HTML: &str = include_str!("../assets/index.html");
const MANIFEST_JSON: &str = include_str!("../assets/manifest.json");

pub fn bundled() -> BundledAssets {
    BundledAssets::new()
        .with_file("/", "text/html; charset=utf-8", INDEX_HTML)
        .with_file("/index.html", "text/html; charset=utf-8", INDEX_HTML)
        .with_file("/manifest.json", "application/manifest+json", MANIFEST_JSON)
}

/// The fields of the web app manifest the UI uses.
#[derive(Debug, Clone, Deserialize)]
pub struct AppManifest {
    pub name: String,
}
