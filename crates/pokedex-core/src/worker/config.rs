use url::Url;

/// Pre-populated store holding the app shell.
pub const STATIC_CACHE: &str = "static-v1";

/// Store populated lazily as requests are observed.
pub const RUNTIME_CACHE: &str = "runtime-v1";

/// Documents needed to boot the page offline.
pub const APP_SHELL: &[&str] = &["/", "/index.html", "/manifest.json"];

/// Document every in-scope navigation resolves to.
pub const SHELL_DOCUMENT: &str = "/index.html";

/// Dev-server paths that must never be intercepted.
pub const DEV_SERVER_PREFIXES: &[&str] = &["/@vite", "/__vite"];

pub const SPRITE_HOST: &str = "raw.githubusercontent.com";
pub const SPRITE_PATH_MARKER: &str = "/PokeAPI/sprites/";
pub const API_HOST_SUFFIX: &str = "pokeapi.co";

/// Everything the worker needs to know about its environment.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Origin (and scope) the worker controls.
    pub origin: Url,
    pub static_cache: String,
    pub runtime_cache: String,
    pub app_shell: Vec<String>,
    pub shell_document: String,
    pub bypass_prefixes: Vec<String>,
    pub sprite_host: String,
    pub sprite_path_marker: String,
    pub api_host_suffix: String,
}

impl WorkerConfig {
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            static_cache: STATIC_CACHE.to_string(),
            runtime_cache: RUNTIME_CACHE.to_string(),
            app_shell: APP_SHELL.iter().map(|s| s.to_string()).collect(),
            shell_document: SHELL_DOCUMENT.to_string(),
            bypass_prefixes: DEV_SERVER_PREFIXES.iter().map(|s| s.to_string()).collect(),
            sprite_host: SPRITE_HOST.to_string(),
            sprite_path_marker: SPRITE_PATH_MARKER.to_string(),
            api_host_suffix: API_HOST_SUFFIX.to_string(),
        }
    }

    /// Store names that survive activation.
    pub fn known_caches(&self) -> [&str; 2] {
        [self.static_cache.as_str(), self.runtime_cache.as_str()]
    }

    /// Resolve a path against the worker origin.
    pub fn resolve(&self, path: &str) -> Result<Url, url::ParseError> {
        self.origin.join(path)
    }
}
