//! Request classification.
//!
//! The worker decides how to answer a request by walking an ordered table of
//! routes; the first route whose matcher accepts the request wins, and
//! requests no route accepts use the fallback strategy.

use std::fmt;

use reqwest::Method;
use url::Url;

use crate::net::{Request, RequestMode};

use super::WorkerConfig;

/// How a request is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Serve the cached shell document, network if it was never cached.
    AppShell,
    /// Cache if present, else network (and store).
    CacheFirst,
    /// Cache immediately while refreshing it from the network.
    StaleWhileRevalidate,
    /// Network (and store), cache when the network fails.
    NetworkFirst,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::AppShell => write!(f, "app-shell"),
            Strategy::CacheFirst => write!(f, "cache-first"),
            Strategy::StaleWhileRevalidate => write!(f, "stale-while-revalidate"),
            Strategy::NetworkFirst => write!(f, "network-first"),
        }
    }
}

type Matcher = Box<dyn Fn(&Request, &Url) -> bool + Send + Sync>;

/// One row of the routing table.
pub struct Route {
    pub name: &'static str,
    pub strategy: Strategy,
    matcher: Matcher,
}

impl Route {
    /// `matcher` receives the request and the worker origin.
    pub fn new<F>(name: &'static str, strategy: Strategy, matcher: F) -> Self
    where
        F: Fn(&Request, &Url) -> bool + Send + Sync + 'static,
    {
        Self {
            name,
            strategy,
            matcher: Box::new(matcher),
        }
    }

    pub fn matches(&self, request: &Request, origin: &Url) -> bool {
        (self.matcher)(request, origin)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("strategy", &self.strategy)
            .finish()
    }
}

/// Outcome of classifying a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Let the request go to the network untouched.
    Bypass,
    Handle {
        route: &'static str,
        strategy: Strategy,
    },
}

#[derive(Debug)]
pub struct Router {
    routes: Vec<Route>,
    fallback: Strategy,
    bypass_prefixes: Vec<String>,
}

impl Router {
    pub fn new(fallback: Strategy) -> Self {
        Self {
            routes: Vec::new(),
            fallback,
            bypass_prefixes: Vec::new(),
        }
    }

    /// Append a route; earlier routes take priority.
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Never intercept paths starting with `prefix`.
    pub fn bypass_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.bypass_prefixes.push(prefix.into());
        self
    }

    /// The routing table for the catalog: app-shell navigations, sprite
    /// images, API responses, same-origin assets, then everything else.
    pub fn for_config(config: &WorkerConfig) -> Self {
        let sprite_host = config.sprite_host.clone();
        let sprite_marker = config.sprite_path_marker.clone();
        let api_suffix = config.api_host_suffix.clone();

        let mut router = Router::new(Strategy::NetworkFirst)
            .route(Route::new("navigation", Strategy::AppShell, |req, origin| {
                req.mode == RequestMode::Navigate && is_same_origin(req, origin)
            }))
            .route(Route::new("sprites", Strategy::CacheFirst, move |req, _| {
                req.url.host_str() == Some(sprite_host.as_str())
                    && req.url.path().contains(sprite_marker.as_str())
            }))
            .route(Route::new(
                "api",
                Strategy::StaleWhileRevalidate,
                move |req, _| {
                    req.url
                        .host_str()
                        .is_some_and(|host| host.ends_with(api_suffix.as_str()))
                },
            ))
            .route(Route::new("same-origin", Strategy::CacheFirst, |req, origin| {
                is_same_origin(req, origin)
            }));

        for prefix in &config.bypass_prefixes {
            router = router.bypass_prefix(prefix.clone());
        }
        router
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn decide(&self, request: &Request, origin: &Url) -> Decision {
        if request.method != Method::GET || !request.is_http() {
            return Decision::Bypass;
        }
        let path = request.url.path();
        if self.bypass_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            return Decision::Bypass;
        }

        self.routes
            .iter()
            .find(|route| route.matches(request, origin))
            .map(|route| Decision::Handle {
                route: route.name,
                strategy: route.strategy,
            })
            .unwrap_or(Decision::Handle {
                route: "fallback",
                strategy: self.fallback,
            })
    }
}

fn is_same_origin(request: &Request, origin: &Url) -> bool {
    request.url.origin() == origin.origin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("http://localhost:5173/").unwrap()
    }

    fn router() -> Router {
        Router::for_config(&WorkerConfig::new(origin()))
    }

    fn decide(req: Request) -> Decision {
        router().decide(&req, &origin())
    }

    #[test]
    fn test_navigation_uses_app_shell() {
        let req = Request::navigate(Url::parse("http://localhost:5173/some/route").unwrap());
        assert_eq!(
            decide(req),
            Decision::Handle {
                route: "navigation",
                strategy: Strategy::AppShell,
            }
        );
    }

    #[test]
    fn test_cross_origin_navigation_is_not_app_shell() {
        let req = Request::navigate(Url::parse("https://example.com/").unwrap());
        assert_eq!(
            decide(req),
            Decision::Handle {
                route: "fallback",
                strategy: Strategy::NetworkFirst,
            }
        );
    }

    #[test]
    fn test_sprites_cache_first() {
        let req = Request::parse(
            "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/25.png",
        )
        .unwrap();
        assert_eq!(
            decide(req),
            Decision::Handle {
                route: "sprites",
                strategy: Strategy::CacheFirst,
            }
        );
    }

    #[test]
    fn test_other_github_content_falls_back() {
        let req =
            Request::parse("https://raw.githubusercontent.com/rust-lang/rust/README.md").unwrap();
        assert_eq!(
            decide(req),
            Decision::Handle {
                route: "fallback",
                strategy: Strategy::NetworkFirst,
            }
        );
    }

    #[test]
    fn test_api_host_and_subdomains() {
        for url in [
            "https://pokeapi.co/api/v2/pokemon?limit=20&offset=0",
            "https://beta.pokeapi.co/graphql",
        ] {
            assert_eq!(
                decide(Request::parse(url).unwrap()),
                Decision::Handle {
                    route: "api",
                    strategy: Strategy::StaleWhileRevalidate,
                }
            );
        }
    }

    #[test]
    fn test_same_origin_assets() {
        let req = Request::parse("http://localhost:5173/manifest.json").unwrap();
        assert_eq!(
            decide(req),
            Decision::Handle {
                route: "same-origin",
                strategy: Strategy::CacheFirst,
            }
        );
    }

    #[test]
    fn test_bypass_rules() {
        let post = Request::parse("https://pokeapi.co/api/v2/pokemon")
            .unwrap()
            .with_method(Method::POST);
        assert_eq!(decide(post), Decision::Bypass);

        let data = Request::parse("data:text/plain,hello").unwrap();
        assert_eq!(decide(data), Decision::Bypass);

        let hmr = Request::parse("http://localhost:5173/@vite/client").unwrap();
        assert_eq!(decide(hmr), Decision::Bypass);
        let hmr = Request::parse("http://localhost:5173/__vite_ping").unwrap();
        assert_eq!(decide(hmr), Decision::Bypass);
    }

    #[test]
    fn test_custom_route_takes_priority_order() {
        let router = Router::new(Strategy::NetworkFirst)
            .route(Route::new("first", Strategy::CacheFirst, |_, _| true))
            .route(Route::new("second", Strategy::StaleWhileRevalidate, |_, _| true));
        let req = Request::parse("https://example.com/").unwrap();
        assert_eq!(
            router.decide(&req, &origin()),
            Decision::Handle {
                route: "first",
                strategy: Strategy::CacheFirst,
            }
        );
        assert_eq!(router.routes().len(), 2);
    }
}
