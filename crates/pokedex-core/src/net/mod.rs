//! Request/response plumbing.
//!
//! The page never talks to reqwest directly: it fetches through a
//! [`ControlledFetcher`], which hands requests to the caching worker when one
//! controls the page and to the network otherwise.

pub mod assets;
pub mod controlled;
pub mod fetch;
pub mod request;

pub use assets::BundledAssets;
pub use controlled::ControlledFetcher;
pub use fetch::{Fetch, FetchError, HttpFetcher};
pub use request::{Request, RequestMode, Response, ResponseSource};

#[cfg(test)]
pub(crate) mod testing;
