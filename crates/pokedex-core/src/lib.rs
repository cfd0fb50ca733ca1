//! Core library for the Pokédex terminal browser.
//!
//! This crate holds everything that does not touch the terminal:
//!
//! - `api`: PokeAPI client issuing requests through a [`net::Fetch`] implementation
//! - `models`: Record summaries and listing pages
//! - `catalog`: Reducer-style view state (pagination and client-side search)
//! - `cache`: Named response stores, in memory or on disk
//! - `net`: Request/response types, the network fetcher and the controlled fetcher
//! - `worker`: The offline caching worker (routing, strategies, lifecycle, messaging)
//! - `notify`: Page-side notification trigger

pub mod api;
pub mod cache;
pub mod catalog;
pub mod models;
pub mod net;
pub mod notify;
pub mod worker;
