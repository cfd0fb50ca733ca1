//! Reducer-style state for the paginated, searchable catalog view.

pub mod state;

pub use state::{CatalogState, Effect, LoadTarget, Message, View};
