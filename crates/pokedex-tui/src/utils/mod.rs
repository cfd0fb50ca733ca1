//! Utility functions for string formatting and manipulation.

pub mod format;

pub use format::{format_bytes, png_dimensions, pokemon_id_from_path, truncate_string};
