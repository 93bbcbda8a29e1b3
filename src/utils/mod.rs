//! Utility functions and helpers.

pub mod url;

pub use url::{UrlBuilder, encode_path};
