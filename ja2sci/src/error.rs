//! Error types for name translation
//!
//! Only genuine failures live here. A dictionary miss, a page without a
//! scientific name and a page that does not exist are ordinary outcomes and
//! are reported through `Option` / [`Outcome`](crate::resolver::Outcome)
//! instead.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Ja2SciError {
    /// Connection failure or a non-2xx status from the encyclopedia API
    #[error("HTTP request error: {0}")]
    Network(#[from] reqwest::Error),

    /// A fetcher other than the HTTP clients failed to deliver a response
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("JSON decoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// The body decoded as JSON but does not have the shape of a page query
    #[error("Malformed query response: {0}")]
    MalformedResponse(String),

    #[error("Timed out after {after:?} while fetching '{title}'")]
    Timeout { title: String, after: Duration },

    /// Too many redirect hops, or a redirect cycle
    #[error("Redirect limit reached for '{title}' after {hops} hop(s)")]
    RedirectLimit { title: String, hops: usize },

    #[error("Failed to load name mapping from '{}': {reason}", .path.display())]
    MappingLoad { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Pattern error: {0}")]
    Pattern(String),
}

impl From<fancy_regex::Error> for Ja2SciError {
    fn from(err: fancy_regex::Error) -> Self {
        Ja2SciError::Pattern(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Ja2SciError>;
