//! Wikipedia (MediaWiki API) fetchers
//!
//! Issues `action=query&prop=revisions&rvprop=content` requests against the
//! configured `api.php` endpoint, Japanese Wikipedia by default. Two clients
//! share the request building and error mapping:
//!
//! * [`WikipediaClient`] - `reqwest::Client`, implements [`AsyncFetch`]
//! * [`BlockingWikipediaClient`] - `reqwest::blocking::Client`, implements [`Fetch`]
//!
//! The blocking client must not be used from inside an async runtime.
//!
//! # Example
//!
//! ```ignore
//! use ja2sci::{BlockingWikipediaClient, Fetch, PageQuery, ResolverConfig};
//!
//! let client = BlockingWikipediaClient::new(&ResolverConfig::default())?;
//! let response = client.fetch(&PageQuery::new("ニホンオオカミ"))?;
//! println!("{:?}", response.into_document()?.title);
//! ```

use crate::config::ResolverConfig;
use crate::error::{Ja2SciError, Result};
use crate::query::{PageQuery, QueryResponse};
use crate::resolver::{AsyncFetch, Fetch};
use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

/// Full request URL for `query` against `endpoint`
fn request_url(endpoint: &str, query: &PageQuery) -> Result<Url> {
    Url::parse_with_params(endpoint, query.params())
        .map_err(|e| Ja2SciError::Config(format!("Invalid endpoint '{}': {}", endpoint, e)))
}

/// Map a reqwest failure, keeping timeouts distinguishable
fn classify(err: reqwest::Error, query: &PageQuery) -> Ja2SciError {
    if err.is_timeout() {
        Ja2SciError::Timeout {
            title: query.title.clone(),
            after: query.timeout.unwrap_or_default(),
        }
    } else {
        Ja2SciError::Network(err)
    }
}

/// Non-blocking client for the MediaWiki query API
#[derive(Clone)]
pub struct WikipediaClient {
    client: reqwest::Client,
    endpoint: String,
}

impl WikipediaClient {
    /// Create a client for `config.endpoint`
    ///
    /// # Errors
    ///
    /// * [`Ja2SciError::Config`] if the endpoint is not a valid URL
    /// * [`Ja2SciError::Network`] if the HTTP client cannot be built
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        config.validate()?;
        Url::parse(&config.endpoint).map_err(|e| {
            Ja2SciError::Config(format!("Invalid endpoint '{}': {}", config.endpoint, e))
        })?;

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl std::fmt::Debug for WikipediaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WikipediaClient")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[async_trait]
impl AsyncFetch for WikipediaClient {
    async fn fetch(&self, query: &PageQuery) -> Result<QueryResponse> {
        let url = request_url(&self.endpoint, query)?;
        debug!("GET {}", url);

        let mut request = self.client.get(url);
        if let Some(timeout) = query.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| classify(e, query))?;
        let text = response.text().await.map_err(|e| classify(e, query))?;

        Ok(serde_json::from_str(&text)?)
    }

    fn fetcher_name(&self) -> &str {
        "Wikipedia"
    }
}

/// Blocking client for the MediaWiki query API
#[derive(Clone)]
pub struct BlockingWikipediaClient {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl BlockingWikipediaClient {
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        config.validate()?;
        Url::parse(&config.endpoint).map_err(|e| {
            Ja2SciError::Config(format!("Invalid endpoint '{}': {}", config.endpoint, e))
        })?;

        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl std::fmt::Debug for BlockingWikipediaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingWikipediaClient")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl Fetch for BlockingWikipediaClient {
    fn fetch(&self, query: &PageQuery) -> Result<QueryResponse> {
        let url = request_url(&self.endpoint, query)?;
        debug!("GET {}", url);

        let mut request = self.client.get(url);
        if let Some(timeout) = query.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| classify(e, query))?;
        let text = response.text().map_err(|e| classify(e, query))?;

        Ok(serde_json::from_str(&text)?)
    }

    fn fetcher_name(&self) -> &str {
        "Wikipedia (blocking)"
    }
}
