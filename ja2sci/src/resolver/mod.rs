//! Remote resolution of taxon names against the encyclopedia
//!
//! The resolution algorithm lives in [`Resolution`], a small state machine
//! that hands out the next [`PageQuery`] and consumes the matching
//! [`QueryResponse`]. It never performs I/O itself. [`Resolver::resolve`]
//! drives it with a blocking [`Fetch`] implementation and
//! [`Resolver::resolve_async`] with an [`AsyncFetch`] implementation, so
//! both concurrency models share the same redirect handling and produce the
//! same results for the same remote state.
//!
//! # Example
//!
//! ```ignore
//! use ja2sci::{Resolver, ResolverConfig, WikipediaClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ResolverConfig::default();
//!     let resolver = Resolver::new(WikipediaClient::new(&config)?, config)?;
//!     let page = resolver.resolve_async("アカギツネ").await?;
//!     println!("{:?}", page.outcome);
//!     Ok(())
//! }
//! ```

pub mod mock;
pub mod wikipedia;

use crate::config::{RedirectMode, ResolverConfig};
use crate::error::{Ja2SciError, Result};
use crate::extractor::{ExtractionResult, Extractor};
use crate::query::{DocumentResponse, PageQuery, QueryResponse, TitleHop};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

pub use mock::MockFetcher;
pub use wikipedia::{BlockingWikipediaClient, WikipediaClient};

/// Blocking fetch capability: one HTTP round trip on the calling thread
pub trait Fetch {
    fn fetch(&self, query: &PageQuery) -> Result<QueryResponse>;

    /// Name used in logs to identify the backend
    fn fetcher_name(&self) -> &str;
}

/// Non-blocking fetch capability: suspends the calling task, not the thread
#[async_trait]
pub trait AsyncFetch: Send + Sync {
    async fn fetch(&self, query: &PageQuery) -> Result<QueryResponse>;

    fn fetcher_name(&self) -> &str;
}

/// Final classification of a title, after all redirects were followed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Found(String),
    NotFound,
    NoSuchPage,
}

impl From<Outcome> for ExtractionResult {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Found(name) => ExtractionResult::Found(name),
            Outcome::NotFound => ExtractionResult::NotFound,
            Outcome::NoSuchPage => ExtractionResult::NoSuchPage,
        }
    }
}

/// Result of resolving one title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPage {
    /// Title originally asked for
    pub requested: String,
    /// Title of the page the resolution ended on
    pub title: String,
    /// Every redirect hop followed, server-side and client-side alike
    pub redirects: Vec<TitleHop>,
    /// Raw wikitext of the final page, when it exists
    pub body: Option<String>,
    pub outcome: Outcome,
    /// Number of round trips made
    pub requests: usize,
}

impl ResolvedPage {
    pub fn scientific_name(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Found(name) => Some(name),
            _ => None,
        }
    }
}

/// Redirect-following state for a single title
///
/// Call [`query`](Self::query), perform the request however the caller
/// likes, and feed the response to [`advance`](Self::advance) until it
/// returns a [`ResolvedPage`].
#[derive(Debug)]
pub struct Resolution<'a> {
    extractor: &'a Extractor,
    max_redirects: usize,
    timeout: Option<Duration>,
    requested: String,
    current: String,
    visited: Vec<String>,
    chain: Vec<TitleHop>,
    requests: usize,
}

impl<'a> Resolution<'a> {
    pub fn new(extractor: &'a Extractor, config: &ResolverConfig, title: &str) -> Self {
        Self {
            extractor,
            max_redirects: config.max_redirects,
            timeout: config.timeout,
            requested: title.to_string(),
            current: title.to_string(),
            visited: vec![title.to_string()],
            chain: Vec::new(),
            requests: 0,
        }
    }

    /// The request to issue next
    pub fn query(&self) -> PageQuery {
        PageQuery {
            title: self.current.clone(),
            resolve_redirects: self.extractor.mode() == RedirectMode::Server,
            timeout: self.timeout,
        }
    }

    pub fn current_title(&self) -> &str {
        &self.current
    }

    /// Consume the response to the last [`query`](Self::query)
    ///
    /// Returns `Ok(None)` when a redirect has to be followed with another
    /// request, `Ok(Some(page))` once a terminal page is reached.
    ///
    /// # Errors
    ///
    /// * [`Ja2SciError::RedirectLimit`] when the hop limit is exceeded or a
    ///   title is visited twice
    /// * [`Ja2SciError::MalformedResponse`] when the response has no page
    pub fn advance(&mut self, response: QueryResponse) -> Result<Option<ResolvedPage>> {
        self.requests += 1;
        let document = response.into_document()?;

        for hop in &document.redirected_from {
            self.follow(hop.clone())?;
        }

        match self.extractor.extract(&document, &self.current)? {
            ExtractionResult::Redirect(target) => {
                let already_recorded = self
                    .chain
                    .last()
                    .is_some_and(|hop| hop.to == target && !document.redirected_from.is_empty());
                if !already_recorded {
                    self.follow(TitleHop::new(self.current.clone(), target.clone()))?;
                }
                debug!("Following redirect '{}' -> '{}'", self.current, target);
                self.current = target;
                Ok(None)
            }
            ExtractionResult::Found(name) => Ok(Some(self.finish(document, Outcome::Found(name)))),
            ExtractionResult::NotFound => Ok(Some(self.finish(document, Outcome::NotFound))),
            ExtractionResult::NoSuchPage => Ok(Some(self.finish(document, Outcome::NoSuchPage))),
        }
    }

    fn follow(&mut self, hop: TitleHop) -> Result<()> {
        if self.chain.len() >= self.max_redirects || self.visited.contains(&hop.to) {
            return Err(Ja2SciError::RedirectLimit {
                title: self.requested.clone(),
                hops: self.chain.len() + 1,
            });
        }
        self.visited.push(hop.to.clone());
        self.chain.push(hop);
        Ok(())
    }

    fn finish(&mut self, document: DocumentResponse, outcome: Outcome) -> ResolvedPage {
        ResolvedPage {
            requested: self.requested.clone(),
            title: document.title,
            redirects: std::mem::take(&mut self.chain),
            body: document.found.then_some(document.raw_text),
            outcome,
            requests: self.requests,
        }
    }
}

/// Resolves titles through a fetch capability
#[derive(Debug)]
pub struct Resolver<F> {
    fetcher: F,
    extractor: Extractor,
    config: ResolverConfig,
}

impl<F> Resolver<F> {
    pub fn new(fetcher: F, config: ResolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            fetcher,
            extractor: Extractor::new(config.redirect_mode)?,
            config,
        })
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn start(&self, title: &str) -> Resolution<'_> {
        Resolution::new(&self.extractor, &self.config, title)
    }
}

impl<F: Fetch> Resolver<F> {
    /// Resolve `title`, blocking the calling thread for each round trip
    pub fn resolve(&self, title: &str) -> Result<ResolvedPage> {
        let mut resolution = self.start(title);
        loop {
            let query = resolution.query();
            debug!("[{}] fetching '{}'", self.fetcher.fetcher_name(), query.title);
            let response = self.fetcher.fetch(&query)?;
            if let Some(page) = resolution.advance(response)? {
                return Ok(page);
            }
        }
    }
}

impl<F: AsyncFetch> Resolver<F> {
    /// Resolve `title`, suspending the calling task for each round trip
    ///
    /// Each attempt is bounded by the configured timeout. Dropping the
    /// returned future cancels the request in flight.
    pub async fn resolve_async(&self, title: &str) -> Result<ResolvedPage> {
        let mut resolution = self.start(title);
        loop {
            let query = resolution.query();
            debug!("[{}] fetching '{}'", self.fetcher.fetcher_name(), query.title);
            let response = match query.timeout {
                Some(limit) => tokio::time::timeout(limit, self.fetcher.fetch(&query))
                    .await
                    .map_err(|_| Ja2SciError::Timeout {
                        title: query.title.clone(),
                        after: limit,
                    })??,
                None => self.fetcher.fetch(&query).await?,
            };
            if let Some(page) = resolution.advance(response)? {
                return Ok(page);
            }
        }
    }
}
