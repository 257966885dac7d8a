//! In-memory encyclopedia for testing
//!
//! [`MockFetcher`] answers page queries from a table of pages and a table of
//! redirects, without network access. It behaves like the MediaWiki API in
//! both redirect modes: with `resolve_redirects` set it follows the redirect
//! table itself and reports the chain, otherwise a redirect title is served
//! as a page whose body is a `#REDIRECT [[...]]` marker.
//!
//! # Example
//!
//! ```ignore
//! use ja2sci::{MockFetcher, Resolver, ResolverConfig};
//!
//! let fetcher = MockFetcher::new()
//!     .with_page("アカギツネ", "| 学名 = ''Vulpes vulpes''")
//!     .with_redirect("キツネ", "アカギツネ");
//! let resolver = Resolver::new(fetcher, ResolverConfig::default())?;
//! assert_eq!(resolver.resolve("キツネ")?.scientific_name(), Some("Vulpes vulpes"));
//! ```

use crate::error::{Ja2SciError, Result};
use crate::query::{PageQuery, QueryResponse, TitleHop};
use crate::resolver::{AsyncFetch, Fetch};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Upper bound on redirects the simulated server follows on its own
const SERVER_REDIRECT_LIMIT: usize = 16;

#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    /// title -> (page id, wikitext)
    pages: HashMap<String, (u64, String)>,
    redirects: HashMap<String, String>,
    delay: Option<Duration>,
    failure: Option<String>,
    /// Shared between clones so tests can inspect traffic after handing the
    /// fetcher to a resolver
    requested: Arc<Mutex<Vec<String>>>,
    calls: Arc<AtomicUsize>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fetcher whose every request fails with a transport error
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_page(mut self, title: impl Into<String>, wikitext: impl Into<String>) -> Self {
        let id = self.pages.len() as u64 + 1;
        self.pages.insert(title.into(), (id, wikitext.into()));
        self
    }

    pub fn with_redirect(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.redirects.insert(from.into(), to.into());
        self
    }

    /// Simulated network latency per request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested_titles(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|titles| titles.clone())
            .unwrap_or_default()
    }

    fn record(&self, query: &PageQuery) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut titles) = self.requested.lock() {
            titles.push(query.title.clone());
        }
    }

    fn respond(&self, query: &PageQuery) -> Result<QueryResponse> {
        if let Some(message) = &self.failure {
            return Err(Ja2SciError::Transport(message.clone()));
        }

        let mut title = query.title.clone();
        let mut hops = Vec::new();
        if query.resolve_redirects {
            let mut seen = vec![title.clone()];
            while let Some(target) = self.redirects.get(&title) {
                if hops.len() >= SERVER_REDIRECT_LIMIT {
                    break;
                }
                hops.push(TitleHop::new(title.clone(), target.clone()));
                title = target.clone();
                if seen.contains(&title) {
                    break;
                }
                seen.push(title.clone());
            }
        }

        let response = match (self.pages.get(&title), self.redirects.get(&title)) {
            (Some((id, wikitext)), _) => QueryResponse::page(*id, title, wikitext.clone()),
            (None, Some(target)) => {
                let id = 10_000 + self.pages.len() as u64 + hops.len() as u64;
                QueryResponse::page(id, title, format!("#REDIRECT [[{}]]", target))
            }
            (None, None) => QueryResponse::missing(title),
        };
        Ok(response.with_redirects(hops))
    }
}

impl Fetch for MockFetcher {
    fn fetch(&self, query: &PageQuery) -> Result<QueryResponse> {
        self.record(query);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.respond(query)
    }

    fn fetcher_name(&self) -> &str {
        "Mock Encyclopedia"
    }
}

#[async_trait]
impl AsyncFetch for MockFetcher {
    async fn fetch(&self, query: &PageQuery) -> Result<QueryResponse> {
        self.record(query);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.respond(query)
    }

    fn fetcher_name(&self) -> &str {
        "Mock Encyclopedia"
    }
}
