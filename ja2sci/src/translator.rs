//! Japanese name → scientific name translation
//!
//! [`Translator`] consults the offline [`NameMapping`] first and only falls
//! back to the encyclopedia when the name is not in it. Every "not found"
//! along the way collapses into `Ok(None)`; only I/O and decoding failures
//! are returned as errors.
//!
//! # Example
//!
//! ```ignore
//! use ja2sci::{NameMapping, ResolverConfig, Translator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let translator = Translator::with_wikipedia(NameMapping::bundled()?, ResolverConfig::default())?;
//!     let name = translator.translate_async("ニホンオオカミ", false).await?;
//!     println!("{:?}", name); // Some("Canis lupus hodophilax")
//!     Ok(())
//! }
//! ```

use crate::config::ResolverConfig;
use crate::dictionary::NameMapping;
use crate::error::Result;
use crate::resolver::{
    AsyncFetch, BlockingWikipediaClient, Fetch, Outcome, ResolvedPage, Resolver, WikipediaClient,
};
use std::sync::Arc;

/// Emit at `info` when diagnostics were requested, `debug` otherwise
macro_rules! diagnostic {
    ($enabled:expr, $($arg:tt)+) => {
        if $enabled {
            tracing::info!($($arg)+);
        } else {
            tracing::debug!($($arg)+);
        }
    };
}

pub struct Translator<F> {
    mapping: Arc<NameMapping>,
    resolver: Resolver<F>,
}

impl<F> Translator<F> {
    pub fn new(mapping: impl Into<Arc<NameMapping>>, resolver: Resolver<F>) -> Self {
        Self {
            mapping: mapping.into(),
            resolver,
        }
    }

    pub fn mapping(&self) -> &NameMapping {
        &self.mapping
    }

    pub fn resolver(&self) -> &Resolver<F> {
        &self.resolver
    }

    /// Offline stage only; never touches the network
    pub fn lookup_offline(&self, name: &str) -> Option<&str> {
        self.mapping.lookup(name)
    }

    fn offline(&self, name: &str, debug_logging: bool) -> Option<String> {
        let hit = self.mapping.lookup(name).map(str::to_string);
        diagnostic!(
            debug_logging,
            "Offline lookup for '{}': {}",
            name,
            hit.as_deref().unwrap_or("miss")
        );
        hit
    }

    fn settle(&self, page: ResolvedPage, debug_logging: bool) -> Option<String> {
        let found = page.body.is_some();
        diagnostic!(
            debug_logging,
            "Page for '{}' {} (final title '{}', {} request(s))",
            page.requested,
            if found { "found" } else { "not found" },
            page.title,
            page.requests
        );
        if !page.redirects.is_empty() {
            let chain = page
                .redirects
                .iter()
                .map(|hop| format!("{} -> {}", hop.from, hop.to))
                .collect::<Vec<_>>()
                .join(", ");
            diagnostic!(debug_logging, "Redirects followed: {}", chain);
        }
        if let Some(body) = &page.body {
            diagnostic!(debug_logging, "Document body of '{}':\n{}", page.title, body);
        }

        match page.outcome {
            Outcome::Found(name) => {
                diagnostic!(debug_logging, "Scientific name field located: {}", name);
                Some(name)
            }
            Outcome::NotFound => {
                diagnostic!(debug_logging, "No scientific name field in '{}'", page.title);
                None
            }
            Outcome::NoSuchPage => None,
        }
    }
}

impl<F: Fetch> Translator<F> {
    /// Translate `name`, blocking on the network when the offline mapping misses
    ///
    /// # Arguments
    ///
    /// * `name` - Japanese name, matched exactly as given
    /// * `debug_logging` - Promote resolution diagnostics to `info` level
    ///
    /// # Returns
    ///
    /// * `Ok(Some(name))` - the scientific name
    /// * `Ok(None)` - no translation found offline or online
    /// * `Err(_)` - network, decoding, timeout or redirect-limit failure
    pub fn translate(&self, name: &str, debug_logging: bool) -> Result<Option<String>> {
        if let Some(hit) = self.offline(name, debug_logging) {
            return Ok(Some(hit));
        }
        let page = self.resolver.resolve(name)?;
        Ok(self.settle(page, debug_logging))
    }
}

impl<F: AsyncFetch> Translator<F> {
    /// Same contract as [`Translator::translate`], suspending the task instead
    /// of the thread while the remote lookup runs
    pub async fn translate_async(&self, name: &str, debug_logging: bool) -> Result<Option<String>> {
        if let Some(hit) = self.offline(name, debug_logging) {
            return Ok(Some(hit));
        }
        let page = self.resolver.resolve_async(name).await?;
        Ok(self.settle(page, debug_logging))
    }
}

impl Translator<WikipediaClient> {
    pub fn with_wikipedia(
        mapping: impl Into<Arc<NameMapping>>,
        config: ResolverConfig,
    ) -> Result<Self> {
        let client = WikipediaClient::new(&config)?;
        Ok(Self::new(mapping, Resolver::new(client, config)?))
    }
}

impl Translator<BlockingWikipediaClient> {
    pub fn with_blocking_wikipedia(
        mapping: impl Into<Arc<NameMapping>>,
        config: ResolverConfig,
    ) -> Result<Self> {
        let client = BlockingWikipediaClient::new(&config)?;
        Ok(Self::new(mapping, Resolver::new(client, config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Ja2SciError;
    use crate::resolver::MockFetcher;

    fn translator(fetcher: MockFetcher) -> Translator<MockFetcher> {
        let mapping = NameMapping::from_entries([("ニホンオオカミ", "Canis lupus hodophilax")]);
        Translator::new(mapping, Resolver::new(fetcher, ResolverConfig::default()).unwrap())
    }

    #[test]
    fn test_offline_hit_skips_network() {
        let t = translator(MockFetcher::new());
        assert_eq!(
            t.translate("ニホンオオカミ", false).unwrap(),
            Some("Canis lupus hodophilax".to_string())
        );
        assert_eq!(t.resolver().fetcher().call_count(), 0);
    }

    #[test]
    fn test_offline_miss_goes_online() {
        let t = translator(MockFetcher::new().with_page("キツネ", "| 学名 = {{Snamei|Vulpes vulpes}}"));
        assert_eq!(
            t.translate("キツネ", false).unwrap(),
            Some("Vulpes vulpes".to_string())
        );
        assert_eq!(t.resolver().fetcher().call_count(), 1);
    }

    #[test]
    fn test_not_found_and_no_such_page_are_absent() {
        let t = translator(MockFetcher::new().with_page("日本", "国"));
        assert_eq!(t.translate("日本", false).unwrap(), None);
        assert_eq!(t.translate("ツチノコ", false).unwrap(), None);
    }

    #[test]
    fn test_debug_logging_does_not_change_result() {
        let t = translator(
            MockFetcher::new()
                .with_page("アカギツネ", "| 学名 = ''Vulpes vulpes''")
                .with_redirect("キツネ", "アカギツネ"),
        );
        for name in ["ニホンオオカミ", "キツネ", "ツチノコ"] {
            assert_eq!(
                t.translate(name, true).unwrap(),
                t.translate(name, false).unwrap()
            );
        }
    }

    #[test]
    fn test_network_failure_is_an_error() {
        let t = translator(MockFetcher::failing("unreachable"));
        assert!(matches!(
            t.translate("キツネ", false),
            Err(Ja2SciError::Transport(_))
        ));
        // The offline path still works without the network
        assert!(t.translate("ニホンオオカミ", false).unwrap().is_some());
    }

    #[test]
    fn test_shared_mapping() {
        let mapping = Arc::new(NameMapping::from_entries([("トキ", "Nipponia nippon")]));
        let a = Translator::new(
            Arc::clone(&mapping),
            Resolver::new(MockFetcher::new(), ResolverConfig::default()).unwrap(),
        );
        let b = Translator::new(
            Arc::clone(&mapping),
            Resolver::new(MockFetcher::new(), ResolverConfig::default()).unwrap(),
        );
        assert_eq!(a.lookup_offline("トキ"), b.lookup_offline("トキ"));
        assert_eq!(Arc::strong_count(&mapping), 3);
    }

    #[tokio::test]
    async fn test_async_offline_hit_skips_network() {
        let t = translator(MockFetcher::new());
        assert_eq!(
            t.translate_async("ニホンオオカミ", true).await.unwrap(),
            Some("Canis lupus hodophilax".to_string())
        );
        assert_eq!(t.resolver().fetcher().call_count(), 0);
    }

    #[tokio::test]
    async fn test_async_matches_blocking() {
        let t = translator(
            MockFetcher::new()
                .with_page("アカギツネ", "| 学名 = {{Sname|''Vulpes vulpes''|Linnaeus, 1758}}")
                .with_redirect("キツネ", "アカギツネ"),
        );
        for name in ["ニホンオオカミ", "キツネ", "アカギツネ", "ツチノコ"] {
            assert_eq!(
                t.translate_async(name, false).await.unwrap(),
                t.translate(name, false).unwrap()
            );
        }
    }
}
