//! Translate Japanese taxon names into scientific names
//!
//! Lookups go through two stages:
//!
//! 1. **Offline** - an exact-match [`NameMapping`] loaded once at start-up
//!    (the bundled dictionary, or any JSON file of the same shape).
//! 2. **Online** - the Japanese Wikipedia article of the same title, whose
//!    taxobox `学名` field is extracted with a small set of ordered pattern
//!    matchers. Redirects are followed up to a configurable hop limit.
//!
//! Both a blocking ([`Translator::translate`]) and a non-blocking
//! ([`Translator::translate_async`]) entry point are provided; they share the
//! same resolution algorithm and differ only in the fetch capability plugged
//! into the [`Resolver`].
//!
//! # Example
//!
//! ```ignore
//! use ja2sci::{NameMapping, ResolverConfig, Translator};
//!
//! let translator =
//!     Translator::with_blocking_wikipedia(NameMapping::bundled()?, ResolverConfig::from_env()?)?;
//! match translator.translate("アカギツネ", false)? {
//!     Some(name) => println!("{}", name),
//!     None => println!("None"),
//! }
//! ```

pub mod config;
pub mod dictionary;
pub mod error;
pub mod extractor;
pub mod query;
pub mod resolver;
pub mod translator;


pub use config::{RedirectMode, ResolverConfig};
pub use dictionary::NameMapping;
pub use error::{Ja2SciError, Result};
pub use extractor::{ExtractionResult, Extractor, MatcherKind};
pub use query::{DocumentResponse, PageQuery, QueryResponse, TitleHop};
pub use resolver::{
    AsyncFetch, BlockingWikipediaClient, Fetch, MockFetcher, Outcome, ResolvedPage, Resolution,
    Resolver, WikipediaClient,
};
pub use translator::Translator;
