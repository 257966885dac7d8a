//! Resolver configuration
//!
//! Defaults target the Japanese Wikipedia API. Every field can be overridden
//! from the environment with [`ResolverConfig::from_env`].

use crate::error::{Ja2SciError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://ja.wikipedia.org/w/api.php";
pub const DEFAULT_MAX_REDIRECTS: usize = 5;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How redirects between encyclopedia pages are followed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RedirectMode {
    /// Ask the API to resolve redirects (`redirects=1`) and trust the
    /// redirect chain it reports.
    #[default]
    Server,
    /// Fetch each page as-is and follow `#REDIRECT [[...]]` markers found in
    /// the page body, one request per hop.
    Client,
}

impl std::str::FromStr for RedirectMode {
    type Err = Ja2SciError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "server" => Ok(RedirectMode::Server),
            "client" => Ok(RedirectMode::Client),
            other => Err(Ja2SciError::Config(format!(
                "Unknown redirect mode '{}' (expected 'server' or 'client')",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Base URL of the MediaWiki `api.php` endpoint
    pub endpoint: String,
    pub redirect_mode: RedirectMode,
    /// Maximum number of redirect hops before giving up
    pub max_redirects: usize,
    /// Per-attempt timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            redirect_mode: RedirectMode::Server,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            user_agent: concat!("ja2sci/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ResolverConfig {
    /// Build a configuration from defaults overlaid with environment variables
    ///
    /// Recognised variables:
    ///
    /// * `JA2SCI_ENDPOINT` - API endpoint URL
    /// * `JA2SCI_REDIRECT_MODE` - `server` or `client`
    /// * `JA2SCI_MAX_REDIRECTS` - hop limit
    /// * `JA2SCI_TIMEOUT_SECS` - per-attempt timeout, `0` disables it
    ///
    /// # Errors
    ///
    /// Returns [`Ja2SciError::Config`] when a variable is set to a value that
    /// cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(mut self, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = var("JA2SCI_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(mode) = var("JA2SCI_REDIRECT_MODE") {
            self.redirect_mode = mode.parse()?;
        }
        if let Some(hops) = var("JA2SCI_MAX_REDIRECTS") {
            self.max_redirects = hops.trim().parse().map_err(|e| {
                Ja2SciError::Config(format!("Invalid JA2SCI_MAX_REDIRECTS '{}': {}", hops, e))
            })?;
        }
        if let Some(secs) = var("JA2SCI_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|e| {
                Ja2SciError::Config(format!("Invalid JA2SCI_TIMEOUT_SECS '{}': {}", secs, e))
            })?;
            self.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(Ja2SciError::Config("Endpoint cannot be empty".to_string()));
        }
        if self.user_agent.trim().is_empty() {
            return Err(Ja2SciError::Config("User agent cannot be empty".to_string()));
        }
        Ok(())
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_redirect_mode(mut self, mode: RedirectMode) -> Self {
        self.redirect_mode = mode;
        self
    }

    pub fn with_max_redirects(mut self, hops: usize) -> Self {
        self.max_redirects = hops;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}
