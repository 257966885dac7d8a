//! MediaWiki page query responses
//!
//! Models the subset of `action=query&prop=revisions&rvprop=content` output
//! that name resolution needs, in the default (`formatversion=1`) layout:
//!
//! ```json
//! {
//!   "query": {
//!     "redirects": [{ "from": "キツネ", "to": "アカギツネ" }],
//!     "pages": {
//!       "33590": {
//!         "pageid": 33590,
//!         "title": "アカギツネ",
//!         "revisions": [{ "*": "{{生物分類表 ... | 学名 = ''Vulpes vulpes'' ..." }]
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! A title that does not exist comes back under the page id `-1` with a
//! `missing` marker.

use crate::error::{Ja2SciError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// One round trip to the encyclopedia: fetch the content of `title`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub title: String,
    /// Ask the server to follow redirects before returning content
    pub resolve_redirects: bool,
    pub timeout: Option<Duration>,
}

impl PageQuery {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            resolve_redirects: true,
            timeout: None,
        }
    }

    /// Query-string parameters for the MediaWiki API
    pub fn params(&self) -> Vec<(&'static str, &str)> {
        let mut params = vec![
            ("format", "json"),
            ("action", "query"),
            ("prop", "revisions"),
            ("rvprop", "content"),
            ("titles", self.title.as_str()),
        ];
        if self.resolve_redirects {
            params.push(("redirects", "1"));
        }
        params
    }
}

/// A `from` → `to` title rewrite reported by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleHop {
    pub from: String,
    pub to: String,
}

impl TitleHop {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<QueryBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    #[serde(default)]
    pub info: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryBody {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub normalized: Vec<TitleHop>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub redirects: Vec<TitleHop>,
    #[serde(default)]
    pub pages: BTreeMap<String, Page>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pageid: Option<u64>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub revisions: Vec<Revision>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    #[serde(rename = "*", alias = "content", default)]
    pub content: Option<String>,
}

/// The page a query landed on, flattened for extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentResponse {
    /// `false` when the title does not exist on the remote service
    pub found: bool,
    pub title: String,
    pub raw_text: String,
    /// Redirect hops the server followed, in order
    pub redirected_from: Vec<TitleHop>,
}

impl QueryResponse {
    /// Response for a title that does not exist
    pub fn missing(title: impl Into<String>) -> Self {
        let page = Page {
            title: title.into(),
            missing: Some(Value::String(String::new())),
            ..Page::default()
        };
        Self::with_page("-1".to_string(), page, Vec::new())
    }

    /// Response carrying the content of an existing page
    pub fn page(pageid: u64, title: impl Into<String>, content: impl Into<String>) -> Self {
        let page = Page {
            pageid: Some(pageid),
            title: title.into(),
            revisions: vec![Revision {
                content: Some(content.into()),
            }],
            ..Page::default()
        };
        Self::with_page(pageid.to_string(), page, Vec::new())
    }

    pub fn with_redirects(mut self, redirects: Vec<TitleHop>) -> Self {
        if let Some(body) = self.query.as_mut() {
            body.redirects = redirects;
        }
        self
    }

    fn with_page(key: String, page: Page, redirects: Vec<TitleHop>) -> Self {
        let mut pages = BTreeMap::new();
        pages.insert(key, page);
        Self {
            query: Some(QueryBody {
                normalized: Vec::new(),
                redirects,
                pages,
            }),
            error: None,
        }
    }

    /// Flatten the response into the single page it describes
    ///
    /// # Errors
    ///
    /// [`Ja2SciError::MalformedResponse`] when the API reported an error, when
    /// the `query.pages` object is absent or empty, or when an existing page
    /// carries no revision content.
    pub fn into_document(self) -> Result<DocumentResponse> {
        if let Some(err) = self.error {
            return Err(Ja2SciError::MalformedResponse(format!(
                "API error {}: {}",
                err.code, err.info
            )));
        }

        let body = self.query.ok_or_else(|| {
            Ja2SciError::MalformedResponse("missing 'query' object".to_string())
        })?;

        let (key, page) = body.pages.into_iter().next().ok_or_else(|| {
            Ja2SciError::MalformedResponse("'query.pages' is empty".to_string())
        })?;

        if key.starts_with('-') || page.missing.is_some() || page.invalid.is_some() {
            return Ok(DocumentResponse {
                found: false,
                title: page.title,
                raw_text: String::new(),
                redirected_from: body.redirects,
            });
        }

        let raw_text = page
            .revisions
            .into_iter()
            .next()
            .and_then(|rev| rev.content)
            .ok_or_else(|| {
                Ja2SciError::MalformedResponse(format!(
                    "page '{}' has no revision content",
                    page.title
                ))
            })?;

        Ok(DocumentResponse {
            found: true,
            title: page.title,
            raw_text,
            redirected_from: body.redirects,
        })
    }
}
