//! Scientific name extraction from wikitext
//!
//! Japanese Wikipedia articles about organisms carry a taxobox whose `学名`
//! (scientific name) parameter holds the Latin name. Editors write it in a
//! few recurring shapes, which are tried in a fixed order:
//!
//! 1. **Quoted emphasis**: `学名 = ''Vulpes vulpes''`
//! 2. **Single-argument template**: `学名 = {{Snamei|Vulpes vulpes}}`
//! 3. **Multi-argument template family**: `学名 = {{Sname|Vulpes vulpes|Linnaeus, 1758}}`
//!
//! The first shape that matches wins, regardless of where in the document
//! the other shapes appear. Apostrophe runs must have the same length on
//! both sides of the name, which needs a backreference, so the matchers use
//! `fancy_regex`. This is not a wikitext parser: template arguments end at
//! the first `|` or `}`. As in MediaWiki, the first letter of a template
//! name is case-insensitive.

use crate::config::RedirectMode;
use crate::error::Result;
use crate::query::DocumentResponse;
use fancy_regex::Regex;
use tracing::{trace, warn};

/// Field label plus the assignment, e.g. `| 学名 = `
const FIELD: &str = r"学名[ \t]*=[ \t]*";

/// Optional apostrophe run (`''`, `'''`, ...) captured so the closing run
/// can be required to match it exactly.
const EMPHASIS_OPEN: &str = r"(?P<q>(?:'{2,})?)";
const EMPHASIS_CLOSE: &str = r"\k<q>(?!')";

/// The name itself: no apostrophes, pipes, braces or line breaks
const NAME: &str = r"(?P<name>[^'|{}\n]+?)";

/// Outcome of scanning one query response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    Found(String),
    /// The queried title is not canonical; resolve this title instead
    Redirect(String),
    /// The page exists but has no scientific name field
    NotFound,
    /// The queried title does not exist
    NoSuchPage,
}

/// The shapes of `学名` values understood by the extractor, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherKind {
    QuotedEmphasis,
    SingleTemplate,
    MultiTemplate,
}

impl MatcherKind {
    pub fn name(&self) -> &'static str {
        match self {
            MatcherKind::QuotedEmphasis => "quoted emphasis",
            MatcherKind::SingleTemplate => "Snamei template",
            MatcherKind::MultiTemplate => "Sname template family",
        }
    }

    fn pattern(&self) -> String {
        match self {
            MatcherKind::QuotedEmphasis => {
                format!(r"{FIELD}(?P<q>'{{2,}}){NAME}{EMPHASIS_CLOSE}")
            }
            MatcherKind::SingleTemplate => format!(
                r"{FIELD}\{{\{{[ \t]*[Ss]namei[ \t]*\|[ \t]*{EMPHASIS_OPEN}{NAME}{EMPHASIS_CLOSE}[ \t]*\}}\}}"
            ),
            MatcherKind::MultiTemplate => format!(
                r"{FIELD}\{{\{{[ \t]*[Ss]name[a-z]*[ \t]*\|[ \t]*{EMPHASIS_OPEN}{NAME}{EMPHASIS_CLOSE}[ \t]*(?:\|[^{{}}]*)?\}}\}}"
            ),
        }
    }
}

const MATCHER_ORDER: [MatcherKind; 3] = [
    MatcherKind::QuotedEmphasis,
    MatcherKind::SingleTemplate,
    MatcherKind::MultiTemplate,
];

struct Matcher {
    kind: MatcherKind,
    regex: Regex,
}

/// Turns a flattened query response into an [`ExtractionResult`]
pub struct Extractor {
    mode: RedirectMode,
    matchers: Vec<Matcher>,
    redirect_marker: regex::Regex,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("mode", &self.mode)
            .field(
                "matchers",
                &self.matchers.iter().map(|m| m.kind).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Extractor {
    /// Compile the matchers
    ///
    /// `mode` decides where redirects are read from: the response's redirect
    /// metadata for [`RedirectMode::Server`], a leading `#REDIRECT [[...]]`
    /// marker in the page body for [`RedirectMode::Client`].
    pub fn new(mode: RedirectMode) -> Result<Self> {
        let matchers = MATCHER_ORDER
            .iter()
            .map(|kind| {
                Ok(Matcher {
                    kind: *kind,
                    regex: Regex::new(&kind.pattern())?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let redirect_marker =
            regex::Regex::new(r"(?i)\A\s*[#＃](?:REDIRECT|転送|リダイレクト)\s*:?\s*\[\[([^\]|#]+)")
            .map_err(|e| crate::error::Ja2SciError::Pattern(e.to_string()))?;

        Ok(Self {
            mode,
            matchers,
            redirect_marker,
        })
    }

    pub fn mode(&self) -> RedirectMode {
        self.mode
    }

    /// Classify one query response
    ///
    /// # Arguments
    ///
    /// * `document` - The page the query landed on
    /// * `source_title` - The title that was queried, used for tracing only
    ///
    /// # Returns
    ///
    /// * `NoSuchPage` - the title does not exist
    /// * `Redirect(target)` - the page redirects elsewhere
    /// * `Found(name)` / `NotFound` - result of scanning the body
    pub fn extract(&self, document: &DocumentResponse, source_title: &str) -> Result<ExtractionResult> {
        if !document.found {
            trace!("'{}' does not exist", source_title);
            return Ok(ExtractionResult::NoSuchPage);
        }

        if let Some(target) = self.redirect_target(document) {
            trace!("'{}' redirects to '{}'", source_title, target);
            return Ok(ExtractionResult::Redirect(target));
        }

        Ok(match self.scientific_name(&document.raw_text)? {
            Some((kind, name)) => {
                trace!("'{}' matched {}: {}", source_title, kind.name(), name);
                ExtractionResult::Found(name)
            }
            None => ExtractionResult::NotFound,
        })
    }

    fn redirect_target(&self, document: &DocumentResponse) -> Option<String> {
        match self.mode {
            // The server already followed the chain; only report a redirect if
            // the page we were handed is not where the chain ends.
            RedirectMode::Server => document
                .redirected_from
                .last()
                .filter(|hop| hop.to != document.title)
                .map(|hop| hop.to.clone()),
            RedirectMode::Client => self.redirect_marker_target(&document.raw_text),
        }
    }

    /// Target of a leading redirect marker
    ///
    /// Accepts `#REDIRECT`, `#転送` and `#リダイレクト`, with a half- or
    /// full-width `#` and an optional colon before `[[Title]]`.
    pub fn redirect_marker_target(&self, text: &str) -> Option<String> {
        self.redirect_marker
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|target| !target.is_empty())
    }

    /// Scan wikitext for the `学名` field
    ///
    /// Returns the first matcher (in priority order) that yields a non-empty
    /// name, together with the name. A matcher that gives up on a pathological
    /// body (backtrack limit) is skipped rather than failing the lookup.
    pub fn scientific_name(&self, text: &str) -> Result<Option<(MatcherKind, String)>> {
        for matcher in &self.matchers {
            for caps in matcher.regex.captures_iter(text) {
                let caps = match caps {
                    Ok(caps) => caps,
                    Err(e) => {
                        warn!("{} matcher abandoned: {}", matcher.kind.name(), e);
                        break;
                    }
                };
                let name = caps.name("name").map(|m| m.as_str().trim()).unwrap_or("");
                if !name.is_empty() {
                    return Ok(Some((matcher.kind, name.to_string())));
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::TitleHop;

    fn server() -> Extractor {
        Extractor::new(RedirectMode::Server).unwrap()
    }

    fn page(title: &str, body: &str) -> DocumentResponse {
        DocumentResponse {
            found: true,
            title: title.to_string(),
            raw_text: body.to_string(),
            redirected_from: Vec::new(),
        }
    }

    fn name_of(body: &str) -> Option<String> {
        server().scientific_name(body).unwrap().map(|(_, name)| name)
    }

    // ========== Quoted emphasis ==========

    #[test]
    fn test_quoted_emphasis_two_apostrophes() {
        assert_eq!(name_of("| 学名 = ''Foo bar''"), Some("Foo bar".to_string()));
    }

    #[test]
    fn test_quoted_emphasis_longer_runs() {
        assert_eq!(name_of("| 学名 = '''Foo bar'''"), Some("Foo bar".to_string()));
        assert_eq!(
            name_of("| 学名 = '''''Foo bar'''''"),
            Some("Foo bar".to_string())
        );
    }

    #[test]
    fn test_quoted_emphasis_without_spaces_around_equals() {
        assert_eq!(name_of("|学名=''Canis lupus''"), Some("Canis lupus".to_string()));
    }

    #[test]
    fn test_apostrophe_mismatch_does_not_match() {
        let extractor = server();
        let result = extractor
            .extract(&page("T", "| 学名 = '''Foo bar''\n"), "T")
            .unwrap();
        assert_eq!(result, ExtractionResult::NotFound);
    }

    #[test]
    fn test_closing_run_longer_than_opening_does_not_match() {
        assert_eq!(name_of("| 学名 = ''Foo bar'''"), None);
    }

    #[test]
    fn test_single_apostrophes_are_not_emphasis() {
        assert_eq!(name_of("| 学名 = 'Foo bar'"), None);
    }

    // ========== Single-argument template ==========

    #[test]
    fn test_single_template_plain() {
        assert_eq!(
            name_of("| 学名 = {{Snamei|Vulpes vulpes}}"),
            Some("Vulpes vulpes".to_string())
        );
    }

    #[test]
    fn test_single_template_same_result_with_or_without_emphasis() {
        let plain = name_of("| 学名 = {{Snamei|Vulpes vulpes}}");
        let wrapped = name_of("| 学名 = {{Snamei|''Vulpes vulpes''}}");
        let bold = name_of("| 学名 = {{Snamei|'''Vulpes vulpes'''}}");
        assert_eq!(plain, Some("Vulpes vulpes".to_string()));
        assert_eq!(plain, wrapped);
        assert_eq!(plain, bold);
    }

    #[test]
    fn test_single_template_mismatched_emphasis() {
        let result = server().scientific_name("| 学名 = {{Snamei|'''Vulpes vulpes''}}").unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_capture_stops_at_closing_braces() {
        // The capture must not run past the template's own `}}`
        let body = "| 学名 = {{Snamei|Vulpes vulpes}} {{Sname|Other name}}";
        let (kind, name) = server().scientific_name(body).unwrap().unwrap();
        assert_eq!(kind, MatcherKind::SingleTemplate);
        assert_eq!(name, "Vulpes vulpes");
    }

    #[test]
    fn test_template_first_letter_case_insensitive() {
        assert_eq!(
            name_of("| 学名 = {{snamei|Vulpes vulpes}}"),
            Some("Vulpes vulpes".to_string())
        );
        assert_eq!(
            name_of("| 学名 = {{sname|Vulpes vulpes|Linnaeus, 1758}}"),
            Some("Vulpes vulpes".to_string())
        );
        assert_eq!(name_of("| 学名 = {{SNAMEI|Vulpes vulpes}}"), None);
    }

    // ========== Multi-argument template family ==========

    #[test]
    fn test_multi_template_first_argument() {
        let (kind, name) = server()
            .scientific_name("| 学名 = {{Sname|Vulpes vulpes|Linnaeus, 1758}}")
            .unwrap()
            .unwrap();
        assert_eq!(kind, MatcherKind::MultiTemplate);
        assert_eq!(name, "Vulpes vulpes");
    }

    #[test]
    fn test_multi_template_family_members() {
        assert_eq!(
            name_of("| 学名 = {{Snameit|''Canis lupus''|Linnaeus|1758}}"),
            Some("Canis lupus".to_string())
        );
        assert_eq!(
            name_of("| 学名 = {{Snamei|Canis lupus|Linnaeus, 1758}}"),
            Some("Canis lupus".to_string())
        );
        assert_eq!(name_of("| 学名 = {{Sname|Canis lupus}}"), Some("Canis lupus".to_string()));
    }

    #[test]
    fn test_multi_template_empty_first_argument_is_skipped() {
        assert_eq!(name_of("| 学名 = {{Sname||Canis lupus}}"), None);
    }

    // ========== Ordering ==========

    #[test]
    fn test_quoted_emphasis_wins_over_template() {
        // The template appears first in the document, but quoted emphasis is tried first
        let body = "| 学名 = {{Snamei|Template name}}\n| 学名 = ''Emphasis name''\n";
        let (kind, name) = server().scientific_name(body).unwrap().unwrap();
        assert_eq!(kind, MatcherKind::QuotedEmphasis);
        assert_eq!(name, "Emphasis name");
    }

    #[test]
    fn test_single_template_wins_over_family() {
        let body = "| 学名 = {{Sname|Family name|Author}}\n| 学名 = {{Snamei|Single name}}\n";
        let (kind, name) = server().scientific_name(body).unwrap().unwrap();
        assert_eq!(kind, MatcherKind::SingleTemplate);
        assert_eq!(name, "Single name");
    }

    #[test]
    fn test_pathological_body_is_not_an_error() {
        let body = "| 学名 = ''".repeat(100_000);
        assert_eq!(server().scientific_name(&body).unwrap(), None);
        assert_eq!(
            server().extract(&page("T", &body), "T").unwrap(),
            ExtractionResult::NotFound
        );
    }

    // ========== Whole-document classification ==========

    #[test]
    fn test_realistic_taxobox() {
        let body = "{{生物分類表\n| 名称 = ニホンオオカミ\n| 画像 = [[ファイル:Canis lupus hodophilax.jpg|250px]]\n\
                    | 界 = [[動物界]] Animalia\n| 亜種 = '''ニホンオオカミ''' ''C. l. hodophilax''\n\
                    | 学名 = ''Canis lupus hodophilax''<br />([[コンラート・ヤコブ・テミンク|Temminck]], 1839)\n}}\n\
                    '''ニホンオオカミ'''は...";
        let result = server().extract(&page("ニホンオオカミ", body), "ニホンオオカミ").unwrap();
        assert_eq!(result, ExtractionResult::Found("Canis lupus hodophilax".to_string()));
    }

    #[test]
    fn test_page_without_field() {
        let result = server()
            .extract(&page("日本", "'''日本'''は東アジアの国。"), "日本")
            .unwrap();
        assert_eq!(result, ExtractionResult::NotFound);
    }

    #[test]
    fn test_missing_page() {
        let doc = DocumentResponse {
            found: false,
            title: "存在しない".to_string(),
            raw_text: String::new(),
            redirected_from: Vec::new(),
        };
        assert_eq!(
            server().extract(&doc, "存在しない").unwrap(),
            ExtractionResult::NoSuchPage
        );
    }

    // ========== Redirects ==========

    #[test]
    fn test_server_mode_trusts_completed_chain() {
        let mut doc = page("アカギツネ", "| 学名 = ''Vulpes vulpes''");
        doc.redirected_from = vec![TitleHop::new("キツネ", "アカギツネ")];
        assert_eq!(
            server().extract(&doc, "キツネ").unwrap(),
            ExtractionResult::Found("Vulpes vulpes".to_string())
        );
    }

    #[test]
    fn test_server_mode_reports_unfinished_chain() {
        let mut doc = page("キツネ", "#REDIRECT [[アカギツネ]]");
        doc.redirected_from = vec![TitleHop::new("狐", "キツネ"), TitleHop::new("キツネ", "アカギツネ")];
        assert_eq!(
            server().extract(&doc, "狐").unwrap(),
            ExtractionResult::Redirect("アカギツネ".to_string())
        );
    }

    #[test]
    fn test_server_mode_ignores_body_marker() {
        let doc = page("キツネ", "#REDIRECT [[アカギツネ]]");
        assert_eq!(server().extract(&doc, "キツネ").unwrap(), ExtractionResult::NotFound);
    }

    #[test]
    fn test_client_mode_reads_body_marker() {
        let client = Extractor::new(RedirectMode::Client).unwrap();
        assert_eq!(
            client.extract(&page("キツネ", "#REDIRECT [[アカギツネ]]"), "キツネ").unwrap(),
            ExtractionResult::Redirect("アカギツネ".to_string())
        );
        assert_eq!(
            client.extract(&page("狐", "#転送 [[キツネ#語源]]"), "狐").unwrap(),
            ExtractionResult::Redirect("キツネ".to_string())
        );
        assert_eq!(
            client.extract(&page("x", "  #redirect[[Vulpes]]\n[[Category:x]]"), "x").unwrap(),
            ExtractionResult::Redirect("Vulpes".to_string())
        );
        for body in [
            "#リダイレクト [[アカギツネ]]",
            "＃転送 [[アカギツネ]]",
            "＃リダイレクト[[アカギツネ]]",
            "#REDIRECT:[[アカギツネ]]",
            "#転送 : [[アカギツネ]]",
        ] {
            assert_eq!(
                client.redirect_marker_target(body).as_deref(),
                Some("アカギツネ"),
                "{}",
                body
            );
        }
    }

    #[test]
    fn test_client_mode_marker_must_lead() {
        let client = Extractor::new(RedirectMode::Client).unwrap();
        assert_eq!(client.redirect_marker_target("本文\n#REDIRECT [[X]]"), None);
    }
}
