use crate::error::{Ja2SciError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Dictionary shipped with the crate, embedded at build time so an installed
/// binary does not depend on the source tree
const BUNDLED_DICTIONARY: &str = include_str!("../dictionary/ja2sci.json");

/// Label reported in load errors for the embedded dictionary
const BUNDLED_LABEL: &str = "<bundled>/ja2sci.json";

/// Immutable mapping from Japanese names to scientific names.
///
/// Keys are matched exactly as given: no whitespace trimming, width folding
/// or Unicode normalization happens anywhere in the lookup path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameMapping(HashMap<String, String>);

impl NameMapping {
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        entries.into_iter().collect()
    }

    /// Load the dictionary shipped with the crate
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_DICTIONARY, Path::new(BUNDLED_LABEL))
    }

    /// Load a mapping from a JSON file
    ///
    /// The JSON file should have the following structure:
    /// ```json
    /// {
    ///     "@metadata": { ... },  // Ignored
    ///     "ニホンオオカミ": "Canis lupus hodophilax",
    ///     "キタキツネ": "Vulpes vulpes schrencki"
    /// }
    /// ```
    ///
    /// Keys starting with `@` are skipped, as are entries whose value is not a
    /// non-empty string.
    ///
    /// # Errors
    /// - File not found or unreadable
    /// - Invalid JSON
    /// - Root is not an object
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Ja2SciError::MappingLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_json(&content, path)
    }

    /// Parse dictionary JSON already in memory; `source` only labels errors
    /// and log lines
    pub fn from_json(content: &str, source: &Path) -> Result<Self> {
        let load_error = |reason: String| Ja2SciError::MappingLoad {
            path: source.to_path_buf(),
            reason,
        };

        let json: Value =
            serde_json::from_str(content).map_err(|e| load_error(format!("invalid JSON: {}", e)))?;
        let obj = json
            .as_object()
            .ok_or_else(|| load_error("root must be an object".to_string()))?;

        let mut entries = HashMap::with_capacity(obj.len());
        for (key, value) in obj {
            if key.starts_with('@') {
                continue;
            }
            match value.as_str() {
                Some(name) if !name.is_empty() => {
                    entries.insert(key.clone(), name.to_string());
                }
                _ => warn!("Entry '{}' is not a non-empty string, skipping", key),
            }
        }

        debug!("Loaded {} names from {}", entries.len(), source.display());
        Ok(NameMapping(entries))
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for NameMapping
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        NameMapping(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .filter(|(_, v): &(String, String)| !v.is_empty())
                .collect(),
        )
    }
}
