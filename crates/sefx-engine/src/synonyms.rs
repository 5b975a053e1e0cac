//! Synonym sources for keyword expansion.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use crate::error::EngineError;

/// Maps a word to candidate related words from a lexical database.
///
/// An empty set is a valid answer and simply contributes no candidates.
pub trait SynonymSource: Send + Sync {
    fn synonyms(&self, word: &str) -> BTreeSet<String>;
}

/// A source that knows no synonyms.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSynonyms;

impl SynonymSource for NoSynonyms {
    fn synonyms(&self, _word: &str) -> BTreeSet<String> {
        BTreeSet::new()
    }
}

/// In-memory synonym lexicon.
///
/// Keys are lowercased. Lemma-style entries (`dry_mouth`) are stored with
/// spaces (`dry mouth`).
#[derive(Debug, Default, Clone)]
pub struct LexiconSynonyms {
    entries: HashMap<String, BTreeSet<String>>,
}

impl LexiconSynonyms {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add synonyms for `word`, merging with any already present.
    pub fn insert<I, S>(&mut self, word: &str, synonyms: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = self.entries.entry(normalize(word)).or_default();
        set.extend(
            synonyms
                .into_iter()
                .map(|s| normalize(s.as_ref()))
                .filter(|s| !s.is_empty()),
        );
    }

    /// Parse a YAML mapping of `word: [synonym, ...]`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SynonymsParse`] if the YAML is not such a mapping.
    pub fn from_yaml(yaml: &str) -> Result<Self, EngineError> {
        let raw: HashMap<String, Vec<String>> = serde_yaml::from_str(yaml)?;
        let mut lexicon = Self::new();
        for (word, synonyms) in raw {
            lexicon.insert(&word, synonyms);
        }
        Ok(lexicon)
    }

    /// Load a YAML lexicon file.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SynonymsIo`] if the file cannot be read, or
    /// [`EngineError::SynonymsParse`] if it cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path).map_err(|e| EngineError::SynonymsIo {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SynonymSource for LexiconSynonyms {
    fn synonyms(&self, word: &str) -> BTreeSet<String> {
        self.entries
            .get(&normalize(word))
            .cloned()
            .unwrap_or_default()
    }
}

fn normalize(term: &str) -> String {
    term.replace('_', " ").trim().to_lowercase()
}
