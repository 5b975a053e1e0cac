use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Seed keywords to score and the official side-effect terms used as an
/// expansion pool.
///
/// When the file lists no seed keywords, every official term is scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    #[serde(default)]
    pub seed_keywords: Vec<String>,
    #[serde(default)]
    pub official_terms: Vec<String>,
}

/// Load and validate a vocabulary from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_vocabulary(path: &Path) -> Result<Vocabulary, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::VocabularyFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_vocabulary(&content)
}

/// Parse, normalize and validate a vocabulary from YAML text.
///
/// Terms are trimmed and lowercased.
///
/// # Errors
///
/// Returns `ConfigError` on YAML errors, blank or duplicate terms, or when
/// both lists are empty.
pub fn parse_vocabulary(yaml: &str) -> Result<Vocabulary, ConfigError> {
    let raw: Vocabulary = serde_yaml::from_str(yaml)?;

    let official_terms = normalize_list("official_terms", raw.official_terms)?;
    let mut seed_keywords = normalize_list("seed_keywords", raw.seed_keywords)?;
    if seed_keywords.is_empty() {
        seed_keywords.clone_from(&official_terms);
    }

    if seed_keywords.is_empty() {
        return Err(ConfigError::Validation(
            "vocabulary must list at least one seed keyword or official term".to_string(),
        ));
    }

    Ok(Vocabulary {
        seed_keywords,
        official_terms,
    })
}

fn normalize_list(list: &str, terms: Vec<String>) -> Result<Vec<String>, ConfigError> {
    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(terms.len());

    for term in terms {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Err(ConfigError::Validation(format!(
                "{list} must not contain blank terms"
            )));
        }
        if !seen.insert(term.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate term in {list}: '{term}'"
            )));
        }
        normalized.push(term);
    }

    Ok(normalized)
}
