use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::text::{preprocess_text, word_count};
use crate::CoreError;

/// Placeholder bodies forum exports use for moderated or deleted comments.
const REMOVED_PLACEHOLDERS: &[&str] = &["[deleted]", "[removed]", "[ Removed by Reddit ]"];

/// One review unit as the engine sees it.
///
/// `side_effects` is append-only: the evidence selector adds a keyword each
/// time the comment matches it and nothing ever removes one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub drug_name: String,
    pub raw_text: String,
    pub cleaned_text: String,
    #[serde(default)]
    pub side_effects: Vec<String>,
}

impl CommentRecord {
    /// Build a record from raw review text, cleaning it with [`preprocess_text`].
    #[must_use]
    pub fn new(drug_name: impl Into<String>, raw_text: impl Into<String>) -> Self {
        let raw_text = raw_text.into();
        let cleaned_text = preprocess_text(&raw_text);
        Self {
            drug_name: drug_name.into(),
            raw_text,
            cleaned_text,
            side_effects: Vec::new(),
        }
    }
}

/// A review row as it arrives from an export.
///
/// Accepts both snake-case keys and the column names of the review CSV exports
/// (`Drug Name`, `Review Text`, `cleaned_comments`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewRecord {
    #[serde(default, alias = "Drug Name")]
    pub drug_name: Option<String>,
    #[serde(default, alias = "Review Text")]
    pub review_text: Option<String>,
    #[serde(default, alias = "cleaned_comments")]
    pub cleaned_text: Option<String>,
}

/// Convert raw review rows into comment records.
///
/// Rows whose text is a moderation placeholder are dropped. Rows without a
/// cleaned text get one from [`preprocess_text`].
///
/// # Errors
///
/// Returns [`CoreError::MalformedRecord`] for the first row with a missing or
/// blank drug name or review text.
pub fn records_from_reviews(reviews: Vec<ReviewRecord>) -> Result<Vec<CommentRecord>, CoreError> {
    let mut records = Vec::with_capacity(reviews.len());

    for (index, review) in reviews.into_iter().enumerate() {
        let drug_name = review
            .drug_name
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .ok_or(CoreError::MalformedRecord {
                index,
                field: "drug_name",
            })?;
        let raw_text = review
            .review_text
            .filter(|t| !t.trim().is_empty())
            .ok_or(CoreError::MalformedRecord {
                index,
                field: "review_text",
            })?;

        if REMOVED_PLACEHOLDERS.contains(&raw_text.trim()) {
            continue;
        }

        let cleaned_text = review
            .cleaned_text
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| preprocess_text(&raw_text));

        records.push(CommentRecord {
            drug_name,
            raw_text,
            cleaned_text,
            side_effects: Vec::new(),
        });
    }

    Ok(records)
}

/// Parse a JSON array of review rows into comment records.
///
/// # Errors
///
/// Returns [`CoreError::ReviewsParse`] for invalid JSON and
/// [`CoreError::MalformedRecord`] for rows missing required fields.
pub fn parse_reviews_json(json: &str) -> Result<Vec<CommentRecord>, CoreError> {
    let reviews: Vec<ReviewRecord> = serde_json::from_str(json)?;
    records_from_reviews(reviews)
}

/// Read and parse a JSON review export.
///
/// # Errors
///
/// Returns [`CoreError::ReviewsIo`] if the file cannot be read, otherwise the
/// errors of [`parse_reviews_json`].
pub fn load_reviews(path: &Path) -> Result<Vec<CommentRecord>, CoreError> {
    let content = std::fs::read_to_string(path).map_err(|e| CoreError::ReviewsIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_reviews_json(&content)
}

/// Keep only records whose cleaned text has more than `min_words` words.
///
/// `min_words == 0` keeps everything, including empty cleaned texts.
#[must_use]
pub fn retain_long_comments(records: Vec<CommentRecord>, min_words: usize) -> Vec<CommentRecord> {
    if min_words == 0 {
        return records;
    }
    records
        .into_iter()
        .filter(|r| word_count(&r.cleaned_text) > min_words)
        .collect()
}

/// Unique drug names in first-seen order.
#[must_use]
pub fn drug_names(records: &[CommentRecord]) -> Vec<String> {
    group_by_drug(records)
        .into_iter()
        .map(|(drug, _)| drug)
        .collect()
}

/// Record indices grouped by drug name.
///
/// Drugs appear in first-seen order and each index list keeps input order.
#[must_use]
pub fn group_by_drug(records: &[CommentRecord]) -> Vec<(String, Vec<usize>)> {
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    let mut slot_by_drug: HashMap<&str, usize> = HashMap::new();

    for (index, record) in records.iter().enumerate() {
        if let Some(&slot) = slot_by_drug.get(record.drug_name.as_str()) {
            groups[slot].1.push(index);
        } else {
            slot_by_drug.insert(record.drug_name.as_str(), groups.len());
            groups.push((record.drug_name.clone(), vec![index]));
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(drug: Option<&str>, text: Option<&str>) -> ReviewRecord {
        ReviewRecord {
            drug_name: drug.map(ToString::to_string),
            review_text: text.map(ToString::to_string),
            cleaned_text: None,
        }
    }

    #[test]
    fn records_are_cleaned_on_ingest() {
        let records =
            records_from_reviews(vec![review(Some("adderall"), Some("Bad Headache!!"))]).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cleaned_text, "bad headache");
        assert_eq!(records[0].raw_text, "Bad Headache!!");
        assert!(records[0].side_effects.is_empty());
    }

    #[test]
    fn provided_cleaned_text_is_kept() {
        let mut row = review(Some("ritalin"), Some("Raw text."));
        row.cleaned_text = Some("already clean".to_string());
        let records = records_from_reviews(vec![row]).unwrap();
        assert_eq!(records[0].cleaned_text, "already clean");
    }

    #[test]
    fn missing_drug_name_is_malformed() {
        let result = records_from_reviews(vec![
            review(Some("adderall"), Some("fine")),
            review(Some("  "), Some("text")),
        ]);
        assert!(matches!(
            result,
            Err(CoreError::MalformedRecord {
                index: 1,
                field: "drug_name"
            })
        ));
    }

    #[test]
    fn missing_review_text_is_malformed() {
        let result = records_from_reviews(vec![review(Some("adderall"), None)]);
        assert!(matches!(
            result,
            Err(CoreError::MalformedRecord {
                index: 0,
                field: "review_text"
            })
        ));
    }

    #[test]
    fn removed_placeholders_are_dropped() {
        let records = records_from_reviews(vec![
            review(Some("vyvanse"), Some("[deleted]")),
            review(Some("vyvanse"), Some("[ Removed by Reddit ]")),
            review(Some("vyvanse"), Some("made me jittery")),
        ])
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cleaned_text, "made me jittery");
    }

    #[test]
    fn parse_accepts_export_column_names() {
        let json = r#"[
            {"Drug Name": "concerta", "Review Text": "Dry mouth all day"},
            {"drug_name": "strattera", "review_text": "Nausea", "cleaned_text": "nausea"}
        ]"#;
        let records = parse_reviews_json(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].drug_name, "concerta");
        assert_eq!(records[0].cleaned_text, "dry mouth all day");
        assert_eq!(records[1].drug_name, "strattera");
    }

    #[test]
    fn parse_rejects_invalid_json() {
        assert!(matches!(
            parse_reviews_json("{not json"),
            Err(CoreError::ReviewsParse(_))
        ));
    }

    #[test]
    fn short_comments_are_filtered() {
        let records = vec![
            CommentRecord::new("a", "one two three"),
            CommentRecord::new("a", "one two three four five"),
        ];
        let kept = retain_long_comments(records, 3);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].cleaned_text, "one two three four five");
    }

    #[test]
    fn zero_min_words_keeps_everything() {
        let records = vec![CommentRecord::new("a", ""), CommentRecord::new("a", "x")];
        assert_eq!(retain_long_comments(records, 0).len(), 2);
    }

    #[test]
    fn drugs_are_listed_in_first_seen_order() {
        let records = vec![
            CommentRecord::new("ritalin", "a"),
            CommentRecord::new("adderall", "b"),
            CommentRecord::new("ritalin", "c"),
        ];
        assert_eq!(drug_names(&records), vec!["ritalin", "adderall"]);
    }

    #[test]
    fn group_by_drug_keeps_input_order() {
        let records = vec![
            CommentRecord::new("A", "1"),
            CommentRecord::new("B", "2"),
            CommentRecord::new("A", "3"),
        ];
        let groups = group_by_drug(&records);
        assert_eq!(
            groups,
            vec![("A".to_string(), vec![0, 2]), ("B".to_string(), vec![1])]
        );
    }
}
