//! JSON persistence of a corpus run.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sefx_engine::{CorpusReport, KeywordScore};

pub(crate) const COMMENTS_FILE: &str = "comments.json";
pub(crate) const SCORES_FILE: &str = "scores.json";
pub(crate) const EVIDENCE_FILE: &str = "evidence.json";
pub(crate) const RUN_FILE: &str = "run.json";

/// Header describing one run, written next to the result files.
#[derive(Debug, Serialize)]
pub(crate) struct RunMetadata {
    pub generated_at: DateTime<Utc>,
    pub input: String,
    pub drugs: usize,
    pub comments: usize,
    pub keywords: Vec<String>,
    pub evidence: usize,
}

impl RunMetadata {
    pub(crate) fn for_report(input: &Path, keywords: &[String], report: &CorpusReport) -> Self {
        Self {
            generated_at: Utc::now(),
            input: input.display().to_string(),
            drugs: report.drugs.len(),
            comments: report.comments.len(),
            keywords: keywords.to_vec(),
            evidence: report.evidence().count(),
        }
    }
}

/// One row of the drug → keyword → score table.
#[derive(Debug, Serialize)]
struct ScoreRow<'a> {
    drug: &'a str,
    comment_count: usize,
    scores: &'a [KeywordScore],
}

/// Write the annotated comments, score table, evidence list and run header
/// into `dir`, creating it if needed.
///
/// Returns the written paths in that order.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or a file cannot be
/// written.
pub(crate) fn write_report(
    dir: &Path,
    report: &CorpusReport,
    metadata: &RunMetadata,
) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let scores: Vec<ScoreRow<'_>> = report
        .drugs
        .iter()
        .map(|d| ScoreRow {
            drug: &d.drug,
            comment_count: d.comment_count,
            scores: &d.scores,
        })
        .collect();
    let evidence: Vec<_> = report.evidence().collect();

    Ok(vec![
        write_json(dir, COMMENTS_FILE, &report.comments)?,
        write_json(dir, SCORES_FILE, &scores)?,
        write_json(dir, EVIDENCE_FILE, &evidence)?,
        write_json(dir, RUN_FILE, metadata)?,
    ])
}

fn write_json<T: Serialize + ?Sized>(dir: &Path, name: &str, value: &T) -> anyhow::Result<PathBuf> {
    let path = dir.join(name);
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("failed to serialize {name}"))?;
    std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
