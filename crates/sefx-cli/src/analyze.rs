//! `analyze` and `expand` command handlers.

use std::path::Path;

use anyhow::Context;
use sefx_core::{CommentRecord, EngineConfig, Vocabulary};
use sefx_engine::{Analyzer, CachedEmbedder, ScoringSettings, TeiClient};

use crate::load_synonyms;
use crate::output::{write_report, RunMetadata};

fn load_vocabulary(config: &EngineConfig) -> anyhow::Result<Vocabulary> {
    sefx_core::load_vocabulary(&config.vocabulary_path).with_context(|| {
        format!(
            "failed to load vocabulary from {}",
            config.vocabulary_path.display()
        )
    })
}

fn build_embedder(config: &EngineConfig) -> anyhow::Result<CachedEmbedder<TeiClient>> {
    let tei = TeiClient::from_config(config).context("failed to build TEI client")?;
    Ok(CachedEmbedder::new(tei))
}

/// Keep only the records of `drug`, if one is given.
///
/// # Errors
///
/// Returns an error if the filter matches no record.
pub(crate) fn filter_drug(
    records: Vec<CommentRecord>,
    drug: Option<&str>,
) -> anyhow::Result<Vec<CommentRecord>> {
    let Some(drug) = drug else {
        return Ok(records);
    };
    let filtered: Vec<CommentRecord> = records
        .into_iter()
        .filter(|r| r.drug_name.eq_ignore_ascii_case(drug))
        .collect();
    if filtered.is_empty() {
        anyhow::bail!("drug '{drug}' has no comments in the input");
    }
    Ok(filtered)
}

/// Trim and lowercase command-line keywords, dropping blanks.
pub(crate) fn normalize_keywords(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

/// Run a full analysis of a review export.
///
/// Loads the reviews, applies the short-comment filter and the optional drug
/// filter, scores every vocabulary seed keyword for every drug, and writes
/// the result files into `output_dir`.
///
/// When `dry_run` is `true`, prints the drugs and keywords that would be
/// analyzed and returns without contacting the embedding server.
///
/// # Errors
///
/// Returns an error if an input file is missing or malformed, the embedding
/// server fails, or the output cannot be written.
pub(crate) async fn run_analyze(
    config: &EngineConfig,
    input: &Path,
    output_dir: &Path,
    drug: Option<&str>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let vocabulary = load_vocabulary(config)?;
    let records = sefx_core::load_reviews(input)
        .with_context(|| format!("failed to load reviews from {}", input.display()))?;
    let loaded = records.len();
    let records = sefx_core::retain_long_comments(records, config.min_comment_words);
    if records.len() < loaded {
        tracing::info!(
            dropped = loaded - records.len(),
            min_words = config.min_comment_words,
            "dropped short comments"
        );
    }
    let records = filter_drug(records, drug)?;

    if records.is_empty() {
        println!("no comments to analyze in {}; nothing written", input.display());
        return Ok(());
    }

    let drugs = sefx_core::drug_names(&records);
    if dry_run {
        println!(
            "dry-run: would score {} keywords for {} comments across {} drugs: [{}]",
            vocabulary.seed_keywords.len(),
            records.len(),
            drugs.len(),
            drugs.join(", ")
        );
        return Ok(());
    }

    let synonyms = load_synonyms(config)?;
    let embedder = build_embedder(config)?;
    let analyzer = Analyzer::new(
        &embedder,
        &*synonyms,
        &vocabulary.official_terms,
        ScoringSettings::from_config(config),
    );

    let report = analyzer
        .analyze_corpus(&vocabulary.seed_keywords, records)
        .await
        .context("side-effect analysis failed")?;

    let metadata = RunMetadata::for_report(input, &vocabulary.seed_keywords, &report);
    let paths = write_report(output_dir, &report, &metadata)?;
    for path in &paths {
        tracing::info!(path = %path.display(), "wrote output");
    }

    println!(
        "analysis complete: {} drugs, {} comments, {} keywords, {} evidence items written to {}",
        metadata.drugs,
        metadata.comments,
        metadata.keywords.len(),
        metadata.evidence,
        output_dir.display()
    );
    Ok(())
}

/// Print the expansion of `keywords` (or the vocabulary seeds) as JSON.
///
/// # Errors
///
/// Returns an error if the vocabulary or synonyms cannot be loaded or the
/// embedding server fails.
pub(crate) async fn run_expand(config: &EngineConfig, keywords: &[String]) -> anyhow::Result<()> {
    let vocabulary = load_vocabulary(config)?;
    let keywords = normalize_keywords(keywords);
    let seeds = if keywords.is_empty() {
        vocabulary.seed_keywords.clone()
    } else {
        keywords
    };

    let synonyms = load_synonyms(config)?;
    let embedder = build_embedder(config)?;
    let expansions = Analyzer::new(
        &embedder,
        &*synonyms,
        &vocabulary.official_terms,
        ScoringSettings::from_config(config),
    )
    .expand_keywords(&seeds)
    .await
    .context("keyword expansion failed")?;

    println!("{}", serde_json::to_string_pretty(&expansions)?);
    Ok(())
}
