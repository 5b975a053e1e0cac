use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::EngineConfig;
use crate::ConfigError;

/// Load engine configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to an unparseable or out-of-range value.
pub fn load_engine_config() -> Result<EngineConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_engine_config_from_env()
}

/// Load engine configuration from environment variables already in the process.
///
/// Unlike [`load_engine_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to an unparseable or out-of-range value.
pub fn load_engine_config_from_env() -> Result<EngineConfig, ConfigError> {
    build_engine_config(|key| std::env::var(key))
}

/// Build engine configuration using the provided env-var lookup function.
///
/// Every variable is optional; unset variables take the [`EngineConfig`]
/// defaults. Decoupled from the real environment so tests can drive it with a
/// `HashMap` lookup.
fn build_engine_config<F>(lookup: F) -> Result<EngineConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let defaults = EngineConfig::default();

    let parse_or = |var: &str| -> Option<String> { lookup(var).ok() };

    let tei_url = parse_or("SEFX_TEI_URL")
        .map_or(defaults.tei_url, |url| url.trim_end_matches('/').to_string());
    let tei_api_key = parse_or("SEFX_TEI_API_KEY").filter(|k| !k.trim().is_empty());

    let embed_timeout_secs = parse_number(
        &lookup,
        "SEFX_EMBED_TIMEOUT_SECS",
        defaults.embed_timeout_secs,
    )?;
    let embed_batch_size =
        parse_number(&lookup, "SEFX_EMBED_BATCH_SIZE", defaults.embed_batch_size)?;
    let embed_max_retries =
        parse_number(&lookup, "SEFX_EMBED_MAX_RETRIES", defaults.embed_max_retries)?;
    let embed_retry_backoff_ms = parse_number(
        &lookup,
        "SEFX_EMBED_RETRY_BACKOFF_MS",
        defaults.embed_retry_backoff_ms,
    )?;

    let similarity_threshold = parse_number(
        &lookup,
        "SEFX_SIMILARITY_THRESHOLD",
        defaults.similarity_threshold,
    )?;
    if !(-1.0..=1.0).contains(&similarity_threshold) {
        return Err(invalid(
            "SEFX_SIMILARITY_THRESHOLD",
            format!("{similarity_threshold} is outside [-1, 1]"),
        ));
    }

    let expansion_top_k =
        parse_number(&lookup, "SEFX_EXPANSION_TOP_K", defaults.expansion_top_k)?;
    let evidence_top_k = parse_number(&lookup, "SEFX_EVIDENCE_TOP_K", defaults.evidence_top_k)?;

    let match_percentile =
        parse_number(&lookup, "SEFX_MATCH_PERCENTILE", defaults.match_percentile)?;
    if !(0.0..=100.0).contains(&match_percentile) {
        return Err(invalid(
            "SEFX_MATCH_PERCENTILE",
            format!("{match_percentile} is outside [0, 100]"),
        ));
    }

    let min_comment_words =
        parse_number(&lookup, "SEFX_MIN_COMMENT_WORDS", defaults.min_comment_words)?;
    let max_concurrent_drugs = parse_number(
        &lookup,
        "SEFX_MAX_CONCURRENT_DRUGS",
        defaults.max_concurrent_drugs,
    )?;

    for (var, value) in [
        ("SEFX_EMBED_BATCH_SIZE", embed_batch_size),
        ("SEFX_EXPANSION_TOP_K", expansion_top_k),
        ("SEFX_MAX_CONCURRENT_DRUGS", max_concurrent_drugs),
    ] {
        if value == 0 {
            return Err(invalid(var, "must be at least 1".to_string()));
        }
    }

    let vocabulary_path = parse_or("SEFX_VOCABULARY_PATH")
        .map_or(defaults.vocabulary_path, PathBuf::from);
    let synonyms_path = parse_or("SEFX_SYNONYMS_PATH")
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);
    let log_level = parse_or("SEFX_LOG_LEVEL").unwrap_or(defaults.log_level);

    Ok(EngineConfig {
        tei_url,
        tei_api_key,
        embed_timeout_secs,
        embed_batch_size,
        embed_max_retries,
        embed_retry_backoff_ms,
        similarity_threshold,
        expansion_top_k,
        evidence_top_k,
        match_percentile,
        min_comment_words,
        max_concurrent_drugs,
        vocabulary_path,
        synonyms_path,
        log_level,
    })
}

/// Parse `var` with `FromStr`, falling back to `default` when unset.
fn parse_number<F, T>(lookup: &F, var: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| invalid(var, e.to_string())),
        Err(_) => Ok(default),
    }
}

fn invalid(var: &str, reason: String) -> ConfigError {
    ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
