mod analyze;
mod output;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sefx_engine::{LexiconSynonyms, NoSynonyms, SynonymSource};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sefx")]
#[command(about = "Side-effect relevance scoring for drug reviews")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Score seed side effects against a review export and write the results
    Analyze {
        /// Review JSON file (array of `{drug_name, review_text, cleaned_text?}`)
        #[arg(long)]
        input: PathBuf,

        /// Directory receiving comments.json, scores.json, evidence.json and run.json
        #[arg(long, default_value = "./output")]
        output_dir: PathBuf,

        /// Restrict the run to a single drug
        #[arg(long)]
        drug: Option<String>,

        /// Show what would be analyzed without calling the embedding server
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the weighted expansion of seed keywords as JSON
    Expand {
        /// Keyword to expand (repeatable); defaults to the vocabulary seeds
        #[arg(long = "keyword")]
        keywords: Vec<String>,
    },
    /// Print the cleaned form of a piece of text
    Clean {
        /// Text to clean
        text: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = sefx_core::load_engine_config().context("failed to load configuration")?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(Commands::Analyze {
            input,
            output_dir,
            drug,
            dry_run,
        }) => {
            analyze::run_analyze(&config, &input, &output_dir, drug.as_deref(), dry_run).await?;
        }
        Some(Commands::Expand { keywords }) => {
            analyze::run_expand(&config, &keywords).await?;
        }
        Some(Commands::Clean { text }) => println!("{}", sefx_core::preprocess_text(&text)),
        None => println!("sefx ready; run `sefx --help` for commands"),
    }

    Ok(())
}

/// Load the synonym lexicon named by the config, or an empty source when
/// none is configured.
fn load_synonyms(config: &sefx_core::EngineConfig) -> anyhow::Result<Box<dyn SynonymSource>> {
    match &config.synonyms_path {
        Some(path) => {
            let lexicon = LexiconSynonyms::load(path)
                .with_context(|| format!("failed to load synonyms from {}", path.display()))?;
            tracing::info!(path = %path.display(), words = lexicon.len(), "loaded synonym lexicon");
            Ok(Box::new(lexicon))
        }
        None => {
            tracing::warn!("SEFX_SYNONYMS_PATH not set; expanding from official terms only");
            Ok(Box::new(NoSynonyms))
        }
    }
}
