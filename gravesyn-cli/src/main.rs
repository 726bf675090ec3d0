//! gravesyn CLI - graveyard synergy classification for card catalogs.
//!
//! Features:
//! - Batch classification of cards and candidate pairs from JSON files
//! - gravesyn.toml overrides for rules and scoring
//! - Incremental tag cache for re-runs over a mostly unchanged catalog
//! - Audit dump of the active Pattern Library

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use gravesyn_core::{
    cache, init_structured_logging, load_config, load_config_file, print_json, print_plain,
    print_rules_json, print_rules_plain, CardRecord, Classifier, ClassifierBuilder, GravesynConfig,
    TagCache,
};

/// Input files larger than this are refused (100MB).
const MAX_INPUT_BYTES: u64 = 100_000_000;

#[derive(Parser, Debug)]
#[command(author, version, about = "Rule-based graveyard synergy classifier")]
pub struct Cli {
    /// Path to a gravesyn.toml (defaults to ./gravesyn.toml if present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output results in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Tag a batch of cards and evaluate candidate pairs
    Classify {
        /// JSON array of {"id", "text"} card records
        #[arg(long, value_name = "FILE")]
        cards: PathBuf,

        /// JSON array of ["a", "b"] candidate pairs
        #[arg(long, value_name = "FILE", conflicts_with = "all_pairs")]
        pairs: Option<PathBuf>,

        /// Evaluate every pair of cards in the batch
        #[arg(long)]
        all_pairs: bool,

        /// Directory holding the .gravesyn tag cache
        #[arg(long, value_name = "DIR")]
        cache_dir: Option<PathBuf>,
    },

    /// Dump the active Pattern Library for audit
    Rules,

    /// Tag a single ability text
    Tag {
        /// Normalized ability text; use \n between ability lines
        text: String,
    },
}

/// Reads a JSON input file, refusing oversized files.
fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let size = fs::metadata(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .len();
    if size > MAX_INPUT_BYTES {
        return Err(anyhow!(
            "{} is {} bytes, over the {} byte limit",
            path.display(),
            size,
            MAX_INPUT_BYTES
        ));
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn resolve_config(explicit: Option<&Path>) -> Result<GravesynConfig> {
    match explicit {
        Some(path) => load_config_file(path),
        None => Ok(load_config(Path::new("."))?.unwrap_or_default()),
    }
}

/// Every unordered pair of distinct card ids, in input order.
fn all_pairs(cards: &[CardRecord]) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (i, a) in cards.iter().enumerate() {
        for b in &cards[i + 1..] {
            if a.id != b.id {
                pairs.push((a.id.clone(), b.id.clone()));
            }
        }
    }
    pairs
}

fn run_classify(
    classifier: &Classifier,
    cards_path: &Path,
    pairs_path: Option<&Path>,
    all: bool,
    cache_dir: Option<&Path>,
    json: bool,
) -> Result<()> {
    let cards: Vec<CardRecord> = read_json(cards_path)?;
    let pairs: Vec<(String, String)> = match pairs_path {
        Some(path) => read_json(path)?,
        None if all => all_pairs(&cards),
        None => Vec::new(),
    };

    let result = match cache_dir {
        Some(dir) => {
            let mut tag_cache =
                cache::load_cache(dir).unwrap_or_else(|| TagCache::new(classifier.library()));
            let result = classifier.classify_cached(&mut tag_cache, &cards, &pairs);
            cache::save_cache(dir, &tag_cache)
                .with_context(|| format!("Failed to save tag cache in {}", dir.display()))?;
            result
        }
        None => classifier.classify(&cards, &pairs),
    };

    if json {
        print_json(&result);
    } else {
        print_plain(&result);
    }
    Ok(())
}

fn main() -> Result<()> {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] gravesyn internal error: {}", info);
        eprintln!("[PANIC] The process will exit safely with code 2.");
    }));

    // Initialize structured logging (JSON to stderr, respects RUST_LOG)
    init_structured_logging();

    let cli = Cli::parse();

    // Rule errors are fatal here, before any card is read.
    let config = resolve_config(cli.config.as_deref())?;
    let json = cli.json || config.wants_json();
    let classifier = ClassifierBuilder::new()
        .with_config(&config)
        .build()
        .context("Failed to build classifier")?;

    match &cli.command {
        Command::Classify {
            cards,
            pairs,
            all_pairs,
            cache_dir,
        } => run_classify(
            &classifier,
            cards,
            pairs.as_deref(),
            *all_pairs,
            cache_dir.as_deref(),
            json,
        ),
        Command::Rules => {
            if json {
                print_rules_json(classifier.library());
            } else {
                print_rules_plain(classifier.library());
            }
            Ok(())
        }
        Command::Tag { text } => {
            let text = text.replace("\\n", "\n");
            let tags = classifier.tag_text(&text);
            if json {
                println!("{}", serde_json::to_string_pretty(&tags)?);
            } else if tags.is_empty() {
                println!("neutral");
            } else {
                for tag in &tags {
                    println!("{}", tag);
                }
            }
            Ok(())
        }
    }
}
