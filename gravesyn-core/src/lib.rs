//! gravesyn-core: rule-based graveyard synergy classification
//!
//! Tags free-text card abilities with mechanics from a closed taxonomy and
//! decides, pair by pair, whether one card filling the graveyard actually
//! feeds the other. The central guarantee: a card that can only recur
//! *itself* (flashback, jump-start, retrace, disturb, embalm, eternalize,
//! aftermath) is never the payoff side of an edge.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use gravesyn_core::prelude::*;
//!
//! let classifier = ClassifierBuilder::new().build()?;
//! let result = classifier.classify(&cards, &pairs);
//!
//! for edge in &result.edges {
//!     println!("{} [{:.2}] {}", edge.pair, edge.strength, edge.justification);
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`taxonomy`]: families, mechanic names, tags
//! - [`patterns`]: the versioned Pattern Library and its audit dump
//! - [`tagger`]: applies the library to ability text
//! - [`synergy`]: scoring policy and the pairwise evaluator
//! - [`classify`]: batch facade over tagging and evaluation
//! - [`builder`]: fluent builder API for configuration
//! - [`cache`]: tag cache with SHA-256 change detection
//! - [`error`]: typed error handling
//!
//! # Cargo Features
//!
//! - `cache` (default): on-disk tag cache

pub mod builder;
pub mod card;
pub mod classify;
pub mod config;
pub mod error;
pub mod logging;
pub mod patterns;
pub mod prelude;
pub mod report;
pub mod synergy;
pub mod tagger;
pub mod taxonomy;

#[cfg(feature = "cache")]
pub mod cache;

// ============================================================================
// Explicit Re-exports (avoiding glob imports for clear API surface)
// ============================================================================

// Error types
pub use error::{GravesynError, GravesynResult, IoResultExt};

// Facade and builder
pub use builder::ClassifierBuilder;
pub use classify::{Classification, Classifier};

// Cards
pub use card::{CardPair, CardRecord, TaggedCard};

// Configuration
pub use config::{
    load_config, load_config_file, parse_config,
    GravesynConfig, OutputConfig, ScoringConfig, CONFIG_FILE_NAME,
};

// Logging
pub use logging::init_structured_logging;

// Pattern Library
pub use patterns::{
    builtin_rules, CompiledRule, LineMatch, PatternLibrary, PatternRule,
    RuleRow, RuleTable, BUILTIN_RULESET_VERSION,
};

// Reporting
pub use report::{print_json, print_plain, print_rules_json, print_rules_plain};

// Synergy scoring
pub use synergy::{
    eligible_payoff_tags, roles, source_tags,
    Role, ScoringPolicy, SynergyEdge, SynergyEvaluator, SynergyLink,
};

// Tagging
pub use tagger::{ability_lines, strip_reminder_text, tag_text, AbilityLine, Tagger};

// Taxonomy
pub use taxonomy::{mechanic, Family, MechanicTag, Quantity, TagSet};

// Feature-gated re-exports
#[cfg(feature = "cache")]
pub use cache::{load_cache, save_cache, text_hash, CacheMetadata, CachedTags, RetagReport, TagCache};
