//! Pattern Library: the versioned, auditable rules the tagger applies.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐     ┌─────────────────────┐
//! │     builtin.rs      │     │  gravesyn.toml      │
//! │  ─────────────────  │     │  ─────────────────  │
//! │  Built-in rule      │     │  Operator rules     │
//! │  table (data)       │     │  and removals       │
//! └──────────┬──────────┘     └──────────┬──────────┘
//!            │                           │
//!            └───────────┬───────────────┘
//!                        ▼
//!            ┌─────────────────────┐
//!            │     library.rs      │
//!            │  ─────────────────  │
//!            │  Compiled, ordered  │
//!            │  registry + audit   │
//!            └─────────────────────┘
//! ```
//!
//! Rules are data: a match expression plus exclusions co-located with it.
//! Changing how a card is classified means editing a rule, never the
//! tagger or the evaluator.

pub mod builtin;
pub mod library;
pub mod rule;

pub use builtin::{builtin_rules, BUILTIN_RULESET_VERSION, SELF_RECURSION_EXCLUSION, SELF_RETURN_EXCLUSION};
pub use library::{PatternLibrary, RuleRow, RuleTable};
pub use rule::{CompiledRule, LineMatch, PatternRule, QUANTITY_GROUP};
