//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use gravesyn_core::prelude::*;
//! ```
//!
//! Brings in what a graph builder needs to classify a batch without
//! pulling in the rule and cache internals.

// Facade and builder
pub use crate::builder::ClassifierBuilder;
pub use crate::classify::{Classification, Classifier};

// Inputs and outputs
pub use crate::card::{CardPair, CardRecord, TaggedCard};
pub use crate::synergy::{ScoringPolicy, SynergyEdge, SynergyLink};
pub use crate::taxonomy::{Family, MechanicTag, Quantity, TagSet};

// Rules
pub use crate::patterns::{PatternLibrary, PatternRule};

// Errors
pub use crate::error::{GravesynError, GravesynResult};

// Configuration
pub use crate::config::{load_config, load_config_file, GravesynConfig};

// Caching
#[cfg(feature = "cache")]
pub use crate::cache::{load_cache, save_cache, TagCache};
