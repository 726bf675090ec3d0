//! Configuration loading from gravesyn.toml.
//!
//! ```toml
//! remove_rules = ["mill_fill/surveil/keyword"]
//!
//! [scoring]
//! scale = 3.0
//! intensity_cap = 4
//!
//! [scoring.payoff_hunger]
//! delve = 1.2
//!
//! [[rules]]
//! id = "self_recursion/unearth/keyword"
//! family = "self_recursion"
//! mechanic = "unearth"
//! pattern = '(?:^|, )unearth\b'
//!
//! [output]
//! format = "json"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::{fs, path::Path};
use tracing::info;

use crate::error::{GravesynError, IoResultExt};
use crate::patterns::PatternRule;
use crate::synergy::ScoringPolicy;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "gravesyn.toml";

/// Main configuration structure for gravesyn.toml.
#[derive(Debug, Deserialize, Default)]
pub struct GravesynConfig {
    /// Overrides for the scoring policy.
    pub scoring: Option<ScoringConfig>,
    /// Extra rules appended to the built-in library.
    #[serde(default)]
    pub rules: Vec<PatternRule>,
    /// Built-in rule ids to drop before extra rules are added.
    #[serde(default)]
    pub remove_rules: Vec<String>,
    /// Output configuration.
    pub output: Option<OutputConfig>,
}

/// Partial scoring policy; unset fields keep their defaults.
#[derive(Debug, Deserialize, Default)]
pub struct ScoringConfig {
    pub scale: Option<f64>,
    pub intensity_cap: Option<u32>,
    pub variable_quantity: Option<u32>,
    pub default_payoff_hunger: Option<f64>,
    pub default_source_weight: Option<f64>,
    /// Merged over the default hunger table.
    #[serde(default)]
    pub payoff_hunger: BTreeMap<String, f64>,
    /// Merged over the default source weight table.
    #[serde(default)]
    pub source_weight: BTreeMap<String, f64>,
}

/// Output format configuration.
#[derive(Debug, Deserialize, Default)]
pub struct OutputConfig {
    /// Output format: "plain" or "json".
    pub format: Option<String>,
}

impl ScoringConfig {
    /// Applies the overrides onto `policy`.
    pub fn apply(&self, policy: &mut ScoringPolicy) {
        if let Some(v) = self.scale {
            policy.scale = v;
        }
        if let Some(v) = self.intensity_cap {
            policy.intensity_cap = v;
        }
        if let Some(v) = self.variable_quantity {
            policy.variable_quantity = v;
        }
        if let Some(v) = self.default_payoff_hunger {
            policy.default_payoff_hunger = v;
        }
        if let Some(v) = self.default_source_weight {
            policy.default_source_weight = v;
        }
        policy
            .payoff_hunger
            .extend(self.payoff_hunger.iter().map(|(k, v)| (k.clone(), *v)));
        policy
            .source_weight
            .extend(self.source_weight.iter().map(|(k, v)| (k.clone(), *v)));
    }
}

impl GravesynConfig {
    /// Whether JSON output was requested.
    pub fn wants_json(&self) -> bool {
        self.output
            .as_ref()
            .and_then(|o| o.format.as_deref())
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }
}

/// Parses configuration text.
pub fn parse_config(content: &str) -> Result<GravesynConfig> {
    toml::from_str(content).context("Invalid gravesyn.toml")
}

/// Loads a configuration file from an explicit path.
pub fn load_config_file(path: &Path) -> Result<GravesynConfig> {
    let content = fs::read_to_string(path).with_path(path)?;
    let config: GravesynConfig = toml::from_str(&content)
        .map_err(|e| GravesynError::config(path, e.to_string()))?;
    info!(
        path = %path.display(),
        rules = config.rules.len(),
        removed = config.remove_rules.len(),
        "configuration loaded"
    );
    Ok(config)
}

/// Loads configuration from gravesyn.toml in `root` if it exists.
pub fn load_config(root: &Path) -> Result<Option<GravesynConfig>> {
    let path = root.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }
    load_config_file(&path).map(Some)
}
