//! The Pattern Library: an ordered, auditable registry of compiled rules.
//!
//! Invariants enforced on every mutation:
//! - rule ids are unique
//! - a mechanic name belongs to exactly one family
//! - every stored rule compiled successfully
//!
//! Mutations take `&mut self`, so a library shared with an in-flight batch
//! (behind `&`) cannot change under it.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use tracing::info;

use crate::error::{GravesynError, GravesynResult};
use crate::taxonomy::Family;

use super::builtin::{builtin_rules, BUILTIN_RULESET_VERSION};
use super::rule::{CompiledRule, PatternRule};

/// One row of the audit dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRow {
    pub family: Family,
    pub mechanic: String,
    pub rule_id: String,
    pub pattern: String,
    pub exclusions: Vec<String>,
}

/// Serializable form of a whole library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    pub version: u32,
    pub revision: u64,
    pub rules: Vec<PatternRule>,
}

/// Ordered registry of compiled rules.
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    version: u32,
    revision: u64,
    rules: Vec<CompiledRule>,
}

impl PatternLibrary {
    /// A library with no rules. Everything tags as neutral.
    pub fn empty() -> Self {
        Self {
            version: 0,
            revision: 0,
            rules: Vec::new(),
        }
    }

    /// The built-in ruleset.
    pub fn builtin() -> GravesynResult<Self> {
        Self::from_rules(BUILTIN_RULESET_VERSION, builtin_rules())
    }

    /// Builds a library from declarative rules, failing on the first bad one.
    pub fn from_rules<I>(version: u32, rules: I) -> GravesynResult<Self>
    where
        I: IntoIterator<Item = PatternRule>,
    {
        let mut library = Self {
            version,
            revision: 0,
            rules: Vec::new(),
        };
        for rule in rules {
            library.insert(rule)?;
        }
        Ok(library)
    }

    /// Rebuilds a library from its exported table.
    pub fn from_table(table: RuleTable) -> GravesynResult<Self> {
        let mut library = Self::from_rules(table.version, table.rules)?;
        library.revision = table.revision;
        Ok(library)
    }

    fn insert(&mut self, rule: PatternRule) -> GravesynResult<()> {
        if self.get(&rule.id).is_some() {
            return Err(GravesynError::invalid_rule(&rule.id, "duplicate rule id"));
        }
        if let Some(existing) = self.family_of(&rule.mechanic) {
            if existing != rule.family {
                return Err(GravesynError::invalid_rule(
                    &rule.id,
                    format!(
                        "mechanic '{}' is already registered under {}, cannot also be {}",
                        rule.mechanic, existing, rule.family
                    ),
                ));
            }
        }
        self.rules.push(rule.compile()?);
        Ok(())
    }

    /// Appends a rule at the end of the library. Matching follows insertion
    /// order, so it only assigns its mechanic when no earlier rule fired.
    pub fn add_rule(&mut self, rule: PatternRule) -> GravesynResult<()> {
        let id = rule.id.clone();
        self.insert(rule)?;
        self.revision += 1;
        info!(rule_id = %id, revision = self.revision, "pattern rule added");
        Ok(())
    }

    /// Removes a rule by id, returning it.
    pub fn remove_rule(&mut self, rule_id: &str) -> Option<PatternRule> {
        let index = self.rules.iter().position(|r| r.id() == rule_id)?;
        let removed = self.rules.remove(index).into_rule();
        self.revision += 1;
        info!(rule_id = %rule_id, revision = self.revision, "pattern rule removed");
        Some(removed)
    }

    /// Attaches an extra exclusion to an existing rule, keeping its position.
    pub fn add_exclusion(&mut self, rule_id: &str, exclusion: impl Into<String>) -> GravesynResult<()> {
        let index = self
            .rules
            .iter()
            .position(|r| r.id() == rule_id)
            .ok_or_else(|| GravesynError::invalid_rule(rule_id, "no such rule"))?;
        let recompiled = self.rules[index]
            .rule()
            .clone()
            .with_exclusion(exclusion)
            .compile()?;
        self.rules[index] = recompiled;
        self.revision += 1;
        info!(rule_id = %rule_id, revision = self.revision, "pattern rule exclusion added");
        Ok(())
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Number of mutations applied since construction.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// All rules in matching order.
    pub fn rules(&self) -> impl Iterator<Item = &CompiledRule> {
        self.rules.iter()
    }

    pub fn rules_for(&self, family: Family) -> impl Iterator<Item = &CompiledRule> {
        self.rules.iter().filter(move |r| r.family() == family)
    }

    pub fn get(&self, rule_id: &str) -> Option<&CompiledRule> {
        self.rules.iter().find(|r| r.id() == rule_id)
    }

    /// Family a mechanic is registered under.
    pub fn family_of(&self, mechanic: &str) -> Option<Family> {
        self.rules
            .iter()
            .find(|r| r.mechanic() == mechanic)
            .map(|r| r.family())
    }

    /// Distinct mechanics of a family, in declaration order.
    pub fn mechanics(&self, family: Family) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for rule in self.rules_for(family) {
            if !names.contains(&rule.mechanic()) {
                names.push(rule.mechanic());
            }
        }
        names
    }

    /// Audit rows ordered by family, then declaration order.
    pub fn dump(&self) -> Vec<RuleRow> {
        Family::ALL
            .iter()
            .flat_map(|&family| self.rules_for(family))
            .map(|r| {
                let rule = r.rule();
                RuleRow {
                    family: rule.family,
                    mechanic: rule.mechanic.clone(),
                    rule_id: rule.id.clone(),
                    pattern: rule.pattern.clone(),
                    exclusions: rule.exclusions.clone(),
                }
            })
            .collect()
    }

    /// Declarative export of the library.
    pub fn to_table(&self) -> RuleTable {
        RuleTable {
            version: self.version,
            revision: self.revision,
            rules: self.rules.iter().map(|r| r.rule().clone()).collect(),
        }
    }

    /// Renders the audit dump as a plain-text table.
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "PATTERN LIBRARY v{} (revision {}, {} rules)",
            self.version,
            self.revision,
            self.rules.len()
        );
        let mut current: Option<Family> = None;
        for row in self.dump() {
            if current != Some(row.family) {
                let _ = writeln!(out, "[{}]", row.family);
                current = Some(row.family);
            }
            let _ = writeln!(out, "  {:<16} {:<44} {}", row.mechanic, row.rule_id, row.pattern);
            for exclusion in &row.exclusions {
                let _ = writeln!(out, "  {:<16} {:<44} NOT {}", "", "", exclusion);
            }
        }
        out
    }

    /// Stable digest of the rules, used to invalidate cached tags.
    pub fn fingerprint(&self) -> String {
        let mut sha = Sha256::new();
        sha.update(self.version.to_le_bytes());
        for r in &self.rules {
            let rule = r.rule();
            for field in [rule.id.as_str(), rule.family.as_str(), rule.mechanic.as_str(), rule.pattern.as_str()] {
                sha.update(field.as_bytes());
                sha.update([0u8]);
            }
            for exclusion in &rule.exclusions {
                sha.update(exclusion.as_bytes());
                sha.update([1u8]);
            }
        }
        format!("{:x}", sha.finalize())
    }
}
