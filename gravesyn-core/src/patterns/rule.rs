//! A single matching rule and its compiled form.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{GravesynError, GravesynResult};
use crate::taxonomy::Family;

/// Name of the capture group a rule uses to report a card quantity.
pub const QUANTITY_GROUP: &str = "n";

/// Upper bound on compiled regex size per expression.
const MAX_REGEX_SIZE: usize = 1 << 20;

/// Declarative rule: data only, no matching logic.
///
/// A rule fires on an ability unit when `pattern` matches that unit and
/// none of `exclusions` match the same unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    pub id: String,
    pub family: Family,
    pub mechanic: String,
    pub pattern: String,
    #[serde(default)]
    pub exclusions: Vec<String>,
}

impl PatternRule {
    pub fn new(
        id: impl Into<String>,
        family: Family,
        mechanic: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            family,
            mechanic: mechanic.into(),
            pattern: pattern.into(),
            exclusions: Vec::new(),
        }
    }

    pub fn with_exclusion(mut self, exclusion: impl Into<String>) -> Self {
        self.exclusions.push(exclusion.into());
        self
    }

    pub fn with_exclusions<I, S>(mut self, exclusions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusions.extend(exclusions.into_iter().map(Into::into));
        self
    }

    /// Validates and compiles the rule.
    pub fn compile(self) -> GravesynResult<CompiledRule> {
        if self.id.trim().is_empty() {
            return Err(GravesynError::invalid_rule("<unnamed>", "rule id is empty"));
        }
        if self.mechanic.trim().is_empty() {
            return Err(GravesynError::invalid_rule(&self.id, "mechanic name is empty"));
        }
        if self.pattern.trim().is_empty() {
            return Err(GravesynError::invalid_rule(&self.id, "match expression is empty"));
        }

        let matcher = build_regex(&self.id, &self.pattern)?;
        let exclusions = self
            .exclusions
            .iter()
            .map(|e| build_regex(&self.id, e))
            .collect::<GravesynResult<Vec<_>>>()?;

        Ok(CompiledRule {
            rule: self,
            matcher,
            exclusions,
        })
    }
}

fn build_regex(rule_id: &str, expr: &str) -> GravesynResult<Regex> {
    if expr.trim().is_empty() {
        return Err(GravesynError::invalid_rule(rule_id, "exclusion expression is empty"));
    }
    RegexBuilder::new(expr)
        .case_insensitive(true)
        .size_limit(MAX_REGEX_SIZE)
        .build()
        .map_err(|e| GravesynError::invalid_rule(rule_id, format!("`{}`: {}", expr, e)))
}

/// Outcome of testing one rule against one ability line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineMatch<'t> {
    /// Pattern did not match.
    Miss,
    /// Pattern matched but an exclusion on the same line vetoed it.
    Excluded { exclusion: usize },
    /// Rule fired; `quantity` is the raw text of the `n` group, if any.
    Fired { quantity: Option<&'t str> },
}

/// A rule with its expressions compiled, ready for matching.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    rule: PatternRule,
    matcher: Regex,
    exclusions: Vec<Regex>,
}

impl CompiledRule {
    pub fn rule(&self) -> &PatternRule {
        &self.rule
    }

    pub fn id(&self) -> &str {
        &self.rule.id
    }

    pub fn family(&self) -> Family {
        self.rule.family
    }

    pub fn mechanic(&self) -> &str {
        &self.rule.mechanic
    }

    /// Tests the rule against a single ability line.
    pub fn match_line<'t>(&self, line: &'t str) -> LineMatch<'t> {
        let Some(caps) = self.matcher.captures(line) else {
            return LineMatch::Miss;
        };
        if let Some(exclusion) = self.exclusions.iter().position(|re| re.is_match(line)) {
            return LineMatch::Excluded { exclusion };
        }
        LineMatch::Fired {
            quantity: caps.name(QUANTITY_GROUP).map(|m| m.as_str()),
        }
    }

    pub fn into_rule(self) -> PatternRule {
        self.rule
    }
}
