//! Builder pattern API for the classifier.
//!
//! ```rust,ignore
//! use gravesyn_core::prelude::*;
//!
//! let classifier = ClassifierBuilder::new()
//!     .with_config(&config)
//!     .without_rule("mill_fill/surveil/keyword")
//!     .build()?;
//!
//! let result = classifier.classify(&cards, &pairs);
//! ```
//!
//! Every rule is compiled and the policy validated inside `build()`, so a
//! broken configuration fails before any card is classified.

use tracing::info;

use crate::classify::Classifier;
use crate::config::GravesynConfig;
use crate::error::{GravesynError, GravesynResult};
use crate::patterns::{PatternLibrary, PatternRule};
use crate::synergy::ScoringPolicy;

/// Builder for configuring a [`Classifier`].
#[derive(Debug, Clone, Default)]
pub struct ClassifierBuilder {
    /// Base library; the built-in ruleset when unset
    library: Option<PatternLibrary>,

    /// Scoring policy; defaults when unset
    policy: Option<ScoringPolicy>,

    /// Rule ids to drop from the base library
    removed: Vec<String>,

    /// Rules appended after removals
    added: Vec<PatternRule>,
}

impl ClassifierBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from `library` instead of the built-in ruleset.
    pub fn with_library(mut self, library: PatternLibrary) -> Self {
        self.library = Some(library);
        self
    }

    pub fn with_policy(mut self, policy: ScoringPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Appends a rule to the library.
    pub fn with_rule(mut self, rule: PatternRule) -> Self {
        self.added.push(rule);
        self
    }

    /// Drops a rule by id. Unknown ids fail the build.
    pub fn without_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.removed.push(rule_id.into());
        self
    }

    /// Applies a loaded gravesyn.toml: policy overrides, removals, and
    /// extra rules.
    pub fn with_config(mut self, config: &GravesynConfig) -> Self {
        let mut policy = self.policy.take().unwrap_or_default();
        if let Some(scoring) = &config.scoring {
            scoring.apply(&mut policy);
        }
        self.policy = Some(policy);
        self.removed.extend(config.remove_rules.iter().cloned());
        self.added.extend(config.rules.iter().cloned());
        self
    }

    /// Builds the classifier, compiling and checking every rule.
    pub fn build(self) -> GravesynResult<Classifier> {
        let mut library = match self.library {
            Some(library) => library,
            None => PatternLibrary::builtin()?,
        };

        for id in &self.removed {
            if library.remove_rule(id).is_none() {
                return Err(GravesynError::invalid_rule(id, "cannot remove: no such rule"));
            }
        }
        for rule in self.added {
            library.add_rule(rule)?;
        }

        let policy = self.policy.unwrap_or_default();
        policy.validate()?;

        info!(
            version = library.version(),
            revision = library.revision(),
            rules = library.len(),
            "classifier ready"
        );
        Ok(Classifier::from_parts(library, policy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::taxonomy::{mechanic, Family};

    #[test]
    fn test_builder_defaults() {
        let classifier = ClassifierBuilder::new().build().unwrap();
        assert_eq!(classifier.library().len(), PatternLibrary::builtin().unwrap().len());
        assert_eq!(classifier.policy(), &ScoringPolicy::default());
    }

    #[test]
    fn test_builder_rule_edits() {
        let classifier = ClassifierBuilder::new()
            .without_rule("mill_fill/surveil/keyword")
            .with_rule(PatternRule::new(
                "self_recursion/unearth/keyword",
                Family::SelfRecursion,
                "unearth",
                r"(?:^|, )unearth\b",
            ))
            .build()
            .unwrap();
        assert!(!classifier.tag_text("surveil 2.").contains(mechanic::SURVEIL));
        assert!(classifier.tag_text("unearth {b}").contains("unearth"));
    }

    #[test]
    fn test_bad_rule_fails_build() {
        let err = ClassifierBuilder::new()
            .with_rule(PatternRule::new("broken", Family::TruePayoff, "broken", r"(unclosed"))
            .build()
            .unwrap_err();
        assert!(matches!(err, GravesynError::InvalidRule { .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_unknown_removal_fails_build() {
        let err = ClassifierBuilder::new().without_rule("nope").build().unwrap_err();
        assert!(matches!(err, GravesynError::InvalidRule { .. }));
    }

    #[test]
    fn test_with_config() {
        let cfg = parse_config(
            r#"
remove_rules = ["mill_fill/entomb/tutor"]

[scoring]
scale = 6.0
"#,
        )
        .unwrap();
        let classifier = ClassifierBuilder::new().with_config(&cfg).build().unwrap();
        assert_eq!(classifier.policy().scale, 6.0);
        assert!(classifier.library().get("mill_fill/entomb/tutor").is_none());
    }

    #[test]
    fn test_config_merges_over_explicit_policy_and_appends_rules() {
        let cfg = parse_config(
            r#"
remove_rules = ["mill_fill/surveil/keyword"]

[scoring.payoff_hunger]
delve = 1.5

[[rules]]
id = "self_recursion/unearth/keyword"
family = "self_recursion"
mechanic = "unearth"
pattern = '(?:^|, )unearth\b'
"#,
        )
        .unwrap();
        let base = ScoringPolicy {
            scale: 4.0,
            ..ScoringPolicy::default()
        };
        let classifier = ClassifierBuilder::new()
            .with_policy(base)
            .with_config(&cfg)
            .build()
            .unwrap();

        let policy = classifier.policy();
        assert_eq!(policy.scale, 4.0);
        assert_eq!(policy.hunger(mechanic::DELVE), 1.5);
        assert_eq!(
            policy.hunger(mechanic::REANIMATION),
            ScoringPolicy::default().hunger(mechanic::REANIMATION)
        );

        let library = classifier.library();
        assert!(library.get("mill_fill/surveil/keyword").is_none());
        assert_eq!(library.family_of("unearth"), Some(Family::SelfRecursion));
        assert_eq!(library.rules().last().map(|r| r.id()), Some("self_recursion/unearth/keyword"));
        assert_eq!(library.revision(), 2);
    }

    #[test]
    fn test_config_unknown_removal_fails_build() {
        let cfg = parse_config(r#"remove_rules = ["nope"]"#).unwrap();
        let err = ClassifierBuilder::new().with_config(&cfg).build().unwrap_err();
        assert!(matches!(err, GravesynError::InvalidRule { .. }));
    }

    #[test]
    fn test_invalid_policy_fails_build() {
        let policy = ScoringPolicy {
            scale: -1.0,
            ..ScoringPolicy::default()
        };
        let err = ClassifierBuilder::new().with_policy(policy).build().unwrap_err();
        assert!(matches!(err, GravesynError::InvalidPolicy { .. }));
    }
}
