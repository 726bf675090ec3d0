//! Classifier Facade: the entry point for the synergy graph builder.
//!
//! A batch runs in two phases, both parallel:
//! 1. tag every card (pure per card, no ordering dependency)
//! 2. evaluate only the candidate pairs the caller supplied
//!
//! Bad cards and bad pairs are rejected one by one and reported in
//! [`Classification::rejected`]; the rest of the batch is unaffected.

use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use tracing::{info, warn};

#[cfg(feature = "cache")]
use crate::cache::TagCache;
use crate::builder::ClassifierBuilder;
use crate::card::{CardPair, CardRecord, TaggedCard};
use crate::error::{GravesynError, GravesynResult};
use crate::patterns::PatternLibrary;
use crate::synergy::{ScoringPolicy, SynergyEdge, SynergyEvaluator};
use crate::tagger::Tagger;
use crate::taxonomy::TagSet;

/// Output of one classification batch.
#[derive(Debug, Default)]
pub struct Classification {
    /// Tags of every accepted card, by id.
    pub tags: BTreeMap<String, TagSet>,
    /// One edge per normalized pair, sorted by pair.
    pub edges: Vec<SynergyEdge>,
    /// Per-item input errors. Never configuration errors.
    pub rejected: Vec<GravesynError>,
}

impl Classification {
    /// Edge between `a` and `b` in either order.
    pub fn edge(&self, a: &str, b: &str) -> Option<&SynergyEdge> {
        let pair = CardPair::new(a, b).ok()?;
        self.edges
            .binary_search_by(|e| e.pair.cmp(&pair))
            .ok()
            .map(|i| &self.edges[i])
    }

    pub fn has_rejections(&self) -> bool {
        !self.rejected.is_empty()
    }
}

/// Tags cards and scores candidate pairs.
///
/// The library is only mutated through [`Classifier::reload_library`],
/// which needs `&mut self`, so no batch can observe a half-updated ruleset.
#[derive(Debug, Clone)]
pub struct Classifier {
    library: PatternLibrary,
    policy: ScoringPolicy,
}

impl Classifier {
    pub(crate) fn from_parts(library: PatternLibrary, policy: ScoringPolicy) -> Self {
        Self { library, policy }
    }

    /// Builder starting from the built-in library and default policy.
    pub fn builder() -> ClassifierBuilder {
        ClassifierBuilder::new()
    }

    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Swaps in a new ruleset between batches.
    pub fn reload_library(&mut self, library: PatternLibrary) {
        info!(
            version = library.version(),
            revision = library.revision(),
            rules = library.len(),
            "pattern library reloaded"
        );
        self.library = library;
    }

    /// Tags one ability text.
    pub fn tag_text(&self, text: &str) -> TagSet {
        Tagger::new(&self.library).tag(text)
    }

    /// Evaluates one pair of already tagged cards.
    pub fn evaluate(&self, a: &TaggedCard, b: &TaggedCard) -> GravesynResult<Option<SynergyEdge>> {
        SynergyEvaluator::new(&self.policy).evaluate(a, b)
    }

    /// Tags `cards` and evaluates `pairs`.
    pub fn classify(&self, cards: &[CardRecord], pairs: &[(String, String)]) -> Classification {
        let mut rejected = Vec::new();
        let unique = dedupe(cards, &mut rejected);
        let tagged = Tagger::new(&self.library).tag_batch(&unique);
        self.finish(cards.len(), tagged, pairs, rejected)
    }

    /// Same as [`Classifier::classify`], reusing cached tags for cards whose
    /// text has not changed.
    #[cfg(feature = "cache")]
    pub fn classify_cached(
        &self,
        cache: &mut TagCache,
        cards: &[CardRecord],
        pairs: &[(String, String)],
    ) -> Classification {
        let mut rejected = Vec::new();
        let unique = dedupe(cards, &mut rejected);
        let report = cache.retag(&unique, &self.library);
        info!(hits = report.hits, misses = report.misses, "tag cache consulted");
        self.finish(cards.len(), report.results, pairs, rejected)
    }

    fn finish(
        &self,
        total: usize,
        tagged: Vec<GravesynResult<TaggedCard>>,
        pairs: &[(String, String)],
        mut rejected: Vec<GravesynError>,
    ) -> Classification {
        let mut cards: BTreeMap<String, TaggedCard> = BTreeMap::new();
        for result in tagged {
            match result {
                Ok(card) => {
                    cards.insert(card.id.clone(), card);
                }
                Err(e) => rejected.push(e),
            }
        }

        let evaluator = SynergyEvaluator::new(&self.policy);
        let results: Vec<GravesynResult<Option<SynergyEdge>>> = pairs
            .par_iter()
            .map(|(a, b)| {
                if a == b {
                    return Err(GravesynError::self_pair(a.as_str()));
                }
                let left = cards.get(a).ok_or_else(|| GravesynError::unknown_card(a.as_str()))?;
                let right = cards.get(b).ok_or_else(|| GravesynError::unknown_card(b.as_str()))?;
                evaluator.evaluate(left, right)
            })
            .collect();

        // (a, b) and (b, a) collapse onto one edge.
        let mut edges: BTreeMap<CardPair, SynergyEdge> = BTreeMap::new();
        for result in results {
            match result {
                Ok(Some(edge)) => {
                    edges.entry(edge.pair.clone()).or_insert(edge);
                }
                Ok(None) => {}
                Err(e) => rejected.push(e),
            }
        }

        for e in &rejected {
            warn!(card_id = e.card_id().unwrap_or(""), error = %e, "item rejected");
        }
        info!(
            cards = total,
            tagged = cards.len(),
            pairs = pairs.len(),
            edges = edges.len(),
            rejected = rejected.len(),
            "classification batch complete"
        );

        Classification {
            tags: cards.into_iter().map(|(id, card)| (id, card.tags)).collect(),
            edges: edges.into_values().collect(),
            rejected,
        }
    }
}

/// Keeps the first record per id; later duplicates are rejected.
fn dedupe(cards: &[CardRecord], rejected: &mut Vec<GravesynError>) -> Vec<CardRecord> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(cards.len());
    for card in cards {
        if !card.id.is_empty() && !seen.insert(card.id.as_str()) {
            rejected.push(GravesynError::invalid_card(&card.id, "duplicate card id"));
            continue;
        }
        unique.push(card.clone());
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: &str, b: &str) -> (String, String) {
        (a.to_string(), b.to_string())
    }

    #[test]
    fn test_reversed_pairs_collapse() {
        let classifier = Classifier::builder().build().unwrap();
        let cards = vec![
            CardRecord::new("Treasure Cruise", "delve\ndraw three cards."),
            CardRecord::new("Generous Ent", "when this creature enters the battlefield, mill three cards."),
        ];
        let result = classifier.classify(
            &cards,
            &[pair("Treasure Cruise", "Generous Ent"), pair("Generous Ent", "Treasure Cruise")],
        );
        assert_eq!(result.edges.len(), 1);
        assert!(result.edge("Generous Ent", "Treasure Cruise").is_some());
        assert!(!result.has_rejections());
    }

    #[test]
    fn test_duplicate_id_rejected_first_kept() {
        let classifier = Classifier::builder().build().unwrap();
        let cards = vec![CardRecord::new("a", "delve"), CardRecord::new("a", "mill two cards.")];
        let result = classifier.classify(&cards, &[]);
        assert_eq!(result.rejected.len(), 1);
        assert!(result.tags["a"].contains("delve"));
    }

    #[test]
    fn test_unknown_and_self_pairs_rejected() {
        let classifier = Classifier::builder().build().unwrap();
        let cards = vec![CardRecord::new("a", "delve"), CardRecord::new("b", "mill two cards.")];
        let result = classifier.classify(&cards, &[pair("a", "a"), pair("a", "zzz"), pair("a", "b")]);
        assert_eq!(result.rejected.len(), 2);
        assert!(result
            .rejected
            .iter()
            .any(|e| matches!(e, GravesynError::SelfPair { .. })));
        assert!(result
            .rejected
            .iter()
            .any(|e| matches!(e, GravesynError::UnknownCard { card_id } if card_id == "zzz")));
        assert_eq!(result.edges.len(), 1);
    }

    #[test]
    fn test_reload_library_changes_tags() {
        let mut classifier = Classifier::builder().build().unwrap();
        assert!(classifier.tag_text("delve").contains("delve"));
        classifier.reload_library(PatternLibrary::empty());
        assert!(classifier.tag_text("delve").is_empty());
    }
}
