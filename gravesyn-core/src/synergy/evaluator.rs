//! Pairwise Synergy Evaluator.
//!
//! A link exists from card S to card P when S has a `mill_fill` tag and P
//! has an *eligible* `true_payoff` tag. Self-recursion tags never make a
//! card a payoff, and a payoff tag whose every ability unit also carries a
//! self-recursion tag is not eligible either: when both kinds of rule fire
//! on the same span, self-recursion wins.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

use crate::card::{CardPair, TaggedCard};
use crate::error::GravesynResult;
use crate::taxonomy::{Family, MechanicTag, TagSet};

use super::policy::ScoringPolicy;

/// Role a card can play in a graveyard-synergy link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Puts other cards into the graveyard.
    Source,
    /// Benefits from other cards in the graveyard.
    Payoff,
}

/// Tags that let a card act as a source.
pub fn source_tags(tags: &TagSet) -> Vec<&MechanicTag> {
    tags.by_family(Family::MillFill).collect()
}

/// Payoff tags that survive the self-recursion override.
///
/// A payoff stays eligible while at least one unit it fired on carries no
/// self-recursion tag.
pub fn eligible_payoff_tags(tags: &TagSet) -> Vec<&MechanicTag> {
    let recursion_lines: BTreeSet<usize> = tags
        .by_family(Family::SelfRecursion)
        .flat_map(|t| t.lines.iter().copied())
        .collect();
    tags.by_family(Family::TruePayoff)
        .filter(|t| {
            let shadowed = t.lines.iter().all(|line| recursion_lines.contains(line));
            if shadowed {
                debug!(mechanic = %t.mechanic, lines = ?t.lines, "payoff shadowed by self-recursion on same line");
            }
            !shadowed
        })
        .collect()
}

/// Roles a card can play.
pub fn roles(tags: &TagSet) -> BTreeSet<Role> {
    let mut roles = BTreeSet::new();
    if !source_tags(tags).is_empty() {
        roles.insert(Role::Source);
    }
    if !eligible_payoff_tags(tags).is_empty() {
        roles.insert(Role::Payoff);
    }
    roles
}

/// One directed source → payoff link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynergyLink {
    pub source_card: String,
    pub source_mechanic: String,
    pub payoff_card: String,
    pub payoff_mechanic: String,
    pub strength: f64,
}

impl fmt::Display for SynergyLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) fills the graveyard for {} ({}) [{:.2}]",
            self.source_card, self.source_mechanic, self.payoff_card, self.payoff_mechanic, self.strength
        )
    }
}

/// Graveyard-synergy edge between two cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynergyEdge {
    pub pair: CardPair,
    /// Strength of the strongest link.
    pub strength: f64,
    /// One link per direction that qualifies, first card's direction first.
    pub links: Vec<SynergyLink>,
    pub justification: String,
}

/// Scores pairs of tagged cards under a policy.
#[derive(Debug, Clone, Copy)]
pub struct SynergyEvaluator<'p> {
    policy: &'p ScoringPolicy,
}

impl<'p> SynergyEvaluator<'p> {
    pub fn new(policy: &'p ScoringPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &'p ScoringPolicy {
        self.policy
    }

    /// Strongest link with `source` feeding `payoff`, if any.
    ///
    /// Ties keep the earliest payoff tag, then the earliest source tag.
    pub fn best_link(&self, source: &TaggedCard, payoff: &TaggedCard) -> Option<SynergyLink> {
        let sources = source_tags(&source.tags);
        let payoffs = eligible_payoff_tags(&payoff.tags);

        let mut best: Option<(f64, &MechanicTag, &MechanicTag)> = None;
        for p in &payoffs {
            for s in &sources {
                let strength = self.policy.link_strength(s, p);
                if best.map_or(true, |(b, _, _)| strength > b) {
                    best = Some((strength, *s, *p));
                }
            }
        }

        best.map(|(strength, s, p)| SynergyLink {
            source_card: source.id.clone(),
            source_mechanic: s.mechanic.clone(),
            payoff_card: payoff.id.clone(),
            payoff_mechanic: p.mechanic.clone(),
            strength,
        })
    }

    /// Decides whether `a` and `b` share a graveyard-synergy edge.
    ///
    /// `evaluate(a, b)` and `evaluate(b, a)` return the same edge. A self
    /// pair is an input error; "no edge" is `Ok(None)`.
    pub fn evaluate(&self, a: &TaggedCard, b: &TaggedCard) -> GravesynResult<Option<SynergyEdge>> {
        let pair = CardPair::new(a.id.as_str(), b.id.as_str())?;
        let (first, second) = if a.id.as_str() == pair.first() { (a, b) } else { (b, a) };
        let (first_roles, second_roles) = (roles(&first.tags), roles(&second.tags));

        let mut links = Vec::with_capacity(2);
        if first_roles.contains(&Role::Source) && second_roles.contains(&Role::Payoff) {
            links.extend(self.best_link(first, second));
        }
        if second_roles.contains(&Role::Source) && first_roles.contains(&Role::Payoff) {
            links.extend(self.best_link(second, first));
        }

        if links.is_empty() {
            debug!(pair = %pair, "no graveyard synergy");
            return Ok(None);
        }

        let strength = links.iter().map(|l| l.strength).fold(0.0_f64, f64::max);
        let justification = links
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        debug!(pair = %pair, strength, links = links.len(), "graveyard synergy edge");

        Ok(Some(SynergyEdge {
            pair,
            strength,
            links,
            justification,
        }))
    }
}
