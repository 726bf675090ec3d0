//! Tunable scoring policy for synergy strength.
//!
//! Strength of one source → payoff link:
//!
//! ```text
//! strength = scale × hunger(payoff) × weight(source) × intensity(quantity)
//! intensity = min(cards per activation, intensity_cap) / intensity_cap
//! ```
//!
//! Absolute values are tunable. The defaults keep volume-hungry payoffs
//! (delve, escape, count effects) above single-target reanimation for the
//! same source.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{GravesynError, GravesynResult};
use crate::taxonomy::{mechanic, MechanicTag, Quantity};

/// Weights and limits used to score links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    /// Strength of a maximally hungry payoff fed by a full-intensity source.
    pub scale: f64,
    /// Cards per activation counted as full intensity.
    pub intensity_cap: u32,
    /// Assumed size of an `X` quantity.
    pub variable_quantity: u32,
    /// Hunger for payoff mechanics missing from `payoff_hunger`.
    pub default_payoff_hunger: f64,
    /// Weight for source mechanics missing from `source_weight`.
    pub default_source_weight: f64,
    pub payoff_hunger: BTreeMap<String, f64>,
    pub source_weight: BTreeMap<String, f64>,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        let payoff_hunger = [
            (mechanic::DELVE, 1.0),
            (mechanic::ESCAPE, 1.0),
            (mechanic::COUNT_EFFECT, 1.0),
            (mechanic::THRESHOLD, 0.9),
            (mechanic::UNDERGROWTH, 0.9),
            (mechanic::DREDGE, 0.8),
            (mechanic::DELIRIUM, 0.7),
            (mechanic::REANIMATION, 0.5),
        ];
        let source_weight = [
            (mechanic::MILL, 1.0),
            (mechanic::SURVEIL, 0.8),
            (mechanic::DISCARD, 0.7),
            (mechanic::OPPONENT_MILL, 0.6),
            (mechanic::ENTOMB, 0.6),
        ];
        Self {
            scale: 3.0,
            intensity_cap: 4,
            variable_quantity: 3,
            default_payoff_hunger: 0.6,
            default_source_weight: 1.0,
            payoff_hunger: payoff_hunger
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            source_weight: source_weight
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}

fn check_weight(name: &str, value: f64) -> GravesynResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GravesynError::invalid_policy(format!(
            "{} must be positive and finite, got {}",
            name, value
        )))
    }
}

impl ScoringPolicy {
    /// Every weight must be positive so any qualifying link scores above zero.
    pub fn validate(&self) -> GravesynResult<()> {
        check_weight("scale", self.scale)?;
        check_weight("default_payoff_hunger", self.default_payoff_hunger)?;
        check_weight("default_source_weight", self.default_source_weight)?;
        if self.intensity_cap == 0 {
            return Err(GravesynError::invalid_policy("intensity_cap must be at least 1"));
        }
        if self.variable_quantity == 0 {
            return Err(GravesynError::invalid_policy("variable_quantity must be at least 1"));
        }
        for (name, value) in self.payoff_hunger.iter().chain(self.source_weight.iter()) {
            check_weight(name, *value)?;
        }
        Ok(())
    }

    pub fn hunger(&self, mechanic: &str) -> f64 {
        self.payoff_hunger
            .get(mechanic)
            .copied()
            .unwrap_or(self.default_payoff_hunger)
    }

    pub fn source_weight(&self, mechanic: &str) -> f64 {
        self.source_weight
            .get(mechanic)
            .copied()
            .unwrap_or(self.default_source_weight)
    }

    /// Cards moved per activation. A tag without a quantity moves one card.
    pub fn cards_per_activation(&self, quantity: Option<Quantity>) -> u32 {
        match quantity {
            None => 1,
            Some(Quantity::Fixed(n)) => n.max(1),
            Some(Quantity::Variable) => self.variable_quantity,
        }
    }

    /// Source intensity in `(0, 1]`.
    pub fn intensity(&self, quantity: Option<Quantity>) -> f64 {
        let cap = self.intensity_cap.max(1);
        let n = self.cards_per_activation(quantity).min(cap);
        f64::from(n) / f64::from(cap)
    }

    /// Strength of `source` feeding `payoff`.
    pub fn link_strength(&self, source: &MechanicTag, payoff: &MechanicTag) -> f64 {
        self.scale
            * self.hunger(&payoff.mechanic)
            * self.source_weight(&source.mechanic)
            * self.intensity(source.quantity)
    }
}
