//! Graveyard-synergy scoring between pairs of tagged cards.
//!
//! - [`policy`]: tunable weights (payoff hunger, source weight, intensity)
//! - [`evaluator`]: role assignment, eligibility, and edge construction

pub mod evaluator;
pub mod policy;

pub use evaluator::{eligible_payoff_tags, roles, source_tags, Role, SynergyEdge, SynergyEvaluator, SynergyLink};
pub use policy::ScoringPolicy;
