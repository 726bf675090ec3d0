//! Mechanic taxonomy: families, built-in mechanic names, and tag sets.
//!
//! A mechanic belongs to exactly one [`Family`]. Mechanic names are plain
//! strings so operators can register new ones (a future self-recursion
//! keyword, say) through the Pattern Library without touching the evaluator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Top-level mechanic family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    /// Acts from the graveyard using only the card itself.
    SelfRecursion,
    /// Benefits from other cards in the graveyard.
    TruePayoff,
    /// Puts cards into a graveyard without using them.
    MillFill,
    /// No graveyard signal.
    Neutral,
}

impl Family {
    /// All families in audit order.
    pub const ALL: [Family; 4] = [
        Family::SelfRecursion,
        Family::TruePayoff,
        Family::MillFill,
        Family::Neutral,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Family::SelfRecursion => "self_recursion",
            Family::TruePayoff => "true_payoff",
            Family::MillFill => "mill_fill",
            Family::Neutral => "neutral",
        }
    }

    /// Whether tags of this family say anything about the graveyard.
    pub fn is_graveyard_relevant(self) -> bool {
        !matches!(self, Family::Neutral)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Family {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "self_recursion" => Ok(Family::SelfRecursion),
            "true_payoff" => Ok(Family::TruePayoff),
            "mill_fill" => Ok(Family::MillFill),
            "neutral" => Ok(Family::Neutral),
            other => Err(format!("unknown mechanic family '{}'", other)),
        }
    }
}

/// Built-in mechanic names.
pub mod mechanic {
    // self_recursion
    pub const FLASHBACK: &str = "flashback";
    pub const JUMP_START: &str = "jump-start";
    pub const RETRACE: &str = "retrace";
    pub const DISTURB: &str = "disturb";
    pub const EMBALM: &str = "embalm";
    pub const ETERNALIZE: &str = "eternalize";
    pub const AFTERMATH: &str = "aftermath";

    // true_payoff
    pub const REANIMATION: &str = "reanimation";
    pub const DELVE: &str = "delve";
    pub const ESCAPE: &str = "escape";
    pub const THRESHOLD: &str = "threshold";
    pub const DELIRIUM: &str = "delirium";
    pub const UNDERGROWTH: &str = "undergrowth";
    pub const DREDGE: &str = "dredge";
    pub const COUNT_EFFECT: &str = "count-effect";

    // mill_fill
    pub const MILL: &str = "mill";
    pub const OPPONENT_MILL: &str = "opponent-mill";
    pub const DISCARD: &str = "discard";
    pub const SURVEIL: &str = "surveil";
    pub const ENTOMB: &str = "entomb";

    /// Self-recursion keywords known to the built-in ruleset.
    pub const SELF_RECURSION_KEYWORDS: [&str; 7] = [
        FLASHBACK, JUMP_START, RETRACE, DISTURB, EMBALM, ETERNALIZE, AFTERMATH,
    ];
}

/// Number of cards an effect moves per activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    Fixed(u32),
    /// `X` or another amount only known at resolution.
    Variable,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::Fixed(n) => write!(f, "{}", n),
            Quantity::Variable => f.write_str("x"),
        }
    }
}

/// One mechanic detected on a card.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MechanicTag {
    pub family: Family,
    pub mechanic: String,
    /// Id of the rule that assigned this mechanic (first firing rule wins).
    pub rule_id: String,
    /// Ability units the rule fired on, ascending. Never empty.
    pub lines: Vec<usize>,
    /// Cards per activation, when the rule captured one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Quantity>,
}

impl MechanicTag {
    pub fn new(family: Family, mechanic: impl Into<String>, rule_id: impl Into<String>, line: usize) -> Self {
        Self {
            family,
            mechanic: mechanic.into(),
            rule_id: rule_id.into(),
            lines: vec![line],
            quantity: None,
        }
    }

    /// Adds further units the same rule fired on.
    pub fn with_lines<I: IntoIterator<Item = usize>>(mut self, lines: I) -> Self {
        self.lines.extend(lines);
        self.lines.sort_unstable();
        self.lines.dedup();
        self
    }

    /// First unit the rule fired on.
    pub fn line(&self) -> usize {
        self.lines.first().copied().unwrap_or(0)
    }

    pub fn with_quantity(mut self, quantity: Option<Quantity>) -> Self {
        self.quantity = quantity;
        self
    }
}

impl fmt::Display for MechanicTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.family, self.mechanic)?;
        if let Some(q) = self.quantity {
            write!(f, "({})", q)?;
        }
        Ok(())
    }
}

/// Ordered tags of one card, at most one per mechanic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet {
    tags: Vec<MechanicTag>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tag unless its mechanic is already present.
    ///
    /// Returns `false` when an earlier rule already assigned the mechanic.
    pub fn insert(&mut self, tag: MechanicTag) -> bool {
        if self.contains(&tag.mechanic) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &MechanicTag> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn contains(&self, mechanic: &str) -> bool {
        self.tags.iter().any(|t| t.mechanic == mechanic)
    }

    pub fn get(&self, mechanic: &str) -> Option<&MechanicTag> {
        self.tags.iter().find(|t| t.mechanic == mechanic)
    }

    pub fn has_family(&self, family: Family) -> bool {
        self.tags.iter().any(|t| t.family == family)
    }

    pub fn by_family(&self, family: Family) -> impl Iterator<Item = &MechanicTag> {
        self.tags.iter().filter(move |t| t.family == family)
    }

    /// Family-level presence. A card with no graveyard-relevant tag is `neutral`.
    pub fn families(&self) -> BTreeSet<Family> {
        let mut families: BTreeSet<Family> = self
            .tags
            .iter()
            .map(|t| t.family)
            .filter(|f| f.is_graveyard_relevant())
            .collect();
        if families.is_empty() {
            families.insert(Family::Neutral);
        }
        families
    }

    pub fn mechanics(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.mechanic.as_str()).collect()
    }

    /// True when the card has no graveyard-relevant tag at all.
    pub fn is_neutral(&self) -> bool {
        !self.tags.iter().any(|t| t.family.is_graveyard_relevant())
    }

    /// True when self-recursion is the card's only graveyard-relevant family.
    pub fn is_self_recursion_only(&self) -> bool {
        self.families().into_iter().eq([Family::SelfRecursion])
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = &'a MechanicTag;
    type IntoIter = std::slice::Iter<'a, MechanicTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}
