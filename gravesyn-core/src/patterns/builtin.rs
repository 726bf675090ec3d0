//! Built-in rule table.
//!
//! Rules run against one normalized ability unit at a time (reminder text
//! already stripped). Keyword rules are anchored to the start of a unit or
//! to a comma-separated keyword list. Every `true_payoff` rule carries the
//! self-recursion keyword exclusion explicitly.

use crate::taxonomy::{mechanic, Family};

use super::rule::PatternRule;

/// Version of the built-in table. Bump when any built-in rule changes.
pub const BUILTIN_RULESET_VERSION: u32 = 3;

/// Quantity capture shared by mill/fill rules.
const QTY: &str = r"(?P<n>an?|one|two|three|four|five|six|seven|eight|nine|ten|x|\d+)";

/// Vetoes a payoff match on a line that is a self-recursion ability.
pub const SELF_RECURSION_EXCLUSION: &str =
    r"\b(?:flashback|jump-start|retrace|disturb|embalm|eternalize|aftermath)\b";

/// Vetoes a payoff match on a line where the card only returns itself.
pub const SELF_RETURN_EXCLUSION: &str =
    r"\b(?:return|put)s? (?:this card|this creature|this permanent|~)\b";

/// Players other than the controller, as a mill subject.
const OTHER_PLAYER: &str =
    r"(?:target (?:player|opponent)|each (?:opponent|player)|that player|defending player|an opponent)";

fn keyword(word: &str) -> String {
    format!(r"(?:^|, ){}\b", word)
}

fn self_recursion(name: &str) -> PatternRule {
    PatternRule::new(
        format!("self_recursion/{}/keyword", name),
        Family::SelfRecursion,
        name,
        keyword(name),
    )
}

fn payoff(name: &str, variant: &str, pattern: impl Into<String>) -> PatternRule {
    PatternRule::new(
        format!("true_payoff/{}/{}", name, variant),
        Family::TruePayoff,
        name,
        pattern,
    )
    .with_exclusion(SELF_RECURSION_EXCLUSION)
}

fn fill(name: &str, variant: &str, pattern: impl Into<String>) -> PatternRule {
    PatternRule::new(
        format!("mill_fill/{}/{}", name, variant),
        Family::MillFill,
        name,
        pattern,
    )
}

/// The built-in rules, in declaration order.
pub fn builtin_rules() -> Vec<PatternRule> {
    let mut rules: Vec<PatternRule> = mechanic::SELF_RECURSION_KEYWORDS
        .iter()
        .map(|name| self_recursion(name))
        .collect();

    rules.extend([
        payoff(
            mechanic::REANIMATION,
            "return-or-put",
            r"\b(?:return|put)s?\b[^.]*?\b(?:creature|permanent|artifact|enchantment|planeswalker)s?\b[^.]*?\bfrom (?:a|an|your|any|each|their|target player's|an opponent's) graveyards?\b[^.]*?\b(?:onto|to) the battlefield\b",
        )
        .with_exclusion(SELF_RETURN_EXCLUSION),
        payoff(mechanic::DELVE, "keyword", keyword(mechanic::DELVE)),
        payoff(mechanic::ESCAPE, "keyword", keyword(mechanic::ESCAPE)),
        payoff(
            mechanic::THRESHOLD,
            "seven-or-more",
            r"\b(?:seven|7) or more cards (?:are )?in your graveyard\b",
        ),
        payoff(
            mechanic::DELIRIUM,
            "four-card-types",
            r"\b(?:four|4) or more card types among cards in your graveyard\b",
        ),
        payoff(
            mechanic::UNDERGROWTH,
            "creature-count",
            r"^undergrowth\b[^.]*?\bnumber of creature cards in your graveyard\b",
        ),
        payoff(mechanic::DREDGE, "keyword", format!(r"{} ?\d*", keyword(mechanic::DREDGE))),
        payoff(
            mechanic::COUNT_EFFECT,
            "scaled-by-graveyard",
            r"\b(?:for each|number of)\b[^.]*?\bcards? in (?:your|all|each|a|their|target player's|an opponent's) graveyards?\b",
        )
        .with_exclusions([r"^undergrowth\b"]),
    ]);

    rules.extend([
        fill(
            mechanic::MILL,
            "self",
            format!(r"\bmills? {} cards?\b", QTY),
        )
        .with_exclusion(format!(r"\b{} mills?\b", OTHER_PLAYER)),
        fill(
            mechanic::MILL,
            "top-n",
            format!(r"\bput the top (?:{} )?cards? of your library into your graveyard\b", QTY),
        ),
        fill(
            mechanic::MILL,
            "put-rest",
            r"\bput (?:the rest|the others|the other cards|them|those cards) into your graveyard\b",
        )
        .with_exclusion(r"\bsearch your library\b"),
        fill(
            mechanic::OPPONENT_MILL,
            "targeted",
            format!(r"\b{} mills? {} cards?\b", OTHER_PLAYER, QTY),
        ),
        fill(
            mechanic::DISCARD,
            "count",
            format!(r"\bdiscards? {} cards?\b", QTY),
        ),
        fill(
            mechanic::DISCARD,
            "hand",
            r"\bdiscards? (?:that many cards|your hand|their hand)\b",
        ),
        fill(mechanic::SURVEIL, "keyword", format!(r"\bsurveil {}\b", QTY)),
        fill(
            mechanic::ENTOMB,
            "tutor",
            r"\bsearch your library for [^.]*?\bput (?:it|that card|them|those cards) into your graveyard\b",
        ),
    ]);

    rules
}
