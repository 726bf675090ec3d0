//! Mechanic Tagger: applies the Pattern Library to ability text.
//!
//! Tagging is a pure function of `(library, text)`. It reads no other card
//! and keeps no state, so batches are tagged in parallel with Rayon and the
//! result never depends on batch order.
//!
//! Text arrives already normalized (case folded, whitespace collapsed).
//! The tagger only splits it into ability units and drops reminder text,
//! which never carries a functional ability.

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::card::{CardRecord, TaggedCard};
use crate::error::GravesynResult;
use crate::patterns::{LineMatch, PatternLibrary};
use crate::taxonomy::{MechanicTag, Quantity, TagSet};

/// One functional ability unit (a sentence of one ability line) with its
/// position in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbilityLine {
    pub index: usize,
    pub text: String,
}

/// Removes parenthesized reminder text, including nested parentheses.
pub fn strip_reminder_text(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut depth = 0usize;
    for c in line.chars() {
        match c {
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits a line after every `". "`, keeping the period with its sentence.
fn sentences(line: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    for (at, _) in line.match_indices(". ") {
        out.push(&line[start..=at]);
        start = at + 2;
    }
    out.push(&line[start..]);
    out
}

/// Splits ability text into non-empty ability units.
///
/// Text is split on newlines, reminder text is removed, then each line is
/// split into sentences. Whitespace-collapsed text that lost its line
/// breaks still yields one unit per sentence. Indices count every unit
/// before empty ones are dropped, so they stay stable when a line is
/// nothing but reminder text.
pub fn ability_lines(text: &str) -> Vec<AbilityLine> {
    let mut units = Vec::new();
    let mut index = 0;
    for raw in text.lines() {
        let stripped = strip_reminder_text(raw);
        for sentence in sentences(&stripped) {
            let sentence = sentence.trim();
            if !sentence.is_empty() {
                units.push(AbilityLine {
                    index,
                    text: sentence.to_string(),
                });
            }
            index += 1;
        }
    }
    units
}

/// Parses the raw text of a quantity capture.
pub fn parse_quantity(raw: &str) -> Option<Quantity> {
    let word = raw.trim().to_ascii_lowercase();
    let n = match word.as_str() {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "x" => return Some(Quantity::Variable),
        digits => digits.parse().ok()?,
    };
    Some(Quantity::Fixed(n))
}

/// Tags one ability text against a library.
///
/// Every rule is tried on every unit. The first rule (in library order)
/// that fires for a mechanic assigns it; later rules for the same mechanic
/// are ignored. The tag records every unit that rule fired on, and takes
/// its quantity from the first. Families are evaluated independently, so
/// one card can be both a mill source and a self-recursion card.
pub fn tag_text(library: &PatternLibrary, text: &str) -> TagSet {
    let lines = ability_lines(text);
    let mut tags = TagSet::new();

    for rule in library.rules() {
        if tags.contains(rule.mechanic()) {
            continue;
        }
        let mut tag: Option<MechanicTag> = None;
        for line in &lines {
            match rule.match_line(&line.text) {
                LineMatch::Miss => {}
                LineMatch::Excluded { exclusion } => {
                    trace!(rule_id = %rule.id(), line = line.index, exclusion, "rule vetoed by exclusion");
                }
                LineMatch::Fired { quantity } => {
                    tag = Some(match tag {
                        Some(t) => t.with_lines([line.index]),
                        None => MechanicTag::new(rule.family(), rule.mechanic(), rule.id(), line.index)
                            .with_quantity(quantity.and_then(parse_quantity)),
                    });
                }
            }
        }
        if let Some(tag) = tag {
            tags.insert(tag);
        }
    }

    tags
}

/// Tagger bound to one library.
#[derive(Debug, Clone, Copy)]
pub struct Tagger<'a> {
    library: &'a PatternLibrary,
}

impl<'a> Tagger<'a> {
    pub fn new(library: &'a PatternLibrary) -> Self {
        Self { library }
    }

    pub fn library(&self) -> &'a PatternLibrary {
        self.library
    }

    /// Tags a single ability text.
    pub fn tag(&self, text: &str) -> TagSet {
        tag_text(self.library, text)
    }

    /// Validates and tags one card record.
    pub fn tag_card(&self, card: &CardRecord) -> GravesynResult<TaggedCard> {
        card.validate()?;
        let tags = self.tag(&card.text);
        debug!(card_id = %card.id, tags = tags.len(), "card tagged");
        Ok(TaggedCard::new(card.id.clone(), card.text.clone(), tags))
    }

    /// Tags a batch in parallel. Results keep input order; a bad record
    /// yields an error in its slot without affecting the others.
    pub fn tag_batch(&self, cards: &[CardRecord]) -> Vec<GravesynResult<TaggedCard>> {
        cards.par_iter().map(|card| self.tag_card(card)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::{mechanic, Family};

    fn lib() -> PatternLibrary {
        PatternLibrary::builtin().unwrap()
    }

    #[test]
    fn test_strip_reminder_text() {
        assert_eq!(
            strip_reminder_text("flashback {r} (you may cast this card from your graveyard for its flashback cost.)"),
            "flashback {r}"
        );
        assert_eq!(strip_reminder_text("a (b (c) d) e"), "a e");
        assert_eq!(strip_reminder_text("(only reminder)"), "");
    }

    #[test]
    fn test_ability_lines_keep_original_indices() {
        let lines = ability_lines("flying\n(reminder only)\ndelve");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].index, 0);
        assert_eq!(lines[1].index, 2);
        assert_eq!(lines[1].text, "delve");
    }

    #[test]
    fn test_ability_lines_split_sentences() {
        let lines = ability_lines("delve draw two cards. flashback {5}{u}\nflying");
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["delve draw two cards.", "flashback {5}{u}", "flying"]);
        assert_eq!(lines[2].index, 2);
    }

    #[test]
    fn test_reminder_periods_do_not_split() {
        let lines = ability_lines("flashback {r} (you may cast it. then exile it.) draw a card.");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "flashback {r} draw a card.");
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("three"), Some(Quantity::Fixed(3)));
        assert_eq!(parse_quantity("a"), Some(Quantity::Fixed(1)));
        assert_eq!(parse_quantity("12"), Some(Quantity::Fixed(12)));
        assert_eq!(parse_quantity("X"), Some(Quantity::Variable));
        assert_eq!(parse_quantity("many"), None);
    }

    #[test]
    fn test_flashback_is_self_recursion_only() {
        let tags = tag_text(&lib(), "flaring pain deals damage.\nflashback {r}");
        assert!(tags.contains(mechanic::FLASHBACK));
        assert!(tags.is_self_recursion_only());
        assert!(!tags.has_family(Family::TruePayoff));
    }

    #[test]
    fn test_flashback_graveyard_wording_not_payoff() {
        let text = "flashback—{1}{g}, return a creature card from your graveyard to the battlefield";
        let tags = tag_text(&lib(), text);
        assert!(tags.contains(mechanic::FLASHBACK));
        assert!(!tags.contains(mechanic::REANIMATION));
    }

    #[test]
    fn test_reanimation_requires_battlefield_shape() {
        let lib = lib();
        let tags = tag_text(&lib, "put target creature card from a graveyard onto the battlefield under your control.");
        assert!(tags.contains(mechanic::REANIMATION));

        let tags = tag_text(&lib, "return target creature card from your graveyard to your hand.");
        assert!(!tags.contains(mechanic::REANIMATION));

        let tags = tag_text(&lib, "exile target card from a graveyard.");
        assert!(tags.is_neutral());
    }

    #[test]
    fn test_self_return_is_not_reanimation() {
        let tags = tag_text(
            &lib(),
            "{2}{b}: return this creature card from your graveyard to the battlefield tapped.",
        );
        assert!(!tags.contains(mechanic::REANIMATION));
    }

    #[test]
    fn test_mill_quantity_captured() {
        let tags = tag_text(&lib(), "when this creature enters the battlefield, mill three cards.");
        let mill = tags.get(mechanic::MILL).unwrap();
        assert_eq!(mill.family, Family::MillFill);
        assert_eq!(mill.quantity, Some(Quantity::Fixed(3)));
    }

    #[test]
    fn test_opponent_mill_separate_from_self_mill() {
        let tags = tag_text(&lib(), "target player mills x cards.");
        assert!(!tags.contains(mechanic::MILL));
        let tag = tags.get(mechanic::OPPONENT_MILL).unwrap();
        assert_eq!(tag.quantity, Some(Quantity::Variable));
    }

    #[test]
    fn test_keyword_inside_other_ability_not_tagged() {
        let tags = tag_text(&lib(), "target instant card in your graveyard gains flashback until end of turn.");
        assert!(!tags.contains(mechanic::FLASHBACK));
    }

    #[test]
    fn test_reminder_text_does_not_match() {
        // The reminder wording alone would look like a count effect.
        let tags = tag_text(
            &lib(),
            "flying\n(this spell costs {1} less for each card in your graveyard.)",
        );
        assert!(tags.is_neutral());
    }

    #[test]
    fn test_threshold_and_delirium_need_cardinality() {
        let lib = lib();
        let tags = tag_text(&lib, "threshold — as long as seven or more cards are in your graveyard, this creature gets +1/+1.");
        assert!(tags.contains(mechanic::THRESHOLD));
        let tags = tag_text(&lib, "delirium — this gets +2/+2 as long as there are four or more card types among cards in your graveyard.");
        assert!(tags.contains(mechanic::DELIRIUM));
        let tags = tag_text(&lib, "threshold");
        assert!(tags.is_neutral());
    }

    #[test]
    fn test_undergrowth_not_double_counted() {
        let tags = tag_text(
            &lib(),
            "undergrowth — target creature gets -x/-x, where x is the number of creature cards in your graveyard.",
        );
        assert!(tags.contains(mechanic::UNDERGROWTH));
        assert!(!tags.contains(mechanic::COUNT_EFFECT));
    }

    #[test]
    fn test_count_effect() {
        let tags = tag_text(&lib(), "this creature gets +1/+0 for each creature card in your graveyard.");
        assert!(tags.contains(mechanic::COUNT_EFFECT));
    }

    #[test]
    fn test_multiple_families_on_one_card() {
        let tags = tag_text(&lib(), "mill two cards.\nflashback {3}{u}");
        assert!(tags.has_family(Family::MillFill));
        assert!(tags.has_family(Family::SelfRecursion));
        assert_eq!(tags.get(mechanic::FLASHBACK).map(|t| t.line()), Some(1));
    }

    #[test]
    fn test_single_line_card_keeps_both_families() {
        let tags = tag_text(
            &lib(),
            "return target creature card from your graveyard to the battlefield. flashback—sacrifice three creatures.",
        );
        assert_eq!(tags.get(mechanic::REANIMATION).map(|t| t.line()), Some(0));
        assert_eq!(tags.get(mechanic::FLASHBACK).map(|t| t.line()), Some(1));
    }

    #[test]
    fn test_put_top_cards_is_mill() {
        let tags = tag_text(
            &lib(),
            "when this creature enters the battlefield, put the top three cards of your library into your graveyard.",
        );
        let mill = tags.get(mechanic::MILL).unwrap();
        assert_eq!(mill.quantity, Some(Quantity::Fixed(3)));
        assert!(tag_text(&lib(), "put the top card of your library into your graveyard.").contains(mechanic::MILL));
    }

    #[test]
    fn test_tag_records_every_firing_line() {
        let tags = tag_text(&lib(), "mill two cards.\nflying\nmill a card.");
        let mill = tags.get(mechanic::MILL).unwrap();
        assert_eq!(mill.lines, vec![0, 2]);
        assert_eq!(mill.quantity, Some(Quantity::Fixed(2)));
    }

    #[test]
    fn test_tag_card_rejects_empty_text() {
        let lib = lib();
        let tagger = Tagger::new(&lib);
        let err = tagger.tag_card(&CardRecord::new("blank", "   ")).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_tag_batch_isolates_bad_records() {
        let lib = lib();
        let tagger = Tagger::new(&lib);
        let cards = vec![
            CardRecord::new("a", "delve"),
            CardRecord::new("", "mill two cards."),
            CardRecord::new("c", "mill two cards."),
        ];
        let results = tagger.tag_batch(&cards);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].as_ref().unwrap().tags.contains(mechanic::MILL));
    }
}
