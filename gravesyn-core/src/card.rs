//! Card records, tagged cards, and normalized candidate pairs.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::error::{GravesynError, GravesynResult};
use crate::taxonomy::TagSet;

/// Card record as supplied by the external catalog.
///
/// Missing fields deserialize as empty strings so a bad record is rejected
/// on its own instead of failing the whole input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "ability_text")]
    pub text: String,
}

impl CardRecord {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// Rejects records with an empty id or empty ability text.
    pub fn validate(&self) -> GravesynResult<()> {
        if self.id.trim().is_empty() {
            return Err(GravesynError::invalid_card(&self.id, "card id is empty"));
        }
        if self.text.trim().is_empty() {
            return Err(GravesynError::invalid_card(&self.id, "ability text is empty"));
        }
        Ok(())
    }
}

/// A card after tagging. Immutable; re-tag only when the text changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedCard {
    pub id: String,
    pub text: String,
    pub tags: TagSet,
}

impl TaggedCard {
    pub fn new(id: impl Into<String>, text: impl Into<String>, tags: TagSet) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            tags,
        }
    }
}

/// Unordered pair of distinct card ids, stored in sorted order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardPair {
    first: String,
    second: String,
}

impl CardPair {
    /// Normalizes `(a, b)` and `(b, a)` to the same pair. Rejects `(a, a)`.
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> GravesynResult<Self> {
        let (a, b) = (a.into(), b.into());
        match a.cmp(&b) {
            Ordering::Less => Ok(Self { first: a, second: b }),
            Ordering::Greater => Ok(Self { first: b, second: a }),
            Ordering::Equal => Err(GravesynError::self_pair(a)),
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }

    pub fn contains(&self, id: &str) -> bool {
        self.first == id || self.second == id
    }
}

impl fmt::Display for CardPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.first, self.second)
    }
}
