//! Tag cache using SHA-256 for change detection.
//!
//! Cards are tagged once per catalog ingestion and re-tagged only when
//! their ability text changes. The cache is keyed by card id and stores
//! the text hash next to the tags.
//!
//! # Cache Versioning
//!
//! The whole cache is discarded when:
//! - the cache format version changes
//! - the major gravesyn version changes
//! - the Pattern Library fingerprint changes (any rule edit)
//!
//! Edges are never cached.

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use crate::card::{CardRecord, TaggedCard};
use crate::error::GravesynResult;
use crate::patterns::PatternLibrary;
use crate::tagger::Tagger;
use crate::taxonomy::TagSet;

/// Maximum cache file size (50MB).
const MAX_CACHE_SIZE_BYTES: usize = 50_000_000;

/// Current cache format version. Increment when the format changes.
const CACHE_VERSION: u32 = 2;

const GRAVESYN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Directory holding the cache, relative to the working root.
pub const CACHE_DIR: &str = ".gravesyn";

const CACHE_FILE: &str = "tags.json";

/// Cached tags of one card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedTags {
    pub hash: String,
    pub tags: TagSet,
}

/// Cache metadata for compatibility checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub cache_version: u32,
    pub gravesyn_version: String,
    pub library_fingerprint: String,
    #[serde(default)]
    pub created_at: u64,
}

impl CacheMetadata {
    /// Metadata for the current build and library.
    pub fn current(library: &PatternLibrary) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            cache_version: CACHE_VERSION,
            gravesyn_version: GRAVESYN_VERSION.to_string(),
            library_fingerprint: library.fingerprint(),
            created_at,
        }
    }

    /// Whether tags cached under this metadata are valid for `library`.
    pub fn is_compatible(&self, library: &PatternLibrary) -> bool {
        if self.cache_version != CACHE_VERSION {
            return false;
        }

        let current_major = GRAVESYN_VERSION.split('.').next().unwrap_or("0");
        let cached_major = self.gravesyn_version.split('.').next().unwrap_or("0");
        if current_major != cached_major {
            return false;
        }

        self.library_fingerprint == library.fingerprint()
    }
}

/// Card id → cached tags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagCache {
    #[serde(default)]
    pub metadata: CacheMetadata,
    pub cards: BTreeMap<String, CachedTags>,
}

/// Outcome of [`TagCache::retag`].
#[derive(Debug)]
pub struct RetagReport {
    /// One result per input card, in input order.
    pub results: Vec<GravesynResult<TaggedCard>>,
    pub hits: usize,
    pub misses: usize,
}

/// SHA-256 of ability text.
#[inline]
pub fn text_hash(text: &str) -> String {
    let mut sha = Sha256::new();
    sha.update(text.as_bytes());
    format!("{:x}", sha.finalize())
}

enum Lookup {
    Hit(TaggedCard),
    Miss(TaggedCard, String),
}

impl TagCache {
    /// Empty cache bound to `library`.
    pub fn new(library: &PatternLibrary) -> Self {
        Self {
            metadata: CacheMetadata::current(library),
            cards: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Cached tags for `card` if its text is unchanged.
    pub fn lookup(&self, card: &CardRecord) -> Option<&TagSet> {
        self.cards
            .get(&card.id)
            .filter(|c| c.hash == text_hash(&card.text))
            .map(|c| &c.tags)
    }

    /// Tags `cards`, reusing cached tags for unchanged text.
    ///
    /// An incompatible cache is cleared first. Bad records are reported in
    /// their slot and leave the cache untouched.
    pub fn retag(&mut self, cards: &[CardRecord], library: &PatternLibrary) -> RetagReport {
        if !self.metadata.is_compatible(library) {
            if !self.cards.is_empty() {
                info!(entries = self.cards.len(), "tag cache incompatible with library, rebuilding");
            }
            *self = Self::new(library);
        }

        let tagger = Tagger::new(library);
        let cache = &*self;
        let lookups: Vec<GravesynResult<Lookup>> = cards
            .par_iter()
            .map(|card| {
                card.validate()?;
                let hash = text_hash(&card.text);
                if let Some(cached) = cache.cards.get(&card.id).filter(|c| c.hash == hash) {
                    return Ok(Lookup::Hit(TaggedCard::new(
                        card.id.clone(),
                        card.text.clone(),
                        cached.tags.clone(),
                    )));
                }
                Ok(Lookup::Miss(tagger.tag_card(card)?, hash))
            })
            .collect();

        let (mut hits, mut misses) = (0, 0);
        let mut results = Vec::with_capacity(lookups.len());
        for lookup in lookups {
            results.push(lookup.map(|l| match l {
                Lookup::Hit(tagged) => {
                    hits += 1;
                    tagged
                }
                Lookup::Miss(tagged, hash) => {
                    misses += 1;
                    self.cards.insert(
                        tagged.id.clone(),
                        CachedTags {
                            hash,
                            tags: tagged.tags.clone(),
                        },
                    );
                    tagged
                }
            }));
        }

        debug!(hits, misses, "tag cache refreshed");
        RetagReport { results, hits, misses }
    }
}

fn cache_path(root: &Path) -> PathBuf {
    root.join(CACHE_DIR).join(CACHE_FILE)
}

/// Loads the cache from `.gravesyn/tags.json`.
///
/// Returns `None` if the file is missing or corrupted. Compatibility with
/// the active library is checked later by [`TagCache::retag`].
pub fn load_cache(root: &Path) -> Option<TagCache> {
    let path = cache_path(root);
    if !path.exists() {
        return None;
    }

    let text = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&text) {
        Ok(cache) => Some(cache),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "discarding corrupted tag cache");
            let _ = fs::remove_file(&path);
            None
        }
    }
}

/// Saves the cache with an atomic temp-file + rename write.
pub fn save_cache(root: &Path, cache: &TagCache) -> Result<()> {
    let dir = root.join(CACHE_DIR);
    if !dir.exists() {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache dir: {}", dir.display()))?;
    }

    let path = cache_path(root);
    let json = serde_json::to_string_pretty(cache)?;

    if json.len() > MAX_CACHE_SIZE_BYTES {
        warn!(
            limit_mb = MAX_CACHE_SIZE_BYTES / 1_000_000,
            "tag cache exceeds size limit, clearing"
        );
        let _ = fs::remove_file(&path);
        return Ok(());
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let temp_path = dir.join(format!("{}.{}.{}.tmp", CACHE_FILE, std::process::id(), nanos));

    fs::write(&temp_path, &json)
        .with_context(|| format!("Failed to write temp cache file: {}", temp_path.display()))?;

    fs::rename(&temp_path, &path).with_context(|| {
        let _ = fs::remove_file(&temp_path);
        format!("Failed to rename cache file to: {}", path.display())
    })?;

    Ok(())
}
