//! Memoized sibling-group solutions.
//!
//! Outlines repeat themselves (many classes with the same members), so groups
//! with identical dimensions are solved once per layout. Keys are blake3
//! fingerprints over the solver settings and the exact bits of every rectangle.

use std::collections::HashMap;

use blake3::Hash;

use crate::config::PackingConfig;
use crate::pack::{PackingResult, Rectangle};

pub fn fingerprint(config: &PackingConfig, rectangles: &[Rectangle]) -> Hash {
    let mut hasher = blake3::Hasher::new();
    for value in [
        config.aspect_ratio,
        config.tolerance,
        config.expansion_limit,
        config.gutter,
    ] {
        hasher.update(&value.to_bits().to_le_bytes());
    }
    hasher.update(&(rectangles.len() as u64).to_le_bytes());
    for rect in rectangles {
        hasher.update(&(rect.index as u64).to_le_bytes());
        hasher.update(&rect.width.to_bits().to_le_bytes());
        hasher.update(&rect.height.to_bits().to_le_bytes());
    }
    hasher.finalize()
}

#[derive(Debug, Default)]
pub struct SolveCache {
    entries: HashMap<Hash, PackingResult>,
    hits: u64,
    misses: u64,
}

impl SolveCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, key: &Hash) -> Option<&PackingResult> {
        match self.entries.get(key) {
            Some(result) => {
                self.hits += 1;
                Some(result)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: Hash, result: PackingResult) {
        self.entries.insert(key, result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
