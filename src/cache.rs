//! Host-side memoization of [`build`] results.
//!
//! Entries are keyed by a SHA-256 digest of the corpus and parameters, so a
//! changed corpus or parameter can never return a stale graph. The cache is an
//! ordinary value owned by whoever calls it; there is no global instance.

use std::collections::{HashMap, VecDeque};

use log::debug;
use sha2::{Digest, Sha256};

use crate::cooccurrence::{Graph, build};
use crate::error::Result;

/// Digest of `(corpus, top_n, min_weight)`. Tokens are length-prefixed so
/// `["ab"]` and `["a", "b"]` hash differently.
pub fn content_key(corpus: &[Vec<String>], top_n: usize, min_weight: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update((corpus.len() as u64).to_le_bytes());
    for document in corpus {
        hasher.update((document.len() as u64).to_le_bytes());
        for token in document {
            hasher.update((token.len() as u64).to_le_bytes());
            hasher.update(token.as_bytes());
        }
    }
    hasher.update((top_n as u64).to_le_bytes());
    hasher.update(min_weight.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Graphs kept by [`BuildCache::new`].
pub const DEFAULT_CAPACITY: usize = 32;

/// Holds at most `capacity` graphs; the oldest entry is dropped first.
#[derive(Debug)]
pub struct BuildCache {
    entries: HashMap<String, Graph>,
    order: VecDeque<String>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl Default for BuildCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl BuildCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A capacity of 0 is treated as 1.
    pub fn with_capacity(capacity: usize) -> Self {
        BuildCache {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
        }
    }

    /// Returns the cached graph for these inputs, building it on a miss.
    /// Invalid parameters are reported and nothing is cached.
    pub fn get_or_build(
        &mut self,
        corpus: &[Vec<String>],
        top_n: usize,
        min_weight: u32,
    ) -> Result<&Graph> {
        let key = content_key(corpus, top_n, min_weight);
        if self.entries.contains_key(&key) {
            self.hits += 1;
            debug!("build cache hit {}", &key[..12]);
        } else {
            let graph = build(corpus, top_n, min_weight)?;
            self.misses += 1;
            debug!("build cache miss {}", &key[..12]);
            if self.entries.len() >= self.capacity {
                if let Some(oldest) = self.order.pop_front() {
                    self.entries.remove(&oldest);
                    debug!("build cache evicted {}", &oldest[..12]);
                }
            }
            self.order.push_back(key.clone());
            self.entries.insert(key.clone(), graph);
        }
        Ok(&self.entries[&key])
    }

    pub fn invalidate_all(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
