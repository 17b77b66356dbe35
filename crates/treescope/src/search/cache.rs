//! Optional LRU cache for search responses.
//!
//! Keys derive deterministically from the argument bag, so identical requests
//! hit regardless of which surface issued them. Safe for concurrent use.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use treescope_contracts::{SearchArguments, SearchOutcome};

const DEFAULT_CAPACITY: usize = 256;

pub struct SearchCache {
    inner: Mutex<LruCache<u64, SearchOutcome>>,
}

impl Default for SearchCache {
    fn default() -> Self {
        SearchCache::new(DEFAULT_CAPACITY)
    }
}

impl SearchCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        SearchCache {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Deterministic key over the full argument bag. Output plumbing does not
    /// change what a search returns, so it is excluded.
    pub fn key_for(arguments: &SearchArguments) -> u64 {
        let mut canonical = arguments.clone();
        canonical.output_file = None;
        canonical.suppress_output = false;
        hash_arguments(&canonical)
    }

    /// Key the same search would use in `count_only_matches` mode; lets a
    /// `total_only` run prime the detailed-count entry.
    pub fn count_only_key_for(arguments: &SearchArguments) -> u64 {
        let mut canonical = arguments.clone();
        canonical.output_file = None;
        canonical.suppress_output = false;
        canonical.total_only = false;
        canonical.count_only_matches = true;
        hash_arguments(&canonical)
    }

    pub fn get(&self, key: u64) -> Option<SearchOutcome> {
        self.inner.lock().get(&key).cloned()
    }

    pub fn put(&self, key: u64, outcome: SearchOutcome) {
        self.inner.lock().put(key, outcome);
    }
}

fn hash_arguments(arguments: &SearchArguments) -> u64 {
    // Struct field order is fixed, so the JSON encoding is stable.
    let encoded = serde_json::to_string(arguments).unwrap_or_default();
    let mut hasher = DefaultHasher::new();
    encoded.hash(&mut hasher);
    hasher.finish()
}
