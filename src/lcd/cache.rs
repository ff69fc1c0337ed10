//! Code details cache.
//!
//! Uploaded code is immutable on-chain, so entries never expire. One cache belongs to
//! one client instance and is shared between its clones.

use dashmap::DashMap;
use std::sync::Arc;

use crate::lcd::types::CodeDetails;
use crate::observability::metrics;

/// A thread-safe cache of code details keyed by code id.
#[derive(Clone, Default)]
pub struct CodeCache {
    inner: Arc<DashMap<u64, CodeDetails>>,
}

impl CodeCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached details for `code_id`, if any.
    pub fn get(&self, code_id: u64) -> Option<CodeDetails> {
        let hit = self.inner.get(&code_id).map(|r| r.value().clone());
        if hit.is_some() {
            metrics::record_code_cache_hit();
            tracing::debug!(code_id, "Code details cache hit");
        }
        hit
    }

    /// Store details. An existing entry for the same id is kept.
    pub fn insert(&self, details: CodeDetails) -> CodeDetails {
        let entry = self
            .inner
            .entry(details.code.id)
            .or_insert(details)
            .value()
            .clone();
        metrics::record_code_cache_size(self.inner.len());
        entry
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl std::fmt::Debug for CodeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeCache").field("entries", &self.inner.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lcd::types::Code;

    fn details(id: u64, data: &[u8]) -> CodeDetails {
        CodeDetails {
            code: Code {
                id,
                creator: "wasm1creator".to_string(),
                checksum: "aa".to_string(),
                source: None,
                builder: None,
            },
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_cache_operations() {
        let cache = CodeCache::new();
        assert!(cache.get(1).is_none());
        assert!(cache.is_empty());

        cache.insert(details(1, b"wasm"));
        assert_eq!(cache.get(1).unwrap().data, b"wasm".to_vec());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_first_insert_wins() {
        let cache = CodeCache::new();
        cache.insert(details(2, b"first"));
        let kept = cache.insert(details(2, b"second"));
        assert_eq!(kept.data, b"first".to_vec());
        assert_eq!(cache.get(2).unwrap().data, b"first".to_vec());
    }

    #[test]
    fn test_clones_share_entries() {
        let cache = CodeCache::new();
        let clone = cache.clone();
        clone.insert(details(3, b"shared"));
        assert!(cache.get(3).is_some());
    }
}
