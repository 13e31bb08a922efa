//! Memoization for parsed structures and fingerprints.
//!
//! Lookups take a shared lock. A miss computes the value with no lock held and then stores it
//! under the write lock, so two callers racing on one key both compute and the last store wins.
//! Every computation for a key yields the same value, which makes that harmless.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use crate::catalog::FingerprintType;
use crate::chem::{Fingerprint, Molecule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FingerprintKey {
    /// ingestion position of the compound
    pub position: usize,
    pub fp_type: FingerprintType,
    pub use_chirality: bool,
}

/// A parsed structure, or the parser's complaint about it.
pub type StructureEntry = std::result::Result<Arc<Molecule>, String>;

#[derive(Debug, Default)]
pub struct MemoCache<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K: Eq + Hash, V: Clone> MemoCache<K, V> {

    pub fn new() -> Self {
        Self { entries: RwLock::new(HashMap::new()) }
    }

    pub fn get(&self, key: &K) -> Option<V> {

        //a panicked writer cannot leave a half-written entry, so poisoning is ignored
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        return entries.get(key).cloned();
    }

    pub fn get_or_insert_with<F: FnOnce() -> V>(&self, key: K, compute: F) -> V {

        if let Some(v) = self.get(&key) {
            return v;
        }

        let value = compute();

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, value.clone());

        return value;
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub type StructureCache = MemoCache<usize, StructureEntry>;
pub type FingerprintCache = MemoCache<FingerprintKey, Arc<Fingerprint>>;
