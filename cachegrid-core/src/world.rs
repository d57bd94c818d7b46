//! World memory — the sparse, lazily populated registry of caches.
//!
//! Keyed by cell, populated the first time a spawning cell is generated and
//! never shrunk during a session. It is the sole long-lived owner of cache
//! state; everything that draws a cache reads through it.
//!
//! A `BTreeMap` keeps iteration (and therefore the saved snapshot) in a
//! stable cell order.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use tracing::debug;

use crate::cache::{Cache, Memento};
use crate::oracle::SpawnRule;
use crate::types::Cell;

/// Cell → cache registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldMemory {
    caches: BTreeMap<Cell, Cache>,
    rule: SpawnRule,
}

impl WorldMemory {
    /// An empty world generated under `rule`.
    #[must_use]
    pub fn new(rule: SpawnRule) -> Self {
        Self {
            caches: BTreeMap::new(),
            rule,
        }
    }

    /// Rebuild a world from persisted mementos, each rehydrated onto a fresh
    /// empty cache bound to its cell.
    #[must_use]
    pub fn from_mementos(rule: SpawnRule, mementos: impl IntoIterator<Item = (Cell, Memento)>) -> Self {
        let caches = mementos
            .into_iter()
            .map(|(cell, memento)| {
                let mut cache = Cache::empty(cell);
                cache.restore(&memento);
                (cell, cache)
            })
            .collect();
        Self { caches, rule }
    }

    /// The generation rule in force.
    #[must_use]
    pub const fn rule(&self) -> &SpawnRule {
        &self.rule
    }

    /// The cache at `cell`, generating it from the oracle on first access.
    ///
    /// An existing cache is returned after a capture/restore round trip; the
    /// two must agree, and a divergence is a defect in the memento codec.
    pub fn get_or_create(&mut self, cell: Cell) -> &mut Cache {
        match self.caches.entry(cell) {
            Entry::Vacant(slot) => {
                let token_count = self.rule.initial_tokens(cell);
                debug!(cell = %cell, tokens = token_count, "Generated cache");
                slot.insert(Cache::new(cell, token_count))
            }
            Entry::Occupied(slot) => {
                let cache = slot.into_mut();
                let memento = cache.capture();
                cache.restore(&memento);
                debug_assert_eq!(cache.capture(), memento, "memento round trip diverged");
                cache
            }
        }
    }

    /// The cache at `cell`, if it has ever been generated.
    #[must_use]
    pub fn get(&self, cell: Cell) -> Option<&Cache> {
        self.caches.get(&cell)
    }

    /// Mutable access to an existing cache.
    pub fn get_mut(&mut self, cell: Cell) -> Option<&mut Cache> {
        self.caches.get_mut(&cell)
    }

    /// Whether `cell` has ever been generated.
    #[must_use]
    pub fn contains(&self, cell: Cell) -> bool {
        self.caches.contains_key(&cell)
    }

    /// Number of generated caches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.caches.len()
    }

    /// Whether nothing has been generated yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }

    /// Caches in cell order.
    pub fn iter(&self) -> impl Iterator<Item = &Cache> {
        self.caches.values()
    }

    /// A memento for every cache, in cell order.
    #[must_use]
    pub fn capture_all(&self) -> BTreeMap<Cell, Memento> {
        self.caches
            .iter()
            .map(|(cell, cache)| (*cell, cache.capture()))
            .collect()
    }

    /// Tokens held across all caches.
    #[must_use]
    pub fn total_tokens(&self) -> usize {
        self.caches.values().map(Cache::len).sum()
    }

    /// Forget every cache. Only a configured reset does this.
    pub fn clear(&mut self) {
        self.caches.clear();
    }
}
