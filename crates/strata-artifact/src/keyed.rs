//! Later-supersedes-earlier composition
//!
//! One primitive serves every "defined later wins" rule in the engine: a
//! redeclared routine inside one script, a routine redefined by a new round,
//! and a markup section replaced by a new round. Items are folded into a
//! [`Ledger`] in order; an item whose key is already present replaces the
//! earlier item *in place* and the replacement is recorded as a
//! [`Collision`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Item with an optional identity key
///
/// Items without a key never collide; they keep their position.
pub trait Keyed {
    /// Identity key, if the item has one
    fn key(&self) -> Option<&str>;
}

/// A key that was defined more than once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collision {
    /// Shared key
    pub key: String,
    /// True when both definitions were equal
    pub identical: bool,
}

/// Result of folding items through a [`Ledger`]
#[derive(Debug, Clone, PartialEq)]
pub struct Superseded<T> {
    /// Surviving items in first-seen order
    pub items: Vec<T>,
    /// Replacements that happened, in the order they happened
    pub collisions: Vec<Collision>,
}

/// Order-stable fold where later keyed items replace earlier ones
#[derive(Debug, Clone)]
pub struct Ledger<T> {
    items: Vec<T>,
    positions: IndexMap<String, usize>,
    collisions: Vec<Collision>,
}

impl<T> Default for Ledger<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            positions: IndexMap::new(),
            collisions: Vec::new(),
        }
    }
}

impl<T: Keyed + PartialEq> Ledger<T> {
    /// Empty ledger
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one item in
    ///
    /// Returns the displaced earlier item when `item`'s key was already present.
    pub fn record(&mut self, item: T) -> Option<T> {
        let Some(key) = item.key().map(str::to_owned) else {
            self.items.push(item);
            return None;
        };

        if let Some(&pos) = self.positions.get(&key) {
            let identical = self.items[pos] == item;
            self.collisions.push(Collision { key, identical });
            Some(std::mem::replace(&mut self.items[pos], item))
        } else {
            self.positions.insert(key, self.items.len());
            self.items.push(item);
            None
        }
    }

    /// Fold a sequence in order
    pub fn extend(&mut self, items: impl IntoIterator<Item = T>) {
        for item in items {
            self.record(item);
        }
    }

    /// Whether a key has been seen
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    /// Item currently held for a key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&T> {
        self.positions.get(key).map(|&pos| &self.items[pos])
    }

    /// Number of items held
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing has been recorded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Finish folding
    #[must_use]
    pub fn finish(self) -> Superseded<T> {
        Superseded {
            items: self.items,
            collisions: self.collisions,
        }
    }
}

/// Fold `earlier` then `later`: keyed items in both take the later version
/// at the earlier position; later-only items are appended in later order.
#[must_use]
pub fn supersede<T: Keyed + PartialEq>(
    earlier: impl IntoIterator<Item = T>,
    later: impl IntoIterator<Item = T>,
) -> Superseded<T> {
    let mut ledger = Ledger::new();
    ledger.extend(earlier);
    ledger.extend(later);
    ledger.finish()
}
