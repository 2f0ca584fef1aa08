// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Keyed storage: the lookup table behind every typed handle.

use crate::key::{Key, Keyed};
use rustc_hash::FxHashMap;
use std::ops::{Index, IndexMut};

/// Owning storage of objects addressed by typed handles.
///
/// Objects are kept in insertion order; the handle's key maps to the slot.
#[derive(Debug)]
pub struct Arena<I, T> {
    items: Vec<T>,
    ids: Vec<I>,
    slots: FxHashMap<Key, usize>,
}

impl<I: Keyed + Copy, T> Arena<I, T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            ids: Vec::new(),
            slots: FxHashMap::default(),
        }
    }

    /// Store `item` under `id`. Returns false if `id` is already present.
    pub fn insert(&mut self, id: I, item: T) -> bool {
        if self.slots.contains_key(&id.key()) {
            return false;
        }
        self.slots.insert(id.key(), self.items.len());
        self.items.push(item);
        self.ids.push(id);
        true
    }

    pub fn contains(&self, id: I) -> bool {
        self.slots.contains_key(&id.key())
    }

    pub fn get(&self, id: I) -> Option<&T> {
        self.slots.get(&id.key()).map(|&slot| &self.items[slot])
    }

    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        match self.slots.get(&id.key()) {
            Some(&slot) => Some(&mut self.items[slot]),
            None => None,
        }
    }

    /// Handles in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = I> + '_ {
        self.ids.iter().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.ids.iter().copied().zip(self.items.iter())
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<I: Keyed + Copy, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Keyed + Copy + std::fmt::Display, T> Index<I> for Arena<I, T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if `id` was not issued by the owner of this arena.
    fn index(&self, id: I) -> &T {
        match self.get(id) {
            Some(item) => item,
            None => panic!("unknown handle {}", id),
        }
    }
}

impl<I: Keyed + Copy + std::fmt::Display, T> IndexMut<I> for Arena<I, T> {
    fn index_mut(&mut self, id: I) -> &mut T {
        match self.slots.get(&id.key()) {
            Some(&slot) => &mut self.items[slot],
            None => panic!("unknown handle {}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyRegistry;

    #[test]
    fn test_insert_and_lookup() {
        let mut registry = KeyRegistry::new();
        let mut arena: Arena<Key, &str> = Arena::new();
        let a = registry.issue();
        let b = registry.issue();
        assert!(arena.insert(a, "a"));
        assert!(arena.insert(b, "b"));
        assert!(!arena.insert(a, "again"));

        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena[b], "b");
        assert_eq!(arena.ids().collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn test_missing_handle() {
        let mut registry = KeyRegistry::new();
        let arena: Arena<Key, u8> = Arena::new();
        assert!(arena.get(registry.issue()).is_none());
    }

    #[test]
    #[should_panic(expected = "unknown handle")]
    fn test_index_unknown_handle_panics() {
        let mut registry = KeyRegistry::new();
        let arena: Arena<Key, u8> = Arena::new();
        let _ = arena[registry.issue()];
    }
}
