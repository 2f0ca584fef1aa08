// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! ObjectList: ordered, identity-unique lists of handles.
//!
//! An `ObjectList<T>` is an ordered sequence of non-owning handles. Two
//! entries are the same object when their keys agree, so a list never
//! holds the same key twice. Set operations return new lists and leave
//! their operands untouched; the `size_*` variants count without building
//! the result.
//!
//! Lists are small in practice (the frames below one decay, the children of
//! one jigsaw), so membership is a linear scan over the entries.
//!
//! # Examples
//!
//! ```
//! use jigsaw_reco::key::{Key, KeyRegistry};
//! use jigsaw_reco::list::ObjectList;
//!
//! let mut registry = KeyRegistry::new();
//! let (a, b, c) = (registry.issue(), registry.issue(), registry.issue());
//!
//! let first: ObjectList<Key> = [a, b].into_iter().collect();
//! let second: ObjectList<Key> = [b, c].into_iter().collect();
//!
//! assert_eq!(first.union(&second).len(), 3);
//! assert_eq!(first.size_intersection(&second), 1);
//! assert!(first.complement(&second).contains(&a));
//! ```

use crate::key::Keyed;
use std::fmt;

/// Ordered collection of handles, unique by identity.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ObjectList<T> {
    objs: Vec<T>,
}

impl<T: Keyed + Copy> ObjectList<T> {
    /// Create an empty list.
    pub const fn new() -> Self {
        Self { objs: Vec::new() }
    }

    /// Add `obj` at the end. Returns false (and leaves the list unchanged)
    /// if an object with the same key is already present.
    pub fn add(&mut self, obj: T) -> bool {
        if self.contains(&obj) {
            return false;
        }
        self.objs.push(obj);
        true
    }

    /// Add every entry of `objs` not already present, keeping their order.
    /// Returns true if anything was added.
    pub fn add_all(&mut self, objs: &ObjectList<T>) -> bool {
        let mut added = false;
        for &obj in &objs.objs {
            added |= self.add(obj);
        }
        added
    }

    /// Remove `obj`, returning the index it occupied.
    pub fn remove(&mut self, obj: &T) -> Option<usize> {
        let index = self.index_of(obj)?;
        self.objs.remove(index);
        Some(index)
    }

    /// Remove every entry of `objs`.
    pub fn remove_all(&mut self, objs: &ObjectList<T>) {
        self.objs.retain(|obj| !objs.contains(obj));
    }

    pub fn clear(&mut self) {
        self.objs.clear();
    }

    pub fn len(&self) -> usize {
        self.objs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.objs.get(index).copied()
    }

    pub fn first(&self) -> Option<T> {
        self.objs.first().copied()
    }

    pub fn index_of(&self, obj: &T) -> Option<usize> {
        self.objs.iter().position(|o| o.is_same(obj))
    }

    pub fn contains(&self, obj: &T) -> bool {
        self.objs.iter().any(|o| o.is_same(obj))
    }

    /// True if every entry of `objs` is in this list.
    pub fn contains_all(&self, objs: &ObjectList<T>) -> bool {
        objs.objs.iter().all(|obj| self.contains(obj))
    }

    /// Same set of objects, regardless of order.
    pub fn is_same(&self, objs: &ObjectList<T>) -> bool {
        self.len() == objs.len() && self.contains_all(objs)
    }

    /// Entries of this list followed by the entries of `objs` not already present.
    pub fn union(&self, objs: &ObjectList<T>) -> ObjectList<T> {
        let mut union = self.clone();
        union.add_all(objs);
        union
    }

    /// Entries of this list that are also in `objs`, in this list's order.
    pub fn intersection(&self, objs: &ObjectList<T>) -> ObjectList<T> {
        self.objs.iter().copied().filter(|o| objs.contains(o)).collect()
    }

    /// Entries of this list that are not in `objs`.
    pub fn complement(&self, objs: &ObjectList<T>) -> ObjectList<T> {
        self.objs.iter().copied().filter(|o| !objs.contains(o)).collect()
    }

    pub fn size_union(&self, objs: &ObjectList<T>) -> usize {
        self.len() + objs.size_complement(self)
    }

    pub fn size_intersection(&self, objs: &ObjectList<T>) -> usize {
        self.objs.iter().filter(|o| objs.contains(o)).count()
    }

    pub fn size_complement(&self, objs: &ObjectList<T>) -> usize {
        self.objs.iter().filter(|o| !objs.contains(o)).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.objs.iter().copied()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.objs
    }
}

impl<T: Keyed + Copy> Default for ObjectList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Keyed + Copy> FromIterator<T> for ObjectList<T> {
    fn from_iter<It: IntoIterator<Item = T>>(iter: It) -> Self {
        let mut list = Self::new();
        for obj in iter {
            list.add(obj);
        }
        list
    }
}

impl<T: Keyed + Copy> From<T> for ObjectList<T> {
    fn from(obj: T) -> Self {
        Self { objs: vec![obj] }
    }
}

impl<'a, T: Keyed + Copy> IntoIterator for &'a ObjectList<T> {
    type Item = T;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.objs.iter().copied()
    }
}

impl<T: fmt::Debug> fmt::Debug for ObjectList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.objs.iter()).finish()
    }
}
