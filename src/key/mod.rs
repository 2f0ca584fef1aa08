// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Identity keys for analysis objects.
//!
//! Every long-lived object in an analysis (frames, states, groups, jigsaws)
//! is identified by a [`Key`] handed out by the [`KeyRegistry`] of the
//! [`AnalysisContext`](crate::context::AnalysisContext) that created it.
//! Equality between objects is key equality, never value equality.
//!
//! Keys are scoped to one registry, so two independent analyses (or two
//! tests) start from the same key sequence.
//!
//! # Examples
//!
//! ```
//! use jigsaw_reco::key::KeyRegistry;
//!
//! let mut registry = KeyRegistry::new();
//! let a = registry.issue();
//! let b = registry.issue();
//! assert_ne!(a, b);
//! assert!(a < b);
//! ```

pub mod arena;

pub use arena::Arena;

use std::fmt;

/// Unique identifier of an object within one analysis configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(u32);

impl Key {
    /// Raw value of the key.
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic key source.
#[derive(Debug, Default)]
pub struct KeyRegistry {
    next: u32,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next unused key.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` keys are issued by one registry.
    pub fn issue(&mut self) -> Key {
        let key = Key(self.next);
        self.next = self
            .next
            .checked_add(1)
            .expect("key registry exhausted");
        key
    }

    /// Number of keys issued so far.
    pub fn issued(&self) -> usize {
        self.next as usize
    }
}

/// Anything that carries an identity key.
pub trait Keyed {
    fn key(&self) -> Key;

    /// Identity comparison.
    fn is_same(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Keyed for Key {
    fn key(&self) -> Key {
        *self
    }
}

/// Declare a typed handle wrapping a [`Key`].
macro_rules! keyed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub(crate) $crate::key::Key);

        impl $crate::key::Keyed for $name {
            fn key(&self) -> $crate::key::Key {
                self.0
            }
        }

        impl From<$crate::key::Key> for $name {
            fn from(key: $crate::key::Key) -> Self {
                Self(key)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}{}", stringify!($name), self.0)
            }
        }
    };
}

pub(crate) use keyed_id;

#[cfg(test)]
mod tests {
    use super::*;

    keyed_id!(
        /// Handle used only by these tests.
        TestId
    );

    #[test]
    fn test_keys_are_monotonic() {
        let mut registry = KeyRegistry::new();
        let keys: Vec<Key> = (0..5).map(|_| registry.issue()).collect();
        for pair in keys.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(registry.issued(), 5);
    }

    #[test]
    fn test_registries_are_independent() {
        let mut first = KeyRegistry::new();
        let mut second = KeyRegistry::new();
        assert_eq!(first.issue(), second.issue());
    }

    #[test]
    fn test_typed_id_identity() {
        let mut registry = KeyRegistry::new();
        let a = TestId::from(registry.issue());
        let b = TestId::from(registry.issue());
        let a_copy = a;
        assert!(a.is_same(&a_copy));
        assert!(!a.is_same(&b));
        assert_eq!(format!("{}", a), "TestId#0");
    }
}
