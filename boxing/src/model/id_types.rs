//! Identifier types for the declaration graph
//!
//! Declarations, type references and expression nodes are stored in arenas
//! and referred to by lightweight `u32` ids. Each id kind is its own type so
//! that a `DeclId` can never be passed where a `TypeId` is expected.

use std::fmt;

/// Trait for ID types that can be created and validated
pub trait IdType: Copy + Clone + PartialEq + Eq + std::hash::Hash + fmt::Debug {
    /// Create a new ID from a raw u32 value
    fn from_raw(raw: u32) -> Self;

    /// Get the raw u32 value of this ID
    fn as_raw(self) -> u32;

    /// Check if this ID is valid (not a sentinel value)
    fn is_valid(self) -> bool;

    /// Get an invalid/null sentinel value
    fn invalid() -> Self;

    /// Position of the entity in its arena
    fn index(self) -> usize {
        self.as_raw() as usize
    }
}

macro_rules! define_id_type {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u32);

        impl $name {
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            pub const fn as_raw(self) -> u32 {
                self.0
            }

            pub const fn is_valid(self) -> bool {
                self.0 != u32::MAX
            }

            pub const fn invalid() -> Self {
                Self(u32::MAX)
            }

            /// Id for the arena slot `index`
            pub(crate) fn from_index(index: usize) -> Self {
                debug_assert!(index < u32::MAX as usize, "arena overflow");
                Self(index as u32)
            }
        }

        impl IdType for $name {
            fn from_raw(raw: u32) -> Self {
                Self::from_raw(raw)
            }

            fn as_raw(self) -> u32 {
                self.as_raw()
            }

            fn is_valid(self) -> bool {
                self.is_valid()
            }

            fn invalid() -> Self {
                Self::invalid()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::invalid()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", stringify!($name), self.0)
                } else {
                    write!(f, "{}(<invalid>)", stringify!($name))
                }
            }
        }
    };
}

define_id_type! {
    /// Identifier of a declaration in the [`DeclarationTable`](super::DeclarationTable)
    DeclId
}

define_id_type! {
    /// Identifier of a type reference in the [`TypeTable`](super::TypeTable)
    TypeId
}

define_id_type! {
    /// Identifier of an expression node, unique within a [`Program`](super::Program)
    ExprId
}

/// Id-keyed collections backed by `fxhash`
pub mod collections {
    use super::IdType;
    use fxhash::{FxHashMap, FxHashSet};

    pub type IdMap<K, V> = FxHashMap<K, V>;
    pub type IdSet<T> = FxHashSet<T>;

    pub fn new_id_map<K: IdType, V>() -> IdMap<K, V> {
        IdMap::default()
    }

    pub fn new_id_set<T: IdType>() -> IdSet<T> {
        IdSet::default()
    }
}
