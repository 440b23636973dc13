//! Entity handles with versioned indices.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Opaque entity handle packing an index and a version into one `u64`.
///
/// The version changes every time an index is recycled, so a handle kept
/// after its entity was destroyed can be told apart from the entity that
/// later reuses the same index.
///
/// # Layout
/// - low 32 bits: `index` into entity and sparse storage
/// - high 32 bits: `version` counter for stale reference detection
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(transparent)]
pub struct Entity(u64);

impl Entity {
    /// Number of bits used by the index part.
    pub const INDEX_BITS: u32 = 32;

    /// Index value reserved for the null handle and for list terminators.
    pub const NULL_INDEX: u32 = u32::MAX;

    /// Sentinel value representing "no entity".
    pub const NULL: Self = Self::new(Self::NULL_INDEX, 0);

    /// Creates a handle from an index and a version.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, version: u32) -> Self {
        Self(((version as u64) << Self::INDEX_BITS) | (index as u64))
    }

    /// Reconstructs a handle from its packed representation.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Returns the packed representation.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Returns the index part.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        // Truncation keeps exactly the low 32 bits.
        #[allow(clippy::cast_possible_truncation)]
        let index = self.0 as u32;
        index
    }

    /// Returns the version part.
    #[inline]
    #[must_use]
    pub const fn version(self) -> u32 {
        (self.0 >> Self::INDEX_BITS) as u32
    }

    /// Returns the index widened for slice access.
    #[inline]
    #[must_use]
    pub const fn slot(self) -> usize {
        self.index() as usize
    }

    /// Returns a handle with the same index and the version after this one.
    ///
    /// Versions wrap around at 32 bits.
    #[inline]
    #[must_use]
    pub const fn next_version(self) -> Self {
        Self::new(self.index(), self.version().wrapping_add(1))
    }

    /// Returns true if this is the null sentinel.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.index() == Self::NULL_INDEX
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Entity(null)")
        } else {
            write!(f, "Entity({}v{})", self.index(), self.version())
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Entity(null)")
        } else {
            write!(f, "Entity({})", self.index())
        }
    }
}
