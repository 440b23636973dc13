//! Configuration for registries and their pools.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default number of entries per sparse page.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Configuration for a [`Registry`](crate::Registry).
///
/// Controls sparse paging and up-front reservations. None of these settings
/// change observable behavior, only allocation patterns.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegistryConfig {
    /// Entries per sparse page. Must be a power of two.
    pub page_size: usize,

    /// Entity slots reserved when the registry is created.
    pub entity_capacity: usize,

    /// Dense slots reserved when a pool is created.
    pub pool_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            entity_capacity: 0,
            pool_capacity: 0,
        }
    }
}

impl RegistryConfig {
    /// Creates a configuration for small scenes and tests.
    #[must_use]
    pub fn small() -> Self {
        Self {
            page_size: 256,
            entity_capacity: 256,
            pool_capacity: 64,
        }
    }

    /// Creates a configuration for scenes with hundreds of thousands of entities.
    #[must_use]
    pub fn large() -> Self {
        Self {
            page_size: 32768,
            entity_capacity: 1 << 18,
            pool_capacity: 1 << 14,
        }
    }

    /// Builder method to set the sparse page size.
    ///
    /// # Panics
    ///
    /// Panics if `page_size` is not a power of two.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        assert!(
            page_size.is_power_of_two(),
            "page size must be a power of two, got {page_size}"
        );
        self.page_size = page_size;
        self
    }

    /// Builder method to set the initial entity capacity.
    #[must_use]
    pub fn with_entity_capacity(mut self, capacity: usize) -> Self {
        self.entity_capacity = capacity;
        self
    }

    /// Builder method to set the initial capacity of each new pool.
    #[must_use]
    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }
}
