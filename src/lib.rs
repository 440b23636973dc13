//! Keel - Sparse-set entity-component storage
//!
//! This crate re-exports all layers of keel for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 1: keel_storage    — Sparse sets, pools, registry, views
//! Layer 0: keel_foundation — Core types (Entity, ComponentId, Error)
//! ```

pub use keel_foundation as foundation;
pub use keel_storage as storage;

/// The types most programs need.
pub mod prelude {
    pub use keel_foundation::{Component, Entity, Error, ErrorKind, Result};
    pub use keel_storage::{Registry, RegistryConfig, View};
}
