//! Sparse-set entity-component storage for keel.
//!
//! This crate provides:
//! - [`SparseSet`] - Paged index from entities to dense positions
//! - [`ComponentStorage`] - A sparse set with co-indexed component values
//! - [`Registry`] - Entity lifecycle, component pools and context variables
//! - [`View`] - Iteration over entities owning several components
//!
//! ```
//! use keel_storage::Registry;
//!
//! struct Position(f32);
//! struct Velocity(f32);
//!
//! let mut registry = Registry::new();
//! let moving = registry.create();
//! registry.assign(moving, Position(0.0));
//! registry.assign(moving, Velocity(2.0));
//!
//! registry
//!     .view::<(&mut Position, &Velocity)>()
//!     .each(|_, (position, velocity)| position.0 += velocity.0);
//!
//! assert_eq!(registry.get::<Position>(moving).0, 2.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod pool;
pub mod query;
pub mod registry;
pub mod sparse_set;
pub mod storage;
pub mod view;

pub use config::RegistryConfig;
pub use pool::{Pool, PoolBorrows};
pub use query::{Bundle, ComponentSet, Fetch, FetchItem, Query, QueryItem};
pub use registry::Registry;
pub use sparse_set::SparseSet;
pub use storage::ComponentStorage;
pub use view::View;
