//! Core types for keel.
//!
//! This crate provides:
//! - [`Entity`] - Versioned entity handles
//! - [`Component`] - The component marker trait
//! - [`TypeRegistry`] - Dense component type ids
//! - [`Error`] - Error types for contract violations

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod entity;
pub mod error;
pub mod family;

pub use entity::Entity;
pub use error::{Error, ErrorKind, Result};
pub use family::{Component, ComponentId, ComponentInfo, TypeRegistry};
