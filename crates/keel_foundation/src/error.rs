//! Error types for keel.
//!
//! Uses `thiserror` for error definition. Misusing a handle or a component
//! is a programming error, so the plain registry API panics with these
//! messages; the checked `try_*` operations hand them back instead.

use thiserror::Error;

use crate::entity::Entity;

/// The main error type for keel operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind }
    }

    /// Creates an entity not found error.
    #[must_use]
    pub fn entity_not_found(entity: Entity) -> Self {
        Self::new(ErrorKind::EntityNotFound(entity))
    }

    /// Creates a stale entity reference error.
    #[must_use]
    pub fn stale_entity(entity: Entity) -> Self {
        Self::new(ErrorKind::StaleEntity(entity))
    }

    /// Creates a missing component error.
    #[must_use]
    pub fn component_not_found(entity: Entity, component: &'static str) -> Self {
        Self::new(ErrorKind::ComponentNotFound { entity, component })
    }

    /// Creates a duplicate component error.
    #[must_use]
    pub fn duplicate_component(entity: Entity, component: &'static str) -> Self {
        Self::new(ErrorKind::DuplicateComponent { entity, component })
    }

    /// Creates a missing context variable error.
    #[must_use]
    pub fn context_not_found(name: &'static str) -> Self {
        Self::new(ErrorKind::ContextNotFound(name))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// The handle's index was never issued by this registry.
    #[error("entity not found: {0:?}")]
    EntityNotFound(Entity),

    /// The handle's version no longer matches (entity destroyed or recycled).
    #[error("stale entity reference: {0:?}")]
    StaleEntity(Entity),

    /// The entity does not own a component of the requested type.
    #[error("component not found: {component} on entity {entity:?}")]
    ComponentNotFound {
        /// The entity that was queried.
        entity: Entity,
        /// The component type name.
        component: &'static str,
    },

    /// The entity already owns a component of the assigned type.
    #[error("duplicate component: {component} already assigned to entity {entity:?}")]
    DuplicateComponent {
        /// The entity that was assigned to.
        entity: Entity,
        /// The component type name.
        component: &'static str,
    },

    /// No context variable of the requested type is set.
    #[error("context variable not set: {0}")]
    ContextNotFound(&'static str),
}

/// Result alias for keel operations.
pub type Result<T> = std::result::Result<T, Error>;
