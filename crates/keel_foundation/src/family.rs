//! Dense component type identifiers.
//!
//! Every distinct component type is given a small integer id the first time
//! it is registered. Ids index the registry's pool table directly, so they
//! are dense and never reused within one [`TypeRegistry`].
//!
//! Ids depend on registration order and are only meaningful for the
//! lifetime of the registry that issued them; they must not be persisted.

use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::fmt;

/// Marker trait for values that can be stored as components.
///
/// Any `'static` type qualifies; plain data aggregates and empty tag
/// structs are the common cases.
pub trait Component: 'static {}

impl<T: 'static> Component for T {}

/// Dense identifier of a component type within one [`TypeRegistry`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u32);

impl ComponentId {
    /// Returns the raw index of this id.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Returns the index widened for slice access.
    #[must_use]
    pub const fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.0)
    }
}

/// Registration record for one component type.
#[derive(Clone, Debug)]
pub struct ComponentInfo {
    /// The dense id assigned at registration.
    pub id: ComponentId,
    /// The Rust type identity.
    pub type_id: TypeId,
    /// Human-readable type name, used in diagnostics.
    pub name: &'static str,
}

/// Table mapping component types to dense [`ComponentId`]s.
///
/// Registration is explicit and idempotent: calling [`TypeRegistry::register`]
/// for a type that is already known returns the existing id. Applications
/// that want ids independent of first-use order can register all their
/// component types up front.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    /// Map from type identity to id.
    ids: HashMap<TypeId, ComponentId>,
    /// Records indexed by id.
    infos: Vec<ComponentInfo>,
}

impl TypeRegistry {
    /// Creates an empty type registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `T`, assigning the next free id on first use.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` component types are registered.
    pub fn register<T: Component>(&mut self) -> ComponentId {
        let type_id = TypeId::of::<T>();
        if let Some(&id) = self.ids.get(&type_id) {
            return id;
        }

        let id = ComponentId(u32::try_from(self.infos.len()).expect("too many component types"));
        let name = type_name::<T>();
        self.infos.push(ComponentInfo { id, type_id, name });
        self.ids.insert(type_id, id);
        tracing::debug!(component = name, id = id.0, "registered component type");
        id
    }

    /// Returns the id for `T` if it has been registered.
    #[must_use]
    pub fn id_of<T: Component>(&self) -> Option<ComponentId> {
        self.id_of_type(TypeId::of::<T>())
    }

    /// Returns the id for a raw type identity if it has been registered.
    #[must_use]
    pub fn id_of_type(&self, type_id: TypeId) -> Option<ComponentId> {
        self.ids.get(&type_id).copied()
    }

    /// Returns the registration record for an id.
    #[must_use]
    pub fn info(&self, id: ComponentId) -> Option<&ComponentInfo> {
        self.infos.get(id.slot())
    }

    /// Returns the type name registered under an id.
    #[must_use]
    pub fn name(&self, id: ComponentId) -> Option<&'static str> {
        self.info(id).map(|info| info.name)
    }

    /// Returns the number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Returns true if no type has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Iterates over registration records in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentInfo> + '_ {
        self.infos.iter()
    }
}
