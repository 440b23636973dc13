//! Type-erased access to component pools.
//!
//! The registry keeps one [`ComponentStorage`] per component type behind the
//! object-safe [`Pool`] interface, so lifecycle operations such as entity
//! destruction can run over every pool without knowing component types.

use std::any::{Any, type_name};

use keel_foundation::{Component, Entity, TypeRegistry};

use crate::sparse_set::SparseSet;
use crate::storage::ComponentStorage;

/// Operations the registry needs on a pool of unknown component type.
pub trait Pool: Any {
    /// Returns the pool's presence index.
    fn set(&self) -> &SparseSet;

    /// Returns the number of stored components.
    fn len(&self) -> usize {
        self.set().len()
    }

    /// Returns true if the pool is empty.
    fn is_empty(&self) -> bool {
        self.set().is_empty()
    }

    /// Returns true if `entity` owns a component in this pool.
    fn contains(&self, entity: Entity) -> bool {
        self.set().contains(entity)
    }

    /// Removes and drops the component of `entity`, if present.
    fn erase(&mut self, entity: Entity) -> bool;

    /// Exchanges the dense slots of two present entities.
    fn swap(&mut self, a: Entity, b: Entity);

    /// Removes and drops every component.
    fn clear(&mut self);

    /// Returns the component type name.
    fn component_name(&self) -> &'static str;

    /// Upcasts to `Any` for downcasting to the concrete storage.
    fn as_any(&self) -> &dyn Any;

    /// Upcasts to `Any` for downcasting to the concrete storage.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> Pool for ComponentStorage<T> {
    fn set(&self) -> &SparseSet {
        ComponentStorage::set(self)
    }

    fn erase(&mut self, entity: Entity) -> bool {
        ComponentStorage::erase(self, entity)
    }

    fn swap(&mut self, a: Entity, b: Entity) {
        ComponentStorage::swap(self, a, b);
    }

    fn clear(&mut self) {
        ComponentStorage::clear(self);
    }

    fn component_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl dyn Pool {
    /// Returns the concrete storage if this pool holds `T`.
    #[must_use]
    pub fn downcast_ref<T: Component>(&self) -> Option<&ComponentStorage<T>> {
        self.as_any().downcast_ref()
    }

    /// Returns the concrete storage mutably if this pool holds `T`.
    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut ComponentStorage<T>> {
        self.as_any_mut().downcast_mut()
    }
}

/// Splits the registry's pool table into independent borrows.
///
/// Each pool can be handed out once, either shared or exclusive, which lets
/// a query hold several pools at the same time. Asking for the same pool
/// twice is a contract violation and panics.
pub struct PoolBorrows<'r> {
    types: &'r TypeRegistry,
    slots: Vec<Option<&'r mut (dyn Pool + 'static)>>,
}

impl<'r> PoolBorrows<'r> {
    pub(crate) fn new(types: &'r TypeRegistry, pools: &'r mut [Box<dyn Pool>]) -> Self {
        let slots = pools.iter_mut().map(|pool| Some(&mut **pool)).collect();
        Self { types, slots }
    }

    /// Takes exclusive access to the pool of `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` has no pool or its pool was already taken.
    pub fn take<T: Component>(&mut self) -> &'r mut ComponentStorage<T> {
        let name = type_name::<T>();
        let id = self
            .types
            .id_of::<T>()
            .unwrap_or_else(|| panic!("component {name} has no pool"));
        let pool = self
            .slots
            .get_mut(id.slot())
            .and_then(Option::take)
            .unwrap_or_else(|| panic!("component {name} is borrowed twice by one query"));
        pool.downcast_mut::<T>()
            .expect("pool type matches its component id")
    }

    /// Takes shared access to the pool of `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` has no pool or its pool was already taken.
    pub fn take_ref<T: Component>(&mut self) -> &'r ComponentStorage<T> {
        self.take::<T>()
    }

    /// Takes the presence index of the pool of `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` has no pool or its pool was already taken.
    pub fn take_set<T: Component>(&mut self) -> &'r SparseSet {
        self.take::<T>().set()
    }
}
