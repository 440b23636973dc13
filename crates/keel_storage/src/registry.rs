//! The registry: entity lifecycle, component pools and context variables.
//!
//! Entity slots double as an implicit free list. A live slot stores its own
//! handle; a freed slot stores the index of the next free slot together with
//! the version the slot will carry when it is reused. A handle is valid
//! exactly when the slot at its index stores that same handle.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;

use keel_foundation::{Component, ComponentId, Entity, Error, Result, TypeRegistry};

use crate::config::RegistryConfig;
use crate::pool::{Pool, PoolBorrows};
use crate::query::{Bundle, ComponentSet, Query};
use crate::storage::ComponentStorage;
use crate::view::View;

/// Owns every entity, every component pool and the context variables.
///
/// Operations that take an entity require it to be valid. The panicking
/// forms (`destroy`, `assign`, `get`, ...) treat a violation as a bug in the
/// caller; the `try_` forms report it as an [`Error`] instead.
pub struct Registry {
    /// Configuration applied to new pools.
    config: RegistryConfig,
    /// One slot per issued index, live or free.
    entities: Vec<Entity>,
    /// Head of the free list, `Entity::NULL_INDEX` when empty.
    next_free: u32,
    /// Number of slots on the free list.
    available: usize,
    /// Component type ids, aligned with `pools`.
    types: TypeRegistry,
    /// One pool per registered component type, indexed by id.
    pools: Vec<Box<dyn Pool>>,
    /// Context variables keyed by type.
    context: HashMap<TypeId, Box<dyn Any>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("alive", &self.alive())
            .field("capacity", &self.capacity())
            .field("components", &self.types.len())
            .field("context", &self.context.len())
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Creates an empty registry with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Creates an empty registry with the given configuration.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            entities: Vec::with_capacity(config.entity_capacity),
            next_free: Entity::NULL_INDEX,
            available: 0,
            types: TypeRegistry::new(),
            pools: Vec::new(),
            context: HashMap::new(),
            config,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // --- Entity lifecycle ---

    /// Creates an entity, reusing the most recently freed index if any.
    ///
    /// Fresh indices start at version 0; reused indices carry the version
    /// assigned when they were freed.
    ///
    /// # Panics
    ///
    /// Panics if every index up to `Entity::NULL_INDEX` is in use.
    pub fn create(&mut self) -> Entity {
        if self.next_free == Entity::NULL_INDEX {
            let index = u32::try_from(self.entities.len())
                .ok()
                .filter(|&index| index != Entity::NULL_INDEX)
                .unwrap_or_else(|| panic!("entity index space exhausted"));
            let entity = Entity::new(index, 0);
            self.entities.push(entity);
            entity
        } else {
            let index = self.next_free;
            let slot = &mut self.entities[index as usize];
            self.next_free = slot.index();
            *slot = Entity::new(index, slot.version());
            self.available -= 1;
            *slot
        }
    }

    /// Creates `count` entities.
    pub fn create_many(&mut self, count: usize) -> Vec<Entity> {
        (0..count).map(|_| self.create()).collect()
    }

    /// Creates an entity and assigns every component of `bundle` to it.
    ///
    /// Returns the entity together with mutable references to the new
    /// components.
    ///
    /// ```
    /// use keel_storage::Registry;
    ///
    /// let mut registry = Registry::new();
    /// let (entity, (health, name)) = registry.create_with((10_u32, "orc"));
    /// *health += 5;
    /// assert_eq!(*name, "orc");
    /// assert_eq!(registry.get::<u32>(entity), &15);
    /// ```
    pub fn create_with<B: Bundle>(&mut self, bundle: B) -> (Entity, B::Refs<'_>) {
        let entity = self.create();
        bundle.assign(self, entity);
        let mut pools = self.borrows();
        (entity, B::refs(&mut pools, entity))
    }

    /// Destroys `entity`, dropping all of its components.
    ///
    /// Pools are visited in reverse registration order. The index goes to
    /// the front of the free list with its version advanced by one.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not valid.
    pub fn destroy(&mut self, entity: Entity) {
        self.check(entity);
        for pool in self.pools.iter_mut().rev() {
            pool.erase(entity);
        }
        self.entities[entity.slot()] = Entity::new(self.next_free, entity.next_version().version());
        self.next_free = entity.index();
        self.available += 1;
        tracing::trace!(?entity, "destroyed entity");
    }

    /// Destroys `entity` if it is valid.
    ///
    /// # Errors
    ///
    /// Returns an error if `entity` was never issued or is stale.
    pub fn try_destroy(&mut self, entity: Entity) -> Result<()> {
        self.validate(entity)?;
        self.destroy(entity);
        Ok(())
    }

    /// Returns true if `entity` refers to a live entity.
    #[must_use]
    pub fn valid(&self, entity: Entity) -> bool {
        self.entities
            .get(entity.slot())
            .is_some_and(|&stored| stored == entity)
    }

    /// Checks that `entity` refers to a live entity.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` for an index that was never issued and
    /// `StaleEntity` for a handle whose version is out of date.
    pub fn validate(&self, entity: Entity) -> Result<()> {
        match self.entities.get(entity.slot()) {
            None => Err(Error::entity_not_found(entity)),
            Some(&stored) if stored != entity => Err(Error::stale_entity(entity)),
            Some(_) => Ok(()),
        }
    }

    /// Returns the version stored in the slot of `index`.
    ///
    /// For a free slot this is the version the next entity at that index
    /// will have. Returns `None` for an index that was never issued.
    #[must_use]
    pub fn current_version(&self, index: u32) -> Option<u32> {
        self.entities.get(index as usize).map(|slot| slot.version())
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn alive(&self) -> usize {
        self.entities.len() - self.available
    }

    /// Returns true if no entity is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alive() == 0
    }

    /// Returns the number of indices ever issued, live or free.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entities.len()
    }

    /// Iterates over live entities in index order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities
            .iter()
            .enumerate()
            .filter(|&(slot, entity)| entity.slot() == slot)
            .map(|(_, &entity)| entity)
    }

    /// Calls `f` with every live entity in index order.
    pub fn each(&self, f: impl FnMut(Entity)) {
        self.iter().for_each(f);
    }

    /// Returns true if `entity` owns no components.
    #[must_use]
    pub fn orphan(&self, entity: Entity) -> bool {
        self.pools.iter().all(|pool| !pool.contains(entity))
    }

    /// Destroys every live entity.
    ///
    /// Entities are destroyed in index order, so indices come back from the
    /// free list highest first. Context variables are kept.
    pub fn reset(&mut self) {
        let alive: Vec<Entity> = self.iter().collect();
        tracing::debug!(count = alive.len(), "resetting registry");
        for entity in alive {
            self.destroy(entity);
        }
    }

    // --- Component pools ---

    /// Registers `T`, creating its pool, and returns its id.
    pub fn register<T: Component>(&mut self) -> ComponentId {
        let id = self.types.register::<T>();
        if id.slot() == self.pools.len() {
            let mut pool = ComponentStorage::<T>::with_page_size(self.config.page_size);
            pool.reserve(self.config.pool_capacity);
            self.pools.push(Box::new(pool));
            tracing::debug!(component = type_name::<T>(), ?id, "created pool");
        }
        id
    }

    /// Returns the id of `T` if it has been registered.
    #[must_use]
    pub fn component_id<T: Component>(&self) -> Option<ComponentId> {
        self.types.id_of::<T>()
    }

    /// Returns the component type table.
    #[must_use]
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Returns the pool of `T`, creating it on first use.
    pub fn assure<T: Component>(&mut self) -> &mut ComponentStorage<T> {
        let id = self.register::<T>();
        self.pools[id.slot()]
            .downcast_mut::<T>()
            .expect("pool type matches its component id")
    }

    /// Returns the pool of `T` if it exists.
    #[must_use]
    pub fn storage<T: Component>(&self) -> Option<&ComponentStorage<T>> {
        let id = self.types.id_of::<T>()?;
        self.pools[id.slot()].downcast_ref::<T>()
    }

    /// Returns the pool of `T` mutably if it exists.
    pub fn storage_mut<T: Component>(&mut self) -> Option<&mut ComponentStorage<T>> {
        let id = self.types.id_of::<T>()?;
        self.pools[id.slot()].downcast_mut::<T>()
    }

    /// Removes every `T` from every entity.
    pub fn clear<T: Component>(&mut self) {
        if let Some(pool) = self.storage_mut::<T>() {
            pool.clear();
        }
    }

    /// Reorders the pool of `T` so that entities shared with the pool of `U`
    /// come first, in the order `U` stores them.
    pub fn respect<T: Component, U: Component>(&mut self) {
        self.register::<T>();
        self.register::<U>();
        if TypeId::of::<T>() == TypeId::of::<U>() {
            return;
        }
        let mut pools = self.borrows();
        let to = pools.take::<T>();
        let from = pools.take_set::<U>();
        to.respect(from);
    }

    // --- Components of one entity ---

    /// Assigns `value` to `entity` and returns a reference to it.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not valid or already owns a `T`.
    pub fn assign<T: Component>(&mut self, entity: Entity, value: T) -> &mut T {
        self.assign_with(entity, || value)
    }

    /// Assigns the value produced by `init` to `entity`.
    ///
    /// Nothing is stored if `init` panics.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not valid or already owns a `T`.
    pub fn assign_with<T: Component>(
        &mut self,
        entity: Entity,
        init: impl FnOnce() -> T,
    ) -> &mut T {
        self.check(entity);
        if self.has::<T>(entity) {
            panic!("{}", Error::duplicate_component(entity, type_name::<T>()));
        }
        self.assure::<T>().insert_with(entity, init)
    }

    /// Assigns `value` to `entity` if it is valid and lacks a `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if `entity` is not valid or already owns a `T`.
    pub fn try_assign<T: Component>(&mut self, entity: Entity, value: T) -> Result<&mut T> {
        self.validate(entity)?;
        if self.has::<T>(entity) {
            return Err(Error::duplicate_component(entity, type_name::<T>()));
        }
        Ok(self.assure::<T>().insert(entity, value))
    }

    /// Assigns a clone of `value` to every entity in `entities`.
    ///
    /// # Panics
    ///
    /// Panics if any entity is not valid or already owns a `T`.
    pub fn assign_batch<T: Component + Clone>(&mut self, entities: &[Entity], value: &T) {
        for &entity in entities {
            self.check(entity);
        }
        self.assure::<T>().batch(entities, value);
    }

    /// Replaces the `T` of `entity`, returning the old value.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not valid or lacks a `T`.
    pub fn replace<T: Component>(&mut self, entity: Entity, value: T) -> T {
        std::mem::replace(self.get_mut::<T>(entity), value)
    }

    /// Assigns `value` to `entity`, replacing any existing `T`.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not valid.
    pub fn assign_or_replace<T: Component>(&mut self, entity: Entity, value: T) -> &mut T {
        self.check(entity);
        let pool = self.assure::<T>();
        if pool.contains(entity) {
            let slot = pool.get_mut(entity);
            *slot = value;
            slot
        } else {
            pool.insert(entity, value)
        }
    }

    /// Removes the `T` of `entity` and returns it.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not valid or lacks a `T`.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> T {
        match self.try_remove(entity) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// Removes the `T` of `entity` if present.
    ///
    /// # Errors
    ///
    /// Returns an error if `entity` is not valid or lacks a `T`.
    pub fn try_remove<T: Component>(&mut self, entity: Entity) -> Result<T> {
        self.validate(entity)?;
        match self.storage_mut::<T>() {
            Some(pool) if pool.contains(entity) => Ok(pool.remove(entity)),
            _ => Err(Error::component_not_found(entity, type_name::<T>())),
        }
    }

    /// Returns true if `entity` owns a `T`.
    #[must_use]
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.storage::<T>().is_some_and(|pool| pool.contains(entity))
    }

    /// Returns true if `entity` owns every component of `S`.
    #[must_use]
    pub fn has_all<S: ComponentSet>(&self, entity: Entity) -> bool {
        S::all_present(self, entity)
    }

    /// Returns the `T` of `entity`.
    ///
    /// # Panics
    ///
    /// Panics if `entity` lacks a `T`.
    #[must_use]
    pub fn get<T: Component>(&self, entity: Entity) -> &T {
        self.try_get(entity)
            .unwrap_or_else(|| panic!("{}", Error::component_not_found(entity, type_name::<T>())))
    }

    /// Returns the `T` of `entity` mutably.
    ///
    /// # Panics
    ///
    /// Panics if `entity` lacks a `T`.
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> &mut T {
        self.try_get_mut(entity)
            .unwrap_or_else(|| panic!("{}", Error::component_not_found(entity, type_name::<T>())))
    }

    /// Returns the `T` of `entity` if present.
    #[must_use]
    pub fn try_get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.storage::<T>()?.try_get(entity)
    }

    /// Returns the `T` of `entity` mutably if present.
    pub fn try_get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.storage_mut::<T>()?.try_get_mut(entity)
    }

    /// Returns several components of `entity` at once.
    ///
    /// ```
    /// use keel_storage::Registry;
    ///
    /// let mut registry = Registry::new();
    /// let entity = registry.create();
    /// registry.assign(entity, 1_u8);
    /// registry.assign(entity, 2_u16);
    ///
    /// let (small, wide) = registry.get_many::<(&mut u8, &u16)>(entity);
    /// *small += 1;
    /// assert_eq!(*wide, 2);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `entity` lacks any of the components, or if a component
    /// type appears twice in `Q`.
    pub fn get_many<Q: Query>(&mut self, entity: Entity) -> Q::Item<'_> {
        Q::register(self);
        let mut pools = self.borrows();
        Q::get(&mut pools, entity)
    }

    // --- Views ---

    /// Returns a view of the entities owning every component of `Q`.
    ///
    /// Missing pools are created empty.
    ///
    /// # Panics
    ///
    /// Panics if a component type appears twice in `Q`.
    pub fn view<Q: Query>(&mut self) -> View<'_, Q> {
        self.view_excluding::<Q, ()>()
    }

    /// Returns a view of the entities owning every component of `Q` and
    /// none of `X`.
    ///
    /// # Panics
    ///
    /// Panics if a component type appears twice across `Q` and `X`.
    pub fn view_excluding<Q: Query, X: ComponentSet>(&mut self) -> View<'_, Q, X> {
        Q::register(self);
        X::register(self);
        tracing::trace!(
            query = type_name::<Q>(),
            exclude = type_name::<X>(),
            "building view"
        );
        let mut pools = self.borrows();
        let fetch = Q::borrow(&mut pools);
        let exclude = X::borrow(&mut pools);
        View::new(fetch, exclude)
    }

    // --- Context variables ---

    /// Stores `value` as the context variable of type `T`, replacing any
    /// previous one.
    pub fn set_context<T: Any>(&mut self, value: T) -> &mut T {
        self.context
            .entry(TypeId::of::<T>())
            .insert_entry(Box::new(value))
            .into_mut()
            .downcast_mut::<T>()
            .expect("context entry matches its type id")
    }

    /// Returns the context variable of type `T`.
    ///
    /// # Panics
    ///
    /// Panics if no such variable is set.
    #[must_use]
    pub fn context<T: Any>(&self) -> &T {
        self.try_context()
            .unwrap_or_else(|| panic!("{}", Error::context_not_found(type_name::<T>())))
    }

    /// Returns the context variable of type `T` mutably.
    ///
    /// # Panics
    ///
    /// Panics if no such variable is set.
    pub fn context_mut<T: Any>(&mut self) -> &mut T {
        self.try_context_mut()
            .unwrap_or_else(|| panic!("{}", Error::context_not_found(type_name::<T>())))
    }

    /// Returns the context variable of type `T` if set.
    #[must_use]
    pub fn try_context<T: Any>(&self) -> Option<&T> {
        self.context.get(&TypeId::of::<T>())?.downcast_ref()
    }

    /// Returns the context variable of type `T` mutably if set.
    pub fn try_context_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.context.get_mut(&TypeId::of::<T>())?.downcast_mut()
    }

    /// Removes the context variable of type `T` and returns it.
    pub fn unset_context<T: Any>(&mut self) -> Option<T> {
        let value = self.context.remove(&TypeId::of::<T>())?;
        value.downcast::<T>().ok().map(|boxed| *boxed)
    }

    // --- Helpers ---

    fn check(&self, entity: Entity) {
        if let Err(err) = self.validate(entity) {
            panic!("{err}");
        }
    }

    fn borrows(&mut self) -> PoolBorrows<'_> {
        PoolBorrows::new(&self.types, &mut self.pools)
    }
}
