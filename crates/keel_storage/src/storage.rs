//! Typed component pools.
//!
//! A [`ComponentStorage`] pairs a [`SparseSet`] with a packed array of
//! component values. `instances[i]` always belongs to `entities()[i]`; every
//! mutation of the set is mirrored on the values in the same call.

use std::iter::Zip;
use std::slice;

use keel_foundation::{Component, Entity};

use crate::sparse_set::SparseSet;

/// Packed storage for every instance of one component type.
#[derive(Clone, Debug)]
pub struct ComponentStorage<T> {
    /// Presence index and entity order.
    set: SparseSet,
    /// Component values, co-indexed with `set.entities()`.
    instances: Vec<T>,
}

impl<T: Component> Default for ComponentStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> ComponentStorage<T> {
    /// Creates an empty pool with the default page size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            set: SparseSet::new(),
            instances: Vec::new(),
        }
    }

    /// Creates an empty pool whose sparse pages hold `page_size` entries.
    ///
    /// # Panics
    ///
    /// Panics if `page_size` is not a power of two.
    #[must_use]
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            set: SparseSet::with_page_size(page_size),
            instances: Vec::new(),
        }
    }

    /// Returns the underlying presence index.
    #[must_use]
    pub fn set(&self) -> &SparseSet {
        &self.set
    }

    /// Returns the number of stored components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Returns true if the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Returns true if `entity` owns a component in this pool.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.set.contains(entity)
    }

    /// Stores `value` for `entity` and returns a reference to it.
    ///
    /// # Panics
    ///
    /// Panics if `entity` (or another version of its index) is already present.
    pub fn insert(&mut self, entity: Entity, value: T) -> &mut T {
        self.insert_with(entity, || value)
    }

    /// Builds a value with `init` and stores it for `entity`.
    ///
    /// `init` runs before anything is recorded, so a panicking constructor
    /// leaves the pool untouched.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is already present, or if `init` panics.
    pub fn insert_with(&mut self, entity: Entity, init: impl FnOnce() -> T) -> &mut T {
        let value = init();
        self.set.insert(entity);
        self.instances.push(value);
        let last = self.instances.len() - 1;
        &mut self.instances[last]
    }

    /// Stores a clone of `value` for each of `entities`.
    ///
    /// # Panics
    ///
    /// Panics if any entity is already present or repeated in `entities`.
    pub fn batch(&mut self, entities: &[Entity], value: &T)
    where
        T: Clone,
    {
        self.instances.reserve(entities.len());
        self.set.reserve(entities.len());
        for &entity in entities {
            self.insert(entity, value.clone());
        }
    }

    /// Stores a default value for each of `entities`.
    ///
    /// # Panics
    ///
    /// Panics if any entity is already present or repeated in `entities`.
    pub fn batch_default(&mut self, entities: &[Entity])
    where
        T: Default,
    {
        self.instances.reserve(entities.len());
        self.set.reserve(entities.len());
        for &entity in entities {
            self.insert_with(entity, T::default);
        }
    }

    /// Removes and returns the component of `entity`.
    ///
    /// The last component moves into the vacated slot.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not present.
    pub fn remove(&mut self, entity: Entity) -> T {
        let pos = self.set.swap_remove(entity);
        self.instances.swap_remove(pos)
    }

    /// Removes and drops the component of `entity`, if present.
    ///
    /// Returns true if a component was removed.
    pub fn erase(&mut self, entity: Entity) -> bool {
        if self.set.contains(entity) {
            drop(self.remove(entity));
            true
        } else {
            false
        }
    }

    /// Returns the component of `entity`.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not present.
    #[must_use]
    pub fn get(&self, entity: Entity) -> &T {
        &self.instances[self.set.index(entity)]
    }

    /// Returns the component of `entity` mutably.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not present.
    pub fn get_mut(&mut self, entity: Entity) -> &mut T {
        let pos = self.set.index(entity);
        &mut self.instances[pos]
    }

    /// Returns the component of `entity`, or `None` if it is absent.
    #[must_use]
    pub fn try_get(&self, entity: Entity) -> Option<&T> {
        self.set.try_index(entity).map(|pos| &self.instances[pos])
    }

    /// Returns the component of `entity` mutably, or `None` if it is absent.
    pub fn try_get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.set
            .try_index(entity)
            .map(|pos| &mut self.instances[pos])
    }

    /// Returns the component at a dense position.
    pub(crate) fn at(&self, pos: usize) -> &T {
        &self.instances[pos]
    }

    /// Returns the component at a dense position mutably.
    pub(crate) fn at_mut(&mut self, pos: usize) -> &mut T {
        &mut self.instances[pos]
    }

    /// Returns the packed entities, co-indexed with [`ComponentStorage::components`].
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        self.set.entities()
    }

    /// Returns the packed component values.
    #[must_use]
    pub fn components(&self) -> &[T] {
        &self.instances
    }

    /// Returns the packed component values mutably.
    ///
    /// Values may be changed in place; membership cannot.
    pub fn components_mut(&mut self) -> &mut [T] {
        &mut self.instances
    }

    /// Iterates over `(entity, component)` pairs in dense order.
    pub fn iter(&self) -> Zip<std::iter::Copied<slice::Iter<'_, Entity>>, slice::Iter<'_, T>> {
        self.set.iter().zip(self.instances.iter())
    }

    /// Iterates over `(entity, component)` pairs with mutable components.
    pub fn iter_mut(
        &mut self,
    ) -> Zip<std::iter::Copied<slice::Iter<'_, Entity>>, slice::IterMut<'_, T>> {
        self.set.iter().zip(self.instances.iter_mut())
    }

    /// Exchanges the dense slots of two present entities and their values.
    ///
    /// # Panics
    ///
    /// Panics if either entity is not present.
    pub fn swap(&mut self, a: Entity, b: Entity) {
        let (pa, pb) = (self.set.index(a), self.set.index(b));
        self.set.swap_positions(pa, pb);
        self.instances.swap(pa, pb);
    }

    /// Reorders this pool so shared entities follow their order in `other`.
    pub fn respect(&mut self, other: &SparseSet) {
        let instances = &mut self.instances;
        self.set.respect_with(other, |a, b| instances.swap(a, b));
    }

    /// Reserves space for at least `additional` more components.
    pub fn reserve(&mut self, additional: usize) {
        self.set.reserve(additional);
        self.instances.reserve(additional);
    }

    /// Removes and drops every component.
    pub fn clear(&mut self) {
        self.set.clear();
        self.instances.clear();
    }
}

impl<'a, T: Component> IntoIterator for &'a ComponentStorage<T> {
    type Item = (Entity, &'a T);
    type IntoIter = Zip<std::iter::Copied<slice::Iter<'a, Entity>>, slice::Iter<'a, T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
