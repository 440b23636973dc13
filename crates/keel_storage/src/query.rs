//! Compile-time descriptions of component access.
//!
//! A [`Query`] names the components a view reads or writes, for example
//! `(&Position, &mut Velocity)`. A [`ComponentSet`] names plain component
//! types, used for exclusion filters and presence checks. A [`Bundle`] is a
//! tuple of component values assigned together.
//!
//! Tuples of up to eight elements implement all three traits.

use std::any::{Any, TypeId};

use keel_foundation::{Component, Entity};

use crate::pool::PoolBorrows;
use crate::registry::Registry;
use crate::sparse_set::SparseSet;
use crate::storage::ComponentStorage;

/// A set of component accesses that can be borrowed from a registry.
pub trait Query {
    /// The borrowed pools.
    type Fetch<'r>: Fetch;

    /// The components of a single entity, borrowed for `'r`.
    type Item<'r>;

    /// Makes sure every pool the query touches exists.
    fn register(registry: &mut Registry);

    /// Takes the pools out of the registry's pool table.
    fn borrow<'r>(pools: &mut PoolBorrows<'r>) -> Self::Fetch<'r>;

    /// Takes the pools and returns the components of `entity`.
    ///
    /// # Panics
    ///
    /// Panics if `entity` lacks any of the components.
    fn get<'r>(pools: &mut PoolBorrows<'r>, entity: Entity) -> Self::Item<'r>;
}

/// Borrowed pools of a query.
pub trait Fetch {
    /// Number of pools.
    const COUNT: usize;

    /// Returns the presence index of the pool at `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= COUNT`.
    fn set(&self, slot: usize) -> &SparseSet;

    /// Returns the pool storing `type_id`, if borrowed.
    fn storage(&self, type_id: TypeId) -> Option<&dyn Any>;

    /// Returns the pool storing `type_id`, if borrowed mutably.
    fn storage_mut(&mut self, type_id: TypeId) -> Option<&mut dyn Any>;
}

/// Per-entity component access for a borrowed [`Fetch`].
///
/// Implemented on `&'a mut F` so that items are tied to the borrow of the
/// fetch rather than to the fetch type itself.
pub trait FetchItem<'a> {
    /// The components of one entity.
    type Item;

    /// Returns the components of `entity`.
    ///
    /// `hint` is `(slot, position)`: the pool at `slot` stores `entity` at
    /// dense `position`, so it can skip the sparse lookup.
    fn fetch(self, entity: Entity, hint: Option<(usize, usize)>) -> Self::Item;
}

/// The item type produced by fetching from `F` for the borrow `'a`.
pub type QueryItem<'a, F> = <&'a mut F as FetchItem<'a>>::Item;

impl<T: Component> Query for &T {
    type Fetch<'r> = &'r ComponentStorage<T>;
    type Item<'r> = &'r T;

    fn register(registry: &mut Registry) {
        registry.assure::<T>();
    }

    fn borrow<'r>(pools: &mut PoolBorrows<'r>) -> Self::Fetch<'r> {
        pools.take_ref::<T>()
    }

    fn get<'r>(pools: &mut PoolBorrows<'r>, entity: Entity) -> Self::Item<'r> {
        pools.take_ref::<T>().get(entity)
    }
}

impl<T: Component> Query for &mut T {
    type Fetch<'r> = &'r mut ComponentStorage<T>;
    type Item<'r> = &'r mut T;

    fn register(registry: &mut Registry) {
        registry.assure::<T>();
    }

    fn borrow<'r>(pools: &mut PoolBorrows<'r>) -> Self::Fetch<'r> {
        pools.take::<T>()
    }

    fn get<'r>(pools: &mut PoolBorrows<'r>, entity: Entity) -> Self::Item<'r> {
        pools.take::<T>().get_mut(entity)
    }
}

impl<T: Component> Fetch for &ComponentStorage<T> {
    const COUNT: usize = 1;

    fn set(&self, slot: usize) -> &SparseSet {
        debug_assert_eq!(slot, 0);
        ComponentStorage::set(self)
    }

    fn storage(&self, type_id: TypeId) -> Option<&dyn Any> {
        (type_id == TypeId::of::<T>()).then_some(*self as &dyn Any)
    }

    fn storage_mut(&mut self, _type_id: TypeId) -> Option<&mut dyn Any> {
        None
    }
}

impl<T: Component> Fetch for &mut ComponentStorage<T> {
    const COUNT: usize = 1;

    fn set(&self, slot: usize) -> &SparseSet {
        debug_assert_eq!(slot, 0);
        ComponentStorage::set(self)
    }

    fn storage(&self, type_id: TypeId) -> Option<&dyn Any> {
        (type_id == TypeId::of::<T>()).then_some(&**self as &dyn Any)
    }

    fn storage_mut(&mut self, type_id: TypeId) -> Option<&mut dyn Any> {
        (type_id == TypeId::of::<T>()).then_some(&mut **self as &mut dyn Any)
    }
}

impl<'a, T: Component> FetchItem<'a> for &'a mut &ComponentStorage<T> {
    type Item = &'a T;

    fn fetch(self, entity: Entity, hint: Option<(usize, usize)>) -> Self::Item {
        match hint {
            Some((0, position)) => self.at(position),
            _ => self.get(entity),
        }
    }
}

impl<'a, T: Component> FetchItem<'a> for &'a mut &mut ComponentStorage<T> {
    type Item = &'a mut T;

    fn fetch(self, entity: Entity, hint: Option<(usize, usize)>) -> Self::Item {
        match hint {
            Some((0, position)) => self.at_mut(position),
            _ => self.get_mut(entity),
        }
    }
}

/// Plain component types, used to exclude entities or test for presence.
pub trait ComponentSet {
    /// Borrowed presence indices.
    type Sets<'r>: Excluded;

    /// Makes sure every pool the set names exists.
    fn register(registry: &mut Registry);

    /// Takes the presence indices out of the registry's pool table.
    fn borrow<'r>(pools: &mut PoolBorrows<'r>) -> Self::Sets<'r>;

    /// Returns true if `entity` owns every component in the set.
    fn all_present(registry: &Registry, entity: Entity) -> bool;
}

/// Presence indices an entity must not appear in.
pub trait Excluded {
    /// Returns true if any index contains `entity`.
    fn any_contains(&self, entity: Entity) -> bool;
}

impl Excluded for () {
    fn any_contains(&self, _entity: Entity) -> bool {
        false
    }
}

impl Excluded for &SparseSet {
    fn any_contains(&self, entity: Entity) -> bool {
        self.contains(entity)
    }
}

impl ComponentSet for () {
    type Sets<'r> = ();

    fn register(_registry: &mut Registry) {}

    fn borrow<'r>(_pools: &mut PoolBorrows<'r>) -> Self::Sets<'r> {}

    fn all_present(_registry: &Registry, _entity: Entity) -> bool {
        true
    }
}

/// Component values assigned to one entity together.
pub trait Bundle: Sized {
    /// Mutable references to the assigned components.
    type Refs<'r>;

    /// Assigns every value to `entity`.
    fn assign(self, registry: &mut Registry, entity: Entity);

    /// Takes the pools and returns the components of `entity`.
    fn refs<'r>(pools: &mut PoolBorrows<'r>, entity: Entity) -> Self::Refs<'r>;
}

macro_rules! sparse_ref {
    ($ignored:ident, $lt:lifetime) => {
        &$lt SparseSet
    };
}

macro_rules! impl_tuples {
    ($($name:ident),+) => {
        impl<$($name: Query),+> Query for ($($name,)+) {
            type Fetch<'r> = ($($name::Fetch<'r>,)+);
            type Item<'r> = ($($name::Item<'r>,)+);

            fn register(registry: &mut Registry) {
                $($name::register(registry);)+
            }

            fn borrow<'r>(pools: &mut PoolBorrows<'r>) -> Self::Fetch<'r> {
                ($($name::borrow(pools),)+)
            }

            fn get<'r>(pools: &mut PoolBorrows<'r>, entity: Entity) -> Self::Item<'r> {
                ($($name::get(pools, entity),)+)
            }
        }

        impl<$($name: Fetch),+> Fetch for ($($name,)+) {
            const COUNT: usize = 0 $(+ $name::COUNT)+;

            #[allow(non_snake_case, unused_assignments)]
            fn set(&self, slot: usize) -> &SparseSet {
                let ($($name,)+) = self;
                let mut base = 0;
                $(
                    if slot < base + $name::COUNT {
                        return $name.set(slot - base);
                    }
                    base += $name::COUNT;
                )+
                panic!("slot {slot} is out of range for a query of {} pools", Self::COUNT)
            }

            #[allow(non_snake_case)]
            fn storage(&self, type_id: TypeId) -> Option<&dyn Any> {
                let ($($name,)+) = self;
                $(
                    if let Some(found) = $name.storage(type_id) {
                        return Some(found);
                    }
                )+
                None
            }

            #[allow(non_snake_case)]
            fn storage_mut(&mut self, type_id: TypeId) -> Option<&mut dyn Any> {
                let ($($name,)+) = self;
                $(
                    if let Some(found) = $name.storage_mut(type_id) {
                        return Some(found);
                    }
                )+
                None
            }
        }

        impl<'a, $($name),+> FetchItem<'a> for &'a mut ($($name,)+)
        where
            $($name: Fetch, &'a mut $name: FetchItem<'a>,)+
        {
            type Item = ($(<&'a mut $name as FetchItem<'a>>::Item,)+);

            #[allow(non_snake_case, unused_assignments)]
            fn fetch(self, entity: Entity, hint: Option<(usize, usize)>) -> Self::Item {
                let ($($name,)+) = self;
                let mut base = 0;
                ($({
                    let local = hint.and_then(|(slot, position)| {
                        (slot >= base && slot < base + $name::COUNT)
                            .then(|| (slot - base, position))
                    });
                    base += $name::COUNT;
                    $name.fetch(entity, local)
                },)+)
            }
        }

        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            type Sets<'r> = ($(sparse_ref!($name, 'r),)+);

            fn register(registry: &mut Registry) {
                $(registry.assure::<$name>();)+
            }

            fn borrow<'r>(pools: &mut PoolBorrows<'r>) -> Self::Sets<'r> {
                ($(pools.take_set::<$name>(),)+)
            }

            fn all_present(registry: &Registry, entity: Entity) -> bool {
                $(registry.has::<$name>(entity))&&+
            }
        }

        impl<$($name: Excluded),+> Excluded for ($($name,)+) {
            #[allow(non_snake_case)]
            fn any_contains(&self, entity: Entity) -> bool {
                let ($($name,)+) = self;
                $($name.any_contains(entity))||+
            }
        }

        impl<$($name: Component),+> Bundle for ($($name,)+) {
            type Refs<'r> = ($(&'r mut $name,)+);

            #[allow(non_snake_case)]
            fn assign(self, registry: &mut Registry, entity: Entity) {
                let ($($name,)+) = self;
                $(registry.assign(entity, $name);)+
            }

            fn refs<'r>(pools: &mut PoolBorrows<'r>, entity: Entity) -> Self::Refs<'r> {
                ($(pools.take::<$name>().get_mut(entity),)+)
            }
        }
    };
}

impl_tuples!(A);
impl_tuples!(A, B);
impl_tuples!(A, B, C);
impl_tuples!(A, B, C, D);
impl_tuples!(A, B, C, D, E);
impl_tuples!(A, B, C, D, E, F);
impl_tuples!(A, B, C, D, E, F, G);
impl_tuples!(A, B, C, D, E, F, G, H);
