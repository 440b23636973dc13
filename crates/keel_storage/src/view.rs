//! Multi-component views.
//!
//! A [`View`] borrows the pools of a [`Query`] and walks the entities that
//! own all of them. Iteration is driven by the smallest pool, chosen again
//! every time iteration starts, and every other pool is probed per entity.

use std::any::{TypeId, type_name};
use std::iter::FusedIterator;

use keel_foundation::{Component, Entity};

use crate::query::{ComponentSet, Excluded, Fetch, FetchItem, Query, QueryItem};
use crate::storage::ComponentStorage;

/// The entities that own every component of `Q` and none of `X`.
///
/// Created by [`Registry::view`](crate::Registry::view) and
/// [`Registry::view_excluding`](crate::Registry::view_excluding). The view
/// holds the registry borrowed, so membership cannot change while it lives.
pub struct View<'r, Q: Query, X: ComponentSet = ()> {
    fetch: Q::Fetch<'r>,
    exclude: X::Sets<'r>,
}

impl<'r, Q: Query, X: ComponentSet> View<'r, Q, X> {
    pub(crate) fn new(fetch: Q::Fetch<'r>, exclude: X::Sets<'r>) -> Self {
        Self { fetch, exclude }
    }

    /// Returns the slot of the smallest pool, first on ties.
    fn candidate(&self) -> Option<usize> {
        (0..<Q::Fetch<'r> as Fetch>::COUNT).min_by_key(|&slot| self.fetch.set(slot).len())
    }

    fn accepts(&self, entity: Entity, skip: usize) -> bool {
        (0..<Q::Fetch<'r> as Fetch>::COUNT)
            .all(|slot| slot == skip || self.fetch.set(slot).contains(entity))
            && !self.exclude.any_contains(entity)
    }

    /// Returns an upper bound on the number of matching entities.
    #[must_use]
    pub fn size_hint(&self) -> usize {
        self.candidate()
            .map_or(0, |slot| self.fetch.set(slot).len())
    }

    /// Returns an iterator over the matching entities.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, 'r, Q, X> {
        match self.candidate() {
            Some(candidate) => Iter {
                view: self,
                candidate,
                entities: self.fetch.set(candidate).entities(),
                position: 0,
            },
            None => Iter {
                view: self,
                candidate: 0,
                entities: &[],
                position: 0,
            },
        }
    }

    /// Returns the first matching entity in iteration order.
    #[must_use]
    pub fn front(&self) -> Option<Entity> {
        self.iter().next()
    }

    /// Returns an iterator positioned at `entity`, if it matches.
    #[must_use]
    pub fn find(&self, entity: Entity) -> Option<Iter<'_, 'r, Q, X>> {
        let candidate = self.candidate()?;
        let set = self.fetch.set(candidate);
        let position = set.try_index(entity)?;
        self.accepts(entity, candidate).then(|| Iter {
            view: self,
            candidate,
            entities: set.entities(),
            position,
        })
    }

    /// Returns true if `entity` matches the view.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.find(entity).is_some()
    }

    /// Returns true if no entity matches.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.front().is_none()
    }

    /// Returns the component `T` of a matching entity.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not part of the view or `entity` lacks it.
    #[must_use]
    pub fn get<T: Component>(&self, entity: Entity) -> &T {
        self.fetch
            .storage(TypeId::of::<T>())
            .and_then(|pool| pool.downcast_ref::<ComponentStorage<T>>())
            .unwrap_or_else(|| panic!("{} is not part of this view", type_name::<T>()))
            .get(entity)
    }

    /// Returns the component `T` of a matching entity mutably.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not borrowed mutably by the view or `entity` lacks it.
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> &mut T {
        self.fetch
            .storage_mut(TypeId::of::<T>())
            .and_then(|pool| pool.downcast_mut::<ComponentStorage<T>>())
            .unwrap_or_else(|| panic!("{} is not writable in this view", type_name::<T>()))
            .get_mut(entity)
    }
}

impl<'r, Q: Query, X: ComponentSet> View<'r, Q, X>
where
    for<'a> &'a mut Q::Fetch<'r>: FetchItem<'a>,
{
    /// Returns every component of the view for `entity`.
    ///
    /// # Panics
    ///
    /// Panics if `entity` lacks any of the components.
    pub fn fetch(&mut self, entity: Entity) -> QueryItem<'_, Q::Fetch<'r>> {
        FetchItem::fetch(&mut self.fetch, entity, None)
    }

    /// Calls `f` with every matching entity and its components.
    pub fn each<F>(&mut self, mut f: F)
    where
        F: for<'a> FnMut(Entity, QueryItem<'a, Q::Fetch<'r>>),
    {
        let Some(candidate) = self.candidate() else {
            return;
        };
        let len = self.fetch.set(candidate).len();
        for position in 0..len {
            let entity = self.fetch.set(candidate).entities()[position];
            if self.accepts(entity, candidate) {
                f(
                    entity,
                    FetchItem::fetch(&mut self.fetch, entity, Some((candidate, position))),
                );
            }
        }
    }

    /// Calls `f` with the components of every matching entity.
    pub fn each_components<F>(&mut self, mut f: F)
    where
        F: for<'a> FnMut(QueryItem<'a, Q::Fetch<'r>>),
    {
        self.each(|_, item| f(item));
    }
}

impl<'v, 'r, Q: Query, X: ComponentSet> IntoIterator for &'v View<'r, Q, X> {
    type Item = Entity;
    type IntoIter = Iter<'v, 'r, Q, X>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the entities of a [`View`].
pub struct Iter<'v, 'r, Q: Query, X: ComponentSet> {
    view: &'v View<'r, Q, X>,
    candidate: usize,
    entities: &'v [Entity],
    position: usize,
}

impl<Q: Query, X: ComponentSet> Iterator for Iter<'_, '_, Q, X> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        while let Some(&entity) = self.entities.get(self.position) {
            self.position += 1;
            if self.view.accepts(entity, self.candidate) {
                return Some(entity);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.entities.len().saturating_sub(self.position)))
    }
}

impl<Q: Query, X: ComponentSet> FusedIterator for Iter<'_, '_, Q, X> {}
