//! Paged sparse set over entity handles.
//!
//! The set keeps two arrays:
//! - `sparse`: entity index -> position in `dense`, split into lazily
//!   allocated pages so untouched index ranges cost nothing
//! - `dense`: the packed list of entities currently present
//!
//! For every present entity `e`, `dense[sparse[e.index()]] == e`. Removal
//! moves the last dense element into the vacated slot, so iteration order
//! matches insertion order only until the first removal.

use std::slice;

use keel_foundation::Entity;

use crate::config::DEFAULT_PAGE_SIZE;

/// Sparse entry value meaning "not present".
const EMPTY: u32 = u32::MAX;

/// Integer-keyed presence index with O(1) insert, lookup, and swap-removal.
#[derive(Clone, Debug)]
pub struct SparseSet {
    /// Pages of dense positions, indexed by `entity.index() >> page_shift`.
    sparse: Vec<Option<Box<[u32]>>>,
    /// Packed entities.
    dense: Vec<Entity>,
    /// log2 of the page size.
    page_shift: u32,
}

impl Default for SparseSet {
    fn default() -> Self {
        Self::new()
    }
}

impl SparseSet {
    /// Creates an empty set with the default page size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Creates an empty set whose sparse pages hold `page_size` entries.
    ///
    /// # Panics
    ///
    /// Panics if `page_size` is not a power of two.
    #[must_use]
    pub fn with_page_size(page_size: usize) -> Self {
        assert!(
            page_size.is_power_of_two(),
            "page size must be a power of two, got {page_size}"
        );
        Self {
            sparse: Vec::new(),
            dense: Vec::new(),
            page_shift: page_size.trailing_zeros(),
        }
    }

    /// Returns the number of entries per sparse page.
    #[must_use]
    pub fn page_size(&self) -> usize {
        1 << self.page_shift
    }

    /// Returns the number of sparse pages currently allocated.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.sparse.iter().filter(|page| page.is_some()).count()
    }

    /// Returns the number of entities present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Returns true if no entity is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Returns true if exactly this handle (index and version) is present.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.try_index(entity).is_some()
    }

    /// Returns the dense position of `entity`, or `None` if it is absent.
    #[must_use]
    pub fn try_index(&self, entity: Entity) -> Option<usize> {
        self.position(entity)
            .filter(|&pos| self.dense[pos] == entity)
    }

    /// Returns the dense position of `entity`.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not present.
    #[must_use]
    pub fn index(&self, entity: Entity) -> usize {
        self.try_index(entity)
            .unwrap_or_else(|| panic!("entity {entity:?} is not in this sparse set"))
    }

    /// Appends `entity` to the dense array and records its position.
    ///
    /// # Panics
    ///
    /// Panics if the null handle is inserted, if any version of the same
    /// index is already present, or if the set outgrows `u32` positions.
    pub fn insert(&mut self, entity: Entity) {
        assert!(!entity.is_null(), "cannot insert the null entity");
        assert!(
            self.position(entity).is_none(),
            "entity index {} is already in this sparse set",
            entity.index()
        );

        let pos = u32::try_from(self.dense.len()).expect("sparse set is full");
        *self.entry_mut(entity) = pos;
        self.dense.push(entity);
    }

    /// Inserts every entity of `entities`, reserving dense space once.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`SparseSet::insert`].
    pub fn extend(&mut self, entities: &[Entity]) {
        self.dense.reserve(entities.len());
        for &entity in entities {
            self.insert(entity);
        }
    }

    /// Removes `entity` by moving the last dense element into its slot.
    ///
    /// Returns the position `entity` occupied, which now holds the moved
    /// element (or nothing if `entity` was last). Parallel arrays must apply
    /// the same `swap_remove` at that position.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not present.
    pub fn swap_remove(&mut self, entity: Entity) -> usize {
        let pos = self.index(entity);
        self.dense.swap_remove(pos);
        if let Some(&moved) = self.dense.get(pos) {
            *self.entry_mut(moved) = Self::to_position(pos);
        }
        *self.entry_mut(entity) = EMPTY;
        pos
    }

    /// Removes `entity`.
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not present.
    pub fn remove(&mut self, entity: Entity) {
        self.swap_remove(entity);
    }

    /// Exchanges the dense slots of two present entities.
    ///
    /// # Panics
    ///
    /// Panics if either entity is not present.
    pub fn swap(&mut self, a: Entity, b: Entity) {
        let (pa, pb) = (self.index(a), self.index(b));
        self.swap_positions(pa, pb);
    }

    /// Exchanges two dense positions and fixes up their sparse entries.
    pub(crate) fn swap_positions(&mut self, lhs: usize, rhs: usize) {
        if lhs == rhs {
            return;
        }
        let (a, b) = (self.dense[lhs], self.dense[rhs]);
        self.dense.swap(lhs, rhs);
        *self.entry_mut(a) = Self::to_position(rhs);
        *self.entry_mut(b) = Self::to_position(lhs);
    }

    /// Reorders this set so shared entities follow their order in `other`.
    ///
    /// Entities present in both sets move to the front, in `other`'s
    /// relative order. Entities only present here trail in unspecified order.
    pub fn respect(&mut self, other: &SparseSet) {
        self.respect_with(other, |_, _| {});
    }

    /// Like [`SparseSet::respect`], reporting each dense swap to `on_swap`.
    ///
    /// Parallel arrays replay the reported swaps to stay co-indexed.
    pub fn respect_with(&mut self, other: &SparseSet, mut on_swap: impl FnMut(usize, usize)) {
        let mut next = 0;
        for &entity in &other.dense {
            if let Some(pos) = self.try_index(entity) {
                if pos != next {
                    self.swap_positions(pos, next);
                    on_swap(pos, next);
                }
                next += 1;
            }
        }
    }

    /// Returns the packed entities in iteration order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.dense
    }

    /// Iterates over the packed entities.
    pub fn iter(&self) -> std::iter::Copied<slice::Iter<'_, Entity>> {
        self.dense.iter().copied()
    }

    /// Reserves dense space for at least `additional` more entities.
    pub fn reserve(&mut self, additional: usize) {
        self.dense.reserve(additional);
    }

    /// Removes every entity and releases the sparse pages.
    pub fn clear(&mut self) {
        self.sparse.clear();
        self.dense.clear();
    }

    /// Raw sparse lookup by index only, ignoring the version.
    fn position(&self, entity: Entity) -> Option<usize> {
        let (page, offset) = self.locate(entity);
        let pos = *self.sparse.get(page)?.as_ref()?.get(offset)?;
        (pos != EMPTY).then_some(pos as usize)
    }

    /// Returns the sparse entry for `entity`, allocating its page if needed.
    fn entry_mut(&mut self, entity: Entity) -> &mut u32 {
        let (page, offset) = self.locate(entity);
        if page >= self.sparse.len() {
            self.sparse.resize_with(page + 1, || None);
        }
        let page_size = self.page_size();
        let page = self.sparse[page].get_or_insert_with(|| vec![EMPTY; page_size].into_boxed_slice());
        &mut page[offset]
    }

    fn locate(&self, entity: Entity) -> (usize, usize) {
        let slot = entity.slot();
        (slot >> self.page_shift, slot & (self.page_size() - 1))
    }

    // Positions always fit: insert refuses to grow past u32::MAX entries.
    #[allow(clippy::cast_possible_truncation)]
    fn to_position(pos: usize) -> u32 {
        pos as u32
    }
}

impl<'a> IntoIterator for &'a SparseSet {
    type Item = Entity;
    type IntoIter = std::iter::Copied<slice::Iter<'a, Entity>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
