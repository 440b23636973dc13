//! Integration tests for sparse sets
//!
//! Tests membership, swap-removal, paging, and reordering.

use keel_foundation::Entity;
use keel_storage::SparseSet;

fn e(index: u32) -> Entity {
    Entity::new(index, 0)
}

// =============================================================================
// Membership
// =============================================================================

#[test]
fn insert_then_contains() {
    let mut set = SparseSet::new();
    set.insert(e(3));
    set.insert(e(0));

    assert!(set.contains(e(3)));
    assert!(set.contains(e(0)));
    assert!(!set.contains(e(1)));
    assert_eq!(set.entities(), &[e(3), e(0)]);
}

#[test]
fn contains_checks_the_version() {
    let mut set = SparseSet::new();
    set.insert(Entity::new(4, 1));

    assert!(set.contains(Entity::new(4, 1)));
    assert!(!set.contains(Entity::new(4, 2)));
    assert_eq!(set.try_index(Entity::new(4, 2)), None);
}

#[test]
fn far_indices_allocate_only_their_page() {
    let mut set = SparseSet::with_page_size(64);
    set.insert(e(10_000));

    assert!(set.contains(e(10_000)));
    assert!(!set.contains(e(9_999)));
    assert_eq!(set.len(), 1);
    assert_eq!(set.page_size(), 64);
}

#[test]
#[should_panic(expected = "already in this sparse set")]
fn duplicate_index_panics() {
    let mut set = SparseSet::new();
    set.insert(Entity::new(2, 0));
    set.insert(Entity::new(2, 1));
}

#[test]
#[should_panic(expected = "null entity")]
fn null_entity_panics() {
    let mut set = SparseSet::new();
    set.insert(Entity::NULL);
}

// =============================================================================
// Removal
// =============================================================================

#[test]
fn removal_moves_last_into_hole() {
    let mut set = SparseSet::new();
    set.extend(&[e(0), e(1), e(2), e(3)]);

    assert_eq!(set.swap_remove(e(1)), 1);
    assert_eq!(set.entities(), &[e(0), e(3), e(2)]);
    assert_eq!(set.index(e(3)), 1);
}

#[test]
fn removing_last_leaves_prefix() {
    let mut set = SparseSet::new();
    set.extend(&[e(5), e(6)]);
    set.remove(e(6));

    assert_eq!(set.entities(), &[e(5)]);
    assert!(!set.contains(e(6)));
}

#[test]
fn reinsert_after_removal() {
    let mut set = SparseSet::new();
    set.insert(Entity::new(7, 0));
    set.remove(Entity::new(7, 0));
    set.insert(Entity::new(7, 1));

    assert!(set.contains(Entity::new(7, 1)));
    assert!(!set.contains(Entity::new(7, 0)));
}

#[test]
fn clear_empties_the_set() {
    let mut set = SparseSet::new();
    set.extend(&[e(1), e(2)]);
    set.clear();

    assert!(set.is_empty());
    assert!(!set.contains(e(1)));
    assert_eq!(set.page_count(), 0);
}

// =============================================================================
// Reordering
// =============================================================================

#[test]
fn swap_exchanges_positions() {
    let mut set = SparseSet::new();
    set.extend(&[e(0), e(1), e(2)]);
    set.swap(e(0), e(2));

    assert_eq!(set.entities(), &[e(2), e(1), e(0)]);
    assert_eq!(set.index(e(0)), 2);
}

#[test]
fn respect_follows_other_order() {
    let mut set = SparseSet::new();
    set.extend(&[e(0), e(1), e(2), e(3)]);
    let mut other = SparseSet::new();
    other.extend(&[e(3), e(9), e(1)]);

    set.respect(&other);

    assert_eq!(&set.entities()[..2], &[e(3), e(1)]);
    assert_eq!(set.len(), 4);
    for entity in [e(0), e(1), e(2), e(3)] {
        assert_eq!(set.entities()[set.index(entity)], entity);
    }
}

#[test]
fn iteration_follows_dense_order() {
    let mut set = SparseSet::new();
    set.extend(&[e(8), e(2), e(5)]);

    let seen: Vec<Entity> = set.iter().collect();
    assert_eq!(seen, vec![e(8), e(2), e(5)]);
    assert_eq!((&set).into_iter().count(), 3);
}
