//! Integration tests for views
//!
//! Tests candidate selection, exclusion, lookups, and per-entity callbacks.

use std::collections::HashSet;

use keel_foundation::Entity;
use keel_storage::Registry;
use proptest::prelude::*;

#[derive(Debug, Clone, PartialEq)]
struct Position(i32);

#[derive(Debug, Clone, PartialEq)]
struct Velocity(i32);

#[derive(Debug, Clone, PartialEq)]
struct Frozen;

// =============================================================================
// Matching
// =============================================================================

#[test]
fn view_yields_intersection() {
    let mut registry = Registry::new();
    let e0 = registry.create();
    let e1 = registry.create();
    let e2 = registry.create();
    registry.assign(e0, Position(0));
    registry.assign(e1, Position(1));
    registry.assign(e1, Velocity(1));
    registry.assign(e2, Velocity(2));

    let view = registry.view::<(&Position, &Velocity)>();
    let matched: Vec<Entity> = view.iter().collect();
    assert_eq!(matched, vec![e1]);
}

#[test]
fn single_type_view_walks_the_pool() {
    let mut registry = Registry::new();
    let entities = registry.create_many(3);
    for &entity in &entities {
        registry.assign(entity, Position(0));
    }

    let view = registry.view::<&Position>();
    assert_eq!(view.iter().collect::<Vec<_>>(), entities);
    assert_eq!(view.size_hint(), 3);
}

#[test]
fn excluded_entities_are_skipped() {
    let mut registry = Registry::new();
    let entities = registry.create_many(4);
    for &entity in &entities {
        registry.assign(entity, Position(0));
    }
    registry.assign(entities[1], Frozen);
    registry.assign(entities[3], Frozen);

    let view = registry.view_excluding::<&Position, (Frozen,)>();
    let matched: Vec<Entity> = view.iter().collect();
    assert_eq!(matched, vec![entities[0], entities[2]]);
    assert!(!view.contains(entities[1]));
}

#[test]
fn view_over_unused_type_is_empty() {
    let mut registry = Registry::new();
    let entity = registry.create();
    registry.assign(entity, Position(0));

    let view = registry.view::<(&Position, &Velocity)>();
    assert!(view.is_empty());
    assert_eq!(view.front(), None);
    assert_eq!(view.size_hint(), 0);
}

#[test]
fn candidate_is_smallest_pool() {
    let mut registry = Registry::new();
    let entities = registry.create_many(10);
    for &entity in &entities {
        registry.assign(entity, Position(0));
    }
    registry.assign(entities[7], Velocity(0));

    let view = registry.view::<(&Position, &Velocity)>();
    assert_eq!(view.size_hint(), 1);
    assert_eq!(view.front(), Some(entities[7]));
}

// =============================================================================
// Lookup
// =============================================================================

#[test]
fn find_positions_the_iterator() {
    let mut registry = Registry::new();
    let entities = registry.create_many(4);
    for &entity in &entities {
        registry.assign(entity, Position(0));
        registry.assign(entity, Velocity(0));
    }

    let view = registry.view::<(&Position, &Velocity)>();
    let rest: Vec<Entity> = view.find(entities[2]).unwrap().collect();
    assert_eq!(rest, vec![entities[2], entities[3]]);
    assert!(view.find(Entity::new(50, 0)).is_none());
}

#[test]
fn contains_rejects_stale_handles() {
    let mut registry = Registry::new();
    let entity = registry.create();
    registry.assign(entity, Position(0));
    registry.destroy(entity);
    let recycled = registry.create();
    registry.assign(recycled, Position(1));

    let view = registry.view::<&Position>();
    assert!(view.contains(recycled));
    assert!(!view.contains(entity));
}

#[test]
fn get_reads_components_through_the_view() {
    let mut registry = Registry::new();
    let entity = registry.create();
    registry.assign(entity, Position(4));
    registry.assign(entity, Velocity(2));

    let mut view = registry.view::<(&Position, &mut Velocity)>();
    assert_eq!(view.get::<Position>(entity), &Position(4));
    view.get_mut::<Velocity>(entity).0 = 9;
    let (position, velocity) = view.fetch(entity);
    assert_eq!((position.0, velocity.0), (4, 9));
}

#[test]
#[should_panic(expected = "not writable")]
fn get_mut_on_read_only_component_panics() {
    let mut registry = Registry::new();
    let entity = registry.create();
    registry.assign(entity, Position(4));

    let mut view = registry.view::<&Position>();
    let _ = view.get_mut::<Position>(entity);
}

#[test]
#[should_panic(expected = "borrowed twice")]
fn aliasing_query_panics() {
    let mut registry = Registry::new();
    let _ = registry.view::<(&Position, &mut Position)>();
}

// =============================================================================
// Callbacks
// =============================================================================

#[test]
fn each_mutates_components() {
    let mut registry = Registry::new();
    let moving = registry.create();
    let still = registry.create();
    registry.assign(moving, Position(0));
    registry.assign(moving, Velocity(3));
    registry.assign(still, Position(5));

    registry
        .view::<(&mut Position, &Velocity)>()
        .each(|_, (position, velocity)| position.0 += velocity.0);

    assert_eq!(registry.get::<Position>(moving), &Position(3));
    assert_eq!(registry.get::<Position>(still), &Position(5));
}

#[test]
fn each_components_omits_the_entity() {
    let mut registry = Registry::new();
    for value in 0..5 {
        let entity = registry.create();
        registry.assign(entity, Velocity(value));
    }

    let mut total = 0;
    registry
        .view::<&Velocity>()
        .each_components(|velocity| total += velocity.0);
    assert_eq!(total, 10);
}

#[test]
fn each_respects_exclusion() {
    let mut registry = Registry::new();
    let entities = registry.create_many(3);
    for &entity in &entities {
        registry.assign(entity, Position(0));
    }
    registry.assign(entities[0], Frozen);

    let mut seen = Vec::new();
    registry
        .view_excluding::<&mut Position, (Frozen,)>()
        .each(|entity, position| {
            position.0 = 1;
            seen.push(entity);
        });

    assert_eq!(seen, vec![entities[1], entities[2]]);
    assert_eq!(registry.get::<Position>(entities[0]), &Position(0));
}

#[test]
fn view_sees_changes_between_builds() {
    let mut registry = Registry::new();
    let entity = registry.create();
    registry.assign(entity, Position(0));
    assert_eq!(registry.view::<&Position>().iter().count(), 1);

    registry.remove::<Position>(entity);
    assert_eq!(registry.view::<&Position>().iter().count(), 0);
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn each_visits_exactly_the_matching_set(
        layout in prop::collection::vec((any::<bool>(), any::<bool>(), any::<bool>()), 0..80),
        removals in prop::collection::vec(any::<usize>(), 0..20),
    ) {
        let mut registry = Registry::new();
        let entities = registry.create_many(layout.len());
        for (&entity, &(a, b, c)) in entities.iter().zip(&layout) {
            if a {
                registry.assign(entity, Position(0));
            }
            if b {
                registry.assign(entity, Velocity(0));
            }
            if c {
                registry.assign(entity, Frozen);
            }
        }
        if !entities.is_empty() {
            for index in removals {
                let entity = entities[index % entities.len()];
                let _ = registry.try_remove::<Velocity>(entity);
            }
        }

        let expected: HashSet<Entity> = entities
            .iter()
            .copied()
            .filter(|&e| {
                registry.has::<Position>(e) && registry.has::<Velocity>(e) && !registry.has::<Frozen>(e)
            })
            .collect();

        let mut visited = Vec::new();
        registry
            .view_excluding::<(&Position, &Velocity), (Frozen,)>()
            .each(|entity, _| visited.push(entity));

        let unique: HashSet<Entity> = visited.iter().copied().collect();
        prop_assert_eq!(unique.len(), visited.len());
        prop_assert_eq!(unique, expected);
    }
}
