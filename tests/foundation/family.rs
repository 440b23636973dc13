//! Integration tests for component type registration
//!
//! Tests dense id assignment, idempotent registration, and registry isolation.

use std::any::TypeId;

use keel_foundation::{ComponentId, TypeRegistry};

struct Position;
struct Velocity;
struct Health;

// =============================================================================
// Registration
// =============================================================================

#[test]
fn ids_follow_registration_order() {
    let mut types = TypeRegistry::new();
    let ids: Vec<u32> = vec![
        types.register::<Health>().index(),
        types.register::<Position>().index(),
        types.register::<Velocity>().index(),
    ];
    assert_eq!(ids, vec![0, 1, 2]);
}

#[test]
fn repeated_registration_returns_same_id() {
    let mut types = TypeRegistry::new();
    let first = types.register::<Position>();
    for _ in 0..10 {
        assert_eq!(types.register::<Position>(), first);
    }
    assert_eq!(types.len(), 1);
}

#[test]
fn ids_are_registry_local() {
    let mut a = TypeRegistry::new();
    let mut b = TypeRegistry::new();
    a.register::<Position>();
    a.register::<Velocity>();
    b.register::<Velocity>();

    assert_ne!(a.id_of::<Velocity>(), b.id_of::<Velocity>());
}

// =============================================================================
// Lookup
// =============================================================================

#[test]
fn iter_lists_records_in_id_order() {
    let mut types = TypeRegistry::new();
    types.register::<Velocity>();
    types.register::<Health>();

    let records: Vec<(ComponentId, TypeId)> =
        types.iter().map(|info| (info.id, info.type_id)).collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].1, TypeId::of::<Velocity>());
    assert_eq!(records[1].1, TypeId::of::<Health>());
    assert!(records[0].0 < records[1].0);
}

#[test]
fn unknown_types_have_no_id() {
    let types = TypeRegistry::new();
    assert!(types.is_empty());
    assert_eq!(types.id_of::<Health>(), None);
    assert_eq!(types.id_of_type(TypeId::of::<Health>()), None);
}

#[test]
fn component_id_debug_format() {
    let mut types = TypeRegistry::new();
    let id = types.register::<Health>();
    assert_eq!(format!("{id:?}"), "ComponentId(0)");
    assert_eq!(id.slot(), 0);
}
