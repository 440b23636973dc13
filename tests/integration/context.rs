//! Context variable integration tests
//!
//! Registry-wide singletons shared between systems, such as a frame clock.

use keel::prelude::*;

#[derive(Debug, Default, PartialEq)]
struct Clock {
    frame: u64,
    elapsed_ms: u64,
}

#[derive(Debug, PartialEq)]
struct Score(u32);

fn tick(registry: &mut Registry, delta_ms: u64) {
    let clock = registry.context_mut::<Clock>();
    clock.frame += 1;
    clock.elapsed_ms += delta_ms;
}

#[test]
fn systems_share_context() {
    let mut registry = Registry::new();
    registry.set_context(Clock::default());

    for _ in 0..3 {
        tick(&mut registry, 16);
    }

    assert_eq!(
        registry.context::<Clock>(),
        &Clock {
            frame: 3,
            elapsed_ms: 48
        }
    );
}

#[test]
fn context_is_keyed_by_type() {
    let mut registry = Registry::new();
    registry.set_context(Score(10));
    registry.set_context(Clock::default());

    assert_eq!(registry.context::<Score>(), &Score(10));
    assert_eq!(registry.unset_context::<Score>(), Some(Score(10)));
    assert!(registry.try_context::<Score>().is_none());
    assert!(registry.try_context::<Clock>().is_some());
}

#[test]
fn context_survives_reset() {
    let mut registry = Registry::new();
    registry.set_context(Score(1));
    registry.create_many(3);
    registry.reset();

    assert_eq!(registry.context::<Score>(), &Score(1));
}

#[test]
#[should_panic(expected = "context variable not set")]
fn missing_context_is_a_contract_violation() {
    let mut registry = Registry::new();
    tick(&mut registry, 16);
}

#[test]
fn missing_context_error_names_the_type() {
    let err = Error::context_not_found(std::any::type_name::<Clock>());
    assert!(matches!(err.kind, ErrorKind::ContextNotFound(name) if name.ends_with("Clock")));
}
