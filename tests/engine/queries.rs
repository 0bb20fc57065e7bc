//! Integration tests for live queries
//!
//! Tests steady-state terms, edge triggers, seeding, reset, and disposal.

use tessera_engine::World;
use tessera_foundation::{EntityId, ErrorKind};

#[derive(Debug, Clone, PartialEq)]
struct C1(i32);

#[derive(Debug, Clone, PartialEq)]
struct C2(i32);

#[derive(Debug, Clone, PartialEq)]
struct C3;

fn sorted(world: &World, query: tessera_foundation::QueryId) -> Vec<EntityId> {
    let mut members: Vec<_> = world.query_entities(query).unwrap().collect();
    members.sort_by_key(|e| e.index);
    members
}

// =============================================================================
// Steady-State Terms
// =============================================================================

#[test]
fn with_and_without() {
    let mut world = World::new();
    let q = world.query().with::<C1>().without::<C2>().build().unwrap();

    let e1 = world.create_entity().unwrap();
    let e2 = world.create_entity().unwrap();
    world.set(e1, C1(1)).unwrap();
    world.set(e2, C1(2)).unwrap();
    world.set(e2, C2(2)).unwrap();
    assert_eq!(sorted(&world, q), vec![e1]);

    // A disabled C2 counts as absent.
    world.disable::<C2>(e2).unwrap();
    assert_eq!(sorted(&world, q), vec![e1, e2]);

    world.disable::<C1>(e1).unwrap();
    assert_eq!(sorted(&world, q), vec![e2]);
}

#[test]
fn with_either_or() {
    let mut world = World::new();
    let q = world
        .query()
        .with_either::<C1>()
        .or::<C2>()
        .end_either()
        .without::<C3>()
        .build()
        .unwrap();

    let e1 = world.create_entity().unwrap();
    let e2 = world.create_entity().unwrap();
    let e3 = world.create_entity().unwrap();
    world.set(e1, C1(1)).unwrap();
    world.set(e2, C2(2)).unwrap();
    world.set(e3, C1(3)).unwrap();
    world.set(e3, C3).unwrap();
    assert_eq!(sorted(&world, q), vec![e1, e2]);

    world.remove::<C1>(e1).unwrap();
    world.set(e1, C2(1)).unwrap();
    assert!(world.query_contains(q, e1).unwrap());
}

#[test]
fn without_only_query_tracks_new_entities() {
    let mut world = World::new();
    let q = world.query().without::<C3>().build().unwrap();

    let e1 = world.create_entity().unwrap();
    let e2 = world.create_entity().unwrap();
    world.set(e2, C3).unwrap();

    assert_eq!(sorted(&world, q), vec![e1]);
    world.remove::<C3>(e2).unwrap();
    assert_eq!(sorted(&world, q), vec![e1, e2]);
}

#[test]
fn seeding_and_without_initial_entities() {
    let mut world = World::new();
    let old = world.create_entity().unwrap();
    world.set(old, C1(0)).unwrap();

    let seeded = world.query().with::<C1>().build().unwrap();
    let fresh = world
        .query()
        .with::<C1>()
        .without_initial_entities()
        .build()
        .unwrap();
    assert_eq!(world.query_len(seeded).unwrap(), 1);
    assert_eq!(world.query_len(fresh).unwrap(), 0);

    let new = world.create_entity().unwrap();
    world.set(new, C1(1)).unwrap();
    assert_eq!(sorted(&world, fresh), vec![new]);
}

// =============================================================================
// Edge Triggers
// =============================================================================

#[test]
fn when_added_ignores_existing_and_overwrites() {
    let mut world = World::new();
    let before = world.create_entity().unwrap();
    world.set(before, C1(0)).unwrap();

    let q = world.query().when_added::<C1>().build().unwrap();
    assert_eq!(world.query_len(q).unwrap(), 0);

    world.set(before, C1(5)).unwrap();
    assert_eq!(world.query_len(q).unwrap(), 0);

    let e = world.create_entity().unwrap();
    world.set(e, C1(1)).unwrap();
    assert_eq!(sorted(&world, q), vec![e]);
}

#[test]
fn when_enabled_fires_on_set_and_on_enable() {
    let mut world = World::new();
    let q = world.query().when_enabled::<C1>().build().unwrap();

    let e1 = world.create_entity().unwrap();
    world.set(e1, C1(1)).unwrap();
    assert!(world.query_contains(q, e1).unwrap());

    world.reset_query(q).unwrap();
    world.disable::<C1>(e1).unwrap();
    assert_eq!(world.query_len(q).unwrap(), 0);
    world.enable::<C1>(e1).unwrap();
    assert!(world.query_contains(q, e1).unwrap());
}

#[test]
fn when_disabled_and_when_removed() {
    let mut world = World::new();
    let disabled = world.query().when_disabled::<C1>().build().unwrap();
    let removed = world.query().when_removed::<C1>().build().unwrap();

    let e = world.create_entity().unwrap();
    world.set(e, C1(1)).unwrap();
    world.disable::<C1>(e).unwrap();
    assert!(world.query_contains(disabled, e).unwrap());
    assert!(!world.query_contains(removed, e).unwrap());

    world.remove::<C1>(e).unwrap();
    assert!(world.query_contains(removed, e).unwrap());
}

#[test]
fn edge_trigger_respects_steady_terms() {
    let mut world = World::new();
    let q = world.query().when_added::<C1>().with::<C2>().build().unwrap();

    let without_c2 = world.create_entity().unwrap();
    world.set(without_c2, C1(0)).unwrap();

    let with_c2 = world.create_entity().unwrap();
    world.set(with_c2, C2(0)).unwrap();
    world.set(with_c2, C1(0)).unwrap();

    assert_eq!(sorted(&world, q), vec![with_c2]);

    // Losing the steady term evicts the accumulated member.
    world.disable::<C2>(with_c2).unwrap();
    assert_eq!(world.query_len(q).unwrap(), 0);
}

#[test]
fn when_either_added() {
    let mut world = World::new();
    let q = world
        .query()
        .when_either_added::<C1>()
        .or::<C2>()
        .build()
        .unwrap();

    let e1 = world.create_entity().unwrap();
    let e2 = world.create_entity().unwrap();
    let e3 = world.create_entity().unwrap();
    world.set(e1, C1(1)).unwrap();
    world.set(e2, C2(2)).unwrap();
    world.set(e3, C3).unwrap();

    assert_eq!(sorted(&world, q), vec![e1, e2]);
}

#[test]
fn when_either_removed() {
    let mut world = World::new();
    let q = world
        .query()
        .when_either_removed::<C1>()
        .or::<C2>()
        .build()
        .unwrap();

    let e1 = world.create_entity().unwrap();
    let e2 = world.create_entity().unwrap();
    let e3 = world.create_entity().unwrap();
    world.set(e1, C1(1)).unwrap();
    world.set(e2, C2(2)).unwrap();
    world.set(e3, C3).unwrap();
    assert_eq!(world.query_len(q).unwrap(), 0);

    world.remove::<C1>(e1).unwrap();
    world.remove::<C2>(e2).unwrap();
    world.remove::<C3>(e3).unwrap();
    assert_eq!(sorted(&world, q), vec![e1, e2]);
}

#[test]
fn when_either_enabled() {
    let mut world = World::new();
    let q = world
        .query()
        .when_either_enabled::<C1>()
        .or::<C2>()
        .build()
        .unwrap();

    let e1 = world.create_entity().unwrap();
    let e2 = world.create_entity().unwrap();
    world.set(e1, C1(1)).unwrap();
    world.set(e2, C2(2)).unwrap();
    world.disable::<C2>(e2).unwrap();
    assert_eq!(sorted(&world, q), vec![e1, e2]);

    world.reset_query(q).unwrap();
    world.enable::<C2>(e2).unwrap();
    assert_eq!(sorted(&world, q), vec![e2]);
}

#[test]
fn when_either_disabled_with_steady_term() {
    let mut world = World::new();
    let q = world
        .query()
        .when_either_disabled::<C1>()
        .or::<C2>()
        .end_either()
        .with::<C3>()
        .build()
        .unwrap();

    let tagged = world.create_entity().unwrap();
    let untagged = world.create_entity().unwrap();
    world.set(tagged, C1(1)).unwrap();
    world.set(tagged, C3).unwrap();
    world.set(untagged, C2(2)).unwrap();
    assert_eq!(world.query_len(q).unwrap(), 0);

    world.disable::<C1>(tagged).unwrap();
    world.disable::<C2>(untagged).unwrap();
    assert_eq!(sorted(&world, q), vec![tagged]);
}

#[test]
fn two_triggers_need_both_events() {
    let mut world = World::new();
    let q = world
        .query()
        .when_added::<C1>()
        .when_added::<C2>()
        .build()
        .unwrap();

    let e = world.create_entity().unwrap();
    world.set(e, C2(0)).unwrap();
    assert_eq!(world.query_len(q).unwrap(), 0);
    world.set(e, C1(0)).unwrap();
    assert!(world.query_contains(q, e).unwrap());
}

#[test]
fn reset_on_steady_query_keeps_members() {
    let mut world = World::new();
    let q = world.query().with::<C1>().build().unwrap();
    let e = world.create_entity().unwrap();
    world.set(e, C1(0)).unwrap();

    world.reset_query(q).unwrap();
    assert!(world.query_contains(q, e).unwrap());
}

// =============================================================================
// Handles
// =============================================================================

#[test]
fn disposed_query_handle_is_invalid() {
    let mut world = World::new();
    let q = world.query().with::<C1>().build().unwrap();
    world.dispose_query(q).unwrap();

    for err in [
        world.query_len(q).unwrap_err(),
        world.reset_query(q).unwrap_err(),
        world.query_cursor(q).unwrap_err(),
    ] {
        assert!(matches!(err.kind, ErrorKind::InvalidQueryUse(id) if id == q));
    }

    // The slot is recycled under a new generation.
    let again = world.query().with::<C1>().build().unwrap();
    assert_ne!(again, q);
    assert!(world.query_len(q).is_err());
}

#[test]
fn as_set_builds_like_build() {
    let mut world = World::new();
    let e = world.create_entity().unwrap();
    world.set(e, C1(0)).unwrap();

    let q = world.query().with::<C1>().as_set().unwrap();
    assert_eq!(world.query_len(q).unwrap(), 1);
    assert_eq!(world.query_count(), 1);
}
