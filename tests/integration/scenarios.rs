//! End-to-end scenarios
//!
//! Small scripted sessions against one world.

use tessera::engine::{DefaultSystemGroup, SystemRegistry};
use tessera::foundation::SparseSet;
use tessera::{Result, System, World};

#[derive(Debug, Clone, PartialEq)]
struct Health(i32);

#[derive(Debug, Clone, PartialEq)]
struct Mana(i32);

#[derive(Debug, Clone, PartialEq)]
struct C1;

#[test]
fn entity_with_two_components_then_destroyed() {
    let mut world = World::new();
    let e = world.create_entity().unwrap();
    world.set(e, Health(100)).unwrap();
    world.set(e, Mana(50)).unwrap();

    assert!(world.has::<Health>(e).unwrap());
    assert!(world.has::<Mana>(e).unwrap());

    world.destroy_entity(e).unwrap();
    assert!(world.has::<Health>(e).unwrap_err().is_stale());
}

#[test]
fn steady_query_follows_destroy() {
    let mut world = World::new();
    let q = world.query().with::<C1>().build().unwrap();

    let e1 = world.create_entity().unwrap();
    world.set(e1, C1).unwrap();
    let _e2 = world.create_entity().unwrap();
    assert_eq!(world.query_len(q).unwrap(), 1);

    world.destroy_entity(e1).unwrap();
    assert_eq!(world.query_len(q).unwrap(), 0);
}

#[test]
fn edge_query_accumulates_until_reset() {
    let mut world = World::new();
    let q = world.query().when_added::<C1>().build().unwrap();

    let e1 = world.create_entity().unwrap();
    world.set(e1, C1).unwrap();
    assert_eq!(world.query_len(q).unwrap(), 1);

    world.reset_query(q).unwrap();
    assert_eq!(world.query_len(q).unwrap(), 0);

    let e2 = world.create_entity().unwrap();
    world.set(e2, C1).unwrap();
    assert_eq!(world.query_len(q).unwrap(), 1);
    assert!(world.query_contains(q, e2).unwrap());
}

struct S1;
struct S2;
struct S3;

impl System for S1 {
    fn run(&mut self, world: &mut World) -> Result<()> {
        world.get_singleton_mut::<Vec<&'static str>>()?.push("S1");
        Ok(())
    }
}

impl System for S2 {
    fn run(&mut self, world: &mut World) -> Result<()> {
        world.get_singleton_mut::<Vec<&'static str>>()?.push("S2");
        Ok(())
    }
}

impl System for S3 {
    fn run(&mut self, world: &mut World) -> Result<()> {
        world.get_singleton_mut::<Vec<&'static str>>()?.push("S3");
        Ok(())
    }
}

struct Game;

#[test]
fn scheduler_orders_before_and_after() {
    let mut registry = SystemRegistry::new();
    registry.register(|| S1).before::<S2>();
    registry.register(|| S2).after::<S3>();
    registry.register(|| S3);

    let mut world = World::from_registry::<Game>(&mut registry).unwrap();
    world.set_singleton(Vec::<&'static str>::new()).unwrap();
    world.run_group::<DefaultSystemGroup>().unwrap();

    assert_eq!(
        world.get_singleton::<Vec<&'static str>>().unwrap(),
        &vec!["S1", "S3", "S2"]
    );
}

#[test]
fn sparse_set_swap_remove() {
    let mut set = SparseSet::new();
    set.insert(1, 1);
    set.insert(2, 2);
    set.remove(1);

    assert!(!set.contains(1));
    assert!(set.contains(2));
    assert_eq!(set.get(2), Some(&2));
}

#[test]
fn recycled_index_is_a_new_handle() {
    let mut world = World::new();
    let old = world.create_entity().unwrap();
    world.destroy_entity(old).unwrap();
    let new = world.create_entity().unwrap();

    assert!(!world.is_entity_alive(old));
    assert!(world.is_entity_alive(new));
    assert_eq!(old.index, new.index);
    assert_ne!(old, new);
}
