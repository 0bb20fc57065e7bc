//! Integration tests for system scheduling
//!
//! Tests registration, ordering constraints, cycle detection, and running groups.

use std::sync::{Arc, Mutex};

use tessera_engine::{DefaultSystemGroup, System, SystemRegistry, World};
use tessera_foundation::{ErrorKind, Result};

type Log = Arc<Mutex<Vec<&'static str>>>;

macro_rules! logging_systems {
    ($($name:ident),*) => {$(
        struct $name(Log);
        impl System for $name {
            fn run(&mut self, _: &mut World) -> Result<()> {
                self.0.lock().unwrap().push(stringify!($name));
                Ok(())
            }
        }
    )*};
}

logging_systems!(S1, S2, S3);

struct Update;
struct Render;
struct Game;
struct Editor;

fn registry(log: &Log) -> SystemRegistry {
    let mut registry = SystemRegistry::new();
    let l1 = Arc::clone(log);
    let l2 = Arc::clone(log);
    let l3 = Arc::clone(log);
    registry.register(move || S1(Arc::clone(&l1))).before::<S2>();
    registry.register(move || S2(Arc::clone(&l2))).after::<S3>();
    registry.register(move || S3(Arc::clone(&l3)));
    registry
}

// =============================================================================
// Ordering
// =============================================================================

#[test]
fn before_and_after_constraints() {
    let log = Log::default();
    let mut registry = registry(&log);
    let mut world = World::from_registry::<Game>(&mut registry).unwrap();

    let group = world.system_group::<DefaultSystemGroup>().unwrap();
    assert!(group.has::<S1>());
    assert!(group.has::<S2>());
    assert!(group.has::<S3>());
    assert_eq!(group.position::<S1>(), Some(0));
    assert_eq!(group.position::<S3>(), Some(1));
    assert_eq!(group.position::<S2>(), Some(2));

    world.run_group::<DefaultSystemGroup>().unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["S1", "S3", "S2"]);
}

#[test]
fn cycle_prevents_world_creation() {
    let log = Log::default();
    let mut registry = registry(&log);
    let l3 = Arc::clone(&log);
    registry.register(move || S3(Arc::clone(&l3))).after::<S2>();

    let err = World::from_registry::<Game>(&mut registry).unwrap_err();
    match err.kind {
        ErrorKind::CyclicDependency { group, systems } => {
            assert!(group.contains("DefaultSystemGroup"));
            assert_eq!(systems.len(), 2);
        }
        other => panic!("expected a cycle, got {other:?}"),
    }
}

// =============================================================================
// Worlds and Groups
// =============================================================================

#[test]
fn systems_join_their_world_and_group() {
    let log = Log::default();
    let mut registry = SystemRegistry::new();
    let l1 = Arc::clone(&log);
    let l2 = Arc::clone(&log);
    registry
        .register(move || S1(Arc::clone(&l1)))
        .in_world::<Editor>()
        .in_group::<Render>();
    registry
        .register(move || S2(Arc::clone(&l2)))
        .in_group::<Update>();

    let game = World::from_registry::<Game>(&mut registry).unwrap();
    assert!(game.system_group::<Render>().is_none());
    assert!(game.system_group::<Update>().unwrap().has::<S2>());

    let editor = World::from_registry::<Editor>(&mut registry).unwrap();
    assert!(editor.system_group::<Render>().unwrap().has::<S1>());
    assert_eq!(editor.system_groups().count(), 2);
    assert_eq!(registry.cached_plans(), 2);

    registry.clear_cache();
    assert_eq!(registry.cached_plans(), 0);
}

#[test]
fn each_world_gets_fresh_instances() {
    struct Counter(u32);
    impl System for Counter {
        fn run(&mut self, world: &mut World) -> Result<()> {
            self.0 += 1;
            world.set_singleton(self.0)?;
            Ok(())
        }
    }

    let mut registry = SystemRegistry::new();
    registry.register(|| Counter(0));

    let mut first = World::from_registry::<Game>(&mut registry).unwrap();
    first.run_group::<DefaultSystemGroup>().unwrap();
    first.run_group::<DefaultSystemGroup>().unwrap();
    let mut second = World::from_registry::<Game>(&mut registry).unwrap();
    second.run_group::<DefaultSystemGroup>().unwrap();

    assert_eq!(*first.get_singleton::<u32>().unwrap(), 2);
    assert_eq!(*second.get_singleton::<u32>().unwrap(), 1);
}

#[test]
fn get_or_create_system_group_is_idempotent() {
    let mut world = World::new();
    assert!(world.system_group::<Update>().is_none());

    assert!(world.get_or_create_system_group::<Update>().unwrap().is_empty());
    world.get_or_create_system_group::<Update>().unwrap();
    assert_eq!(world.system_groups().count(), 1);
    assert!(world.system_group::<Update>().unwrap().name().ends_with("Update"));
}

#[test]
fn system_destroying_the_world() {
    struct Teardown;
    impl System for Teardown {
        fn run(&mut self, world: &mut World) -> Result<()> {
            world.destroy()
        }
    }

    let mut registry = SystemRegistry::new();
    registry.register(|| Teardown);
    let mut world = World::from_registry::<Game>(&mut registry).unwrap();

    world.run_group::<DefaultSystemGroup>().unwrap();
    assert!(!world.is_alive());
    assert!(world.run_group::<DefaultSystemGroup>().unwrap_err().is_stale());
}
