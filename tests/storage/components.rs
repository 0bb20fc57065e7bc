//! Integration tests for component storage
//!
//! Tests typed stores, enabled bits, and type-erased registry access.

use tessera_foundation::{EntityId, ErrorKind};
use tessera_storage::{ComponentKey, ComponentRegistry, ComponentStore, EntityStore};

#[derive(Debug, Clone, PartialEq)]
struct Health(i32);

#[derive(Debug, Clone, PartialEq)]
struct Mana(i32);

// =============================================================================
// Typed Stores
// =============================================================================

#[test]
fn has_is_true_after_set_and_false_after_remove() {
    let mut entities = EntityStore::new();
    let mut store = ComponentStore::new();
    let e = entities.spawn().unwrap();

    store.insert(e, Health(10));
    assert!(store.contains(e));
    store.remove(e).unwrap();
    assert!(!store.contains(e));
}

#[test]
fn disabling_keeps_data() {
    let mut store = ComponentStore::new();
    let e = EntityId::new(0, 1);
    store.insert(e, Health(3));

    store.set_enabled(e, false).unwrap();
    assert!(store.contains(e));
    assert_eq!(store.get(e).unwrap(), &Health(3));
    assert!(!store.is_enabled(e));
}

#[test]
fn remove_missing_is_an_error() {
    let mut store: ComponentStore<Health> = ComponentStore::new();
    let err = store.remove(EntityId::new(0, 1)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MissingComponent { .. }));
}

#[test]
fn recycled_entity_does_not_inherit_components() {
    let mut entities = EntityStore::new();
    let mut store = ComponentStore::new();
    let old = entities.spawn().unwrap();
    store.insert(old, Health(1));
    entities.destroy(old).unwrap();

    let new = entities.spawn().unwrap();
    assert_eq!(old.index, new.index);
    assert!(!store.contains(new));
}

// =============================================================================
// Registry
// =============================================================================

#[test]
fn registry_holds_every_type() {
    let mut registry = ComponentRegistry::new();
    let e = EntityId::new(1, 1);
    registry.get_or_create::<Health>().insert(e, Health(1));
    registry.get_or_create::<Mana>().insert(e, Mana(2));

    assert_eq!(registry.len(), 2);
    assert_eq!(
        registry.keys_of(e).collect::<Vec<_>>(),
        vec![ComponentKey::of::<Health>(), ComponentKey::of::<Mana>()]
    );
    let column = registry.column(ComponentKey::of::<Mana>()).unwrap();
    assert_eq!(column.entities(), vec![e]);
    assert_eq!(
        column.get_any(e).and_then(|v| v.downcast_ref::<Mana>()),
        Some(&Mana(2))
    );
}
