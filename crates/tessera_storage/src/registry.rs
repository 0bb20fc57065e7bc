//! Type-indexed registry of component stores.
//!
//! Stores are keyed by [`ComponentKey`], a stable runtime identifier for a
//! component type, and held behind the [`ComponentColumn`] trait so that
//! one registry can hold stores of every type.

use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use tessera_foundation::EntityId;

use crate::component::{Component, ComponentColumn, ComponentStore};

/// Runtime identity of a component type.
///
/// Equality and hashing use only the [`TypeId`]; the name is carried for
/// diagnostics.
#[derive(Copy, Clone)]
pub struct ComponentKey {
    id: TypeId,
    name: &'static str,
}

impl ComponentKey {
    /// Returns the key for component type `T`.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// The underlying type id.
    #[must_use]
    pub fn type_id(self) -> TypeId {
        self.id
    }

    /// Full type name of the component.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.name
    }
}

impl PartialEq for ComponentKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentKey {}

impl Hash for ComponentKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentKey({})", self.name)
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// All component stores of one world, in registration order.
#[derive(Default)]
pub struct ComponentRegistry {
    index: HashMap<TypeId, usize>,
    keys: Vec<ComponentKey>,
    columns: Vec<Box<dyn ComponentColumn>>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the store for `T`, if one has been created.
    #[must_use]
    pub fn get<T: Component>(&self) -> Option<&ComponentStore<T>> {
        let slot = *self.index.get(&TypeId::of::<T>())?;
        self.columns[slot].as_any().downcast_ref()
    }

    /// Returns the store for `T` mutably, if one has been created.
    pub fn get_mut<T: Component>(&mut self) -> Option<&mut ComponentStore<T>> {
        let slot = *self.index.get(&TypeId::of::<T>())?;
        self.columns[slot].as_any_mut().downcast_mut()
    }

    /// Returns the store for `T`, creating it on first use.
    pub fn get_or_create<T: Component>(&mut self) -> &mut ComponentStore<T> {
        let key = ComponentKey::of::<T>();
        let slot = match self.index.get(&key.id) {
            Some(&slot) => slot,
            None => {
                let slot = self.columns.len();
                self.index.insert(key.id, slot);
                self.keys.push(key);
                self.columns.push(Box::new(ComponentStore::<T>::new()));
                tracing::trace!(component = key.name, "component store created");
                slot
            }
        };
        self.columns[slot]
            .as_any_mut()
            .downcast_mut()
            .unwrap_or_else(|| unreachable!("store registered under a foreign type id"))
    }

    /// Returns the type-erased store for `key`.
    #[must_use]
    pub fn column(&self, key: ComponentKey) -> Option<&dyn ComponentColumn> {
        let slot = *self.index.get(&key.id)?;
        Some(self.columns[slot].as_ref())
    }

    /// Returns true if `entity` has the component, enabled or not.
    #[must_use]
    pub fn contains(&self, key: ComponentKey, entity: EntityId) -> bool {
        self.column(key).is_some_and(|c| c.contains(entity))
    }

    /// Returns true if `entity` has the component and it is enabled.
    #[must_use]
    pub fn is_enabled(&self, key: ComponentKey, entity: EntityId) -> bool {
        self.column(key).is_some_and(|c| c.is_enabled(entity))
    }

    /// Keys of every store, in registration order.
    #[must_use]
    pub fn keys(&self) -> &[ComponentKey] {
        &self.keys
    }

    /// Keys of the components `entity` currently has, in registration order.
    pub fn keys_of(&self, entity: EntityId) -> impl Iterator<Item = ComponentKey> + '_ {
        self.keys
            .iter()
            .zip(&self.columns)
            .filter(move |(_, column)| column.contains(entity))
            .map(|(key, _)| *key)
    }

    /// Removes the component under `key` from `entity`, boxing the old value.
    pub fn remove_any(
        &mut self,
        key: ComponentKey,
        entity: EntityId,
    ) -> Option<Box<dyn std::any::Any + Send>> {
        let slot = *self.index.get(&key.id)?;
        self.columns[slot].remove_any(entity)
    }

    /// Number of stores created so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if no store has been created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Drops every store.
    pub fn clear(&mut self) {
        self.index.clear();
        self.keys.clear();
        self.columns.clear();
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.keys
                    .iter()
                    .zip(&self.columns)
                    .map(|(key, column)| (key.name, column.len())),
            )
            .finish()
    }
}
