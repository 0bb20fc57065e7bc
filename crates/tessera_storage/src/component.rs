//! Typed component storage backed by a sparse set.
//!
//! One [`ComponentStore<T>`] exists per component type per world. Each
//! occupied slot records its owning entity and an enabled bit next to the
//! value. Stores only report what changed; fanning those transitions out
//! to listeners is the owning world's job.

use std::any::{Any, type_name};

use tessera_foundation::{EntityId, Error, Result, SparseSet};

/// Marker for types that can be stored as components.
///
/// Implemented for every `Send + 'static` type, so plain structs qualify
/// without any derive.
pub trait Component: Send + 'static {}

impl<T: Send + 'static> Component for T {}

/// One occupied slot of a component store.
#[derive(Clone, Debug)]
struct Slot<T> {
    owner: EntityId,
    enabled: bool,
    value: T,
}

/// Storage for every instance of component type `T` in one world.
#[derive(Clone, Debug)]
pub struct ComponentStore<T> {
    slots: SparseSet<Slot<T>>,
}

impl<T> Default for ComponentStore<T> {
    fn default() -> Self {
        Self {
            slots: SparseSet::new(),
        }
    }
}

impl<T: Component> ComponentStore<T> {
    /// Creates an empty component store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, entity: EntityId) -> Option<&Slot<T>> {
        self.slots
            .get(entity.key())
            .filter(|slot| slot.owner == entity)
    }

    fn slot_mut(&mut self, entity: EntityId) -> Option<&mut Slot<T>> {
        self.slots
            .get_mut(entity.key())
            .filter(|slot| slot.owner == entity)
    }

    /// Inserts or overwrites the component for `entity`.
    ///
    /// A first insert creates an enabled slot and returns `None`. An
    /// overwrite keeps the slot's enabled state and returns the old value.
    pub fn insert(&mut self, entity: EntityId, value: T) -> Option<T> {
        if let Some(slot) = self.slot_mut(entity) {
            return Some(std::mem::replace(&mut slot.value, value));
        }
        // A slot left behind by a previous owner of this index is replaced.
        self.slots.insert(
            entity.key(),
            Slot {
                owner: entity,
                enabled: true,
                value,
            },
        );
        None
    }

    /// Returns the component for `entity`.
    ///
    /// # Errors
    ///
    /// Returns `MissingComponent` if the entity has no `T`.
    pub fn get(&self, entity: EntityId) -> Result<&T> {
        self.slot(entity)
            .map(|slot| &slot.value)
            .ok_or_else(|| Error::missing_component::<T>(entity))
    }

    /// Returns the component for `entity` mutably.
    ///
    /// # Errors
    ///
    /// Returns `MissingComponent` if the entity has no `T`.
    pub fn get_mut(&mut self, entity: EntityId) -> Result<&mut T> {
        self.slot_mut(entity)
            .map(|slot| &mut slot.value)
            .ok_or_else(|| Error::missing_component::<T>(entity))
    }

    /// Returns true if `entity` has a `T`, enabled or not.
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.slot(entity).is_some()
    }

    /// Returns true if `entity` has an enabled `T`.
    #[must_use]
    pub fn is_enabled(&self, entity: EntityId) -> bool {
        self.slot(entity).is_some_and(|slot| slot.enabled)
    }

    /// Removes and returns the component for `entity`.
    ///
    /// # Errors
    ///
    /// Returns `MissingComponent` if the entity has no `T`.
    pub fn remove(&mut self, entity: EntityId) -> Result<T> {
        if !self.contains(entity) {
            return Err(Error::missing_component::<T>(entity));
        }
        self.slots
            .remove(entity.key())
            .map(|slot| slot.value)
            .ok_or_else(|| Error::missing_component::<T>(entity))
    }

    /// Sets the enabled bit, returning true if it changed.
    ///
    /// # Errors
    ///
    /// Returns `MissingComponent` if the entity has no `T`.
    pub fn set_enabled(&mut self, entity: EntityId, enabled: bool) -> Result<bool> {
        let slot = self
            .slot_mut(entity)
            .ok_or_else(|| Error::missing_component::<T>(entity))?;
        let changed = slot.enabled != enabled;
        slot.enabled = enabled;
        Ok(changed)
    }

    /// Number of entities holding a `T`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no entity holds a `T`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterates `(entity, value)` pairs in dense order, including disabled ones.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> + '_ {
        self.slots.values().iter().map(|slot| (slot.owner, &slot.value))
    }

    /// Iterates `(entity, value)` pairs mutably in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> + '_ {
        self.slots
            .values_mut()
            .iter_mut()
            .map(|slot| (slot.owner, &mut slot.value))
    }

    /// Entities holding a `T`, in dense order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots.values().iter().map(|slot| slot.owner)
    }
}

/// Type-erased view of a [`ComponentStore`], used where the component type
/// is only known by key (query evaluation, entity teardown, encoding).
pub trait ComponentColumn: Send {
    /// Type name of the stored component.
    fn component_name(&self) -> &'static str;

    /// Returns true if `entity` has this component, enabled or not.
    fn contains(&self, entity: EntityId) -> bool;

    /// Returns true if `entity` has this component and it is enabled.
    fn is_enabled(&self, entity: EntityId) -> bool;

    /// Returns the component for `entity` as `&dyn Any`.
    fn get_any(&self, entity: EntityId) -> Option<&dyn Any>;

    /// Removes the component for `entity`, boxing the old value.
    fn remove_any(&mut self, entity: EntityId) -> Option<Box<dyn Any + Send>>;

    /// Number of entities holding this component.
    fn len(&self) -> usize;

    /// Returns true if no entity holds this component.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Collects the owning entities in dense order.
    fn entities(&self) -> Vec<EntityId>;

    /// Drops every stored value.
    fn clear(&mut self);

    /// Upcast for downcasting to the concrete store.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete store.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ComponentColumn for ComponentStore<T> {
    fn component_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn contains(&self, entity: EntityId) -> bool {
        ComponentStore::contains(self, entity)
    }

    fn is_enabled(&self, entity: EntityId) -> bool {
        ComponentStore::is_enabled(self, entity)
    }

    fn get_any(&self, entity: EntityId) -> Option<&dyn Any> {
        self.slot(entity).map(|slot| &slot.value as &dyn Any)
    }

    fn remove_any(&mut self, entity: EntityId) -> Option<Box<dyn Any + Send>> {
        self.remove(entity)
            .ok()
            .map(|value| Box::new(value) as Box<dyn Any + Send>)
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn entities(&self) -> Vec<EntityId> {
        ComponentStore::entities(self).collect()
    }

    fn clear(&mut self) {
        self.slots.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
