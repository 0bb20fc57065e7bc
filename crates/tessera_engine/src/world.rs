//! The world: sole owner of entities, component stores, live queries, and
//! system groups.
//!
//! Every mutating operation finishes its event fan-out before returning, so
//! query membership is always coherent with storage when control comes back
//! to the caller.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;

use tessera_foundation::{EntityId, Error, ErrorKind, QueryId, Result};
use tessera_storage::{
    Channel, Component, ComponentKey, ComponentRegistry, EntityStore, Event, EventBus, EventKind,
    Listener, SubscriptionId,
};

use crate::config::WorldConfig;
use crate::query::{Filter, LiveQuery, QueryBuilder, QueryCursor, QueryRegistry};
use crate::schedule::{SystemGroup, SystemRegistry, TypeKey};

/// An isolated container of entities, components, queries, and systems.
pub struct World {
    config: WorldConfig,
    alive: bool,
    /// World type this world was instantiated for, if any.
    kind: Option<TypeKey>,
    entities: EntityStore,
    components: ComponentRegistry,
    /// World-level components, keyed to [`EntityId::SINGLETON`].
    singletons: ComponentRegistry,
    bus: EventBus,
    queries: QueryRegistry,
    groups: Vec<SystemGroup>,
    group_index: HashMap<TypeId, usize>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates an empty world with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Creates an empty world.
    #[must_use]
    pub fn with_config(config: WorldConfig) -> Self {
        let mut entities = EntityStore::with_limit(config.max_entities);
        entities.reserve(config.entity_capacity);
        tracing::debug!(
            max_entities = config.max_entities,
            capacity = config.entity_capacity,
            "world created"
        );
        Self {
            config,
            alive: true,
            kind: None,
            entities,
            components: ComponentRegistry::new(),
            singletons: ComponentRegistry::new(),
            bus: EventBus::new(),
            queries: QueryRegistry::default(),
            groups: Vec::new(),
            group_index: HashMap::new(),
        }
    }

    /// Creates a world for world type `W` with every system registered for it.
    ///
    /// # Errors
    ///
    /// Returns `CyclicDependency` if any group cannot be ordered; no world
    /// is created in that case.
    pub fn from_registry<W: 'static>(registry: &mut SystemRegistry) -> Result<Self> {
        Self::from_registry_with_config::<W>(registry, WorldConfig::default())
    }

    /// Like [`from_registry`](Self::from_registry), with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns `CyclicDependency` if any group cannot be ordered.
    pub fn from_registry_with_config<W: 'static>(
        registry: &mut SystemRegistry,
        config: WorldConfig,
    ) -> Result<Self> {
        let kind = TypeKey::of::<W>();
        let groups = registry.instantiate(kind)?;
        let mut world = Self::with_config(config);
        world.kind = Some(kind);
        for group in groups {
            tracing::debug!(
                world = kind.name(),
                group = group.name(),
                systems = group.len(),
                "system group built"
            );
            world.group_index.insert(group.key().type_id(), world.groups.len());
            world.groups.push(group);
        }
        Ok(world)
    }

    /// The configuration this world was created with.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Name of the world type passed to [`from_registry`](Self::from_registry).
    #[must_use]
    pub fn kind_name(&self) -> Option<&'static str> {
        self.kind.map(TypeKey::name)
    }

    /// Returns false once [`destroy`](Self::destroy) has run.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Tears the world down.
    ///
    /// Entities, components, queries, subscriptions and systems are dropped
    /// without dispatching events. Every later operation fails with
    /// `StaleHandle(World)`.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle(World)` if the world was already destroyed.
    pub fn destroy(&mut self) -> Result<()> {
        self.ensure_alive()?;
        tracing::debug!(
            entities = self.entities.len(),
            queries = self.queries.len(),
            groups = self.groups.len(),
            "world destroyed"
        );
        self.groups.clear();
        self.group_index.clear();
        self.queries.clear();
        self.bus.clear();
        self.components.clear();
        self.singletons.clear();
        self.entities.clear();
        self.alive = false;
        Ok(())
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.alive {
            Ok(())
        } else {
            Err(Error::world_destroyed())
        }
    }

    fn ensure_entity(&self, entity: EntityId) -> Result<()> {
        self.ensure_alive()?;
        self.entities.validate(entity)
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Live entities in index order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter()
    }

    /// Creates an entity with no components.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle(World)` if the world was destroyed, or
    /// `CapacityOverflow` when the index space is exhausted.
    pub fn create_entity(&mut self) -> Result<EntityId> {
        self.ensure_alive()?;
        let entity = self.entities.spawn()?;
        self.queries.on_created(entity, &self.components);
        tracing::trace!(entity = ?entity, "entity created");
        Ok(entity)
    }

    /// Returns true if `entity` is alive in a live world.
    #[must_use]
    pub fn is_entity_alive(&self, entity: EntityId) -> bool {
        self.alive && self.entities.is_alive(entity)
    }

    /// Destroys an entity.
    ///
    /// Each component is removed in component registration order, firing
    /// `Removed`. The index is then freed and the id purged from every
    /// live query.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle` if the world or the entity is dead.
    pub fn destroy_entity(&mut self, entity: EntityId) -> Result<()> {
        self.ensure_entity(entity)?;
        let keys: Vec<ComponentKey> = self.components.keys_of(entity).collect();
        for key in keys {
            let Some(boxed) = self.components.remove_any(key, entity) else {
                continue;
            };
            let value: &dyn Any = &*boxed;
            dispatch(
                &mut self.bus,
                &mut self.queries,
                &self.components,
                Event {
                    channel: Channel::new(key, EventKind::Removed),
                    entity,
                    value,
                },
            );
        }
        self.entities.destroy(entity)?;
        self.queries.purge(entity);
        tracing::trace!(entity = ?entity, "entity destroyed");
        Ok(())
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Sets component `T` on `entity`.
    ///
    /// A first insert creates an enabled component and fires `Added` then
    /// `Enabled`. Overwriting fires nothing and returns the old value.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle` if the world or the entity is dead.
    pub fn set<T: Component>(&mut self, entity: EntityId, value: T) -> Result<Option<T>> {
        self.ensure_entity(entity)?;
        if let Some(previous) = self.components.get_or_create::<T>().insert(entity, value) {
            return Ok(Some(previous));
        }

        let key = ComponentKey::of::<T>();
        let value = self
            .components
            .column(key)
            .and_then(|column| column.get_any(entity))
            .ok_or_else(|| {
                Error::new(ErrorKind::Internal(format!(
                    "{} vanished after insert",
                    type_name::<T>()
                )))
            })?;
        for kind in [EventKind::Added, EventKind::Enabled] {
            dispatch(
                &mut self.bus,
                &mut self.queries,
                &self.components,
                Event {
                    channel: Channel::new(key, kind),
                    entity,
                    value,
                },
            );
        }
        Ok(None)
    }

    /// Returns component `T` of `entity`, enabled or not.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle` for a dead world or entity, or
    /// `MissingComponent` if the entity has no `T`.
    pub fn get<T: Component>(&self, entity: EntityId) -> Result<&T> {
        self.ensure_entity(entity)?;
        self.components
            .get::<T>()
            .ok_or_else(|| Error::missing_component::<T>(entity))?
            .get(entity)
    }

    /// Returns component `T` of `entity` mutably. Writes fire no events.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub fn get_mut<T: Component>(&mut self, entity: EntityId) -> Result<&mut T> {
        self.ensure_entity(entity)?;
        self.components
            .get_mut::<T>()
            .ok_or_else(|| Error::missing_component::<T>(entity))?
            .get_mut(entity)
    }

    /// Returns true if `entity` has a `T`, enabled or not.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle` if the world or the entity is dead.
    pub fn has<T: Component>(&self, entity: EntityId) -> Result<bool> {
        self.ensure_entity(entity)?;
        Ok(self.components.contains(ComponentKey::of::<T>(), entity))
    }

    /// Returns true if `entity` has an enabled `T`.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle` if the world or the entity is dead.
    pub fn is_enabled<T: Component>(&self, entity: EntityId) -> Result<bool> {
        self.ensure_entity(entity)?;
        Ok(self.components.is_enabled(ComponentKey::of::<T>(), entity))
    }

    /// Removes and returns component `T`, firing `Removed`.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle` for a dead world or entity, or
    /// `MissingComponent` if the entity has no `T`.
    pub fn remove<T: Component>(&mut self, entity: EntityId) -> Result<T> {
        self.ensure_entity(entity)?;
        let removed = self
            .components
            .get_mut::<T>()
            .ok_or_else(|| Error::missing_component::<T>(entity))?
            .remove(entity)?;
        dispatch(
            &mut self.bus,
            &mut self.queries,
            &self.components,
            Event {
                channel: Channel::new(ComponentKey::of::<T>(), EventKind::Removed),
                entity,
                value: &removed,
            },
        );
        Ok(removed)
    }

    /// Enables component `T`, firing `Enabled` if it was disabled.
    ///
    /// # Errors
    ///
    /// See [`remove`](Self::remove).
    pub fn enable<T: Component>(&mut self, entity: EntityId) -> Result<()> {
        self.toggle::<T>(entity, true)
    }

    /// Disables component `T`, firing `Disabled` if it was enabled.
    ///
    /// # Errors
    ///
    /// See [`remove`](Self::remove).
    pub fn disable<T: Component>(&mut self, entity: EntityId) -> Result<()> {
        self.toggle::<T>(entity, false)
    }

    fn toggle<T: Component>(&mut self, entity: EntityId, enabled: bool) -> Result<()> {
        self.ensure_entity(entity)?;
        let store = self
            .components
            .get_mut::<T>()
            .ok_or_else(|| Error::missing_component::<T>(entity))?;
        if !store.set_enabled(entity, enabled)? {
            return Ok(());
        }

        let kind = if enabled {
            EventKind::Enabled
        } else {
            EventKind::Disabled
        };
        let store = self
            .components
            .get::<T>()
            .ok_or_else(|| Error::missing_component::<T>(entity))?;
        let value: &dyn Any = store.get(entity)?;
        dispatch(
            &mut self.bus,
            &mut self.queries,
            &self.components,
            Event {
                channel: Channel::new(ComponentKey::of::<T>(), kind),
                entity,
                value,
            },
        );
        Ok(())
    }

    /// Keys of the components `entity` has, in registration order.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle` if the world or the entity is dead.
    pub fn component_keys(&self, entity: EntityId) -> Result<Vec<ComponentKey>> {
        self.ensure_entity(entity)?;
        Ok(self.components.keys_of(entity).collect())
    }

    pub(crate) fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    // =========================================================================
    // Singletons
    // =========================================================================

    /// Sets world-level component `T`. Singletons publish no events.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle(World)` if the world was destroyed.
    pub fn set_singleton<T: Component>(&mut self, value: T) -> Result<Option<T>> {
        self.ensure_alive()?;
        Ok(self
            .singletons
            .get_or_create::<T>()
            .insert(EntityId::SINGLETON, value))
    }

    /// Returns world-level component `T`.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle(World)` or `MissingComponent`.
    pub fn get_singleton<T: Component>(&self) -> Result<&T> {
        self.ensure_alive()?;
        self.singletons
            .get::<T>()
            .ok_or_else(|| Error::missing_component::<T>(EntityId::SINGLETON))?
            .get(EntityId::SINGLETON)
    }

    /// Returns world-level component `T` mutably.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle(World)` or `MissingComponent`.
    pub fn get_singleton_mut<T: Component>(&mut self) -> Result<&mut T> {
        self.ensure_alive()?;
        self.singletons
            .get_mut::<T>()
            .ok_or_else(|| Error::missing_component::<T>(EntityId::SINGLETON))?
            .get_mut(EntityId::SINGLETON)
    }

    /// Returns true if the world has a `T` singleton, enabled or not.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle(World)` if the world was destroyed.
    pub fn has_singleton<T: Component>(&self) -> Result<bool> {
        self.ensure_alive()?;
        Ok(self
            .singletons
            .contains(ComponentKey::of::<T>(), EntityId::SINGLETON))
    }

    /// Returns true if the world has an enabled `T` singleton.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle(World)` if the world was destroyed.
    pub fn is_singleton_enabled<T: Component>(&self) -> Result<bool> {
        self.ensure_alive()?;
        Ok(self
            .singletons
            .is_enabled(ComponentKey::of::<T>(), EntityId::SINGLETON))
    }

    /// Removes and returns world-level component `T`.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle(World)` or `MissingComponent`.
    pub fn remove_singleton<T: Component>(&mut self) -> Result<T> {
        self.ensure_alive()?;
        self.singletons
            .get_mut::<T>()
            .ok_or_else(|| Error::missing_component::<T>(EntityId::SINGLETON))?
            .remove(EntityId::SINGLETON)
    }

    /// Enables world-level component `T`.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle(World)` or `MissingComponent`.
    pub fn enable_singleton<T: Component>(&mut self) -> Result<()> {
        self.toggle_singleton::<T>(true)
    }

    /// Disables world-level component `T`.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle(World)` or `MissingComponent`.
    pub fn disable_singleton<T: Component>(&mut self) -> Result<()> {
        self.toggle_singleton::<T>(false)
    }

    fn toggle_singleton<T: Component>(&mut self, enabled: bool) -> Result<()> {
        self.ensure_alive()?;
        self.singletons
            .get_mut::<T>()
            .ok_or_else(|| Error::missing_component::<T>(EntityId::SINGLETON))?
            .set_enabled(EntityId::SINGLETON, enabled)?;
        Ok(())
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Calls `callback` for every `kind` event on component `T`.
    ///
    /// Callbacks run synchronously, after any listener subscribed earlier
    /// on the same channel.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle(World)` if the world was destroyed.
    pub fn subscribe<T: Component>(
        &mut self,
        kind: EventKind,
        mut callback: impl FnMut(EntityId, &T) + Send + 'static,
    ) -> Result<SubscriptionId> {
        self.ensure_alive()?;
        let channel = Channel::new(ComponentKey::of::<T>(), kind);
        let listener = Listener::Callback(Box::new(move |entity, value: &dyn Any| {
            if let Some(value) = value.downcast_ref::<T>() {
                callback(entity, value);
            }
        }));
        Ok(self.bus.subscribe(channel, listener))
    }

    /// Disposes a subscription. Returns false if it was already disposed.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle(World)` if the world was destroyed.
    pub fn unsubscribe(&mut self, subscription: SubscriptionId) -> Result<bool> {
        self.ensure_alive()?;
        Ok(self.bus.unsubscribe(subscription))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Starts building a live query.
    pub fn query(&mut self) -> QueryBuilder<'_> {
        QueryBuilder::new(self)
    }

    /// Registers a live query for `filter`.
    ///
    /// Steady-state queries are filled from existing entities unless the
    /// filter opts out; edge-triggered queries start empty.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle(World)` if the world was destroyed, or
    /// `CapacityOverflow` if the filter has more triggers than the
    /// configured limit.
    pub fn build_query(&mut self, filter: Filter) -> Result<QueryId> {
        self.ensure_alive()?;
        let limit = self.config.trigger_limit();
        if filter.triggers().len() > limit {
            return Err(Error::capacity_overflow(limit)
                .with_context(format!("query has {} triggers", filter.triggers().len())));
        }

        let channels = filter.channels();
        let seed = filter.seeds_initial();
        let candidates = if seed { self.seed_candidates(&filter) } else { Vec::new() };

        let id = self.queries.insert(LiveQuery::new(filter));
        let subscriptions = channels
            .into_iter()
            .map(|channel| self.bus.subscribe(channel, Listener::Query(id)))
            .collect();
        let query = self.queries.get_mut(id)?;
        query.set_subscriptions(subscriptions);
        query.seed(&candidates, &self.components);

        tracing::debug!(
            query = ?id,
            members = query.len(),
            edge = query.filter().is_edge_triggered(),
            "query built"
        );
        Ok(id)
    }

    /// Entities that could satisfy `filter`: the holders of its smallest
    /// required component, or every live entity when nothing is required.
    fn seed_candidates(&self, filter: &Filter) -> Vec<EntityId> {
        let smallest = filter
            .required()
            .map(|key| self.components.column(key))
            .min_by_key(|column| column.map_or(0, |c| c.len()));
        match smallest {
            Some(Some(column)) => column.entities(),
            // A required type with no store yet: nothing can match.
            Some(None) => Vec::new(),
            None => self.entities.iter().collect(),
        }
    }

    /// Number of live queries.
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.queries.len()
    }

    pub(crate) fn live_query(&self, query: QueryId) -> Result<&LiveQuery> {
        self.ensure_alive()?;
        self.queries.get(query)
    }

    /// Number of entities in a query.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle(World)` or `InvalidQueryUse`.
    pub fn query_len(&self, query: QueryId) -> Result<usize> {
        Ok(self.live_query(query)?.len())
    }

    /// Members of a query in dense order.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle(World)` or `InvalidQueryUse`.
    pub fn query_entities(&self, query: QueryId) -> Result<impl Iterator<Item = EntityId> + '_> {
        Ok(self.live_query(query)?.members().iter().copied())
    }

    /// Returns true if `entity` is currently in the query.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle(World)` or `InvalidQueryUse`.
    pub fn query_contains(&self, query: QueryId, entity: EntityId) -> Result<bool> {
        Ok(self.live_query(query)?.contains(entity))
    }

    /// The filter a query was built from.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle(World)` or `InvalidQueryUse`.
    pub fn query_filter(&self, query: QueryId) -> Result<&Filter> {
        Ok(self.live_query(query)?.filter())
    }

    /// A cursor positioned before the query's last member.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle(World)` or `InvalidQueryUse`.
    pub fn query_cursor(&self, query: QueryId) -> Result<QueryCursor> {
        Ok(QueryCursor::new(query, self.live_query(query)?.len()))
    }

    /// Clears an edge-triggered query's accumulated members. Has no effect
    /// on steady-state queries.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle(World)` or `InvalidQueryUse`.
    pub fn reset_query(&mut self, query: QueryId) -> Result<()> {
        self.ensure_alive()?;
        let live = self.queries.get_mut(query)?;
        live.reset();
        tracing::debug!(query = ?query, members = live.len(), "query reset");
        Ok(())
    }

    /// Disposes a query and its subscriptions. The handle becomes invalid.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle(World)` or `InvalidQueryUse`.
    pub fn dispose_query(&mut self, query: QueryId) -> Result<()> {
        self.ensure_alive()?;
        let mut live = self.queries.remove(query)?;
        for subscription in live.take_subscriptions() {
            self.bus.unsubscribe(subscription);
        }
        tracing::debug!(query = ?query, "query disposed");
        Ok(())
    }

    // =========================================================================
    // Systems
    // =========================================================================

    /// Returns group `G`, creating an empty one if needed.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle(World)` if the world was destroyed.
    pub fn get_or_create_system_group<G: 'static>(&mut self) -> Result<&mut SystemGroup> {
        self.ensure_alive()?;
        let key = TypeKey::of::<G>();
        let slot = match self.group_index.get(&key.type_id()) {
            Some(&slot) => slot,
            None => {
                let slot = self.groups.len();
                self.group_index.insert(key.type_id(), slot);
                self.groups.push(SystemGroup::empty(key));
                tracing::debug!(group = key.name(), "system group created");
                slot
            }
        };
        Ok(&mut self.groups[slot])
    }

    /// Returns group `G`, if it exists.
    #[must_use]
    pub fn system_group<G: 'static>(&self) -> Option<&SystemGroup> {
        let slot = *self.group_index.get(&TypeId::of::<G>())?;
        self.groups.get(slot)
    }

    /// Every group, in creation order.
    pub fn system_groups(&self) -> impl Iterator<Item = &SystemGroup> {
        self.groups.iter()
    }

    /// Runs the systems of group `G` in order, stopping at the first error.
    ///
    /// A missing group runs nothing.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle(World)` if the world was destroyed, or the
    /// first error a system returns.
    pub fn run_group<G: 'static>(&mut self) -> Result<()> {
        self.ensure_alive()?;
        let Some(&slot) = self.group_index.get(&TypeId::of::<G>()) else {
            return Ok(());
        };
        let mut systems = self.groups[slot].take_systems();
        let mut outcome = Ok(());
        for entry in &mut systems {
            if let Err(err) = entry.run(self) {
                outcome = Err(err.with_context(format!("in system {}", entry.name())));
                break;
            }
        }
        // A system may have destroyed the world, dropping every group.
        if let Some(group) = self.groups.get_mut(slot) {
            group.restore_systems(systems);
        }
        outcome
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    /// Read-only view of one entity.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle` if the world or the entity is dead.
    pub fn view(&self, entity: EntityId) -> Result<EntityView<'_>> {
        self.ensure_entity(entity)?;
        Ok(EntityView {
            world: self,
            entity,
        })
    }

    /// Encodes `entity` into `out` with `encoder`.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle` for a dead world or entity, or whatever the
    /// encoder returns.
    pub fn encode_entity<E: EntityEncoder + ?Sized>(
        &self,
        entity: EntityId,
        encoder: &E,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        encoder.encode(self.view(entity)?, out)
    }
}

/// Publishes one event and routes query listeners to their caches.
fn dispatch(
    bus: &mut EventBus,
    queries: &mut QueryRegistry,
    components: &ComponentRegistry,
    event: Event<'_>,
) {
    bus.publish(event, |id, event| {
        queries.on_event(id, event.channel, event.entity, components);
    });
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("alive", &self.alive)
            .field("kind", &self.kind_name())
            .field("entities", &self.entities.len())
            .field("components", &self.components)
            .field("singletons", &self.singletons)
            .field("queries", &self.queries.len())
            .field("subscriptions", &self.bus.len())
            .field("groups", &self.groups)
            .finish()
    }
}

// =============================================================================
// Encoding Boundary
// =============================================================================

/// Read access to one live entity, handed to an [`EntityEncoder`].
#[derive(Copy, Clone)]
pub struct EntityView<'w> {
    world: &'w World,
    entity: EntityId,
}

impl<'w> EntityView<'w> {
    /// The entity being viewed.
    #[must_use]
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Component `T`, enabled or not.
    #[must_use]
    pub fn get<T: Component>(&self) -> Option<&'w T> {
        self.world
            .components()
            .get::<T>()
            .and_then(|store| store.get(self.entity).ok())
    }

    /// Returns true if the entity has a `T`.
    #[must_use]
    pub fn has<T: Component>(&self) -> bool {
        self.world
            .components()
            .contains(ComponentKey::of::<T>(), self.entity)
    }

    /// Returns true if the entity has an enabled `T`.
    #[must_use]
    pub fn is_enabled<T: Component>(&self) -> bool {
        self.world
            .components()
            .is_enabled(ComponentKey::of::<T>(), self.entity)
    }

    /// Component under `key` as `&dyn Any`.
    #[must_use]
    pub fn get_any(&self, key: ComponentKey) -> Option<&'w dyn Any> {
        self.world
            .components()
            .column(key)
            .and_then(|column| column.get_any(self.entity))
    }

    /// Keys of the entity's components, in registration order.
    #[must_use]
    pub fn component_keys(&self) -> Vec<ComponentKey> {
        self.world.components().keys_of(self.entity).collect()
    }
}

impl fmt::Debug for EntityView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityView")
            .field("entity", &self.entity)
            .field("components", &self.component_keys())
            .finish()
    }
}

/// Turns an entity into bytes. The byte format belongs to the implementor.
pub trait EntityEncoder {
    /// Appends the encoding of `view` to `out`.
    ///
    /// # Errors
    ///
    /// Implementations report their own failures.
    fn encode(&self, view: EntityView<'_>, out: &mut Vec<u8>) -> Result<()>;
}
