//! Live, event-maintained queries.
//!
//! This module provides:
//! - [`Filter`] - The compiled predicate of one query
//! - [`QueryBuilder`] - Fluent construction of a filter against a world
//! - [`QueryCursor`] - Backwards iteration that tolerates removal of the
//!   current member
//!
//! A query never scans storage after it is built. It subscribes to the
//! channels its filter watches and updates its member set as events arrive.
//!
//! Steady-state terms (`with`, `without`, `with_either`) describe what an
//! entity must look like right now. Edge triggers (`when_*`) describe
//! transitions that must have happened since the last reset. A query with
//! several triggers admits an entity once every trigger has fired for it
//! while the steady-state terms still hold.

use tessera_foundation::{EntityId, Error, QueryId, Result, SparseSet};
use tessera_storage::{Channel, Component, ComponentKey, ComponentRegistry, EventKind, SubscriptionId};

use crate::world::World;

/// Maximum number of edge triggers in one query.
pub const MAX_QUERY_TRIGGERS: usize = 64;

// =============================================================================
// Filter
// =============================================================================

/// One steady-state condition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Term {
    /// The component is present and enabled.
    With(ComponentKey),
    /// The component is absent or disabled.
    Without(ComponentKey),
    /// At least one of the components is present and enabled.
    Either(Vec<ComponentKey>),
}

impl Term {
    fn holds(&self, entity: EntityId, components: &ComponentRegistry) -> bool {
        match self {
            Self::With(key) => components.is_enabled(*key, entity),
            Self::Without(key) => !components.is_enabled(*key, entity),
            Self::Either(keys) => keys.iter().any(|key| components.is_enabled(*key, entity)),
        }
    }

    fn keys(&self) -> &[ComponentKey] {
        match self {
            Self::With(key) | Self::Without(key) => std::slice::from_ref(key),
            Self::Either(keys) => keys,
        }
    }
}

/// The predicate of a live query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filter {
    terms: Vec<Term>,
    triggers: Vec<Vec<Channel>>,
    seed_initial: bool,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            terms: Vec::new(),
            triggers: Vec::new(),
            seed_initial: true,
        }
    }
}

impl Filter {
    /// Creates a filter that matches every entity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Steady-state terms, in the order they were added.
    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Edge triggers; each is satisfied by an event on any of its channels.
    #[must_use]
    pub fn triggers(&self) -> &[Vec<Channel>] {
        &self.triggers
    }

    /// Returns true if the filter has at least one edge trigger.
    #[must_use]
    pub fn is_edge_triggered(&self) -> bool {
        !self.triggers.is_empty()
    }

    /// Returns true if a new query should be filled from existing entities.
    ///
    /// Edge-triggered queries never are: a transition that happened before
    /// the query existed was not observed.
    #[must_use]
    pub fn seeds_initial(&self) -> bool {
        self.seed_initial && !self.is_edge_triggered()
    }

    /// Evaluates the steady-state terms for `entity`.
    #[must_use]
    pub fn matches(&self, entity: EntityId, components: &ComponentRegistry) -> bool {
        self.terms.iter().all(|term| term.holds(entity, components))
    }

    /// Every channel the filter must observe, without duplicates.
    ///
    /// Steady-state components are watched on all four kinds; triggers add
    /// their own channels.
    #[must_use]
    pub fn channels(&self) -> Vec<Channel> {
        let mut channels = Vec::new();
        let steady = self.terms.iter().flat_map(Term::keys).flat_map(|key| {
            EventKind::ALL.into_iter().map(move |kind| Channel::new(*key, kind))
        });
        for channel in steady.chain(self.triggers.iter().flatten().copied()) {
            if !channels.contains(&channel) {
                channels.push(channel);
            }
        }
        channels
    }

    /// Component types named by `with` terms.
    pub fn required(&self) -> impl Iterator<Item = ComponentKey> + '_ {
        self.terms.iter().filter_map(|term| match term {
            Term::With(key) => Some(*key),
            _ => None,
        })
    }

    /// Bitmask of the triggers that listen on `channel`.
    fn trigger_mask(&self, channel: Channel) -> u64 {
        self.triggers
            .iter()
            .enumerate()
            .filter(|(_, channels)| channels.contains(&channel))
            .fold(0, |mask, (bit, _)| mask | (1 << bit))
    }

    fn full_mask(&self) -> u64 {
        match self.triggers.len() {
            MAX_QUERY_TRIGGERS => u64::MAX,
            n => (1 << n) - 1,
        }
    }

    fn push_term(&mut self, term: Term) {
        self.terms.push(term);
    }

    fn push_trigger(&mut self, channels: Vec<Channel>) {
        self.triggers.push(channels);
    }
}

// =============================================================================
// Live Query State
// =============================================================================

/// Member set and trigger bookkeeping of one query.
#[derive(Debug)]
pub(crate) struct LiveQuery {
    filter: Filter,
    members: SparseSet<EntityId>,
    pending: SparseSet<u64>,
    subscriptions: Vec<SubscriptionId>,
}

impl LiveQuery {
    pub(crate) fn new(filter: Filter) -> Self {
        Self {
            filter,
            members: SparseSet::new(),
            pending: SparseSet::new(),
            subscriptions: Vec::new(),
        }
    }

    pub(crate) fn filter(&self) -> &Filter {
        &self.filter
    }

    pub(crate) fn set_subscriptions(&mut self, subscriptions: Vec<SubscriptionId>) {
        self.subscriptions = subscriptions;
    }

    pub(crate) fn take_subscriptions(&mut self) -> Vec<SubscriptionId> {
        std::mem::take(&mut self.subscriptions)
    }

    pub(crate) fn len(&self) -> usize {
        self.members.len()
    }

    pub(crate) fn contains(&self, entity: EntityId) -> bool {
        self.members.get(entity.key()) == Some(&entity)
    }

    pub(crate) fn member_at(&self, position: usize) -> Option<EntityId> {
        self.members.get_dense(position).map(|(_, entity)| *entity)
    }

    pub(crate) fn members(&self) -> &[EntityId] {
        self.members.values()
    }

    /// Admits every candidate that satisfies the steady-state terms.
    pub(crate) fn seed(&mut self, candidates: &[EntityId], components: &ComponentRegistry) {
        for &entity in candidates {
            if self.filter.matches(entity, components) {
                self.members.insert(entity.key(), entity);
            }
        }
    }

    /// Applies one component event to the member set.
    pub(crate) fn on_event(
        &mut self,
        channel: Channel,
        entity: EntityId,
        components: &ComponentRegistry,
    ) {
        if !self.filter.matches(entity, components) {
            self.evict(entity);
            return;
        }
        if !self.filter.is_edge_triggered() {
            self.members.insert(entity.key(), entity);
            return;
        }

        let fired = self.filter.trigger_mask(channel);
        if fired == 0 {
            return;
        }
        let full = self.filter.full_mask();
        let mask = match self.pending.get_mut(entity.key()) {
            Some(mask) => {
                *mask |= fired;
                *mask
            }
            None => {
                self.pending.insert(entity.key(), fired);
                fired
            }
        };
        if mask == full {
            self.members.insert(entity.key(), entity);
        }
    }

    /// Offers a freshly created entity to a steady-state query that
    /// requires no component; such an entity fires no event of its own.
    pub(crate) fn on_created(&mut self, entity: EntityId, components: &ComponentRegistry) {
        if self.filter.is_edge_triggered() || self.filter.required().next().is_some() {
            return;
        }
        if self.filter.matches(entity, components) {
            self.members.insert(entity.key(), entity);
        }
    }

    /// Drops `entity` and any partial trigger progress it had.
    pub(crate) fn purge(&mut self, entity: EntityId) {
        self.evict(entity);
    }

    /// Clears an edge-triggered query. Steady-state queries are unaffected.
    pub(crate) fn reset(&mut self) {
        if self.filter.is_edge_triggered() {
            self.members.clear();
            self.pending.clear();
        }
    }

    fn evict(&mut self, entity: EntityId) {
        if self.contains(entity) {
            self.members.remove(entity.key());
        }
        self.pending.remove(entity.key());
    }
}

// =============================================================================
// Query Registry
// =============================================================================

#[derive(Debug)]
struct QuerySlot {
    generation: u32,
    query: Option<LiveQuery>,
}

/// Generational slots for the live queries of one world.
#[derive(Debug, Default)]
pub(crate) struct QueryRegistry {
    slots: Vec<QuerySlot>,
    free: Vec<u32>,
    live: usize,
}

impl QueryRegistry {
    pub(crate) fn insert(&mut self, query: LiveQuery) -> QueryId {
        self.live += 1;
        if let Some(slot) = self.free.pop() {
            let entry = &mut self.slots[slot as usize];
            entry.generation = entry.generation.wrapping_add(1);
            entry.query = Some(query);
            return QueryId::new(slot, entry.generation);
        }
        #[allow(clippy::cast_possible_truncation)]
        let slot = self.slots.len() as u32;
        self.slots.push(QuerySlot {
            generation: 1,
            query: Some(query),
        });
        QueryId::new(slot, 1)
    }

    pub(crate) fn get(&self, id: QueryId) -> Result<&LiveQuery> {
        self.slots
            .get(id.slot as usize)
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.query.as_ref())
            .ok_or_else(|| Error::invalid_query(id))
    }

    pub(crate) fn get_mut(&mut self, id: QueryId) -> Result<&mut LiveQuery> {
        self.slots
            .get_mut(id.slot as usize)
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.query.as_mut())
            .ok_or_else(|| Error::invalid_query(id))
    }

    pub(crate) fn remove(&mut self, id: QueryId) -> Result<LiveQuery> {
        let query = self
            .slots
            .get_mut(id.slot as usize)
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.query.take())
            .ok_or_else(|| Error::invalid_query(id))?;
        self.free.push(id.slot);
        self.live -= 1;
        Ok(query)
    }

    /// Forwards an event to one query; events for disposed queries are dropped.
    pub(crate) fn on_event(
        &mut self,
        id: QueryId,
        channel: Channel,
        entity: EntityId,
        components: &ComponentRegistry,
    ) {
        if let Ok(query) = self.get_mut(id) {
            query.on_event(channel, entity, components);
        }
    }

    pub(crate) fn on_created(&mut self, entity: EntityId, components: &ComponentRegistry) {
        for query in self.slots.iter_mut().filter_map(|entry| entry.query.as_mut()) {
            query.on_created(entity, components);
        }
    }

    pub(crate) fn purge(&mut self, entity: EntityId) {
        for query in self.slots.iter_mut().filter_map(|entry| entry.query.as_mut()) {
            query.purge(entity);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.live
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.live = 0;
    }
}

// =============================================================================
// Builders
// =============================================================================

/// Fluent construction of a live query.
///
/// ```ignore
/// let moving = world.query().with::<Position>().with::<Velocity>().build()?;
/// let spawned = world.query().when_added::<Enemy>().build()?;
/// ```
#[must_use = "a query builder does nothing until built"]
pub struct QueryBuilder<'w> {
    world: &'w mut World,
    filter: Filter,
}

impl<'w> QueryBuilder<'w> {
    pub(crate) fn new(world: &'w mut World) -> Self {
        Self {
            world,
            filter: Filter::new(),
        }
    }

    /// Requires an enabled `T`.
    pub fn with<T: Component>(mut self) -> Self {
        self.filter.push_term(Term::With(ComponentKey::of::<T>()));
        self
    }

    /// Requires `T` to be absent or disabled.
    pub fn without<T: Component>(mut self) -> Self {
        self.filter.push_term(Term::Without(ComponentKey::of::<T>()));
        self
    }

    /// Starts a disjunction: at least one of the listed types is enabled.
    pub fn with_either<T: Component>(self) -> WithEither<'w> {
        WithEither {
            builder: self,
            keys: vec![ComponentKey::of::<T>()],
        }
    }

    /// Triggers when `T` is added to an entity.
    pub fn when_added<T: Component>(self) -> Self {
        self.when::<T>(EventKind::Added)
    }

    /// Triggers when `T` is removed from an entity.
    pub fn when_removed<T: Component>(self) -> Self {
        self.when::<T>(EventKind::Removed)
    }

    /// Triggers when `T` becomes enabled, including right after it is added.
    pub fn when_enabled<T: Component>(self) -> Self {
        self.when::<T>(EventKind::Enabled)
    }

    /// Triggers when `T` becomes disabled.
    pub fn when_disabled<T: Component>(self) -> Self {
        self.when::<T>(EventKind::Disabled)
    }

    /// Starts a trigger satisfied by adding any of the listed types.
    pub fn when_either_added<T: Component>(self) -> WhenEither<'w> {
        WhenEither::new::<T>(self, EventKind::Added)
    }

    /// Starts a trigger satisfied by removing any of the listed types.
    pub fn when_either_removed<T: Component>(self) -> WhenEither<'w> {
        WhenEither::new::<T>(self, EventKind::Removed)
    }

    /// Starts a trigger satisfied by enabling any of the listed types.
    pub fn when_either_enabled<T: Component>(self) -> WhenEither<'w> {
        WhenEither::new::<T>(self, EventKind::Enabled)
    }

    /// Starts a trigger satisfied by disabling any of the listed types.
    pub fn when_either_disabled<T: Component>(self) -> WhenEither<'w> {
        WhenEither::new::<T>(self, EventKind::Disabled)
    }

    /// Skips filling the query from entities that already exist.
    pub fn without_initial_entities(mut self) -> Self {
        self.filter.seed_initial = false;
        self
    }

    /// The filter built so far.
    #[must_use]
    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Registers the query with the world.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle(World)` if the world was destroyed, or
    /// `CapacityOverflow` if the filter has more triggers than the world's
    /// configured limit (at most [`MAX_QUERY_TRIGGERS`]).
    pub fn build(self) -> Result<QueryId> {
        self.world.build_query(self.filter)
    }

    /// Alias of [`build`](Self::build) for call sites that read as "this
    /// set of entities".
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn as_set(self) -> Result<QueryId> {
        self.build()
    }

    fn when<T: Component>(mut self, kind: EventKind) -> Self {
        self.filter
            .push_trigger(vec![Channel::new(ComponentKey::of::<T>(), kind)]);
        self
    }
}

/// An open `with_either` disjunction.
#[must_use = "close the disjunction with `end_either` or `build`"]
pub struct WithEither<'w> {
    builder: QueryBuilder<'w>,
    keys: Vec<ComponentKey>,
}

impl<'w> WithEither<'w> {
    /// Adds another alternative.
    pub fn or<T: Component>(mut self) -> Self {
        let key = ComponentKey::of::<T>();
        if !self.keys.contains(&key) {
            self.keys.push(key);
        }
        self
    }

    /// Closes the disjunction and returns to the query builder.
    pub fn end_either(mut self) -> QueryBuilder<'w> {
        self.builder.filter.push_term(Term::Either(self.keys));
        self.builder
    }

    /// Closes the disjunction and builds the query.
    ///
    /// # Errors
    ///
    /// See [`QueryBuilder::build`].
    pub fn build(self) -> Result<QueryId> {
        self.end_either().build()
    }

    /// Closes the disjunction and builds the query.
    ///
    /// # Errors
    ///
    /// See [`QueryBuilder::build`].
    pub fn as_set(self) -> Result<QueryId> {
        self.build()
    }
}

/// An open `when_either_*` trigger.
#[must_use = "close the trigger with `end_either` or `build`"]
pub struct WhenEither<'w> {
    builder: QueryBuilder<'w>,
    kind: EventKind,
    channels: Vec<Channel>,
}

impl<'w> WhenEither<'w> {
    fn new<T: Component>(builder: QueryBuilder<'w>, kind: EventKind) -> Self {
        Self {
            builder,
            kind,
            channels: vec![Channel::new(ComponentKey::of::<T>(), kind)],
        }
    }

    /// Adds another type whose event satisfies this trigger.
    pub fn or<T: Component>(mut self) -> Self {
        let channel = Channel::new(ComponentKey::of::<T>(), self.kind);
        if !self.channels.contains(&channel) {
            self.channels.push(channel);
        }
        self
    }

    /// Closes the trigger and returns to the query builder.
    pub fn end_either(mut self) -> QueryBuilder<'w> {
        self.builder.filter.push_trigger(self.channels);
        self.builder
    }

    /// Closes the trigger and builds the query.
    ///
    /// # Errors
    ///
    /// See [`QueryBuilder::build`].
    pub fn build(self) -> Result<QueryId> {
        self.end_either().build()
    }

    /// Closes the trigger and builds the query.
    ///
    /// # Errors
    ///
    /// See [`QueryBuilder::build`].
    pub fn as_set(self) -> Result<QueryId> {
        self.build()
    }
}

// =============================================================================
// Cursor
// =============================================================================

/// Iterates a query's members from the back.
///
/// Removing the member just returned (or destroying its entity) swaps the
/// last member into its place, which the cursor has already visited, so no
/// member is skipped. Members added during a pass are not visited until
/// [`restart`](Self::restart).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct QueryCursor {
    query: QueryId,
    position: usize,
}

impl QueryCursor {
    pub(crate) fn new(query: QueryId, len: usize) -> Self {
        Self {
            query,
            position: len,
        }
    }

    /// The query this cursor walks.
    #[must_use]
    pub fn query(&self) -> QueryId {
        self.query
    }

    /// Returns the next member, or `None` once the pass is complete.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle(World)` if the world was destroyed, or
    /// `InvalidQueryUse` if the query was disposed.
    pub fn advance(&mut self, world: &World) -> Result<Option<EntityId>> {
        let query = world.live_query(self.query)?;
        let position = self.position.min(query.len());
        if position == 0 {
            self.position = 0;
            return Ok(None);
        }
        self.position = position - 1;
        Ok(query.member_at(self.position))
    }

    /// Starts a new pass over the current members.
    ///
    /// # Errors
    ///
    /// See [`advance`](Self::advance).
    pub fn restart(&mut self, world: &World) -> Result<()> {
        self.position = world.live_query(self.query)?.len();
        Ok(())
    }
}
