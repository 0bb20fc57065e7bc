//! Entity lifecycle management with generational indices.
//!
//! The `EntityStore` manages entity allocation and tracks generations
//! to detect stale references to destroyed entities.

use tessera_foundation::{EntityId, Error, Result};

/// Manages entity lifecycle and generation tracking.
///
/// Entities are allocated from a free list when available, otherwise
/// new indices are allocated. When an entity is destroyed, its index
/// is added to the free list and its generation is incremented.
#[derive(Debug, Clone)]
pub struct EntityStore {
    /// Generation counter for each entity index.
    /// Even generations are free, odd generations are alive.
    generations: Vec<u32>,
    /// Free list of indices available for reuse.
    free_list: Vec<u32>,
    /// Count of live entities.
    live_count: usize,
    /// Size of the index space.
    max_entities: u32,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    /// Creates a new empty entity store using the whole index space.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(u32::MAX)
    }

    /// Creates a store that never hands out more than `max_entities` indices.
    ///
    /// `u32::MAX` itself is reserved for [`EntityId::null`], so the effective
    /// limit is at most `u32::MAX - 1` slots.
    #[must_use]
    pub fn with_limit(max_entities: u32) -> Self {
        Self {
            generations: Vec::new(),
            free_list: Vec::new(),
            live_count: 0,
            max_entities: max_entities.min(u32::MAX - 1),
        }
    }

    /// Reserves room for `additional` more entity slots.
    pub fn reserve(&mut self, additional: usize) {
        self.generations.reserve(additional);
    }

    /// Spawns a new entity, returns its ID.
    ///
    /// Reuses indices from the free list when available.
    ///
    /// # Errors
    ///
    /// Returns `CapacityOverflow` when every index is in use or retired.
    pub fn spawn(&mut self) -> Result<EntityId> {
        if let Some(index) = self.free_list.pop() {
            let idx = index as usize;
            // Was even/free, now odd/alive
            self.generations[idx] += 1;
            self.live_count += 1;
            return Ok(EntityId::new(index, self.generations[idx]));
        }

        let len = self.generations.len();
        if len >= self.max_entities as usize {
            return Err(Error::capacity_overflow(self.max_entities as usize));
        }

        // len < max_entities <= u32::MAX - 1
        #[allow(clippy::cast_possible_truncation)]
        let index = len as u32;
        // New entities start at generation 1 (odd = alive)
        self.generations.push(1);
        self.live_count += 1;
        Ok(EntityId::new(index, 1))
    }

    /// Destroys an entity.
    ///
    /// Callers are expected to have removed the entity's components first.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle` if the entity is stale or already destroyed.
    pub fn destroy(&mut self, id: EntityId) -> Result<()> {
        self.validate(id)?;

        let idx = id.index as usize;
        self.generations[idx] += 1;
        self.live_count -= 1;

        // A slot with no odd generation left below the ceiling is retired.
        if self.generations[idx] < u32::MAX - 1 {
            self.free_list.push(id.index);
        }

        Ok(())
    }

    /// Checks if an entity exists and is not stale.
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        // Entity is alive if generation matches and is odd
        self.generations
            .get(id.index as usize)
            .is_some_and(|&generation| generation == id.generation && generation % 2 == 1)
    }

    /// Validates that an entity is live.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle` if the entity is stale or never existed.
    pub fn validate(&self, id: EntityId) -> Result<()> {
        if self.is_alive(id) {
            Ok(())
        } else {
            Err(Error::stale_entity(id))
        }
    }

    /// Returns the total number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live_count
    }

    /// Returns true if there are no live entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// Iterates over all live entity IDs in index order.
    #[allow(clippy::cast_possible_truncation)]
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.generations
            .iter()
            .enumerate()
            .filter(|(_, generation)| *generation % 2 == 1)
            .map(|(idx, generation)| EntityId::new(idx as u32, *generation))
    }

    /// Returns the current generation for an index, if it exists.
    #[must_use]
    pub fn generation(&self, index: u32) -> Option<u32> {
        self.generations.get(index as usize).copied()
    }

    /// Returns the configured size of the index space.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.max_entities
    }

    /// Forgets every entity, invalidating all outstanding handles.
    ///
    /// Generations are kept so that handles from before the clear stay
    /// stale; every allocated index returns to the free list.
    #[allow(clippy::cast_possible_truncation)]
    pub fn clear(&mut self) {
        self.free_list.clear();
        for (idx, generation) in self.generations.iter_mut().enumerate() {
            if *generation % 2 == 1 {
                *generation += 1;
            }
            if *generation < u32::MAX - 1 {
                self.free_list.push(idx as u32);
            }
        }
        self.free_list.reverse();
        self.live_count = 0;
    }
}
