//! Configuration for a world.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::query::MAX_QUERY_TRIGGERS;

/// Sizing limits applied when a [`World`](crate::World) is created.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WorldConfig {
    /// Size of the entity index space. Creating an entity when every index
    /// is in use fails with `CapacityOverflow`.
    pub max_entities: u32,

    /// Entity slots reserved up front.
    pub entity_capacity: usize,

    /// Edge triggers allowed in one query, at most [`MAX_QUERY_TRIGGERS`].
    pub max_query_triggers: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            max_entities: u32::MAX - 1,
            entity_capacity: 0,
            max_query_triggers: MAX_QUERY_TRIGGERS,
        }
    }
}

impl WorldConfig {
    /// A configuration for small, bounded worlds (tools, tests, UI scenes).
    #[must_use]
    pub fn small() -> Self {
        Self {
            max_entities: 4096,
            entity_capacity: 256,
            max_query_triggers: MAX_QUERY_TRIGGERS,
        }
    }

    /// Builder method to set the entity index space.
    #[must_use]
    pub fn with_max_entities(mut self, max_entities: u32) -> Self {
        self.max_entities = max_entities;
        self
    }

    /// Builder method to set the number of pre-reserved entity slots.
    #[must_use]
    pub fn with_entity_capacity(mut self, capacity: usize) -> Self {
        self.entity_capacity = capacity;
        self
    }

    /// Builder method to lower the per-query trigger limit.
    #[must_use]
    pub fn with_max_query_triggers(mut self, limit: usize) -> Self {
        self.max_query_triggers = limit.min(MAX_QUERY_TRIGGERS);
        self
    }

    /// The trigger limit actually enforced.
    #[must_use]
    pub fn trigger_limit(&self) -> usize {
        self.max_query_triggers.min(MAX_QUERY_TRIGGERS)
    }
}
