//! Handles to world-owned objects other than entities.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// Handle to a live query owned by a world.
///
/// Like [`EntityId`], a query handle carries a generation so that a handle
/// to a disposed query is never confused with a query later built in the
/// same slot.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QueryId {
    /// Slot in the world's query table.
    pub slot: u32,
    /// Generation of the slot when the query was built.
    pub generation: u32,
}

impl QueryId {
    /// Creates a new query handle.
    #[must_use]
    pub const fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }
}

impl fmt::Debug for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueryId({}v{})", self.slot, self.generation)
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Query({})", self.slot)
    }
}

/// Any handle an operation can be rejected for.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Handle {
    /// An entity that is no longer (or never was) alive.
    Entity(EntityId),
    /// A world that has been destroyed.
    World,
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity(id) => write!(f, "{id:?}"),
            Self::World => write!(f, "world"),
        }
    }
}

impl From<EntityId> for Handle {
    fn from(id: EntityId) -> Self {
        Self::Entity(id)
    }
}
