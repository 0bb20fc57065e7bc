//! Error types for the Tessera runtime.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Every variant is a contract violation by the caller; nothing here is
//! transient or retried.

use thiserror::Error;

use crate::entity::EntityId;
use crate::handle::{Handle, QueryId};

/// The main error type for Tessera operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional free-text context about where the error occurred.
    pub context: Option<String>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Creates a stale handle error for an entity that is not alive.
    #[must_use]
    pub fn stale_entity(id: EntityId) -> Self {
        Self::new(ErrorKind::StaleHandle(Handle::Entity(id)))
    }

    /// Creates a stale handle error for a destroyed world.
    #[must_use]
    pub fn world_destroyed() -> Self {
        Self::new(ErrorKind::StaleHandle(Handle::World))
    }

    /// Creates a missing component error for component type `T`.
    #[must_use]
    pub fn missing_component<T: ?Sized>(entity: EntityId) -> Self {
        Self::new(ErrorKind::MissingComponent {
            entity,
            component: std::any::type_name::<T>(),
        })
    }

    /// Creates an error for use of a disposed (or foreign) query handle.
    #[must_use]
    pub fn invalid_query(id: QueryId) -> Self {
        Self::new(ErrorKind::InvalidQueryUse(id))
    }

    /// Creates a cyclic dependency error for a system group.
    #[must_use]
    pub fn cyclic_dependency(group: impl Into<String>, systems: Vec<String>) -> Self {
        Self::new(ErrorKind::CyclicDependency {
            group: group.into(),
            systems,
        })
    }

    /// Creates a capacity overflow error.
    #[must_use]
    pub fn capacity_overflow(limit: usize) -> Self {
        Self::new(ErrorKind::CapacityOverflow { limit })
    }

    /// Returns true if this error reports a stale handle.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(self.kind, ErrorKind::StaleHandle(_))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Operation on a dead entity or a destroyed world.
    #[error("stale handle: {0}")]
    StaleHandle(Handle),

    /// Get or remove of a component the entity does not have.
    #[error("component not found: {component} on entity {entity:?}")]
    MissingComponent {
        /// The entity that was queried.
        entity: EntityId,
        /// Type name of the missing component.
        component: &'static str,
    },

    /// Operation on a query that has been disposed.
    #[error("invalid use of disposed query {0:?}")]
    InvalidQueryUse(QueryId),

    /// Before/after constraints in a system group admit no order.
    #[error("cyclic system dependency in group {group}: {}", .systems.join(" -> "))]
    CyclicDependency {
        /// Name of the group that failed to build.
        group: String,
        /// Systems left unordered when the cycle was detected.
        systems: Vec<String>,
    },

    /// An index space or per-query limit was exhausted.
    #[error("capacity overflow: limit of {limit} reached")]
    CapacityOverflow {
        /// The configured limit.
        limit: usize,
    },

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias using Tessera's error type.
pub type Result<T> = std::result::Result<T, Error>;
