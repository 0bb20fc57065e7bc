//! Tessera - sparse-set entity-component-system runtime
//!
//! This crate re-exports all layers of the Tessera system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: tessera_engine     - Live queries, system scheduling, World
//! Layer 1: tessera_storage    - Entities, component stores, event bus
//! Layer 0: tessera_foundation - Core types (EntityId, SparseSet, Error)
//! ```

pub use tessera_engine as engine;
pub use tessera_foundation as foundation;
pub use tessera_storage as storage;

pub use tessera_engine::{QueryCursor, System, SystemRegistry, World, WorldConfig};
pub use tessera_foundation::{EntityId, Error, ErrorKind, QueryId, Result};
pub use tessera_storage::{EventKind, SubscriptionId};
