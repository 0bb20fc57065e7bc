//! Live queries, system scheduling, and the world for Tessera.
//!
//! This crate provides:
//! - [`World`] - Owner of entities, component stores, queries, and system groups
//! - [`QueryBuilder`] - Steady-state and edge-triggered live queries
//! - [`QueryCursor`] - Mutation-tolerant iteration over query members
//! - [`SystemRegistry`] - System registration and dependency ordering
//! - [`WorldConfig`] - Sizing limits

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod query;
pub mod schedule;
pub mod world;

pub use config::WorldConfig;
pub use query::{Filter, MAX_QUERY_TRIGGERS, QueryBuilder, QueryCursor, Term, WhenEither, WithEither};
pub use schedule::{
    DefaultSystemGroup, System, SystemDescriptor, SystemEntry, SystemGroup, SystemRegistry, TypeKey,
};
pub use world::{EntityEncoder, EntityView, World};
