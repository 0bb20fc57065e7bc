//! Entity allocation, typed component stores, and the component event bus.
//!
//! This crate provides:
//! - [`EntityStore`] - Generational entity allocation
//! - [`ComponentStore`] - Sparse-set storage for one component type, with enabled bits
//! - [`ComponentRegistry`] - Type-indexed stores behind [`ComponentColumn`]
//! - [`EventBus`] - Synchronous per-(component, [`EventKind`]) channels

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod component;
pub mod entity;
pub mod event;
pub mod registry;

pub use component::{Component, ComponentColumn, ComponentStore};
pub use entity::EntityStore;
pub use event::{Callback, Channel, Event, EventBus, EventKind, Listener, SubscriptionId};
pub use registry::{ComponentKey, ComponentRegistry};
