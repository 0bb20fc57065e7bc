//! Core handles, sparse sets, and error types for Tessera.
//!
//! This crate provides:
//! - [`EntityId`] - Generational entity identifiers
//! - [`QueryId`] and [`Handle`] - Handles to other world-owned objects
//! - [`SparseSet`] - O(1) key-to-dense-slot storage with swap-compaction
//! - [`Error`] - Error kinds shared by every layer

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod entity;
pub mod error;
pub mod handle;
pub mod sparse;

pub use entity::EntityId;
pub use error::{Error, ErrorKind, Result};
pub use handle::{Handle, QueryId};
pub use sparse::SparseSet;
