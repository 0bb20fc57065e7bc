//! Cross-layer integration tests for Tessera
//!
//! End-to-end scenarios and properties that exercise storage, events,
//! queries, and scheduling together through the root crate.

mod scenarios;
