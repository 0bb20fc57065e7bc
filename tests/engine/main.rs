//! Integration tests for Layer 2: Engine
//!
//! Tests for live queries, system scheduling, and the world.

mod queries;
mod scheduling;
