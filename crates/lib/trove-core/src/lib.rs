//! Relation resolution and tree population for trove.
//!
//! This crate owns the entity store accessor, the relation descriptor
//! registry, the recursive population engine, and the control plane that
//! wires them together over a `SurrealDB` backing store.

pub mod control;
pub mod populate;
pub mod relation;
pub mod store;
