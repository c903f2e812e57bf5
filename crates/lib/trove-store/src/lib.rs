//! Record models and schema constants for trove.
//!
//! This crate defines the canonical inventory data model shared by the
//! population engine, the control plane, and the demo binaries. Records are
//! flat: hierarchy is expressed only through foreign keys and resolved at
//! query time.

pub mod models;
pub mod schema;

pub use models::*;
