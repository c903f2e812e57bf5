//! Store interfaces and `SurrealDB` implementation.
//!
//! The store layer persists flat entity records keyed by an engine-owned
//! `uid` field; everything above it is written against this interface only.

pub mod filter;
pub mod surreal;

pub use filter::{Filter, FilterClause};
pub use surreal::{StoreError, StoreResult, SurrealEntityStore};
