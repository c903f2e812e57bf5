//! Recursive, batch-oriented relation population.
//!
//! A populate call takes a root filter and a plan tree of relation names.
//! Each plan level resolves with one store query per relation per owner
//! type (never one per entity), sibling relations resolve concurrently,
//! and results recurse into nested plans before being attached. Calls are
//! stateless; depth is bounded per call and validated against the plan
//! itself, so a cyclic parent chain in the data can never cause an
//! unbounded traversal.

pub mod document;
pub mod engine;
pub mod plan;
mod resolver;

pub use document::{PopulatedDocument, PopulatedRelation};
pub use engine::{PopulateOptions, Populator};
pub use plan::{PlanNode, PopulationPlan};

use std::{error::Error, fmt};

use crate::store::StoreError;

/// Why a populate call failed. Every variant aborts the whole call; the
/// caller never receives a partially populated tree.
#[derive(Debug)]
pub enum PopulateError {
    /// The requested root type is not in the registry.
    UnknownEntityType { entity_type: String },
    /// The plan names a relation the owner type does not declare.
    UnknownRelation {
        entity_type: String,
        relation: String,
        path: String,
    },
    /// A polymorphic record's discriminant is missing or names an
    /// undeclared type. Signals stored-data corruption, so it is fatal
    /// rather than skipped.
    InvalidDiscriminant {
        field: String,
        value: Option<String>,
        path: String,
    },
    /// The plan nests deeper than the caller's bound.
    PlanTooDeep { depth: usize, max_depth: usize },
    /// The backing store failed or timed out.
    Store { source: StoreError, path: String },
    /// The caller's cancellation signal fired.
    Cancelled,
}

impl fmt::Display for PopulateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownEntityType { entity_type } => {
                write!(f, "unknown entity type: {entity_type}")
            }
            Self::UnknownRelation {
                entity_type,
                relation,
                path,
            } => write!(
                f,
                "relation {relation} is not declared for {entity_type} (at {path})"
            ),
            Self::InvalidDiscriminant {
                field,
                value: Some(value),
                path,
            } => write!(
                f,
                "discriminant {field} names undeclared type {value} (at {path})"
            ),
            Self::InvalidDiscriminant {
                field,
                value: None,
                path,
            } => write!(f, "missing discriminant field {field} (at {path})"),
            Self::PlanTooDeep { depth, max_depth } => write!(
                f,
                "population plan depth {depth} exceeds maximum {max_depth}"
            ),
            Self::Store { source, path } if path.is_empty() => {
                write!(f, "store error while fetching roots: {source}")
            }
            Self::Store { source, path } => write!(f, "store error at {path}: {source}"),
            Self::Cancelled => write!(f, "populate call cancelled"),
        }
    }
}

impl Error for PopulateError {}
