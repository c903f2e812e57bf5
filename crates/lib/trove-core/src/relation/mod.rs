//! Declarative relation metadata.
//!
//! Relations are virtual: nothing in a stored record points at its
//! children. Each entity type instead declares, once at startup, how its
//! relations are physically connected (which side holds the foreign key,
//! which type or discriminant names the target, one or many results). The
//! registry built from those declarations is immutable and shared by every
//! populate call.

pub mod descriptor;
pub mod registry;

pub use descriptor::{
    ForwardTarget,
    RelationCardinality,
    RelationDescriptor,
    RelationDirection,
    RelationKind,
};
pub use registry::{RegistryError, RelationRegistry, RelationRegistryBuilder};
