use std::{error::Error, fmt, sync::Arc};

use surrealdb::{Connection, Surreal};

use crate::populate::{PopulateError, Populator};
use crate::relation::RelationRegistry;
use crate::store::{StoreError, SurrealEntityStore};

pub mod inventory;
pub mod populate;

pub use inventory::{NewCategory, NewItem, NewSubCategory};

#[derive(Debug)]
pub enum ControlError {
    Store(StoreError),
    Populate(PopulateError),
    Encode(serde_json::Error),
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Populate(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode record: {err}"),
        }
    }
}

impl Error for ControlError {}

impl From<StoreError> for ControlError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<PopulateError> for ControlError {
    fn from(err: PopulateError) -> Self {
        Self::Populate(err)
    }
}

impl From<serde_json::Error> for ControlError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode(err)
    }
}

/// Orchestration layer wiring the entity store, the relation registry, and
/// the population engine behind one handle.
pub struct TroveControlPlane<C: Connection> {
    store: SurrealEntityStore<C>,
    populator: Populator<C>,
}

impl<C: Connection> Clone for TroveControlPlane<C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            populator: self.populator.clone(),
        }
    }
}

impl<C: Connection> TroveControlPlane<C> {
    pub fn new(db: Surreal<C>, registry: Arc<RelationRegistry>) -> Self {
        Self::with_store(SurrealEntityStore::new(db), registry)
    }

    pub fn from_arc(db: Arc<Surreal<C>>, registry: Arc<RelationRegistry>) -> Self {
        Self::with_store(SurrealEntityStore::from_arc(db), registry)
    }

    pub fn with_store(store: SurrealEntityStore<C>, registry: Arc<RelationRegistry>) -> Self {
        let populator = Populator::new(store.clone(), registry);
        Self { store, populator }
    }

    pub const fn store(&self) -> &SurrealEntityStore<C> {
        &self.store
    }

    pub fn registry(&self) -> &RelationRegistry {
        self.populator.registry()
    }

    pub(crate) const fn populator(&self) -> &Populator<C> {
        &self.populator
    }
}
