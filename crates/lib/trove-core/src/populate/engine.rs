use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, try_join_all};
use surrealdb::Connection;
use tokio::sync::watch;
use tracing::debug;

use crate::relation::{RelationKind, RelationRegistry};
use crate::store::{Filter, StoreError, StoreResult, SurrealEntityStore};

use super::PopulateError;
use super::document::{PopulatedDocument, PopulatedRelation};
use super::plan::{PlanNode, PopulationPlan};

/// Per-call options for a populate traversal.
///
/// The depth bound is required: there is no unbounded default. Timeout
/// applies to each individual store call; the cancellation receiver aborts
/// the whole call, discarding partial results.
#[derive(Debug, Clone)]
pub struct PopulateOptions {
    max_depth: usize,
    timeout: Option<Duration>,
    cancel: Option<watch::Receiver<bool>>,
}

impl PopulateOptions {
    #[must_use]
    pub const fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            timeout: None,
            cancel: None,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Cancels the call when the watched value becomes `true`.
    #[must_use]
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub(super) const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(super) fn cancel(&self) -> Option<watch::Receiver<bool>> {
        self.cancel.clone()
    }

    pub(super) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|cancel| *cancel.borrow())
    }
}

/// Shared context for the store calls issued under one plan node.
pub(super) struct CallCx<'a> {
    pub path: &'a str,
    pub options: &'a PopulateOptions,
}

/// Where a resolved child attaches on its owner.
#[derive(Debug, Clone)]
pub(super) enum Slot {
    One(Option<usize>),
    Many(Vec<usize>),
}

impl Slot {
    fn offset(self, base: usize) -> Self {
        match self {
            Self::One(index) => Self::One(index.map(|child| child + base)),
            Self::Many(indices) => {
                Self::Many(indices.into_iter().map(|child| child + base).collect())
            }
        }
    }
}

/// Owners of one entity type within a plan-node batch, with their positions
/// in the full owner slice.
pub(super) struct OwnerGroup<'a> {
    pub entity_type: &'a str,
    pub members: Vec<(usize, &'a PopulatedDocument)>,
}

/// Result of resolving one relation for one owner group. Child indices are
/// local to `children` until the engine merges groups.
pub(super) struct GroupOutcome {
    pub children: Vec<PopulatedDocument>,
    pub slots: Vec<(usize, Slot)>,
}

/// One plan node resolved across the whole owner batch.
struct ResolvedNode {
    children: Vec<PopulatedDocument>,
    slots: Vec<Slot>,
}

/// Batch, depth-bounded relation population over an entity store.
///
/// Stateless across calls: each populate call is an independent traversal
/// over the shared, read-only relation registry.
pub struct Populator<C: Connection> {
    store: SurrealEntityStore<C>,
    registry: Arc<RelationRegistry>,
}

impl<C: Connection> Clone for Populator<C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            registry: self.registry.clone(),
        }
    }
}

impl<C: Connection> Populator<C> {
    #[must_use]
    pub const fn new(store: SurrealEntityStore<C>, registry: Arc<RelationRegistry>) -> Self {
        Self { store, registry }
    }

    #[must_use]
    pub fn registry(&self) -> &RelationRegistry {
        &self.registry
    }

    pub(super) const fn store(&self) -> &SurrealEntityStore<C> {
        &self.store
    }

    /// Fetches entities of `root_type` matching `filter` and expands `plan`
    /// on each, returning the nested result trees.
    ///
    /// # Errors
    /// Returns `PopulateError` if the root type or a plan relation is
    /// undeclared, a discriminant is invalid, the plan nests deeper than
    /// `options.max_depth()`, a store call fails or times out, or the call
    /// is cancelled. Any failure aborts the whole call.
    pub async fn populate(
        &self,
        root_type: &str,
        filter: &Filter,
        plan: &PopulationPlan,
        options: &PopulateOptions,
    ) -> Result<Vec<PopulatedDocument>, PopulateError> {
        let table = self.table_for(root_type)?;

        // The bound is a property of the plan shape, not of the data: a
        // too-deep plan fails before any query runs, so cyclic parent
        // chains cannot turn a bounded call into an unbounded one.
        let depth = plan.depth();
        if depth > options.max_depth() {
            return Err(PopulateError::PlanTooDeep {
                depth,
                max_depth: options.max_depth(),
            });
        }

        let cx = CallCx { path: "", options };
        let records = self.guarded(&cx, self.store.find_many(table, filter)).await?;
        let mut documents: Vec<PopulatedDocument> = records
            .into_iter()
            .map(|record| PopulatedDocument::new(root_type, record))
            .collect();
        debug!(root_type, roots = documents.len(), depth, "populating");

        self.apply_plan(&mut documents, plan, "", options).await?;
        Ok(documents)
    }

    fn apply_plan<'a>(
        &'a self,
        owners: &'a mut Vec<PopulatedDocument>,
        plan: &'a PopulationPlan,
        path: &'a str,
        options: &'a PopulateOptions,
    ) -> BoxFuture<'a, Result<(), PopulateError>> {
        Box::pin(async move {
            if plan.is_empty() || owners.is_empty() {
                return Ok(());
            }

            // Sibling relations at one depth have no data dependency on
            // each other: issue their batch queries together, and only
            // recurse once every sibling has resolved.
            let resolutions = {
                let shared: &[PopulatedDocument] = owners;
                try_join_all(
                    plan.nodes()
                        .iter()
                        .map(|node| self.resolve_node(shared, node, path, options)),
                )
                .await?
            };

            for (node, mut resolved) in plan.nodes().iter().zip(resolutions) {
                if !node.nested().is_empty() && !resolved.children.is_empty() {
                    let node_path = join_path(path, node.relation());
                    self.apply_plan(&mut resolved.children, node.nested(), &node_path, options)
                        .await?;
                }
                attach_children(owners, node.relation(), resolved);
            }
            Ok(())
        })
    }

    async fn resolve_node(
        &self,
        owners: &[PopulatedDocument],
        node: &PlanNode,
        path: &str,
        options: &PopulateOptions,
    ) -> Result<ResolvedNode, PopulateError> {
        let node_path = join_path(path, node.relation());
        let cx = CallCx {
            path: &node_path,
            options,
        };

        // Below a polymorphic relation one batch can mix entity types; each
        // type resolves against its own descriptor, still one query per
        // type group.
        let mut groups: Vec<OwnerGroup<'_>> = Vec::new();
        for (index, owner) in owners.iter().enumerate() {
            match groups
                .iter_mut()
                .find(|group| group.entity_type == owner.entity_type())
            {
                Some(group) => group.members.push((index, owner)),
                None => groups.push(OwnerGroup {
                    entity_type: owner.entity_type(),
                    members: vec![(index, owner)],
                }),
            }
        }

        let mut children = Vec::new();
        let mut slots = vec![Slot::Many(Vec::new()); owners.len()];
        for group in &groups {
            let descriptor = self
                .registry
                .resolve(group.entity_type, node.relation())
                .map_err(|_| PopulateError::UnknownRelation {
                    entity_type: group.entity_type.to_string(),
                    relation: node.relation().to_string(),
                    path: node_path.clone(),
                })?;

            let outcome = match descriptor.kind() {
                RelationKind::ReverseMany {
                    source_type,
                    foreign_key,
                    discriminant,
                } => {
                    self.resolve_reverse(
                        group,
                        source_type,
                        foreign_key,
                        discriminant.as_deref(),
                        descriptor.sort_by(),
                        &cx,
                    )
                    .await?
                }
                RelationKind::ForwardOne {
                    foreign_key,
                    target,
                } => self.resolve_forward(group, foreign_key, target, &cx).await?,
            };

            let base = children.len();
            children.extend(outcome.children);
            for (owner_index, slot) in outcome.slots {
                slots[owner_index] = slot.offset(base);
            }
        }

        debug!(
            relation = node.relation(),
            owners = owners.len(),
            resolved = children.len(),
            "resolved relation node"
        );
        Ok(ResolvedNode { children, slots })
    }

    pub(super) fn table_for(&self, entity_type: &str) -> Result<&str, PopulateError> {
        self.registry
            .table(entity_type)
            .ok_or_else(|| PopulateError::UnknownEntityType {
                entity_type: entity_type.to_string(),
            })
    }

    /// Runs one store call under the caller's timeout and cancellation
    /// signal, tagging failures with the plan path.
    pub(super) async fn guarded<T>(
        &self,
        cx: &CallCx<'_>,
        call: impl Future<Output = StoreResult<T>>,
    ) -> Result<T, PopulateError> {
        if cx.options.is_cancelled() {
            return Err(PopulateError::Cancelled);
        }
        let outcome = tokio::select! {
            () = wait_cancelled(cx.options.cancel()) => return Err(PopulateError::Cancelled),
            outcome = run_with_timeout(cx.options.timeout(), call) => outcome,
        };
        outcome.map_err(|source| PopulateError::Store {
            source,
            path: cx.path.to_string(),
        })
    }
}

async fn run_with_timeout<T>(
    timeout: Option<Duration>,
    call: impl Future<Output = StoreResult<T>>,
) -> StoreResult<T> {
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(StoreError::Timeout(limit)),
        },
        None => call.await,
    }
}

async fn wait_cancelled(cancel: Option<watch::Receiver<bool>>) {
    let Some(mut cancel) = cancel else {
        return std::future::pending().await;
    };
    loop {
        if *cancel.borrow() {
            return;
        }
        if cancel.changed().await.is_err() {
            // Sender dropped without cancelling; the call can never be
            // cancelled any more.
            return std::future::pending().await;
        }
    }
}

fn attach_children(owners: &mut [PopulatedDocument], relation: &str, resolved: ResolvedNode) {
    let ResolvedNode { children, slots } = resolved;
    let mut pool: Vec<Option<PopulatedDocument>> = children.into_iter().map(Some).collect();
    for (owner, slot) in owners.iter_mut().zip(slots) {
        let value = match slot {
            Slot::One(index) => PopulatedRelation::One(
                index
                    .and_then(|child| pool.get_mut(child).and_then(Option::take))
                    .map(Box::new),
            ),
            Slot::Many(indices) => PopulatedRelation::Many(
                indices
                    .into_iter()
                    .filter_map(|child| pool.get_mut(child).and_then(Option::take))
                    .collect(),
            ),
        };
        owner.attach(relation.to_string(), value);
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}
