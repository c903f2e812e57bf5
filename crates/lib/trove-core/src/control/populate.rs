use surrealdb::Connection;

use crate::populate::{PopulateOptions, PopulatedDocument, PopulationPlan};
use crate::store::Filter;

use super::{ControlError, TroveControlPlane};

impl<C: Connection> TroveControlPlane<C> {
    /// Fetches entities of `root_type` matching `filter` and expands `plan`
    /// on each.
    ///
    /// # Errors
    /// Returns `ControlError` if the populate call fails; the error carries
    /// the kind and the plan path at which it occurred.
    pub async fn populate(
        &self,
        root_type: &str,
        filter: &Filter,
        plan: &PopulationPlan,
        options: &PopulateOptions,
    ) -> Result<Vec<PopulatedDocument>, ControlError> {
        Ok(self
            .populator()
            .populate(root_type, filter, plan, options)
            .await?)
    }
}
