//! Per-node relation resolution: reverse foreign-key lookups and forward
//! dispatch, including the polymorphic discriminant cases.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::Value;
use surrealdb::Connection;
use trove_store::models::Document;
use trove_store::schema::FIELD_UID;

use crate::relation::ForwardTarget;
use crate::store::{Filter, StoreError};

use super::PopulateError;
use super::document::PopulatedDocument;
use super::engine::{CallCx, GroupOutcome, OwnerGroup, Populator, Slot};

impl<C: Connection> Populator<C> {
    /// Resolves a reverse relation for one owner group with a single
    /// set-membership query, then regroups the sources onto their owners by
    /// foreign-key equality.
    pub(super) async fn resolve_reverse(
        &self,
        group: &OwnerGroup<'_>,
        source_type: &str,
        foreign_key: &str,
        discriminant: Option<&str>,
        sort_by: Option<&str>,
        cx: &CallCx<'_>,
    ) -> Result<GroupOutcome, PopulateError> {
        let table = self.table_for(source_type)?;

        let mut owner_ids = Vec::with_capacity(group.members.len());
        for (_, owner) in &group.members {
            let uid = owner.uid().ok_or_else(|| missing_uid(cx.path))?;
            owner_ids.push(uid.to_string());
        }

        let keys = owner_ids
            .iter()
            .map(|uid| Value::String(uid.clone()))
            .collect();
        let mut filter = Filter::new().any_of(foreign_key, keys);
        if let Some(field) = discriminant {
            // Ids are only unique per store, so a source under another
            // owner type may carry the same raw key value; matching the
            // discriminant keeps it out of this owner's result set.
            filter = filter.eq(field, group.entity_type);
        }
        let rows = self
            .guarded(cx, self.store().find_many(table, &filter))
            .await?;

        let mut children = Vec::with_capacity(rows.len());
        let mut by_key: HashMap<String, Vec<usize>> = HashMap::new();
        for row in rows {
            let Some(key) = row.get(foreign_key).and_then(Value::as_str) else {
                continue;
            };
            by_key
                .entry(key.to_string())
                .or_default()
                .push(children.len());
            children.push(PopulatedDocument::new(source_type, row));
        }

        let mut slots = Vec::with_capacity(group.members.len());
        for ((owner_index, _), uid) in group.members.iter().zip(&owner_ids) {
            let mut assigned = by_key.remove(uid).unwrap_or_default();
            if let Some(field) = sort_by {
                sort_indices(&children, &mut assigned, field);
            }
            slots.push((*owner_index, Slot::Many(assigned)));
        }
        Ok(GroupOutcome { children, slots })
    }

    /// Resolves a forward relation for one owner group: one query per
    /// concrete target type, dangling keys resolving to absent. Owners
    /// sharing a target each receive their own clone, so every node of the
    /// result tree owns its subtree.
    pub(super) async fn resolve_forward(
        &self,
        group: &OwnerGroup<'_>,
        foreign_key: &str,
        target: &ForwardTarget,
        cx: &CallCx<'_>,
    ) -> Result<GroupOutcome, PopulateError> {
        let mut wanted: Vec<(usize, Option<(String, String)>)> =
            Vec::with_capacity(group.members.len());
        let mut by_type: Vec<(String, Vec<Value>)> = Vec::new();
        for (owner_index, owner) in &group.members {
            let Some(key) = owner.field(foreign_key).and_then(Value::as_str) else {
                wanted.push((*owner_index, None));
                continue;
            };
            let target_type = match target {
                ForwardTarget::Fixed(entity_type) => entity_type.clone(),
                ForwardTarget::Discriminant(field) => {
                    self.discriminant_target(owner, field, cx.path)?
                }
            };
            match by_type.iter_mut().find(|(name, _)| *name == target_type) {
                Some((_, keys)) => keys.push(Value::String(key.to_string())),
                None => by_type.push((target_type.clone(), vec![Value::String(key.to_string())])),
            }
            wanted.push((*owner_index, Some((target_type, key.to_string()))));
        }

        let mut found: HashMap<(String, String), Document> = HashMap::new();
        for (target_type, keys) in by_type {
            let table = self.table_for(&target_type)?;
            let filter = Filter::new().any_of(FIELD_UID, keys);
            let rows = self
                .guarded(cx, self.store().find_many(table, &filter))
                .await?;
            for row in rows {
                if let Some(uid) = row.get(FIELD_UID).and_then(Value::as_str) {
                    found.insert((target_type.clone(), uid.to_string()), row);
                }
            }
        }

        let mut children = Vec::new();
        let mut slots = Vec::with_capacity(wanted.len());
        for (owner_index, reference) in wanted {
            let resolved = reference.and_then(|key| {
                found.get(&key).map(|row| {
                    children.push(PopulatedDocument::new(key.0.clone(), row.clone()));
                    children.len() - 1
                })
            });
            slots.push((owner_index, Slot::One(resolved)));
        }
        Ok(GroupOutcome { children, slots })
    }

    /// Reads and validates the polymorphic discriminant on one owner
    /// record. Failing here is deliberate: an unresolvable discriminant
    /// signals stored-data corruption, not an empty relation.
    fn discriminant_target(
        &self,
        owner: &PopulatedDocument,
        field: &str,
        path: &str,
    ) -> Result<String, PopulateError> {
        match owner.field(field) {
            Some(Value::String(name)) if self.registry().has_type(name) => Ok(name.clone()),
            Some(Value::String(name)) => Err(PopulateError::InvalidDiscriminant {
                field: field.to_string(),
                value: Some(name.clone()),
                path: path.to_string(),
            }),
            Some(other) => Err(PopulateError::InvalidDiscriminant {
                field: field.to_string(),
                value: Some(other.to_string()),
                path: path.to_string(),
            }),
            None => Err(PopulateError::InvalidDiscriminant {
                field: field.to_string(),
                value: None,
                path: path.to_string(),
            }),
        }
    }
}

fn missing_uid(path: &str) -> PopulateError {
    PopulateError::Store {
        source: StoreError::InvalidInput("record is missing a uid".to_string()),
        path: path.to_string(),
    }
}

fn sort_indices(children: &[PopulatedDocument], indices: &mut [usize], field: &str) {
    indices.sort_by(|&a, &b| compare_values(children[a].field(field), children[b].field(field)));
}

// Total enough for sort keys: absent sorts first, strings and numbers
// compare within their own kind, mixed kinds keep store order.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sort_keys_order_strings_numbers_and_absent() {
        let a = json!("item-1");
        let b = json!("item-2");
        assert_eq!(compare_values(Some(&a), Some(&b)), Ordering::Less);

        let one = json!(1);
        let ten = json!(10);
        assert_eq!(compare_values(Some(&ten), Some(&one)), Ordering::Greater);

        assert_eq!(compare_values(None, Some(&a)), Ordering::Less);
        assert_eq!(compare_values(Some(&a), Some(&one)), Ordering::Equal);
    }
}
