use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use trove_store::models::Document;
use trove_store::schema::FIELD_UID;

/// One expanded relation attached to a populated document.
#[derive(Debug, Clone, PartialEq)]
pub enum PopulatedRelation {
    /// Forward relation: at most one related record. A dangling foreign key
    /// resolves to `None`.
    One(Option<Box<PopulatedDocument>>),
    /// Reverse relation: every matching source record.
    Many(Vec<PopulatedDocument>),
}

/// A stored record together with its expanded relations.
///
/// Serializes as one flat object: the record's own fields, then one field
/// per expanded relation. A forward relation sharing its name with the
/// stored foreign-key field replaces that field in the output, so the
/// populated tree reads the same way the flat record did.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulatedDocument {
    entity_type: String,
    record: Document,
    relations: BTreeMap<String, PopulatedRelation>,
}

impl PopulatedDocument {
    pub(crate) fn new(entity_type: impl Into<String>, record: Document) -> Self {
        Self {
            entity_type: entity_type.into(),
            record,
            relations: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    #[must_use]
    pub const fn record(&self) -> &Document {
        &self.record
    }

    /// One stored field of the record.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.record.get(name)
    }

    /// The record's `uid`, if present and a string.
    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.record.get(FIELD_UID).and_then(Value::as_str)
    }

    #[must_use]
    pub const fn relations(&self) -> &BTreeMap<String, PopulatedRelation> {
        &self.relations
    }

    #[must_use]
    pub fn relation(&self, name: &str) -> Option<&PopulatedRelation> {
        self.relations.get(name)
    }

    pub(crate) fn attach(&mut self, name: String, value: PopulatedRelation) {
        self.relations.insert(name, value);
    }
}

impl Serialize for PopulatedDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let own_fields = self
            .record
            .iter()
            .filter(|(name, _)| !self.relations.contains_key(*name));
        let len = own_fields.clone().count() + self.relations.len();

        let mut map = serializer.serialize_map(Some(len))?;
        for (name, value) in own_fields {
            map.serialize_entry(name, value)?;
        }
        for (name, relation) in &self.relations {
            match relation {
                PopulatedRelation::One(document) => map.serialize_entry(name, document)?,
                PopulatedRelation::Many(documents) => map.serialize_entry(name, documents)?,
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(entity_type: &str, value: Value) -> PopulatedDocument {
        let Value::Object(record) = value else {
            panic!("fixture must be an object");
        };
        PopulatedDocument::new(entity_type, record)
    }

    #[test]
    fn serializes_record_and_relations_flat() {
        let mut category = doc("Category", json!({"uid": "c-1", "title": "Category"}));
        category.attach(
            "items".to_string(),
            PopulatedRelation::Many(vec![doc(
                "Item",
                json!({"uid": "i-1", "name": "root-item-1", "category": "c-1"}),
            )]),
        );

        let rendered = serde_json::to_value(&category).expect("document should serialize");
        assert_eq!(
            rendered,
            json!({
                "uid": "c-1",
                "title": "Category",
                "items": [{"uid": "i-1", "name": "root-item-1", "category": "c-1"}],
            })
        );
    }

    #[test]
    fn forward_relation_replaces_foreign_key_field() {
        let mut item = doc("Item", json!({"uid": "i-1", "name": "Tablet", "category": "c-1"}));
        item.attach(
            "category".to_string(),
            PopulatedRelation::One(Some(Box::new(doc(
                "Category",
                json!({"uid": "c-1", "title": "Electronics"}),
            )))),
        );

        let rendered = serde_json::to_value(&item).expect("document should serialize");
        assert_eq!(
            rendered,
            json!({
                "uid": "i-1",
                "name": "Tablet",
                "category": {"uid": "c-1", "title": "Electronics"},
            })
        );
    }

    #[test]
    fn dangling_forward_relation_serializes_null() {
        let mut item = doc("Item", json!({"uid": "i-1", "name": "Tablet", "category": "gone"}));
        item.attach("category".to_string(), PopulatedRelation::One(None));

        let rendered = serde_json::to_value(&item).expect("document should serialize");
        assert_eq!(rendered.get("category"), Some(&Value::Null));
    }
}
