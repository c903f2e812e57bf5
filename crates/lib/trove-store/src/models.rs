use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Dynamic document form consumed by the population engine.
pub type Document = Map<String, Value>;

/// Inventory category record.
///
/// In the self-referential configuration `parent` points at another category
/// and is absent on roots; the two-tier configuration leaves it unset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub uid: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

/// Subcategory record for the fixed two-tier hierarchy. `parent` always
/// references a category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubCategory {
    pub uid: String,
    pub title: String,
    pub parent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

/// Inventory item record.
///
/// `category` is a foreign key; `category_type` is the polymorphic
/// discriminant naming which table it targets. The discriminant is absent in
/// the self-referential configuration, where the target is always a category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub uid: String,
    pub name: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

/// Converts a serializable record into the dynamic document form.
///
/// # Errors
/// Returns a `serde_json::Error` if the record fails to serialize or does
/// not serialize to an object.
pub fn to_document<T: Serialize>(record: &T) -> serde_json::Result<Document> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        _ => Err(serde::ser::Error::custom(
            "record did not serialize to an object",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_optionals_are_omitted() {
        let category = Category {
            uid: "c-1".to_string(),
            title: "Electronics".to_string(),
            parent: None,
            created_at: None,
            extra: None,
        };

        let doc = to_document(&category).expect("category should serialize");
        assert_eq!(doc.get("uid"), Some(&Value::String("c-1".to_string())));
        assert!(!doc.contains_key("parent"));
        assert!(!doc.contains_key("created_at"));
    }

    #[test]
    fn discriminant_round_trips() {
        let item = Item {
            uid: "i-1".to_string(),
            name: "Tablet".to_string(),
            category: "c-1".to_string(),
            category_type: Some("Category".to_string()),
            created_at: None,
            extra: None,
        };

        let doc = to_document(&item).expect("item should serialize");
        let back: Item =
            serde_json::from_value(Value::Object(doc)).expect("item should deserialize");
        assert_eq!(back, item);
    }
}
