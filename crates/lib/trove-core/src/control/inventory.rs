use serde::{Deserialize, Serialize};
use serde_json::Value;
use surrealdb::Connection;
use trove_store::models::{Category, Item, SubCategory, to_document};
use trove_store::schema::{TABLE_CATEGORY, TABLE_ITEM, TABLE_SUB_CATEGORY};

use crate::store::Filter;

use super::{ControlError, TroveControlPlane};

/// Input payload for creating a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub title: String,
    #[serde(default)]
    pub parent: Option<String>,
}

/// Input payload for creating a subcategory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubCategory {
    pub title: String,
    pub parent: String,
}

/// Input payload for creating an item. `category_type` carries the
/// polymorphic discriminant in the two-tier configuration and stays absent
/// in the self-referential one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub category_type: Option<String>,
}

impl<C: Connection> TroveControlPlane<C> {
    /// Creates a category, stamping its id and creation time.
    ///
    /// # Errors
    /// Returns `ControlError` if encoding or the store write fails.
    pub async fn create_category(&self, request: NewCategory) -> Result<Category, ControlError> {
        let record = Category {
            uid: new_uid(),
            title: request.title,
            parent: request.parent,
            created_at: Some(now_rfc3339()),
            extra: None,
        };
        self.store()
            .create(TABLE_CATEGORY, to_document(&record)?)
            .await?;
        Ok(record)
    }

    /// Creates a subcategory under a category.
    ///
    /// # Errors
    /// Returns `ControlError` if encoding or the store write fails.
    pub async fn create_sub_category(
        &self,
        request: NewSubCategory,
    ) -> Result<SubCategory, ControlError> {
        let record = SubCategory {
            uid: new_uid(),
            title: request.title,
            parent: request.parent,
            created_at: Some(now_rfc3339()),
            extra: None,
        };
        self.store()
            .create(TABLE_SUB_CATEGORY, to_document(&record)?)
            .await?;
        Ok(record)
    }

    /// Creates an item under a category or subcategory.
    ///
    /// # Errors
    /// Returns `ControlError` if encoding or the store write fails.
    pub async fn create_item(&self, request: NewItem) -> Result<Item, ControlError> {
        let record = Item {
            uid: new_uid(),
            name: request.name,
            category: request.category,
            category_type: request.category_type,
            created_at: Some(now_rfc3339()),
            extra: None,
        };
        self.store().create(TABLE_ITEM, to_document(&record)?).await?;
        Ok(record)
    }

    /// Lists categories matching `filter`.
    ///
    /// # Errors
    /// Returns `ControlError` if the store query or decoding fails.
    pub async fn categories(&self, filter: &Filter) -> Result<Vec<Category>, ControlError> {
        self.find_records(TABLE_CATEGORY, filter).await
    }

    /// Lists subcategories matching `filter`.
    ///
    /// # Errors
    /// Returns `ControlError` if the store query or decoding fails.
    pub async fn sub_categories(&self, filter: &Filter) -> Result<Vec<SubCategory>, ControlError> {
        self.find_records(TABLE_SUB_CATEGORY, filter).await
    }

    /// Lists items matching `filter`.
    ///
    /// # Errors
    /// Returns `ControlError` if the store query or decoding fails.
    pub async fn items(&self, filter: &Filter) -> Result<Vec<Item>, ControlError> {
        self.find_records(TABLE_ITEM, filter).await
    }

    /// Deletes every record of every entity type the registry declares.
    /// Returns how many records were removed.
    ///
    /// # Errors
    /// Returns `ControlError` if a store delete fails.
    pub async fn clear_all(&self) -> Result<u64, ControlError> {
        let tables: Vec<String> = self
            .registry()
            .tables()
            .map(|(_, table)| table.to_string())
            .collect();
        let mut removed = 0;
        for table in tables {
            removed += self.store().delete_many(&table, &Filter::new()).await?;
        }
        tracing::debug!(removed, "cleared inventory tables");
        Ok(removed)
    }

    async fn find_records<T>(&self, table: &str, filter: &Filter) -> Result<Vec<T>, ControlError>
    where
        T: serde::de::DeserializeOwned,
    {
        let documents = self.store().find_many(table, filter).await?;
        let mut records = Vec::with_capacity(documents.len());
        for document in documents {
            records.push(serde_json::from_value(Value::Object(document))?);
        }
        Ok(records)
    }
}

fn new_uid() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
