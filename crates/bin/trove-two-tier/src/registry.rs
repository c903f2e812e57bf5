use surrealdb::Surreal;
use surrealdb::engine::any::{self, Any};
use trove_core::relation::{RegistryError, RelationDescriptor, RelationRegistry};
use trove_store::schema::{
    FIELD_CATEGORY,
    FIELD_CATEGORY_TYPE,
    FIELD_NAME,
    FIELD_PARENT,
    FIELD_TITLE,
    REL_CATEGORY,
    REL_ITEMS,
    REL_PARENT,
    REL_SUB_CATEGORIES,
    TABLE_CATEGORY,
    TABLE_ITEM,
    TABLE_SUB_CATEGORY,
    TYPE_CATEGORY,
    TYPE_ITEM,
    TYPE_SUB_CATEGORY,
};

use crate::config::DemoConfig;

/// Relation declarations for the fixed two-tier hierarchy: items reference
/// a category or a subcategory through a discriminant, subcategories always
/// hang under a category.
pub fn build_registry() -> Result<RelationRegistry, RegistryError> {
    RelationRegistry::builder()
        .entity(TYPE_CATEGORY, TABLE_CATEGORY)
        .entity(TYPE_SUB_CATEGORY, TABLE_SUB_CATEGORY)
        .entity(TYPE_ITEM, TABLE_ITEM)
        .relation(
            TYPE_CATEGORY,
            RelationDescriptor::reverse_many_polymorphic(
                REL_ITEMS,
                TYPE_ITEM,
                FIELD_CATEGORY,
                FIELD_CATEGORY_TYPE,
            )
            .with_sort_by(FIELD_NAME),
        )
        .relation(
            TYPE_CATEGORY,
            RelationDescriptor::reverse_many(REL_SUB_CATEGORIES, TYPE_SUB_CATEGORY, FIELD_PARENT)
                .with_sort_by(FIELD_TITLE),
        )
        .relation(
            TYPE_SUB_CATEGORY,
            RelationDescriptor::reverse_many_polymorphic(
                REL_ITEMS,
                TYPE_ITEM,
                FIELD_CATEGORY,
                FIELD_CATEGORY_TYPE,
            )
            .with_sort_by(FIELD_NAME),
        )
        .relation(
            TYPE_SUB_CATEGORY,
            RelationDescriptor::forward_one(REL_PARENT, FIELD_PARENT, TYPE_CATEGORY),
        )
        .relation(
            TYPE_ITEM,
            RelationDescriptor::forward_polymorphic(
                REL_CATEGORY,
                FIELD_CATEGORY,
                FIELD_CATEGORY_TYPE,
            ),
        )
        .build()
}

/// Connects to the configured endpoint; the default is a fresh in-memory
/// database.
pub async fn connect(config: &DemoConfig) -> Result<Surreal<Any>, surrealdb::Error> {
    let db = any::connect(&config.db_uri).await?;
    db.use_ns(&config.db_namespace)
        .use_db(&config.db_database)
        .await?;
    Ok(db)
}
