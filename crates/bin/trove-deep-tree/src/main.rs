//! Self-referential hierarchy demo.
//!
//! Seeds a three-level category tree with items at every level, populates
//! the roots (categories with no parent) through a depth-3 plan, and prints
//! the nested tree.

mod config;
mod registry;

use std::sync::Arc;

use surrealdb::engine::any::Any;
use trove_core::control::{ControlError, NewCategory, NewItem, TroveControlPlane};
use trove_core::populate::{PopulateOptions, PopulationPlan};
use trove_core::store::Filter;
use trove_store::schema::{FIELD_PARENT, TYPE_CATEGORY};

use crate::config::DemoConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = DemoConfig::from_args()?;
    let db = registry::connect(&config).await?;
    let relations = Arc::new(registry::build_registry()?);
    let control = TroveControlPlane::new(db, relations);

    control.clear_all().await?;
    seed(&control).await?;

    let plan = PopulationPlan::from_paths([
        "items",
        "sub_categories.items",
        "sub_categories.sub_categories.items",
    ]);
    let options = PopulateOptions::new(config.max_depth).with_timeout(config.store_timeout);
    let roots = control
        .populate(
            TYPE_CATEGORY,
            &Filter::new().absent(FIELD_PARENT),
            &plan,
            &options,
        )
        .await?;

    let output = if config.compact {
        serde_json::to_string(&roots)?
    } else {
        serde_json::to_string_pretty(&roots)?
    };
    println!("{output}");
    Ok(())
}

async fn seed(control: &TroveControlPlane<Any>) -> Result<(), ControlError> {
    let root = create_category(control, "Category", None).await?;
    let child_1 = create_category(control, "sub-category-1", Some(&root)).await?;
    let child_2 = create_category(control, "sub-category-2", Some(&root)).await?;

    for name in ["root-item-1", "root-item-2", "root-item-3"] {
        create_item(control, name, &root).await?;
    }
    create_item(control, "item-1", &child_1).await?;
    create_item(control, "item-2", &child_1).await?;
    create_item(control, "item-3", &child_2).await?;

    let grandchild_1 = create_category(control, "sub-category-1-1", Some(&child_1)).await?;
    let grandchild_2 = create_category(control, "sub-category-1-2", Some(&child_1)).await?;
    create_item(control, "item-1-1", &grandchild_1).await?;
    create_item(control, "item-2-1", &grandchild_1).await?;
    create_item(control, "item-1-2", &grandchild_2).await?;
    Ok(())
}

async fn create_category(
    control: &TroveControlPlane<Any>,
    title: &str,
    parent: Option<&str>,
) -> Result<String, ControlError> {
    let category = control
        .create_category(NewCategory {
            title: title.to_string(),
            parent: parent.map(String::from),
        })
        .await?;
    Ok(category.uid)
}

async fn create_item(
    control: &TroveControlPlane<Any>,
    name: &str,
    category: &str,
) -> Result<(), ControlError> {
    control
        .create_item(NewItem {
            name: name.to_string(),
            category: category.to_string(),
            category_type: None,
        })
        .await?;
    Ok(())
}
