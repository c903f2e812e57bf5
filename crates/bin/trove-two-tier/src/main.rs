//! Fixed two-tier hierarchy demo.
//!
//! Seeds one category holding three direct items and one subcategory with
//! two items, where each item references its owner polymorphically, then
//! populates `items` and `sub_categories.items` and prints the nested tree.

mod config;
mod registry;

use std::sync::Arc;

use surrealdb::engine::any::Any;
use trove_core::control::{ControlError, NewCategory, NewItem, NewSubCategory, TroveControlPlane};
use trove_core::populate::{PopulateOptions, PopulationPlan};
use trove_core::store::Filter;
use trove_store::schema::{REL_ITEMS, TYPE_CATEGORY, TYPE_SUB_CATEGORY};

use crate::config::DemoConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = DemoConfig::from_args()?;
    let db = registry::connect(&config).await?;
    let relations = Arc::new(registry::build_registry()?);
    let control = TroveControlPlane::new(db, relations);

    control.clear_all().await?;
    seed(&control).await?;

    let plan = PopulationPlan::from_paths([REL_ITEMS, "sub_categories.items"]);
    let options = PopulateOptions::new(config.max_depth).with_timeout(config.store_timeout);
    let categories = control
        .populate(TYPE_CATEGORY, &Filter::new(), &plan, &options)
        .await?;

    let output = if config.compact {
        serde_json::to_string(&categories)?
    } else {
        serde_json::to_string_pretty(&categories)?
    };
    println!("{output}");
    Ok(())
}

async fn seed(control: &TroveControlPlane<Any>) -> Result<(), ControlError> {
    let category = control
        .create_category(NewCategory {
            title: "Category".to_string(),
            parent: None,
        })
        .await?;
    let sub_category = control
        .create_sub_category(NewSubCategory {
            title: "sub-category-1".to_string(),
            parent: category.uid.clone(),
        })
        .await?;

    for name in ["root-item-1", "root-item-2", "root-item-3"] {
        control
            .create_item(NewItem {
                name: name.to_string(),
                category: category.uid.clone(),
                category_type: Some(TYPE_CATEGORY.to_string()),
            })
            .await?;
    }
    for name in ["item-1", "item-2"] {
        control
            .create_item(NewItem {
                name: name.to_string(),
                category: sub_category.uid.clone(),
                category_type: Some(TYPE_SUB_CATEGORY.to_string()),
            })
            .await?;
    }
    Ok(())
}
