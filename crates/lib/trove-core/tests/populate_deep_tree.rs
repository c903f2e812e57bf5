//! End-to-end population over the self-referential hierarchy: categories
//! nest under categories to arbitrary depth, items hang off any level.

use std::sync::Arc;

use serde_json::{Value, json};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use trove_core::control::{ControlError, NewCategory, NewItem, TroveControlPlane};
use trove_core::populate::{
    PopulateError,
    PopulateOptions,
    PopulatedDocument,
    PopulatedRelation,
    PopulationPlan,
};
use trove_core::relation::{RelationDescriptor, RelationRegistry};
use trove_core::store::Filter;
use trove_store::models::Document;
use trove_store::schema::{
    FIELD_CATEGORY,
    FIELD_NAME,
    FIELD_PARENT,
    FIELD_TITLE,
    REL_CATEGORY,
    REL_ITEMS,
    REL_PARENT,
    REL_SUB_CATEGORIES,
    TABLE_CATEGORY,
    TABLE_ITEM,
    TYPE_CATEGORY,
    TYPE_ITEM,
};

fn self_ref_registry() -> RelationRegistry {
    RelationRegistry::builder()
        .entity(TYPE_CATEGORY, TABLE_CATEGORY)
        .entity(TYPE_ITEM, TABLE_ITEM)
        .relation(
            TYPE_CATEGORY,
            RelationDescriptor::reverse_many(REL_ITEMS, TYPE_ITEM, FIELD_CATEGORY)
                .with_sort_by(FIELD_NAME),
        )
        .relation(
            TYPE_CATEGORY,
            RelationDescriptor::reverse_many(REL_SUB_CATEGORIES, TYPE_CATEGORY, FIELD_PARENT)
                .with_sort_by(FIELD_TITLE),
        )
        .relation(
            TYPE_CATEGORY,
            RelationDescriptor::forward_one(REL_PARENT, FIELD_PARENT, TYPE_CATEGORY),
        )
        .relation(
            TYPE_ITEM,
            RelationDescriptor::forward_one(REL_CATEGORY, FIELD_CATEGORY, TYPE_CATEGORY),
        )
        .build()
        .expect("self-referential registry should build")
}

async fn build_control_plane(db_name: &str) -> TroveControlPlane<Db> {
    let db = Surreal::new::<Mem>(())
        .await
        .expect("failed to create in-memory surrealdb instance");
    db.use_ns("trove")
        .use_db(db_name)
        .await
        .expect("failed to select surrealdb namespace/db");
    TroveControlPlane::new(db, Arc::new(self_ref_registry()))
}

async fn create_category(
    control: &TroveControlPlane<Db>,
    title: &str,
    parent: Option<&str>,
) -> String {
    control
        .create_category(NewCategory {
            title: title.to_string(),
            parent: parent.map(String::from),
        })
        .await
        .expect("category create should succeed")
        .uid
}

async fn create_item(control: &TroveControlPlane<Db>, name: &str, category: &str) {
    control
        .create_item(NewItem {
            name: name.to_string(),
            category: category.to_string(),
            category_type: None,
        })
        .await
        .expect("item create should succeed");
}

/// Seeds the demo tree: a root with three items and two children;
/// the first child holds two items and two grandchildren (with two items
/// and one item), the second child holds one item and no children.
async fn seed(control: &TroveControlPlane<Db>) {
    let root = create_category(control, "Category", None).await;
    let child_1 = create_category(control, "sub-category-1", Some(&root)).await;
    let child_2 = create_category(control, "sub-category-2", Some(&root)).await;

    for name in ["root-item-1", "root-item-2", "root-item-3"] {
        create_item(control, name, &root).await;
    }
    create_item(control, "item-1", &child_1).await;
    create_item(control, "item-2", &child_1).await;
    create_item(control, "item-3", &child_2).await;

    let grandchild_1 = create_category(control, "sub-category-1-1", Some(&child_1)).await;
    let grandchild_2 = create_category(control, "sub-category-1-2", Some(&child_1)).await;
    create_item(control, "item-1-1", &grandchild_1).await;
    create_item(control, "item-2-1", &grandchild_1).await;
    create_item(control, "item-1-2", &grandchild_2).await;
}

fn many<'a>(document: &'a PopulatedDocument, name: &str) -> &'a [PopulatedDocument] {
    match document.relation(name) {
        Some(PopulatedRelation::Many(documents)) => documents,
        other => panic!("expected many-relation {name}, got {other:?}"),
    }
}

fn one<'a>(document: &'a PopulatedDocument, name: &str) -> Option<&'a PopulatedDocument> {
    match document.relation(name) {
        Some(PopulatedRelation::One(document)) => document.as_deref(),
        other => panic!("expected one-relation {name}, got {other:?}"),
    }
}

fn names(documents: &[PopulatedDocument], field: &str) -> Vec<String> {
    documents
        .iter()
        .map(|document| {
            document
                .field(field)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

fn object(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture must be an object, got {other}"),
    }
}

#[tokio::test]
async fn self_referential_scenario_reproduces_the_full_shape() {
    let control = build_control_plane("deep_tree_scenario").await;
    seed(&control).await;

    let plan = PopulationPlan::from_paths([
        "items",
        "sub_categories.items",
        "sub_categories.sub_categories.items",
    ]);
    let options = PopulateOptions::new(3);
    let roots = control
        .populate(
            TYPE_CATEGORY,
            &Filter::new().absent(FIELD_PARENT),
            &plan,
            &options,
        )
        .await
        .expect("populate should succeed");

    assert_eq!(roots.len(), 1);
    let root = &roots[0];
    assert_eq!(root.field(FIELD_TITLE), Some(&json!("Category")));
    assert_eq!(
        names(many(root, REL_ITEMS), FIELD_NAME),
        ["root-item-1", "root-item-2", "root-item-3"]
    );

    let children = many(root, REL_SUB_CATEGORIES);
    assert_eq!(
        names(children, FIELD_TITLE),
        ["sub-category-1", "sub-category-2"]
    );

    let child_1 = &children[0];
    assert_eq!(names(many(child_1, REL_ITEMS), FIELD_NAME), ["item-1", "item-2"]);
    let grandchildren = many(child_1, REL_SUB_CATEGORIES);
    assert_eq!(
        names(grandchildren, FIELD_TITLE),
        ["sub-category-1-1", "sub-category-1-2"]
    );
    assert_eq!(
        names(many(&grandchildren[0], REL_ITEMS), FIELD_NAME),
        ["item-1-1", "item-2-1"]
    );
    assert_eq!(
        names(many(&grandchildren[1], REL_ITEMS), FIELD_NAME),
        ["item-1-2"]
    );
    // The plan stops at the grandchildren: their own subcategories are not
    // expanded at all.
    assert!(grandchildren[0].relation(REL_SUB_CATEGORIES).is_none());

    let child_2 = &children[1];
    assert_eq!(names(many(child_2, REL_ITEMS), FIELD_NAME), ["item-3"]);
    assert!(many(child_2, REL_SUB_CATEGORIES).is_empty());
}

#[tokio::test]
async fn cyclic_parent_chain_terminates_with_plan_too_deep() {
    let control = build_control_plane("deep_tree_cycle").await;

    // Two categories that are each other's parent: invalid data the store
    // cannot rule out. The depth bound must still hold.
    control
        .store()
        .create(
            TABLE_CATEGORY,
            object(json!({"uid": "a", "title": "a", "parent": "b"})),
        )
        .await
        .expect("category create should succeed");
    control
        .store()
        .create(
            TABLE_CATEGORY,
            object(json!({"uid": "b", "title": "b", "parent": "a"})),
        )
        .await
        .expect("category create should succeed");

    let plan = PopulationPlan::from_paths([
        "sub_categories.sub_categories.sub_categories.sub_categories.sub_categories",
    ]);
    let options = PopulateOptions::new(3);
    let err = control
        .populate(TYPE_CATEGORY, &Filter::new(), &plan, &options)
        .await
        .unwrap_err();

    let ControlError::Populate(PopulateError::PlanTooDeep { depth, max_depth }) = err else {
        panic!("expected PlanTooDeep, got {err}");
    };
    assert_eq!(depth, 5);
    assert_eq!(max_depth, 3);
}

#[tokio::test]
async fn plan_depth_at_the_bound_is_allowed() {
    let control = build_control_plane("deep_tree_at_bound").await;
    seed(&control).await;

    let plan = PopulationPlan::from_paths(["sub_categories.sub_categories.items"]);
    let options = PopulateOptions::new(3);
    control
        .populate(
            TYPE_CATEGORY,
            &Filter::new().absent(FIELD_PARENT),
            &plan,
            &options,
        )
        .await
        .expect("plan at the depth bound should populate");
}

#[tokio::test]
async fn forward_parent_expansion_clones_shared_targets() {
    let control = build_control_plane("deep_tree_parent").await;
    let root = create_category(&control, "Category", None).await;
    create_category(&control, "sub-category-1", Some(&root)).await;
    create_category(&control, "sub-category-2", Some(&root)).await;

    let plan = PopulationPlan::new().relation(REL_PARENT);
    let options = PopulateOptions::new(1);
    let children = control
        .populate(
            TYPE_CATEGORY,
            &Filter::new().eq(FIELD_PARENT, root.as_str()),
            &plan,
            &options,
        )
        .await
        .expect("populate should succeed");

    assert_eq!(children.len(), 2);
    for child in &children {
        let parent = one(child, REL_PARENT).expect("parent should resolve");
        assert_eq!(parent.uid(), Some(root.as_str()));
        assert_eq!(parent.field(FIELD_TITLE), Some(&json!("Category")));
    }

    // The populated parent replaces the raw foreign key in the output.
    let rendered = serde_json::to_value(&children).expect("result should serialize");
    assert!(rendered[0][FIELD_PARENT].is_object());
}

#[tokio::test]
async fn unknown_root_type_is_rejected() {
    let control = build_control_plane("deep_tree_unknown_root").await;

    let plan = PopulationPlan::new().relation(REL_ITEMS);
    let options = PopulateOptions::new(1);
    let err = control
        .populate("Warehouse", &Filter::new(), &plan, &options)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ControlError::Populate(PopulateError::UnknownEntityType { .. })
    ));
}

#[tokio::test]
async fn clear_all_empties_every_declared_table() {
    let control = build_control_plane("deep_tree_clear").await;
    seed(&control).await;

    let removed = control.clear_all().await.expect("clear should succeed");
    assert_eq!(removed, 14);

    let categories = control
        .categories(&Filter::new())
        .await
        .expect("listing should succeed");
    assert!(categories.is_empty());
    let items = control.items(&Filter::new()).await.expect("listing should succeed");
    assert!(items.is_empty());
}
