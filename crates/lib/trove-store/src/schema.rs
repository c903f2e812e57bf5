pub const TABLE_CATEGORY: &str = "category";
pub const TABLE_SUB_CATEGORY: &str = "sub_category";
pub const TABLE_ITEM: &str = "item";

pub const TYPE_CATEGORY: &str = "Category";
pub const TYPE_SUB_CATEGORY: &str = "SubCategory";
pub const TYPE_ITEM: &str = "Item";

pub const FIELD_UID: &str = "uid";
pub const FIELD_TITLE: &str = "title";
pub const FIELD_NAME: &str = "name";
pub const FIELD_PARENT: &str = "parent";
pub const FIELD_CATEGORY: &str = "category";
pub const FIELD_CATEGORY_TYPE: &str = "category_type";
pub const FIELD_CREATED_AT: &str = "created_at";

pub const REL_ITEMS: &str = "items";
pub const REL_SUB_CATEGORIES: &str = "sub_categories";
pub const REL_PARENT: &str = "parent";
pub const REL_CATEGORY: &str = "category";
