use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::hierarchy::MenuNode;
use crate::models::MegaMenuItem;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMenuItemRequest {
    pub collection_id: Uuid,
    pub parent_menu_item_id: Option<Uuid>,
    #[serde(default)]
    pub position: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub display_subcollections: bool,
}

fn default_true() -> bool {
    true
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<Uuid>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Uuid>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMenuItemRequest {
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub parent_menu_item_id: Option<Option<Uuid>>,
    pub position: Option<i32>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub display_subcollections: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReorderEntry {
    pub id: Uuid,
    pub position: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReorderMenuRequest {
    pub items: Vec<ReorderEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuItemList {
    pub items: Vec<MegaMenuItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuTree {
    pub items: Vec<MenuNode>,
}
