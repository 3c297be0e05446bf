use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::hierarchy::CollectionNode;
use crate::models::Collection;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCollectionRequest {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    #[serde(default = "default_collection_type")]
    pub collection_type: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    pub image_url: Option<String>,
}

fn default_collection_type() -> String {
    "custom".to_string()
}

fn default_true() -> bool {
    true
}

/// Distinguishes "field absent" from "explicit null" so a collection can be
/// detached from its parent by sending `"parent_id": null`.
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<Uuid>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Uuid>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCollectionRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub parent_id: Option<Option<Uuid>>,
    pub collection_type: Option<String>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub image_url: Option<String>,
}

/// Batch membership update for one collection.
///
/// With `full_update`, `product_ids` is the complete desired direct
/// membership: missing ids are removed, new ids are added (and propagated to
/// ancestors). Without it, the ids are simply added.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CollectionProductsRequest {
    pub product_ids: Vec<Uuid>,
    #[serde(default)]
    pub full_update: bool,
    /// When removing (only meaningful with `full_update`), also delete the
    /// membership from every ancestor collection.
    #[serde(default)]
    pub remove_from_parents: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveProductParams {
    #[serde(default)]
    pub remove_from_parents: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CollectionList {
    pub items: Vec<Collection>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CollectionTree {
    pub items: Vec<CollectionNode>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MembershipChange {
    pub collection_id: Uuid,
    pub added: i64,
    pub removed: i64,
}
