use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Product, ProductImage, ProductVariant};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ImageInput {
    pub url: String,
    pub alt_text: Option<String>,
    #[serde(default)]
    pub position: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VariantInput {
    pub size: Option<String>,
    pub color: Option<String>,
    pub price: Option<i64>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub stock: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: i64,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_sale: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub discount: i32,
    #[serde(default)]
    pub images: Vec<ImageInput>,
    #[serde(default)]
    pub variants: Vec<VariantInput>,
}

/// Partial update; `images`/`variants`, when present, replace the whole
/// owned set.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub stock: Option<i32>,
    pub is_new: Option<bool>,
    pub is_sale: Option<bool>,
    pub is_featured: Option<bool>,
    pub discount: Option<i32>,
    pub images: Option<Vec<ImageInput>>,
    pub variants: Option<Vec<VariantInput>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub images: Vec<ProductImage>,
    pub variants: Vec<ProductVariant>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}

/// Collections a product belongs to, as ids.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductCollections {
    pub product_id: Uuid,
    pub collection_ids: Vec<Uuid>,
}
