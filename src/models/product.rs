use crate::entities::product_entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[schema(example = "Engineering Drawing Kit")]
    pub name: String,
    #[schema(example = "Complete kit, barely used, includes mini drafter.")]
    pub description: String,
    /// Price in paise.
    #[schema(example = 45000)]
    pub price: i64,
    #[schema(example = "stationery")]
    pub category: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub seller_id: Option<i64>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImageUploadQuery {
    #[schema(example = "png")]
    pub ext: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: i64,
    pub seller_id: i64,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub category: String,
    pub image_data: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Listing row for browse and search pages. The image payload stays out of
/// these rows; clients fetch it from the product detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: i64,
    pub seller_id: i64,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub category: String,
    pub has_image: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailResponse {
    pub id: i64,
    pub seller_id: i64,
    pub seller_name: String,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub category: String,
    pub image_data: Option<String>,
    pub is_active: bool,
    pub average_rating: Option<f64>,
    pub review_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<product_entity::Model> for ProductResponse {
    fn from(m: product_entity::Model) -> Self {
        Self {
            id: m.id,
            seller_id: m.seller_id,
            name: m.name,
            description: m.description,
            price: m.price,
            category: m.category,
            image_data: m.image_data,
            is_active: m.is_active,
            created_at: m.created_at.unwrap_or_else(Utc::now),
        }
    }
}

impl From<product_entity::Model> for ProductSummary {
    fn from(m: product_entity::Model) -> Self {
        Self {
            id: m.id,
            seller_id: m.seller_id,
            name: m.name,
            description: m.description,
            price: m.price,
            category: m.category,
            has_image: m.image_data.is_some(),
            is_active: m.is_active,
            created_at: m.created_at.unwrap_or_else(Utc::now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_rows_carry_no_image_payload() {
        let model = product_entity::Model {
            id: 12,
            seller_id: 3,
            name: "Scientific calculator".to_string(),
            description: "Casio FX-991, lightly used".to_string(),
            price: 45000,
            category: "electronics".to_string(),
            image_data: Some(format!("data:image/png;base64,{}", "A".repeat(4096))),
            is_active: true,
            created_at: None,
            updated_at: None,
        };

        let summary = ProductSummary::from(model);
        assert!(summary.has_image);

        let value = serde_json::to_value(&summary).unwrap();
        assert!(value.get("imageData").is_none());
        assert_eq!(value.get("hasImage"), Some(&serde_json::Value::Bool(true)));
    }
}
