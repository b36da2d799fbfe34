use crate::entities::review_entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    #[schema(example = 42)]
    pub product_id: i64,
    #[schema(example = 5)]
    pub rating: i16,
    #[schema(example = "Exactly as described, quick handover.")]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: i64,
    pub product_id: i64,
    pub reviewer_id: i64,
    pub reviewer_name: String,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<review_entity::Model> for ReviewResponse {
    fn from(m: review_entity::Model) -> Self {
        Self {
            id: m.id,
            product_id: m.product_id,
            reviewer_id: m.reviewer_id,
            reviewer_name: String::new(), // resolved with a separate lookup
            rating: m.rating,
            comment: m.comment,
            created_at: m.created_at.unwrap_or_else(Utc::now),
        }
    }
}
