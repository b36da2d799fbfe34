use crate::entities::{order_entity, OrderStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Which side of an order the caller wants to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ViewerRole {
    Buyer,
    Seller,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItemRequest {
    #[schema(example = 42)]
    pub product_id: i64,
    #[schema(example = 1)]
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItemRequest>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyDeliveryRequest {
    #[schema(example = 17)]
    pub order_id: i64,
    #[schema(example = "482913")]
    pub otp: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    pub role: Option<ViewerRole>,
    pub status: Option<OrderStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product_id: i64,
    pub product_name: String,
    pub seller_id: i64,
    pub seller_name: String,
    pub quantity: i32,
    pub unit_price: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: i64,
    pub status: OrderStatus,
    pub total_amount: i64,
    pub items: Vec<OrderItemResponse>,
    /// Present only in the buyer view while the order is still open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
    /// Present only in the seller view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer_name: Option<String>,
    pub can_verify: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<order_entity::Model> for OrderResponse {
    fn from(m: order_entity::Model) -> Self {
        Self {
            id: m.id,
            status: m.status,
            total_amount: m.total_amount,
            items: Vec::new(),
            otp: None,
            buyer_name: None,
            can_verify: false,
            delivered_at: m.delivered_at,
            created_at: m.created_at.unwrap_or_else(Utc::now),
        }
    }
}
