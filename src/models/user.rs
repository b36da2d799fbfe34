use crate::entities::user_entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[schema(example = "Rahul")]
    pub first_name: String,
    #[schema(example = "Sharma")]
    pub last_name: String,
    #[schema(example = "rahul.sharma@campus.edu")]
    pub email: String,
    #[schema(example = "Secur3!pass")]
    pub password: String,
    #[schema(example = 21)]
    pub age: i32,
    #[schema(example = "9876543210")]
    pub contact_number: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "rahul.sharma@campus.edu")]
    pub email: String,
    #[schema(example = "Secur3!pass")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[schema(example = "Rahul")]
    pub first_name: Option<String>,
    #[schema(example = "Sharma")]
    pub last_name: Option<String>,
    #[schema(example = "9876543210")]
    pub contact_number: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: i32,
    pub contact_number: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregate counters shown on the profile page.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStatistics {
    pub orders_placed: i64,
    pub total_spent: i64,
    pub items_sold: i64,
    pub total_earned: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

impl From<user_entity::Model> for UserResponse {
    fn from(user: user_entity::Model) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            age: user.age,
            contact_number: user.contact_number,
            created_at: user.created_at.unwrap_or_else(Utc::now),
        }
    }
}
