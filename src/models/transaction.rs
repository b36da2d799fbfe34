use crate::entities::{transaction_entity, PaymentMethod, TransactionStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentRequest {
    #[schema(example = 17)]
    pub order_id: i64,
    pub payment_method: PaymentMethod,
    /// Must equal the order total when supplied.
    #[schema(example = 45000)]
    pub amount: Option<i64>,
    /// Client-supplied reference, for example a UPI transaction id.
    #[schema(example = "UPI-4821-XK")]
    pub txn_ref: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    pub order_id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: i64,
    pub order_id: i64,
    pub txn_ref: String,
    pub amount: i64,
    pub status: TransactionStatus,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

impl From<transaction_entity::Model> for TransactionResponse {
    fn from(m: transaction_entity::Model) -> Self {
        Self {
            id: m.id,
            order_id: m.order_id,
            txn_ref: m.txn_ref,
            amount: m.amount,
            status: m.status,
            payment_method: m.payment_method,
            created_at: m.created_at.unwrap_or_else(Utc::now),
        }
    }
}
