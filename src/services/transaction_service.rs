use crate::entities::{
    order_entity, order_item_entity, transaction_entity, OrderStatus, TransactionStatus,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

const MAX_TXN_REF_LEN: usize = 64;

#[derive(Clone)]
pub struct TransactionService {
    pool: DatabaseConnection,
}

impl TransactionService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// Buyer records how an order is being paid. Payments happen outside the
    /// platform (cash or UPI at handover), so this only keeps the ledger.
    pub async fn record_payment(
        &self,
        buyer_id: i64,
        request: RecordPaymentRequest,
    ) -> AppResult<TransactionResponse> {
        let order = order_entity::Entity::find_by_id(request.order_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
        if order.buyer_id != buyer_id {
            return Err(AppError::Forbidden(
                "Only the buyer can record a payment".to_string(),
            ));
        }
        if order.status == OrderStatus::Cancelled {
            return Err(AppError::Conflict(
                "Cancelled orders cannot be paid".to_string(),
            ));
        }

        let amount = resolve_amount(request.amount, order.total_amount)?;

        // One live record per order; only a failed attempt frees a retry.
        // The partial unique index on order_id closes the race this check
        // leaves open between two concurrent inserts.
        let existing = transaction_entity::Entity::find()
            .filter(transaction_entity::Column::OrderId.eq(order.id))
            .all(&self.pool)
            .await?;
        if existing.iter().any(|t| t.status.is_live()) {
            return Err(AppError::Conflict(
                "Order already has an active payment record".to_string(),
            ));
        }

        let txn_ref = match request.txn_ref {
            Some(supplied) => {
                let trimmed = supplied.trim().to_string();
                if trimmed.is_empty() || trimmed.chars().count() > MAX_TXN_REF_LEN {
                    return Err(AppError::ValidationError(format!(
                        "Transaction reference must be between 1 and {MAX_TXN_REF_LEN} characters"
                    )));
                }
                let taken = transaction_entity::Entity::find()
                    .filter(transaction_entity::Column::TxnRef.eq(trimmed.clone()))
                    .count(&self.pool)
                    .await?;
                if taken > 0 {
                    return Err(AppError::Conflict(
                        "Transaction reference is already used".to_string(),
                    ));
                }
                trimmed
            }
            None => Uuid::new_v4().to_string(),
        };

        let inserted = transaction_entity::ActiveModel {
            order_id: Set(order.id),
            txn_ref: Set(txn_ref),
            amount: Set(amount),
            status: Set(TransactionStatus::Pending),
            payment_method: Set(request.payment_method),
            ..Default::default()
        }
        .insert(&self.pool)
        .await;
        let transaction = match inserted {
            Ok(transaction) => transaction,
            Err(err) => {
                return Err(match err.sql_err() {
                    Some(SqlErr::UniqueConstraintViolation(message)) => {
                        unique_conflict(&message)
                    }
                    _ => err.into(),
                });
            }
        };

        log::info!(
            "Recorded {} payment {} for order {}",
            transaction.payment_method,
            transaction.txn_ref,
            order.id
        );
        Ok(TransactionResponse::from(transaction))
    }

    /// Payment history of one order, visible to the buyer and its sellers.
    pub async fn list_for_order(
        &self,
        user_id: i64,
        order_id: i64,
    ) -> AppResult<Vec<TransactionResponse>> {
        let order = order_entity::Entity::find_by_id(order_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        if order.buyer_id != user_id {
            let sold = order_item_entity::Entity::find()
                .filter(order_item_entity::Column::OrderId.eq(order_id))
                .filter(order_item_entity::Column::SellerId.eq(user_id))
                .count(&self.pool)
                .await?;
            if sold == 0 {
                return Err(AppError::Forbidden(
                    "You are not a party to this order".to_string(),
                ));
            }
        }

        let transactions = transaction_entity::Entity::find()
            .filter(transaction_entity::Column::OrderId.eq(order_id))
            .order_by_desc(transaction_entity::Column::CreatedAt)
            .all(&self.pool)
            .await?;

        Ok(transactions
            .into_iter()
            .map(TransactionResponse::from)
            .collect())
    }

    /// Completes the pending payment record once delivery was verified.
    /// No-op for orders paid in cash without a recorded transaction.
    pub async fn settle_for_order(&self, order_id: i64) -> AppResult<()> {
        match self.find_pending(order_id).await? {
            Some(transaction) => self.transition(transaction, TransactionStatus::Completed).await,
            None => Ok(()),
        }
    }

    /// Fails the pending payment record when the order is cancelled.
    pub async fn fail_pending_for_order(&self, order_id: i64) -> AppResult<()> {
        match self.find_pending(order_id).await? {
            Some(transaction) => self.transition(transaction, TransactionStatus::Failed).await,
            None => Ok(()),
        }
    }

    async fn find_pending(
        &self,
        order_id: i64,
    ) -> AppResult<Option<transaction_entity::Model>> {
        let pending = transaction_entity::Entity::find()
            .filter(transaction_entity::Column::OrderId.eq(order_id))
            .filter(transaction_entity::Column::Status.eq(TransactionStatus::Pending))
            .one(&self.pool)
            .await?;
        Ok(pending)
    }

    /// Single mutation path for transaction status. The update is keyed on
    /// the observed status, so a concurrent transition makes this a no-op.
    async fn transition(
        &self,
        transaction: transaction_entity::Model,
        next: TransactionStatus,
    ) -> AppResult<()> {
        if !transaction.status.can_transition_to(&next) {
            return Err(AppError::Conflict(format!(
                "Payment {} cannot move from {} to {}",
                transaction.txn_ref, transaction.status, next
            )));
        }

        let result = transaction_entity::Entity::update_many()
            .set(transaction_entity::ActiveModel {
                status: Set(next.clone()),
                updated_at: Set(Some(Utc::now())),
                ..Default::default()
            })
            .filter(transaction_entity::Column::Id.eq(transaction.id))
            .filter(transaction_entity::Column::Status.eq(transaction.status.clone()))
            .exec(&self.pool)
            .await?;
        if result.rows_affected > 0 {
            log::info!("Payment {} moved to {}", transaction.txn_ref, next);
        } else {
            log::warn!(
                "Payment {} changed concurrently, skipped move to {}",
                transaction.txn_ref,
                next
            );
        }
        Ok(())
    }
}

/// Picks the conflict for a unique violation raised on insert. The partial
/// order_id index admits one live payment row per order; the only other
/// unique column on the table is txn_ref.
fn unique_conflict(message: &str) -> AppError {
    if message.contains("idx_transactions_order_live") {
        AppError::Conflict("Order already has an active payment record".to_string())
    } else {
        AppError::Conflict("Transaction reference is already used".to_string())
    }
}

/// A payment is recorded over the full order total. A supplied amount must
/// match it exactly; an omitted amount takes it.
fn resolve_amount(requested: Option<i64>, order_total: i64) -> AppResult<i64> {
    let amount = requested.unwrap_or(order_total);
    if amount != order_total {
        return Err(AppError::ValidationError(format!(
            "Amount {amount} does not match the order total {order_total}"
        )));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_must_match_order_total() {
        assert_eq!(resolve_amount(Some(45000), 45000).unwrap(), 45000);
        assert_eq!(resolve_amount(None, 45000).unwrap(), 45000);
        assert!(resolve_amount(Some(44999), 45000).is_err());
        assert!(resolve_amount(Some(0), 45000).is_err());
    }

    #[test]
    fn test_racing_payment_insert_maps_to_conflict() {
        let err = unique_conflict(
            "duplicate key value violates unique constraint \"idx_transactions_order_live\"",
        );
        assert!(matches!(err, AppError::Conflict(ref m) if m.contains("active payment record")));

        let err = unique_conflict(
            "duplicate key value violates unique constraint \"transactions_txn_ref_key\"",
        );
        assert!(matches!(err, AppError::Conflict(ref m) if m.contains("reference")));
    }

    #[test]
    fn test_transition_guard_matrix() {
        use TransactionStatus::*;

        assert!(Pending.can_transition_to(&Completed));
        assert!(Pending.can_transition_to(&Failed));
        assert!(Completed.can_transition_to(&Refunded));

        assert!(!Pending.can_transition_to(&Refunded));
        assert!(!Completed.can_transition_to(&Failed));
        assert!(!Failed.can_transition_to(&Pending));
        assert!(!Refunded.can_transition_to(&Completed));
    }

    #[test]
    fn test_only_failed_frees_the_order() {
        use TransactionStatus::*;

        assert!(Pending.is_live());
        assert!(Completed.is_live());
        assert!(!Failed.is_live());
        assert!(!Refunded.is_live());
    }
}
