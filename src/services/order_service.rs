use crate::entities::{order_entity, order_item_entity, product_entity, user_entity, OrderStatus};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::TransactionService;
use crate::utils::generate_otp;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::HashMap;

const MAX_CART_LINES: usize = 20;
const MAX_ITEM_QUANTITY: i32 = 10;

#[derive(Clone)]
pub struct OrderService {
    pool: DatabaseConnection,
    transaction_service: TransactionService,
}

impl OrderService {
    pub fn new(pool: DatabaseConnection) -> Self {
        let transaction_service = TransactionService::new(pool.clone());
        Self {
            pool,
            transaction_service,
        }
    }

    /// Places an order for the given cart. Prices are snapshotted into the
    /// line items, and a fresh delivery OTP is attached to the order.
    pub async fn checkout(
        &self,
        buyer_id: i64,
        request: CheckoutRequest,
    ) -> AppResult<OrderResponse> {
        let lines = merge_cart_lines(&request.items)?;

        let product_ids: Vec<i64> = lines.iter().map(|(id, _)| *id).collect();
        let products = product_entity::Entity::find()
            .filter(product_entity::Column::Id.is_in(product_ids))
            .all(&self.pool)
            .await?;
        let by_id: HashMap<i64, product_entity::Model> =
            products.into_iter().map(|p| (p.id, p)).collect();

        let mut priced: Vec<(product_entity::Model, i32)> = Vec::with_capacity(lines.len());
        let mut total: i64 = 0;
        for (product_id, quantity) in lines {
            let product = by_id
                .get(&product_id)
                .filter(|p| p.is_active)
                .ok_or_else(|| AppError::NotFound(format!("Product {product_id} not found")))?;
            if product.seller_id == buyer_id {
                return Err(AppError::ValidationError(
                    "You cannot order your own listing".to_string(),
                ));
            }
            total = add_line_total(total, product.price, quantity)?;
            priced.push((product.clone(), quantity));
        }

        let otp = generate_otp();

        let txn = self.pool.begin().await?;
        let order = order_entity::ActiveModel {
            buyer_id: Set(buyer_id),
            total_amount: Set(total),
            status: Set(OrderStatus::Pending),
            otp_code: Set(Some(otp)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        for (product, quantity) in &priced {
            order_item_entity::ActiveModel {
                order_id: Set(order.id),
                product_id: Set(product.id),
                seller_id: Set(product.seller_id),
                quantity: Set(*quantity),
                unit_price: Set(product.price),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
        txn.commit().await?;

        log::info!(
            "User {} placed order {} ({} paise, {} lines)",
            buyer_id,
            order.id,
            total,
            priced.len()
        );
        self.get_order(buyer_id, order.id).await
    }

    pub async fn list_orders(
        &self,
        user_id: i64,
        query: &OrderQuery,
    ) -> AppResult<PaginatedResponse<OrderResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);
        let role = query.role.unwrap_or(ViewerRole::Buyer);

        let mut cond = Condition::all();
        match role {
            ViewerRole::Buyer => {
                cond = cond.add(order_entity::Column::BuyerId.eq(user_id));
            }
            ViewerRole::Seller => {
                let sold = order_item_entity::Entity::find()
                    .filter(order_item_entity::Column::SellerId.eq(user_id))
                    .all(&self.pool)
                    .await?;
                let mut ids: Vec<i64> = sold.into_iter().map(|i| i.order_id).collect();
                ids.sort_unstable();
                ids.dedup();
                if ids.is_empty() {
                    return Ok(PaginatedResponse::new(
                        Vec::new(),
                        params.get_page(),
                        params.get_limit(),
                        0,
                    ));
                }
                cond = cond.add(order_entity::Column::Id.is_in(ids));
            }
        }
        if let Some(status) = query.status.clone() {
            cond = cond.add(order_entity::Column::Status.eq(status));
        }

        #[derive(Debug, sea_orm::FromQueryResult)]
        struct CountRow {
            count: i64,
        }
        let total = order_entity::Entity::find()
            .filter(cond.clone())
            .select_only()
            .column_as(Expr::val(1).count(), "count")
            .into_model::<CountRow>()
            .one(&self.pool)
            .await?
            .map(|r| r.count)
            .unwrap_or(0);

        let orders = order_entity::Entity::find()
            .filter(cond)
            .order_by_desc(order_entity::Column::CreatedAt)
            .offset(params.get_offset() as u64)
            .limit(params.get_limit() as u64)
            .all(&self.pool)
            .await?;

        let views = self.assemble_views(orders, user_id, role).await?;

        Ok(PaginatedResponse::new(
            views,
            params.get_page(),
            params.get_limit(),
            total,
        ))
    }

    pub async fn get_order(&self, user_id: i64, order_id: i64) -> AppResult<OrderResponse> {
        let order = order_entity::Entity::find_by_id(order_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        let role = if order.buyer_id == user_id {
            ViewerRole::Buyer
        } else if self.seller_item_count(user_id, order_id).await? > 0 {
            ViewerRole::Seller
        } else {
            return Err(AppError::Forbidden(
                "You are not a party to this order".to_string(),
            ));
        };

        let mut views = self.assemble_views(vec![order], user_id, role).await?;
        views
            .pop()
            .ok_or_else(|| AppError::InternalError("Order view missing".to_string()))
    }

    /// Seller acknowledgment that the order was seen and is being prepared.
    pub async fn confirm_order(&self, seller_id: i64, order_id: i64) -> AppResult<OrderResponse> {
        order_entity::Entity::find_by_id(order_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
        if self.seller_item_count(seller_id, order_id).await? == 0 {
            return Err(AppError::Forbidden(
                "You are not a seller in this order".to_string(),
            ));
        }

        let result = order_entity::Entity::update_many()
            .set(order_entity::ActiveModel {
                status: Set(OrderStatus::Confirmed),
                updated_at: Set(Some(Utc::now())),
                ..Default::default()
            })
            .filter(order_entity::Column::Id.eq(order_id))
            .filter(order_entity::Column::Status.eq(OrderStatus::Pending))
            .exec(&self.pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::Conflict("Order is not pending".to_string()));
        }

        self.get_order(seller_id, order_id).await
    }

    /// Buyer cancellation. Allowed while the order is still open; voids the
    /// OTP and fails any pending payment record.
    pub async fn cancel_order(&self, buyer_id: i64, order_id: i64) -> AppResult<OrderResponse> {
        let order = order_entity::Entity::find_by_id(order_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
        if order.buyer_id != buyer_id {
            return Err(AppError::Forbidden(
                "Only the buyer can cancel this order".to_string(),
            ));
        }

        let result = order_entity::Entity::update_many()
            .set(order_entity::ActiveModel {
                status: Set(OrderStatus::Cancelled),
                otp_code: Set(None),
                updated_at: Set(Some(Utc::now())),
                ..Default::default()
            })
            .filter(order_entity::Column::Id.eq(order_id))
            .filter(
                order_entity::Column::Status
                    .is_in([OrderStatus::Pending, OrderStatus::Confirmed]),
            )
            .exec(&self.pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::Conflict(
                "Order can no longer be cancelled".to_string(),
            ));
        }

        self.transaction_service
            .fail_pending_for_order(order_id)
            .await?;

        log::info!("User {} cancelled order {}", buyer_id, order_id);
        self.get_order(buyer_id, order_id).await
    }

    /// Seller-side delivery verification. The buyer reads the OTP out at
    /// handover; a correct code moves the order to delivered and consumes the
    /// code in one conditional update, so a second attempt always fails.
    pub async fn verify_delivery(
        &self,
        seller_id: i64,
        request: VerifyDeliveryRequest,
    ) -> AppResult<OrderResponse> {
        let submitted = request.otp.trim().to_string();

        let order = order_entity::Entity::find_by_id(request.order_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
        if self.seller_item_count(seller_id, order.id).await? == 0 {
            return Err(AppError::Forbidden(
                "You are not a seller in this order".to_string(),
            ));
        }
        if !delivery_code_matches(&order.status, order.otp_code.as_deref(), &submitted) {
            return Err(AppError::InvalidCode);
        }

        let now = Utc::now();
        let result = order_entity::Entity::update_many()
            .set(order_entity::ActiveModel {
                status: Set(OrderStatus::Delivered),
                otp_code: Set(None),
                delivered_at: Set(Some(now)),
                updated_at: Set(Some(now)),
                ..Default::default()
            })
            .filter(order_entity::Column::Id.eq(order.id))
            .filter(
                order_entity::Column::Status
                    .is_in([OrderStatus::Pending, OrderStatus::Confirmed]),
            )
            .filter(order_entity::Column::OtpCode.eq(submitted))
            .exec(&self.pool)
            .await?;
        // Zero rows means a concurrent attempt won the race
        if result.rows_affected == 0 {
            return Err(AppError::InvalidCode);
        }

        self.transaction_service.settle_for_order(order.id).await?;

        log::info!("Order {} delivered, verified by seller {}", order.id, seller_id);
        self.get_order(seller_id, order.id).await
    }

    async fn seller_item_count(&self, seller_id: i64, order_id: i64) -> AppResult<i64> {
        #[derive(Debug, sea_orm::FromQueryResult)]
        struct CountRow {
            count: i64,
        }
        let count = order_item_entity::Entity::find()
            .filter(order_item_entity::Column::OrderId.eq(order_id))
            .filter(order_item_entity::Column::SellerId.eq(seller_id))
            .select_only()
            .column_as(Expr::val(1).count(), "count")
            .into_model::<CountRow>()
            .one(&self.pool)
            .await?
            .map(|r| r.count)
            .unwrap_or(0);
        Ok(count)
    }

    /// Builds role-shaped views with batched lookups. Buyers see every line
    /// plus the OTP while the order is open; sellers see only their own lines,
    /// the buyer's name, and their subtotal, never the OTP.
    async fn assemble_views(
        &self,
        orders: Vec<order_entity::Model>,
        viewer_id: i64,
        role: ViewerRole,
    ) -> AppResult<Vec<OrderResponse>> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }
        let order_ids: Vec<i64> = orders.iter().map(|o| o.id).collect();

        let mut items_query = order_item_entity::Entity::find()
            .filter(order_item_entity::Column::OrderId.is_in(order_ids))
            .order_by_asc(order_item_entity::Column::Id);
        if role == ViewerRole::Seller {
            items_query = items_query.filter(order_item_entity::Column::SellerId.eq(viewer_id));
        }
        let items = items_query.all(&self.pool).await?;

        let mut product_ids: Vec<i64> = items.iter().map(|i| i.product_id).collect();
        product_ids.sort_unstable();
        product_ids.dedup();
        let product_names: HashMap<i64, String> = product_entity::Entity::find()
            .filter(product_entity::Column::Id.is_in(product_ids))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();

        let mut user_ids: Vec<i64> = items.iter().map(|i| i.seller_id).collect();
        if role == ViewerRole::Seller {
            user_ids.extend(orders.iter().map(|o| o.buyer_id));
        }
        user_ids.sort_unstable();
        user_ids.dedup();
        let user_names: HashMap<i64, String> = user_entity::Entity::find()
            .filter(user_entity::Column::Id.is_in(user_ids))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|u| (u.id, u.full_name()))
            .collect();

        let mut grouped: HashMap<i64, Vec<OrderItemResponse>> = HashMap::new();
        for item in items {
            let view = OrderItemResponse {
                product_id: item.product_id,
                product_name: product_names
                    .get(&item.product_id)
                    .cloned()
                    .unwrap_or_default(),
                seller_id: item.seller_id,
                seller_name: user_names.get(&item.seller_id).cloned().unwrap_or_default(),
                quantity: item.quantity,
                unit_price: item.unit_price,
            };
            grouped.entry(item.order_id).or_default().push(view);
        }

        let mut views = Vec::with_capacity(orders.len());
        for order in orders {
            let is_open = order.status.is_open();
            let buyer_id = order.buyer_id;
            let otp = order.otp_code.clone();
            let mut view = OrderResponse::from(order);
            view.items = grouped.remove(&view.id).unwrap_or_default();
            match role {
                ViewerRole::Buyer => {
                    if is_open {
                        view.otp = otp;
                    }
                }
                ViewerRole::Seller => {
                    view.buyer_name =
                        Some(user_names.get(&buyer_id).cloned().unwrap_or_default());
                    view.can_verify = is_open;
                    view.total_amount = view.items.iter().fold(0i64, |acc, i| {
                        acc.saturating_add(i.unit_price.saturating_mul(i.quantity as i64))
                    });
                }
            }
            views.push(view);
        }
        Ok(views)
    }
}

/// Collapses duplicate cart lines and enforces per-line bounds.
fn merge_cart_lines(items: &[CheckoutItemRequest]) -> AppResult<Vec<(i64, i32)>> {
    if items.is_empty() {
        return Err(AppError::ValidationError("Cart is empty".to_string()));
    }
    let mut lines: Vec<(i64, i32)> = Vec::new();
    for item in items {
        if item.quantity < 1 || item.quantity > MAX_ITEM_QUANTITY {
            return Err(AppError::ValidationError(format!(
                "Quantity must be between 1 and {MAX_ITEM_QUANTITY}"
            )));
        }
        match lines.iter_mut().find(|(id, _)| *id == item.product_id) {
            Some((_, quantity)) => *quantity += item.quantity,
            None => lines.push((item.product_id, item.quantity)),
        }
    }
    if lines.len() > MAX_CART_LINES {
        return Err(AppError::ValidationError(format!(
            "Cart cannot hold more than {MAX_CART_LINES} different products"
        )));
    }
    if lines.iter().any(|(_, q)| *q > MAX_ITEM_QUANTITY) {
        return Err(AppError::ValidationError(format!(
            "Quantity must be between 1 and {MAX_ITEM_QUANTITY}"
        )));
    }
    Ok(lines)
}

/// Adds a priced line to the running order total. Totals that would overflow
/// are rejected rather than wrapped.
fn add_line_total(total: i64, unit_price: i64, quantity: i32) -> AppResult<i64> {
    unit_price
        .checked_mul(quantity as i64)
        .and_then(|line| total.checked_add(line))
        .ok_or_else(|| AppError::ValidationError("Order total is out of range".to_string()))
}

/// A delivery code is accepted only while the order is open and the submitted
/// code equals the stored one. Closed orders never match, so a consumed code
/// cannot be replayed.
fn delivery_code_matches(status: &OrderStatus, stored: Option<&str>, submitted: &str) -> bool {
    if !status.is_open() {
        return false;
    }
    match stored {
        Some(code) => !submitted.is_empty() && code == submitted,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_code_accepted_while_open() {
        assert!(delivery_code_matches(
            &OrderStatus::Pending,
            Some("482913"),
            "482913"
        ));
        assert!(delivery_code_matches(
            &OrderStatus::Confirmed,
            Some("482913"),
            "482913"
        ));
    }

    #[test]
    fn test_wrong_code_rejected() {
        assert!(!delivery_code_matches(
            &OrderStatus::Pending,
            Some("482913"),
            "000000"
        ));
        assert!(!delivery_code_matches(
            &OrderStatus::Pending,
            Some("482913"),
            ""
        ));
    }

    #[test]
    fn test_consumed_code_cannot_be_replayed() {
        assert!(!delivery_code_matches(
            &OrderStatus::Delivered,
            Some("482913"),
            "482913"
        ));
        assert!(!delivery_code_matches(&OrderStatus::Delivered, None, "482913"));
        assert!(!delivery_code_matches(
            &OrderStatus::Cancelled,
            None,
            "482913"
        ));
    }

    #[test]
    fn test_order_total_stays_in_range() {
        let mut total = add_line_total(0, 45000, 3).unwrap();
        total = add_line_total(total, 120000, 1).unwrap();
        assert_eq!(total, 255000);

        // A runaway price must surface as a validation error, not wrap
        assert!(add_line_total(0, i64::MAX / 2, 3).is_err());
        assert!(add_line_total(i64::MAX, 1, 1).is_err());
    }

    #[test]
    fn test_merge_cart_lines_sums_duplicates() {
        let items = vec![
            CheckoutItemRequest {
                product_id: 7,
                quantity: 2,
            },
            CheckoutItemRequest {
                product_id: 9,
                quantity: 1,
            },
            CheckoutItemRequest {
                product_id: 7,
                quantity: 3,
            },
        ];
        let lines = merge_cart_lines(&items).unwrap();
        assert_eq!(lines, vec![(7, 5), (9, 1)]);
    }

    #[test]
    fn test_merge_cart_lines_bounds() {
        assert!(merge_cart_lines(&[]).is_err());

        let zero = vec![CheckoutItemRequest {
            product_id: 1,
            quantity: 0,
        }];
        assert!(merge_cart_lines(&zero).is_err());

        // Merged quantity above the cap is rejected too
        let merged_over = vec![
            CheckoutItemRequest {
                product_id: 1,
                quantity: 6,
            },
            CheckoutItemRequest {
                product_id: 1,
                quantity: 6,
            },
        ];
        assert!(merge_cart_lines(&merged_over).is_err());
    }
}
