use crate::entities::{order_entity, order_item_entity, user_entity, OrderStatus};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{validate_contact_number, validate_name};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, JoinType,
    QueryFilter, QuerySelect, RelationTrait, Set,
};

#[derive(Clone)]
pub struct UserService {
    pool: DatabaseConnection,
}

impl UserService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn get_user_profile(
        &self,
        user_id: i64,
    ) -> AppResult<(UserResponse, UserStatistics)> {
        let user = user_entity::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let statistics = self.get_user_statistics(user_id).await?;

        Ok((UserResponse::from(user), statistics))
    }

    pub async fn update_user_profile(
        &self,
        user_id: i64,
        request: UpdateUserRequest,
    ) -> AppResult<UserResponse> {
        if let Some(first_name) = &request.first_name {
            validate_name("firstName", first_name)?;
        }
        if let Some(last_name) = &request.last_name {
            validate_name("lastName", last_name)?;
        }
        if let Some(contact_number) = &request.contact_number {
            validate_contact_number(contact_number)?;
        }

        if request.first_name.is_none()
            && request.last_name.is_none()
            && request.contact_number.is_none()
        {
            return Err(AppError::ValidationError("No fields to update".to_string()));
        }

        let mut model = user_entity::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?
            .into_active_model();
        if let Some(first_name) = &request.first_name {
            model.first_name = Set(first_name.trim().to_string());
        }
        if let Some(last_name) = &request.last_name {
            model.last_name = Set(last_name.trim().to_string());
        }
        if let Some(contact_number) = &request.contact_number {
            model.contact_number = Set(contact_number.clone());
        }
        model.updated_at = Set(Some(chrono::Utc::now()));
        let updated = model.update(&self.pool).await?;

        Ok(UserResponse::from(updated))
    }

    /// Buyer and seller counters for the profile page.
    async fn get_user_statistics(&self, user_id: i64) -> AppResult<UserStatistics> {
        #[derive(Debug, sea_orm::FromQueryResult)]
        struct CountRow {
            count: i64,
        }
        let orders_placed = order_entity::Entity::find()
            .filter(order_entity::Column::BuyerId.eq(user_id))
            .select_only()
            .column_as(Expr::val(1).count(), "count")
            .into_model::<CountRow>()
            .one(&self.pool)
            .await?
            .map(|r| r.count)
            .unwrap_or(0);

        let delivered_orders = order_entity::Entity::find()
            .filter(order_entity::Column::BuyerId.eq(user_id))
            .filter(order_entity::Column::Status.eq(OrderStatus::Delivered))
            .all(&self.pool)
            .await?;
        let total_spent = delivered_orders
            .iter()
            .fold(0i64, |acc, o| acc.saturating_add(o.total_amount));

        // Sold line items count only once the order reached delivered
        let sold_items = order_item_entity::Entity::find()
            .join(JoinType::InnerJoin, order_item_entity::Relation::Order.def())
            .filter(order_item_entity::Column::SellerId.eq(user_id))
            .filter(order_entity::Column::Status.eq(OrderStatus::Delivered))
            .all(&self.pool)
            .await?;
        let items_sold: i64 = sold_items.iter().map(|i| i.quantity as i64).sum();
        let total_earned = sold_items.iter().fold(0i64, |acc, i| {
            acc.saturating_add(i.unit_price.saturating_mul(i.quantity as i64))
        });

        Ok(UserStatistics {
            orders_placed,
            total_spent,
            items_sold,
            total_earned,
        })
    }
}
