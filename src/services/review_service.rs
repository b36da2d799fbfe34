use crate::entities::{
    order_entity, order_item_entity, product_entity, review_entity, user_entity, OrderStatus,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use std::collections::HashMap;

const MAX_COMMENT_LEN: usize = 1000;

#[derive(Clone)]
pub struct ReviewService {
    pool: DatabaseConnection,
}

impl ReviewService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// Reviews are restricted to verified purchases: the reviewer must have a
    /// delivered order containing the product, and may review it once.
    pub async fn create_review(
        &self,
        reviewer_id: i64,
        request: CreateReviewRequest,
    ) -> AppResult<ReviewResponse> {
        validate_rating(request.rating)?;
        let comment = normalize_comment(request.comment)?;

        product_entity::Entity::find_by_id(request.product_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

        let delivered_purchases = order_item_entity::Entity::find()
            .join(JoinType::InnerJoin, order_item_entity::Relation::Order.def())
            .filter(order_item_entity::Column::ProductId.eq(request.product_id))
            .filter(order_entity::Column::BuyerId.eq(reviewer_id))
            .filter(order_entity::Column::Status.eq(OrderStatus::Delivered))
            .count(&self.pool)
            .await?;
        if delivered_purchases == 0 {
            return Err(AppError::Forbidden(
                "You can only review products from delivered orders".to_string(),
            ));
        }

        let already = review_entity::Entity::find()
            .filter(review_entity::Column::ProductId.eq(request.product_id))
            .filter(review_entity::Column::ReviewerId.eq(reviewer_id))
            .count(&self.pool)
            .await?;
        if already > 0 {
            return Err(AppError::Conflict(
                "You already reviewed this product".to_string(),
            ));
        }

        let review = review_entity::ActiveModel {
            product_id: Set(request.product_id),
            reviewer_id: Set(reviewer_id),
            rating: Set(request.rating),
            comment: Set(comment),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        let reviewer = user_entity::Entity::find_by_id(reviewer_id)
            .one(&self.pool)
            .await?;

        let mut response = ReviewResponse::from(review);
        response.reviewer_name = reviewer.map(|u| u.full_name()).unwrap_or_default();
        Ok(response)
    }

    pub async fn list_for_product(
        &self,
        product_id: i64,
        query: &ReviewQuery,
    ) -> AppResult<PaginatedResponse<ReviewResponse>> {
        product_entity::Entity::find_by_id(product_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

        let params = PaginationParams::new(query.page, query.per_page);

        let total = review_entity::Entity::find()
            .filter(review_entity::Column::ProductId.eq(product_id))
            .count(&self.pool)
            .await? as i64;

        let reviews = review_entity::Entity::find()
            .filter(review_entity::Column::ProductId.eq(product_id))
            .order_by_desc(review_entity::Column::CreatedAt)
            .offset(params.get_offset() as u64)
            .limit(params.get_limit() as u64)
            .all(&self.pool)
            .await?;

        let mut reviewer_ids: Vec<i64> = reviews.iter().map(|r| r.reviewer_id).collect();
        reviewer_ids.sort_unstable();
        reviewer_ids.dedup();
        let names: HashMap<i64, String> = user_entity::Entity::find()
            .filter(user_entity::Column::Id.is_in(reviewer_ids))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|u| (u.id, u.full_name()))
            .collect();

        let items: Vec<ReviewResponse> = reviews
            .into_iter()
            .map(|r| {
                let reviewer_id = r.reviewer_id;
                let mut response = ReviewResponse::from(r);
                response.reviewer_name = names.get(&reviewer_id).cloned().unwrap_or_default();
                response
            })
            .collect();

        Ok(PaginatedResponse::new(
            items,
            params.get_page(),
            params.get_limit(),
            total,
        ))
    }
}

fn validate_rating(rating: i16) -> AppResult<()> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::ValidationError(
            "Rating must be between 1 and 5".to_string(),
        ));
    }
    Ok(())
}

fn normalize_comment(comment: Option<String>) -> AppResult<Option<String>> {
    match comment {
        Some(text) => {
            let trimmed = text.trim().to_string();
            if trimmed.is_empty() {
                return Ok(None);
            }
            if trimmed.chars().count() > MAX_COMMENT_LEN {
                return Err(AppError::ValidationError(format!(
                    "Comment cannot exceed {MAX_COMMENT_LEN} characters"
                )));
            }
            Ok(Some(trimmed))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }

    #[test]
    fn test_blank_comment_becomes_none() {
        assert_eq!(normalize_comment(Some("   ".to_string())).unwrap(), None);
        assert_eq!(
            normalize_comment(Some(" solid desk ".to_string())).unwrap(),
            Some("solid desk".to_string())
        );
        assert!(normalize_comment(Some("x".repeat(1001))).is_err());
        // Character limit, not bytes
        assert!(normalize_comment(Some("é".repeat(1000))).is_ok());
    }
}
