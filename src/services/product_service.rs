use crate::entities::{product_entity, review_entity, user_entity};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{mime_for_extension, to_data_uri};
use sea_orm::sea_query::extension::postgres::PgBinOper;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;
/// Ten lakh rupees in paise, the most a listing can ask.
const MAX_PRICE: i64 = 100_000_000;

#[derive(Clone)]
pub struct ProductService {
    pool: DatabaseConnection,
}

impl ProductService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn create_product(
        &self,
        seller_id: i64,
        request: CreateProductRequest,
    ) -> AppResult<ProductResponse> {
        validate_product_name(&request.name)?;
        validate_product_description(&request.description)?;
        validate_price(request.price)?;
        validate_category(&request.category)?;

        let product = product_entity::ActiveModel {
            seller_id: Set(seller_id),
            name: Set(request.name.trim().to_string()),
            description: Set(request.description.trim().to_string()),
            price: Set(request.price),
            category: Set(request.category.trim().to_lowercase()),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("User {} listed product {}", seller_id, product.id);
        Ok(ProductResponse::from(product))
    }

    /// Browse listings. The caller's own listings are included even when
    /// delisted, so sellers can manage them. Rows are summaries without the
    /// image payload; the detail endpoint serves the full picture.
    pub async fn list_products(
        &self,
        user_id: i64,
        query: &ProductQuery,
    ) -> AppResult<PaginatedResponse<ProductSummary>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut cond = Condition::all();
        if query.seller_id == Some(user_id) {
            cond = cond.add(product_entity::Column::SellerId.eq(user_id));
        } else {
            cond = cond.add(product_entity::Column::IsActive.eq(true));
            if let Some(seller_id) = query.seller_id {
                cond = cond.add(product_entity::Column::SellerId.eq(seller_id));
            }
        }
        if let Some(category) = &query.category {
            cond = cond.add(product_entity::Column::Category.eq(category.trim().to_lowercase()));
        }
        if let Some(search) = &query.search {
            let pattern = format!("%{}%", search.trim());
            cond = cond.add(
                Condition::any()
                    .add(
                        Expr::col((product_entity::Entity, product_entity::Column::Name))
                            .binary(PgBinOper::ILike, pattern.clone()),
                    )
                    .add(
                        Expr::col((product_entity::Entity, product_entity::Column::Description))
                            .binary(PgBinOper::ILike, pattern),
                    ),
            );
        }

        #[derive(Debug, sea_orm::FromQueryResult)]
        struct CountRow {
            count: i64,
        }
        let total = product_entity::Entity::find()
            .filter(cond.clone())
            .select_only()
            .column_as(Expr::val(1).count(), "count")
            .into_model::<CountRow>()
            .one(&self.pool)
            .await?
            .map(|r| r.count)
            .unwrap_or(0);

        let products = product_entity::Entity::find()
            .filter(cond)
            .order_by_desc(product_entity::Column::CreatedAt)
            .offset(params.get_offset() as u64)
            .limit(params.get_limit() as u64)
            .all(&self.pool)
            .await?;

        let items: Vec<ProductSummary> = products.into_iter().map(ProductSummary::from).collect();

        Ok(PaginatedResponse::new(
            items,
            params.get_page(),
            params.get_limit(),
            total,
        ))
    }

    pub async fn get_product_detail(
        &self,
        user_id: i64,
        product_id: i64,
    ) -> AppResult<ProductDetailResponse> {
        let product = product_entity::Entity::find_by_id(product_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

        // Delisted products stay visible to their seller only
        if !product.is_active && product.seller_id != user_id {
            return Err(AppError::NotFound("Product not found".to_string()));
        }

        let seller = user_entity::Entity::find_by_id(product.seller_id)
            .one(&self.pool)
            .await?;
        let seller_name = seller.map(|s| s.full_name()).unwrap_or_default();

        let reviews = review_entity::Entity::find()
            .filter(review_entity::Column::ProductId.eq(product_id))
            .all(&self.pool)
            .await?;
        let review_count = reviews.len() as i64;
        let average_rating = if reviews.is_empty() {
            None
        } else {
            let sum: i64 = reviews.iter().map(|r| r.rating as i64).sum();
            Some(sum as f64 / review_count as f64)
        };

        Ok(ProductDetailResponse {
            id: product.id,
            seller_id: product.seller_id,
            seller_name,
            name: product.name,
            description: product.description,
            price: product.price,
            category: product.category,
            image_data: product.image_data,
            is_active: product.is_active,
            average_rating,
            review_count,
            created_at: product.created_at.unwrap_or_else(chrono::Utc::now),
        })
    }

    pub async fn update_product(
        &self,
        seller_id: i64,
        product_id: i64,
        request: UpdateProductRequest,
    ) -> AppResult<ProductResponse> {
        if let Some(name) = &request.name {
            validate_product_name(name)?;
        }
        if let Some(description) = &request.description {
            validate_product_description(description)?;
        }
        if let Some(price) = request.price {
            validate_price(price)?;
        }
        if let Some(category) = &request.category {
            validate_category(category)?;
        }
        if request.name.is_none()
            && request.description.is_none()
            && request.price.is_none()
            && request.category.is_none()
        {
            return Err(AppError::ValidationError("No fields to update".to_string()));
        }

        let product = self.find_owned(seller_id, product_id).await?;

        let mut model = product.into_active_model();
        if let Some(name) = &request.name {
            model.name = Set(name.trim().to_string());
        }
        if let Some(description) = &request.description {
            model.description = Set(description.trim().to_string());
        }
        if let Some(price) = request.price {
            model.price = Set(price);
        }
        if let Some(category) = &request.category {
            model.category = Set(category.trim().to_lowercase());
        }
        model.updated_at = Set(Some(chrono::Utc::now()));
        let updated = model.update(&self.pool).await?;

        Ok(ProductResponse::from(updated))
    }

    /// Soft delete. The row stays so past orders keep resolving the name.
    pub async fn delete_product(&self, seller_id: i64, product_id: i64) -> AppResult<()> {
        let product = self.find_owned(seller_id, product_id).await?;

        let mut model = product.into_active_model();
        model.is_active = Set(false);
        model.updated_at = Set(Some(chrono::Utc::now()));
        model.update(&self.pool).await?;

        log::info!("User {} delisted product {}", seller_id, product_id);
        Ok(())
    }

    pub async fn store_image(
        &self,
        seller_id: i64,
        product_id: i64,
        ext: &str,
        bytes: &[u8],
    ) -> AppResult<ProductResponse> {
        if bytes.is_empty() {
            return Err(AppError::ValidationError("Image body is empty".to_string()));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AppError::ValidationError(
                "Image exceeds the 2 MB limit".to_string(),
            ));
        }
        if mime_for_extension(ext) == "application/octet-stream" {
            return Err(AppError::ValidationError(format!(
                "Unsupported image extension: {ext}"
            )));
        }

        let product = self.find_owned(seller_id, product_id).await?;

        let mut model = product.into_active_model();
        model.image_data = Set(Some(to_data_uri(bytes, ext)));
        model.updated_at = Set(Some(chrono::Utc::now()));
        let updated = model.update(&self.pool).await?;

        Ok(ProductResponse::from(updated))
    }

    async fn find_owned(
        &self,
        seller_id: i64,
        product_id: i64,
    ) -> AppResult<product_entity::Model> {
        let product = product_entity::Entity::find_by_id(product_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
        if product.seller_id != seller_id {
            return Err(AppError::Forbidden(
                "Only the seller can modify this listing".to_string(),
            ));
        }
        Ok(product)
    }
}

fn validate_product_name(name: &str) -> AppResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > 100 {
        return Err(AppError::ValidationError(
            "Product name must be between 1 and 100 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_product_description(description: &str) -> AppResult<()> {
    let trimmed = description.trim();
    if trimmed.is_empty() || trimmed.chars().count() > 2000 {
        return Err(AppError::ValidationError(
            "Description must be between 1 and 2000 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_price(price: i64) -> AppResult<()> {
    if !(1..=MAX_PRICE).contains(&price) {
        return Err(AppError::ValidationError(format!(
            "Price must be between 1 and {MAX_PRICE} paise"
        )));
    }
    Ok(())
}

fn validate_category(category: &str) -> AppResult<()> {
    let trimmed = category.trim();
    if trimmed.is_empty() || trimmed.chars().count() > 50 {
        return Err(AppError::ValidationError(
            "Category must be between 1 and 50 characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_bounds() {
        assert!(validate_price(1).is_ok());
        assert!(validate_price(45000).is_ok());
        assert!(validate_price(MAX_PRICE).is_ok());
        assert!(validate_price(0).is_err());
        assert!(validate_price(-500).is_err());
        assert!(validate_price(MAX_PRICE + 1).is_err());
        // An unbounded price would overflow order totals downstream
        assert!(validate_price(i64::MAX / 2).is_err());
    }

    #[test]
    fn test_name_bounds() {
        assert!(validate_product_name("Casio FX-991").is_ok());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_product_name(&"x".repeat(101)).is_err());
        // Limits count characters, not bytes
        assert!(validate_product_name(&"é".repeat(100)).is_ok());
        assert!(validate_product_name(&"é".repeat(101)).is_err());
    }
}
