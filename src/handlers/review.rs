use crate::models::*;
use crate::services::ReviewService;
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, ResponseError, Result};
use serde_json::json;

fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    post,
    path = "/reviews",
    tag = "review",
    request_body = CreateReviewRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Review posted", body = ReviewResponse),
        (status = 403, description = "No delivered order contains this product", body = ErrorResponse),
        (status = 409, description = "Product already reviewed by the caller", body = ErrorResponse)
    )
)]
pub async fn create_review(
    review_service: web::Data<ReviewService>,
    req: HttpRequest,
    request: web::Json<CreateReviewRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match review_service
        .create_review(user_id, request.into_inner())
        .await
    {
        Ok(review) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": review
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/products/{id}/reviews",
    tag = "review",
    params(
        ("id" = i64, Path, description = "Product id"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("perPage" = Option<u32>, Query, description = "Page size")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Reviews for the product, newest first"),
        (status = 404, description = "Product not found", body = ErrorResponse)
    )
)]
pub async fn list_product_reviews(
    review_service: web::Data<ReviewService>,
    path: web::Path<i64>,
    query: web::Query<ReviewQuery>,
) -> Result<HttpResponse> {
    let product_id = path.into_inner();

    match review_service
        .list_for_product(product_id, &query.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn review_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/reviews").route("", web::post().to(create_review)));
}
