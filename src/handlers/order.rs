use crate::entities::OrderStatus;
use crate::models::*;
use crate::services::OrderService;
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, ResponseError, Result};
use serde_json::json;

fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    post,
    path = "/orders",
    tag = "order",
    request_body = CheckoutRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Order placed; the buyer view carries the delivery OTP", body = OrderResponse),
        (status = 400, description = "Empty cart, bad quantity, or own listing", body = ErrorResponse),
        (status = 404, description = "A product is missing or delisted", body = ErrorResponse)
    )
)]
pub async fn checkout(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    request: web::Json<CheckoutRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match order_service.checkout(user_id, request.into_inner()).await {
        Ok(order) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": order
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/orders",
    tag = "order",
    params(
        ("role" = Option<ViewerRole>, Query, description = "buyer (default) or seller"),
        ("status" = Option<OrderStatus>, Query, description = "Filter by order status"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("perPage" = Option<u32>, Query, description = "Page size")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Orders shaped for the requested role"),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn list_orders(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    query: web::Query<OrderQuery>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match order_service.list_orders(user_id, &query.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/orders/verify",
    tag = "order",
    request_body = VerifyDeliveryRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Delivery verified, order delivered", body = OrderResponse),
        (status = 400, description = "Wrong or already consumed OTP", body = ErrorResponse),
        (status = 403, description = "Caller sells nothing in this order", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse)
    )
)]
pub async fn verify_delivery(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    request: web::Json<VerifyDeliveryRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match order_service
        .verify_delivery(user_id, request.into_inner())
        .await
    {
        Ok(order) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": order
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/orders/{id}",
    tag = "order",
    params(
        ("id" = i64, Path, description = "Order id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Order shaped for the caller's role", body = OrderResponse),
        (status = 403, description = "Caller is not a party to the order", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse)
    )
)]
pub async fn get_order(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    let order_id = path.into_inner();

    match order_service.get_order(user_id, order_id).await {
        Ok(order) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": order
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/orders/{id}/confirm",
    tag = "order",
    params(
        ("id" = i64, Path, description = "Order id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Order confirmed by a seller", body = OrderResponse),
        (status = 403, description = "Caller sells nothing in this order", body = ErrorResponse),
        (status = 409, description = "Order is not pending", body = ErrorResponse)
    )
)]
pub async fn confirm_order(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    let order_id = path.into_inner();

    match order_service.confirm_order(user_id, order_id).await {
        Ok(order) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": order
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/orders/{id}/cancel",
    tag = "order",
    params(
        ("id" = i64, Path, description = "Order id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Order cancelled, OTP voided", body = OrderResponse),
        (status = 403, description = "Caller is not the buyer", body = ErrorResponse),
        (status = 409, description = "Order is no longer open", body = ErrorResponse)
    )
)]
pub async fn cancel_order(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    let order_id = path.into_inner();

    match order_service.cancel_order(user_id, order_id).await {
        Ok(order) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": order
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn order_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/orders")
            .route("", web::post().to(checkout))
            .route("", web::get().to(list_orders))
            // registered ahead of /{id} so "verify" is not read as an id
            .route("/verify", web::post().to(verify_delivery))
            .route("/{id}", web::get().to(get_order))
            .route("/{id}/confirm", web::post().to(confirm_order))
            .route("/{id}/cancel", web::post().to(cancel_order)),
    );
}
