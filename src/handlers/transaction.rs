use crate::models::*;
use crate::services::TransactionService;
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, ResponseError, Result};
use serde_json::json;

fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    post,
    path = "/transactions",
    tag = "transaction",
    request_body = RecordPaymentRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Payment recorded", body = TransactionResponse),
        (status = 400, description = "Amount does not match the order total", body = ErrorResponse),
        (status = 403, description = "Caller is not the buyer", body = ErrorResponse),
        (status = 409, description = "Active payment record already exists", body = ErrorResponse)
    )
)]
pub async fn record_payment(
    transaction_service: web::Data<TransactionService>,
    req: HttpRequest,
    request: web::Json<RecordPaymentRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match transaction_service
        .record_payment(user_id, request.into_inner())
        .await
    {
        Ok(transaction) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": transaction
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/transactions",
    tag = "transaction",
    params(
        ("orderId" = i64, Query, description = "Order whose payments to list")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Payment history, newest first"),
        (status = 403, description = "Caller is not a party to the order", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse)
    )
)]
pub async fn list_transactions(
    transaction_service: web::Data<TransactionService>,
    req: HttpRequest,
    query: web::Query<TransactionQuery>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match transaction_service
        .list_for_order(user_id, query.order_id)
        .await
    {
        Ok(transactions) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": transactions
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn transaction_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/transactions")
            .route("", web::post().to(record_payment))
            .route("", web::get().to(list_transactions)),
    );
}
