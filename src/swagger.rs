use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{OrderStatus, PaymentMethod, TransactionStatus};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::logout,
        handlers::user::get_profile,
        handlers::user::update_profile,
        handlers::product::create_product,
        handlers::product::list_products,
        handlers::product::get_product,
        handlers::product::update_product,
        handlers::product::delete_product,
        handlers::product::upload_image,
        handlers::order::checkout,
        handlers::order::list_orders,
        handlers::order::get_order,
        handlers::order::verify_delivery,
        handlers::order::confirm_order,
        handlers::order::cancel_order,
        handlers::transaction::record_payment,
        handlers::transaction::list_transactions,
        handlers::review::create_review,
        handlers::review::list_product_reviews,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            RefreshRequest,
            UpdateUserRequest,
            UserResponse,
            UserStatistics,
            AuthResponse,
            CreateProductRequest,
            UpdateProductRequest,
            ProductQuery,
            ImageUploadQuery,
            ProductResponse,
            ProductSummary,
            ProductDetailResponse,
            CheckoutItemRequest,
            CheckoutRequest,
            VerifyDeliveryRequest,
            OrderQuery,
            OrderItemResponse,
            OrderResponse,
            ViewerRole,
            OrderStatus,
            RecordPaymentRequest,
            TransactionQuery,
            TransactionResponse,
            TransactionStatus,
            PaymentMethod,
            CreateReviewRequest,
            ReviewQuery,
            ReviewResponse,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration and token management"),
        (name = "user", description = "Profile and statistics"),
        (name = "product", description = "Marketplace listings"),
        (name = "order", description = "Checkout and OTP delivery verification"),
        (name = "transaction", description = "Payment records"),
        (name = "review", description = "Verified purchase reviews"),
    ),
    info(
        title = "UniMart Backend API",
        version = "1.0.0",
        description = "Campus marketplace REST API documentation",
    ),
    servers(
        (url = "/api", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
