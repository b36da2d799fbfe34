use serde::Serialize;
use utoipa::ToSchema;

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = false)]
    pub success: bool,
    #[schema(example = "INVALID_CODE")]
    pub code: String,
    #[schema(example = "Invalid OTP")]
    pub message: String,
}
