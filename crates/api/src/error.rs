//! API error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use petsit_billing::BillingError;
use petsit_shared::PetsitError;
use serde_json::json;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // Authentication errors
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Authentication required")]
    Unauthorized,
    #[error("Insufficient permissions")]
    Forbidden,

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),

    // Resource errors
    #[error("No billing customer found for this account")]
    NoBillingCustomer,

    // Billing errors
    #[error("Billing provider unavailable")]
    BillingUnavailable,
    #[error("Billing provider error: {0}")]
    BillingProvider(String),
    #[error("Could not start checkout")]
    CheckoutFailed,
    #[error("Could not open billing portal")]
    PortalFailed,

    // Internal errors
    #[error("Database error: {0}")]
    Database(String),
    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // Authentication
            ApiError::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN", self.to_string()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", self.to_string()),

            // Validation
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),

            // Resources
            ApiError::NoBillingCustomer => (StatusCode::NOT_FOUND, "NO_BILLING_CUSTOMER", "No billing account found. Subscribe to a plan first.".to_string()),

            // Billing
            ApiError::BillingUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "BILLING_UNAVAILABLE", "The billing provider is temporarily unavailable. Please try again.".to_string()),
            ApiError::BillingProvider(_) => (StatusCode::BAD_GATEWAY, "BILLING_PROVIDER_ERROR", "The billing provider rejected the request".to_string()),
            ApiError::CheckoutFailed => (StatusCode::BAD_GATEWAY, "CHECKOUT_FAILED", self.to_string()),
            ApiError::PortalFailed => (StatusCode::BAD_GATEWAY, "PORTAL_FAILED", self.to_string()),

            // Internal
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR", "Database error".to_string()),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", self.to_string()),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::Authentication(_) => ApiError::Unauthorized,
            BillingError::ProviderUnavailable(msg) => {
                tracing::warn!(error = %msg, "Billing provider unavailable");
                ApiError::BillingUnavailable
            }
            BillingError::StripeApi(msg) => {
                tracing::error!(error = %msg, "Billing provider error");
                ApiError::BillingProvider(msg)
            }
            BillingError::CustomerNotFound(_) => ApiError::NoBillingCustomer,
            BillingError::InvalidPrice(price_id) => {
                ApiError::Validation(format!("Unknown plan price: {}", price_id))
            }
            BillingError::InvalidInput(msg) => ApiError::Validation(msg),
            BillingError::CheckoutCreationFailed(msg) => {
                tracing::error!(error = %msg, "Checkout creation failed");
                ApiError::CheckoutFailed
            }
            BillingError::PortalCreationFailed(msg) => {
                tracing::error!(error = %msg, "Portal creation failed");
                ApiError::PortalFailed
            }
            BillingError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                ApiError::Database(msg)
            }
            BillingError::Config(msg) => {
                tracing::error!(error = %msg, "Billing configuration error");
                ApiError::Internal
            }
        }
    }
}

impl From<PetsitError> for ApiError {
    fn from(err: PetsitError) -> Self {
        match err {
            PetsitError::Validation(msg) => ApiError::Validation(msg),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        ApiError::Database(err.to_string())
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
