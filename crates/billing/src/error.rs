//! Billing error types

use thiserror::Error;

/// Billing-specific errors
#[derive(Debug, Error)]
pub enum BillingError {
    /// Missing or invalid caller identity; never grants access
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Provider unreachable, rate limited or failing
    #[error("Billing provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Stripe API error: {0}")]
    StripeApi(String),

    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error("Unknown plan price: {0}")]
    InvalidPrice(String),

    #[error("Checkout session could not be created: {0}")]
    CheckoutCreationFailed(String),

    #[error("Billing portal session could not be created: {0}")]
    PortalCreationFailed(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl BillingError {
    /// Whether the failure is transient on the provider side
    pub fn is_provider_unavailable(&self) -> bool {
        matches!(self, BillingError::ProviderUnavailable(_))
    }
}

impl From<stripe::StripeError> for BillingError {
    fn from(err: stripe::StripeError) -> Self {
        match &err {
            stripe::StripeError::Stripe(req) if req.http_status == 429 || req.http_status >= 500 => {
                BillingError::ProviderUnavailable(err.to_string())
            }
            stripe::StripeError::ClientError(_) | stripe::StripeError::Timeout => {
                BillingError::ProviderUnavailable(err.to_string())
            }
            _ => BillingError::StripeApi(err.to_string()),
        }
    }
}

impl From<sqlx::Error> for BillingError {
    fn from(err: sqlx::Error) -> Self {
        BillingError::Database(err.to_string())
    }
}

pub type BillingResult<T> = Result<T, BillingError>;
