//! Client error types

use thiserror::Error;

/// Failure talking to the Petsit API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Session missing, expired or rejected
    #[error("Session is not valid")]
    Unauthorized,

    /// Transport failure, timeout or a 5xx from the API or provider
    #[error("Billing service unavailable: {0}")]
    Unavailable(String),

    /// Response body did not match the expected shape
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The API refused the request
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Failure of a remediation action; every variant maps to a next step
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemediationError {
    #[error("Could not start checkout: {0}")]
    CheckoutCreationFailed(BackendError),

    #[error("Could not open billing portal: {0}")]
    PortalCreationFailed(BackendError),

    #[error("No active session")]
    NoSession,
}

impl RemediationError {
    /// Text shown to the user, always naming what to do next
    pub fn user_message(&self) -> &'static str {
        match self {
            RemediationError::CheckoutCreationFailed(_) => {
                "We couldn't open the checkout page. Please try again in a moment."
            }
            RemediationError::PortalCreationFailed(BackendError::Rejected { status: 404, .. }) => {
                "No billing account was found yet. Choose a plan to subscribe."
            }
            RemediationError::PortalCreationFailed(_) => {
                "We couldn't open the payment management page. Please try again in a moment."
            }
            RemediationError::NoSession => "Your session has ended. Please sign in again.",
        }
    }
}
