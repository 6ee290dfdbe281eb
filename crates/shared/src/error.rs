//! Error types for Petsit

use thiserror::Error;

use crate::types::ProviderStatus;

#[derive(Debug, Error)]
pub enum PetsitError {
    #[error("Validation error: {0}")]
    Validation(String),
}

/// A `check-subscription` payload that matches none of the expected shapes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("Missing field in subscription payload: {0}")]
    MissingField(&'static str),

    #[error("Inconsistent subscription payload: {0}")]
    Inconsistent(String),
}

impl WireError {
    pub(crate) fn inconsistent(status: ProviderStatus, (subscribed, blocked): (bool, bool)) -> Self {
        WireError::Inconsistent(format!(
            "status {} with subscribed={} blocked={}",
            status, subscribed, blocked
        ))
    }
}
