//! Remediation actions: hosted checkout and billing portal
//!
//! Neither action touches the store. Once the user is back from the hosted
//! page the caller refreshes (see [`SubscriptionStore::notify_refocus`]).
//!
//! [`SubscriptionStore::notify_refocus`]: crate::store::SubscriptionStore::notify_refocus

use std::sync::Arc;

use crate::backend::SubscriptionBackend;
use crate::error::{BackendError, RemediationError};
use crate::session::Session;

/// Opens a hosted page in a new browsing context
pub trait UrlOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<(), String>;
}

/// Checkout and portal launcher for one session
#[derive(Clone)]
pub struct RemediationActions {
    backend: Arc<dyn SubscriptionBackend>,
    opener: Arc<dyn UrlOpener>,
}

impl RemediationActions {
    pub fn new(backend: Arc<dyn SubscriptionBackend>, opener: Arc<dyn UrlOpener>) -> Self {
        Self { backend, opener }
    }

    /// Start a hosted checkout for a plan price
    pub async fn start_checkout(
        &self,
        session: Option<&Session>,
        price_id: &str,
    ) -> Result<String, RemediationError> {
        let session = session.ok_or(RemediationError::NoSession)?;

        let url = self
            .backend
            .create_checkout(session, price_id)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, price_id = %price_id, "Checkout creation failed");
                as_session_error(e, RemediationError::CheckoutCreationFailed)
            })?;

        self.open(&url, RemediationError::CheckoutCreationFailed)?;
        tracing::info!(price_id = %price_id, "Opened checkout");
        Ok(url)
    }

    /// Open the self-service billing portal
    pub async fn open_billing_portal(
        &self,
        session: Option<&Session>,
    ) -> Result<String, RemediationError> {
        let session = session.ok_or(RemediationError::NoSession)?;

        let url = self.backend.customer_portal(session).await.map_err(|e| {
            tracing::warn!(error = %e, "Billing portal creation failed");
            as_session_error(e, RemediationError::PortalCreationFailed)
        })?;

        self.open(&url, RemediationError::PortalCreationFailed)?;
        tracing::info!("Opened billing portal");
        Ok(url)
    }

    fn open(
        &self,
        url: &str,
        on_error: fn(BackendError) -> RemediationError,
    ) -> Result<(), RemediationError> {
        self.opener.open(url).map_err(|e| {
            tracing::warn!(error = %e, "Could not open hosted page");
            on_error(BackendError::Unavailable(format!("could not open page: {}", e)))
        })
    }
}

fn as_session_error(
    err: BackendError,
    otherwise: fn(BackendError) -> RemediationError,
) -> RemediationError {
    match err {
        BackendError::Unauthorized => RemediationError::NoSession,
        other => otherwise(other),
    }
}
