//! Billing self-service portal

use std::sync::Arc;

use petsit_shared::TenantIdentity;

use crate::error::{BillingError, BillingResult};
use crate::provider::{BillingProvider, HostedSession};

/// Portal service for hosted billing portal sessions
pub struct PortalService {
    provider: Arc<dyn BillingProvider>,
    app_base_url: String,
}

impl PortalService {
    pub fn new(provider: Arc<dyn BillingProvider>, app_base_url: impl Into<String>) -> Self {
        Self {
            provider,
            app_base_url: app_base_url.into(),
        }
    }

    /// Create a billing portal session for the tenant's customer
    pub async fn create_portal_session(
        &self,
        identity: &TenantIdentity,
    ) -> BillingResult<HostedSession> {
        let customer = self
            .provider
            .find_customer(identity)
            .await?
            .ok_or_else(|| BillingError::CustomerNotFound(identity.to_string()))?;

        let return_url = format!("{}/subscription", self.app_base_url.trim_end_matches('/'));

        let session = self
            .provider
            .create_portal_session(&customer.id, &return_url)
            .await?;

        tracing::info!(
            tenant = %identity,
            customer_id = %customer.id,
            "Created billing portal session"
        );

        Ok(session)
    }
}
