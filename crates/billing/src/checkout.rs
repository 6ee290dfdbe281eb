//! Hosted checkout sessions

use std::sync::Arc;

use petsit_shared::{PlanCatalog, TenantIdentity};

use crate::error::{BillingError, BillingResult};
use crate::provider::{BillingProvider, CheckoutSessionRequest, HostedSession};

/// Checkout service for creating hosted checkout sessions
pub struct CheckoutService {
    provider: Arc<dyn BillingProvider>,
    catalog: PlanCatalog,
    app_base_url: String,
}

impl CheckoutService {
    pub fn new(
        provider: Arc<dyn BillingProvider>,
        catalog: PlanCatalog,
        app_base_url: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            catalog,
            app_base_url: app_base_url.into(),
        }
    }

    pub fn catalog(&self) -> &PlanCatalog {
        &self.catalog
    }

    /// Create a subscription checkout session for a catalog price.
    ///
    /// Reuses the tenant's customer record when one exists; otherwise the
    /// checkout page is prefilled with the tenant email.
    pub async fn create_subscription_checkout(
        &self,
        identity: &TenantIdentity,
        price_id: &str,
    ) -> BillingResult<HostedSession> {
        let plan = self
            .catalog
            .find_by_price_id(price_id)
            .ok_or_else(|| BillingError::InvalidPrice(price_id.to_string()))?;

        let customer = self.provider.find_customer(identity).await?;
        let customer_email = match identity {
            TenantIdentity::Email(email) => Some(email.clone()),
            TenantIdentity::CustomerKey(_) => None,
        };

        if customer.is_none() && customer_email.is_none() {
            return Err(BillingError::CustomerNotFound(identity.to_string()));
        }

        let base_url = self.app_base_url.trim_end_matches('/');
        let request = CheckoutSessionRequest {
            customer_id: customer.map(|c| c.id),
            customer_email,
            price_id: plan.price_id.clone(),
            success_url: format!("{}/subscription?checkout=success", base_url),
            cancel_url: format!("{}/subscription?checkout=canceled", base_url),
        };

        let session = self.provider.create_checkout_session(request).await?;

        tracing::info!(
            tenant = %identity,
            session_id = %session.id,
            plan = %plan.key,
            "Created checkout session"
        );

        Ok(session)
    }
}
