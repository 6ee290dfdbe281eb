//! Billing status resolution
//!
//! Reduces a tenant's billing-provider records to a [`SubscriptionStatus`].
//! Rules are checked in a fixed order and the first match wins:
//!
//! 1. no customer → `NoSubscription`
//! 2. an `active` subscription → `Active`
//! 3. a `past_due` subscription → grace policy → `PastDueInGrace` or `Blocked`
//! 4. a `canceled`/`unpaid` one among the most recent → `Blocked`
//! 5. otherwise → `NoSubscription`
//!
//! The resolver is read-only and never retries; callers own the retry cadence.

use std::sync::Arc;

use petsit_shared::{GraceConfig, ProviderStatus, SubscriptionStatus, TenantIdentity, LAPSED_MESSAGE};

use crate::error::{BillingError, BillingResult};
use crate::grace::{evaluate_grace, Clock, SystemClock};
use crate::provider::{BillingProvider, ProviderSubscriptionState};
use crate::settings::GraceSettingsStore;

/// How many recent subscriptions are scanned for a lapsed one
pub const LAPSED_LOOKBACK: u8 = 5;

/// Resolver from tenant identity to subscription status
#[derive(Clone)]
pub struct StatusResolver {
    provider: Arc<dyn BillingProvider>,
    settings: Arc<dyn GraceSettingsStore>,
    clock: Arc<dyn Clock>,
}

impl StatusResolver {
    pub fn new(provider: Arc<dyn BillingProvider>, settings: Arc<dyn GraceSettingsStore>) -> Self {
        Self::with_clock(provider, settings, Arc::new(SystemClock))
    }

    pub fn with_clock(
        provider: Arc<dyn BillingProvider>,
        settings: Arc<dyn GraceSettingsStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            settings,
            clock,
        }
    }

    /// Resolve the current subscription status of a tenant
    pub async fn resolve(&self, identity: &TenantIdentity) -> BillingResult<SubscriptionStatus> {
        if identity.is_empty() {
            return Err(BillingError::Authentication(
                "Tenant identity is empty".to_string(),
            ));
        }

        let Some(customer) = self.provider.find_customer(identity).await? else {
            tracing::info!(tenant = %identity, "No billing customer found");
            return Ok(SubscriptionStatus::no_subscription());
        };

        tracing::debug!(tenant = %identity, customer_id = %customer.id, "Found billing customer");

        let active = self
            .provider
            .list_subscriptions(&customer.id, Some(ProviderSubscriptionState::Active), 1)
            .await?;
        if let Some(subscription) = active.into_iter().next() {
            tracing::info!(
                customer_id = %customer.id,
                subscription_id = %subscription.id,
                price_id = ?subscription.plan.price_id,
                "Active subscription found"
            );
            return Ok(SubscriptionStatus::active(
                subscription.plan,
                subscription.current_period_end,
            ));
        }

        let past_due = self
            .provider
            .list_subscriptions(&customer.id, Some(ProviderSubscriptionState::PastDue), 1)
            .await?;
        if let Some(subscription) = past_due.into_iter().next() {
            let grace = self.current_grace_config().await;
            let evaluation = evaluate_grace(
                subscription.current_period_end,
                grace.grace_days,
                self.clock.now(),
            );

            tracing::info!(
                customer_id = %customer.id,
                subscription_id = %subscription.id,
                days_overdue = evaluation.days_overdue,
                grace_days = grace.grace_days,
                within_grace = evaluation.allows_access(),
                "Past due subscription found"
            );

            return Ok(SubscriptionStatus::past_due(
                subscription.plan,
                subscription.current_period_end,
                &evaluation,
            ));
        }

        let recent = self
            .provider
            .list_subscriptions(&customer.id, None, LAPSED_LOOKBACK)
            .await?;
        if let Some(subscription) = recent.iter().find(|s| s.state.is_lapsed()) {
            let status = match subscription.state {
                ProviderSubscriptionState::Unpaid => ProviderStatus::Unpaid,
                _ => ProviderStatus::Canceled,
            };
            tracing::info!(
                customer_id = %customer.id,
                subscription_id = %subscription.id,
                status = %status,
                "Canceled/unpaid subscription found"
            );
            return Ok(SubscriptionStatus::lapsed(status, LAPSED_MESSAGE));
        }

        tracing::info!(customer_id = %customer.id, "No active subscription found");
        Ok(SubscriptionStatus::no_subscription())
    }

    /// Grace setting for this resolution; a settings outage falls back to the
    /// deployment default held by the store
    async fn current_grace_config(&self) -> GraceConfig {
        match self.settings.grace_config().await {
            Ok(config) => config,
            Err(e) => {
                let fallback = self.settings.fallback_config();
                tracing::warn!(
                    error = %e,
                    grace_days = fallback.grace_days,
                    "Failed to read grace period setting, using deployment default"
                );
                fallback
            }
        }
    }
}
