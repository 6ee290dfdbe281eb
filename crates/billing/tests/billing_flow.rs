//! Integration tests for the billing service wiring
//!
//! Drives `BillingService` end to end over an in-memory provider: status
//! resolution across a payment lapse, checkout and the billing portal.
//!
//! ## Running Tests
//! ```bash
//! cargo test -p petsit-billing --test billing_flow
//! ```

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use petsit_billing::{
    BillingError, BillingProvider, BillingResult, BillingService, CheckoutSessionRequest,
    FixedClock, HostedSession, InMemoryGraceSettings, ProviderCustomer,
    ProviderSubscription, ProviderSubscriptionState,
};
use petsit_shared::{
    BillingInterval, GraceConfig, Plan, PlanCatalog, PlanIds, ProviderStatus, StatusKind,
    SubscriptionStatus, TenantIdentity,
};
use time::macros::datetime;
use time::OffsetDateTime;

// ============================================================================
// Test Utilities
// ============================================================================

/// Provider whose single subscription can be moved between states
struct ScriptedProvider {
    customer: Option<ProviderCustomer>,
    subscription: Mutex<Option<ProviderSubscription>>,
    checkout_requests: Mutex<Vec<CheckoutSessionRequest>>,
}

impl ScriptedProvider {
    fn new(customer: bool) -> Self {
        Self {
            customer: customer.then(|| ProviderCustomer {
                id: "cus_flow".to_string(),
                email: Some("tutor@petsit.test".to_string()),
            }),
            subscription: Mutex::new(None),
            checkout_requests: Mutex::new(Vec::new()),
        }
    }

    fn set_subscription(&self, state: ProviderSubscriptionState, period_end: OffsetDateTime) {
        *self.subscription.lock().unwrap() = Some(ProviderSubscription {
            id: "sub_flow".to_string(),
            state,
            current_period_end: period_end,
            plan: PlanIds {
                product_id: Some("prod_monthly".to_string()),
                price_id: Some("price_monthly".to_string()),
            },
        });
    }
}

#[async_trait]
impl BillingProvider for ScriptedProvider {
    async fn find_customer(
        &self,
        _identity: &TenantIdentity,
    ) -> BillingResult<Option<ProviderCustomer>> {
        Ok(self.customer.clone())
    }

    async fn list_subscriptions(
        &self,
        _customer_id: &str,
        state: Option<ProviderSubscriptionState>,
        limit: u8,
    ) -> BillingResult<Vec<ProviderSubscription>> {
        Ok(self
            .subscription
            .lock()
            .unwrap()
            .iter()
            .filter(|s| state.map_or(true, |wanted| s.state == wanted))
            .take(usize::from(limit))
            .cloned()
            .collect())
    }

    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> BillingResult<HostedSession> {
        let url = format!("https://checkout.test/{}", request.price_id);
        self.checkout_requests.lock().unwrap().push(request);
        Ok(HostedSession {
            id: "cs_flow".to_string(),
            url,
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> BillingResult<HostedSession> {
        Ok(HostedSession {
            id: "bps_flow".to_string(),
            url: format!("https://portal.test/{}?return={}", customer_id, return_url),
        })
    }
}

fn catalog() -> PlanCatalog {
    PlanCatalog::new(vec![
        Plan {
            key: "monthly".to_string(),
            name: "Monthly".to_string(),
            price_id: "price_monthly".to_string(),
            product_id: "prod_monthly".to_string(),
            price_cents: 4990,
            currency: "brl".to_string(),
            interval: BillingInterval::Monthly,
        },
        Plan {
            key: "annual".to_string(),
            name: "Annual".to_string(),
            price_id: "price_annual".to_string(),
            product_id: "prod_annual".to_string(),
            price_cents: 41916,
            currency: "brl".to_string(),
            interval: BillingInterval::Annual,
        },
    ])
}

fn service_at(
    provider: Arc<ScriptedProvider>,
    settings: Arc<InMemoryGraceSettings>,
    now: OffsetDateTime,
) -> BillingService {
    BillingService::with_provider_and_clock(
        provider,
        catalog(),
        "https://app.petsit.test/",
        settings,
        Arc::new(FixedClock(now)),
    )
}

fn tenant() -> TenantIdentity {
    TenantIdentity::email("tutor@petsit.test")
}

// ============================================================================
// Status Resolution
// ============================================================================

#[tokio::test]
async fn test_payment_lapse_walks_through_grace_into_block() {
    let provider = Arc::new(ScriptedProvider::new(true));
    let settings = Arc::new(InMemoryGraceSettings::default());
    let period_end = datetime!(2025-03-01 00:00 UTC);

    provider.set_subscription(ProviderSubscriptionState::Active, period_end);
    let status = service_at(provider.clone(), settings.clone(), datetime!(2025-02-20 00:00 UTC))
        .resolver
        .resolve(&tenant())
        .await
        .unwrap();
    assert_eq!(status.kind, StatusKind::Active);
    assert!(status.is_active());

    provider.set_subscription(ProviderSubscriptionState::PastDue, period_end);
    let status = service_at(provider.clone(), settings.clone(), datetime!(2025-03-03 12:00 UTC))
        .resolver
        .resolve(&tenant())
        .await
        .unwrap();
    assert_eq!(status.kind, StatusKind::PastDueInGrace);
    assert_eq!(status.days_overdue, Some(2));
    assert_eq!(status.grace_period_remaining, Some(5));
    assert!(status.is_active());

    let status = service_at(provider.clone(), settings.clone(), datetime!(2025-03-08 00:00 UTC))
        .resolver
        .resolve(&tenant())
        .await
        .unwrap();
    assert_eq!(status.kind, StatusKind::Blocked);
    assert_eq!(status.days_overdue, Some(7));
    assert!(!status.is_active());

    provider.set_subscription(ProviderSubscriptionState::Canceled, period_end);
    let status = service_at(provider, settings, datetime!(2025-04-01 00:00 UTC))
        .resolver
        .resolve(&tenant())
        .await
        .unwrap();
    assert_eq!(status.kind, StatusKind::Blocked);
    assert_eq!(status.provider_status, Some(ProviderStatus::Canceled));
}

#[tokio::test]
async fn test_admin_grace_change_applies_on_next_resolution() {
    let provider = Arc::new(ScriptedProvider::new(true));
    provider.set_subscription(
        ProviderSubscriptionState::PastDue,
        datetime!(2025-03-01 00:00 UTC),
    );
    let settings = Arc::new(InMemoryGraceSettings::default());
    let service = service_at(provider, settings.clone(), datetime!(2025-03-11 00:00 UTC));

    let status = service.resolver.resolve(&tenant()).await.unwrap();
    assert_eq!(status.kind, StatusKind::Blocked);

    service
        .settings
        .set_grace_config(GraceConfig::new(14).unwrap(), None)
        .await
        .unwrap();

    let status = service.resolver.resolve(&tenant()).await.unwrap();
    assert_eq!(status.kind, StatusKind::PastDueInGrace);
    assert_eq!(status.grace_period_remaining, Some(4));
}

#[tokio::test]
async fn test_resolved_status_survives_the_wire() {
    let provider = Arc::new(ScriptedProvider::new(true));
    provider.set_subscription(
        ProviderSubscriptionState::PastDue,
        datetime!(2025-03-01 00:00 UTC),
    );
    let service = service_at(
        provider,
        Arc::new(InMemoryGraceSettings::default()),
        datetime!(2025-03-05 00:00 UTC),
    );

    let status = service.resolver.resolve(&tenant()).await.unwrap();
    let wire = status.to_wire().unwrap();
    let json = serde_json::to_string(&wire).unwrap();
    let parsed = SubscriptionStatus::from_wire(serde_json::from_str(&json).unwrap()).unwrap();

    assert_eq!(parsed.kind, StatusKind::PastDueInGrace);
    assert_eq!(parsed.days_overdue, status.days_overdue);
    assert_eq!(parsed.grace_period_end, status.grace_period_end);
}

// ============================================================================
// Checkout & Portal
// ============================================================================

#[tokio::test]
async fn test_checkout_for_new_tenant_prefills_email() {
    let provider = Arc::new(ScriptedProvider::new(false));
    let service = service_at(
        provider.clone(),
        Arc::new(InMemoryGraceSettings::default()),
        datetime!(2025-03-01 00:00 UTC),
    );

    let session = service
        .checkout
        .create_subscription_checkout(&tenant(), "price_annual")
        .await
        .unwrap();
    assert_eq!(session.url, "https://checkout.test/price_annual");

    let requests = provider.checkout_requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].customer_id.is_none());
    assert_eq!(requests[0].customer_email.as_deref(), Some("tutor@petsit.test"));
    assert_eq!(
        requests[0].success_url,
        "https://app.petsit.test/subscription?checkout=success"
    );
}

#[tokio::test]
async fn test_checkout_rejects_price_outside_catalog() {
    let service = service_at(
        Arc::new(ScriptedProvider::new(true)),
        Arc::new(InMemoryGraceSettings::default()),
        datetime!(2025-03-01 00:00 UTC),
    );

    let err = service
        .checkout
        .create_subscription_checkout(&tenant(), "price_someone_else")
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::InvalidPrice(_)));
}

#[tokio::test]
async fn test_portal_requires_existing_customer() {
    let settings = Arc::new(InMemoryGraceSettings::default());
    let now = datetime!(2025-03-01 00:00 UTC);

    let service = service_at(Arc::new(ScriptedProvider::new(true)), settings.clone(), now);
    let session = service.portal.create_portal_session(&tenant()).await.unwrap();
    assert!(session.url.starts_with("https://portal.test/cus_flow"));

    let service = service_at(Arc::new(ScriptedProvider::new(false)), settings, now);
    let err = service.portal.create_portal_session(&tenant()).await.unwrap_err();
    assert!(matches!(err, BillingError::CustomerNotFound(_)));
}
