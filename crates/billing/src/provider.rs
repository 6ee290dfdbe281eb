//! Billing provider port and its Stripe adapter
//!
//! The resolver, checkout and portal services only talk to the provider
//! through [`BillingProvider`], so they can be exercised against an
//! in-memory provider in tests.

use async_trait::async_trait;
use petsit_shared::{PlanIds, TenantIdentity};
use stripe::{
    BillingPortalSession, CheckoutSession, CheckoutSessionMode, CreateBillingPortalSession,
    CreateCheckoutSession, CreateCheckoutSessionLineItems, Customer, CustomerId, ListCustomers,
    ListSubscriptions, Subscription, SubscriptionStatus as StripeSubStatus,
    SubscriptionStatusFilter,
};
use time::OffsetDateTime;

use crate::client::StripeClient;
use crate::error::{BillingError, BillingResult};

/// Customer record as seen by this system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCustomer {
    pub id: String,
    pub email: Option<String>,
}

/// Provider-side subscription state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderSubscriptionState {
    Active,
    PastDue,
    Canceled,
    Unpaid,
    Trialing,
    Incomplete,
    IncompleteExpired,
    Paused,
}

impl ProviderSubscriptionState {
    /// Lapsed states lock the tenant out without a grace period
    pub fn is_lapsed(&self) -> bool {
        matches!(self, Self::Canceled | Self::Unpaid)
    }
}

impl From<StripeSubStatus> for ProviderSubscriptionState {
    fn from(status: StripeSubStatus) -> Self {
        match status {
            StripeSubStatus::Active => Self::Active,
            StripeSubStatus::PastDue => Self::PastDue,
            StripeSubStatus::Canceled => Self::Canceled,
            StripeSubStatus::Unpaid => Self::Unpaid,
            StripeSubStatus::Trialing => Self::Trialing,
            StripeSubStatus::Incomplete => Self::Incomplete,
            StripeSubStatus::IncompleteExpired => Self::IncompleteExpired,
            StripeSubStatus::Paused => Self::Paused,
        }
    }
}

/// The subset of a provider subscription this system reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSubscription {
    pub id: String,
    pub state: ProviderSubscriptionState,
    pub current_period_end: OffsetDateTime,
    pub plan: PlanIds,
}

/// Parameters for a hosted checkout session
#[derive(Debug, Clone)]
pub struct CheckoutSessionRequest {
    /// Existing customer, when one was found
    pub customer_id: Option<String>,
    /// Prefilled email when no customer exists yet
    pub customer_email: Option<String>,
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// A provider-hosted page the user is sent to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedSession {
    pub id: String,
    pub url: String,
}

/// Read and hosted-flow operations against the billing provider
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Look up the customer for a tenant; `None` when there is no match
    async fn find_customer(
        &self,
        identity: &TenantIdentity,
    ) -> BillingResult<Option<ProviderCustomer>>;

    /// List a customer's subscriptions, newest first.
    /// `state = None` lists subscriptions in any state.
    async fn list_subscriptions(
        &self,
        customer_id: &str,
        state: Option<ProviderSubscriptionState>,
        limit: u8,
    ) -> BillingResult<Vec<ProviderSubscription>>;

    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> BillingResult<HostedSession>;

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> BillingResult<HostedSession>;
}

/// [`BillingProvider`] backed by the Stripe API
#[derive(Clone)]
pub struct StripeProvider {
    stripe: StripeClient,
}

impl StripeProvider {
    pub fn new(stripe: StripeClient) -> Self {
        Self { stripe }
    }

    fn parse_customer_id(customer_id: &str) -> BillingResult<CustomerId> {
        customer_id
            .parse::<CustomerId>()
            .map_err(|e| BillingError::StripeApi(format!("Invalid customer ID: {}", e)))
    }
}

fn status_filter(state: ProviderSubscriptionState) -> SubscriptionStatusFilter {
    match state {
        ProviderSubscriptionState::Active => SubscriptionStatusFilter::Active,
        ProviderSubscriptionState::PastDue => SubscriptionStatusFilter::PastDue,
        ProviderSubscriptionState::Canceled => SubscriptionStatusFilter::Canceled,
        ProviderSubscriptionState::Unpaid => SubscriptionStatusFilter::Unpaid,
        ProviderSubscriptionState::Trialing => SubscriptionStatusFilter::Trialing,
        ProviderSubscriptionState::Incomplete => SubscriptionStatusFilter::Incomplete,
        ProviderSubscriptionState::IncompleteExpired => SubscriptionStatusFilter::IncompleteExpired,
        ProviderSubscriptionState::Paused => SubscriptionStatusFilter::Paused,
    }
}

fn to_provider_subscription(sub: Subscription) -> BillingResult<ProviderSubscription> {
    let current_period_end = OffsetDateTime::from_unix_timestamp(sub.current_period_end)
        .map_err(|e| BillingError::StripeApi(format!("Invalid period end: {}", e)))?;

    let price = sub.items.data.first().and_then(|item| item.price.as_ref());
    let plan = PlanIds {
        product_id: price
            .and_then(|p| p.product.as_ref())
            .map(|product| product.id().to_string()),
        price_id: price.map(|p| p.id.to_string()),
    };

    Ok(ProviderSubscription {
        id: sub.id.to_string(),
        state: sub.status.into(),
        current_period_end,
        plan,
    })
}

#[async_trait]
impl BillingProvider for StripeProvider {
    async fn find_customer(
        &self,
        identity: &TenantIdentity,
    ) -> BillingResult<Option<ProviderCustomer>> {
        match identity {
            TenantIdentity::Email(email) => {
                let mut params = ListCustomers::new();
                params.email = Some(email.as_str());
                params.limit = Some(1);

                let customers = Customer::list(self.stripe.inner(), &params).await?;

                Ok(customers.data.into_iter().next().map(|customer| ProviderCustomer {
                    id: customer.id.to_string(),
                    email: customer.email,
                }))
            }
            TenantIdentity::CustomerKey(key) => {
                let customer_id = Self::parse_customer_id(key)?;
                match Customer::retrieve(self.stripe.inner(), &customer_id, &[]).await {
                    Ok(customer) => Ok(Some(ProviderCustomer {
                        id: customer.id.to_string(),
                        email: customer.email,
                    })),
                    Err(stripe::StripeError::Stripe(req)) if req.http_status == 404 => Ok(None),
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    async fn list_subscriptions(
        &self,
        customer_id: &str,
        state: Option<ProviderSubscriptionState>,
        limit: u8,
    ) -> BillingResult<Vec<ProviderSubscription>> {
        let mut params = ListSubscriptions::new();
        params.customer = Some(Self::parse_customer_id(customer_id)?);
        params.status = Some(state.map(status_filter).unwrap_or(SubscriptionStatusFilter::All));
        params.limit = Some(u64::from(limit));

        let subscriptions = Subscription::list(self.stripe.inner(), &params).await?;

        subscriptions
            .data
            .into_iter()
            .map(to_provider_subscription)
            .collect()
    }

    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> BillingResult<HostedSession> {
        let customer = request
            .customer_id
            .as_deref()
            .map(Self::parse_customer_id)
            .transpose()?;

        let line_items = vec![CreateCheckoutSessionLineItems {
            price: Some(request.price_id.clone()),
            quantity: Some(1),
            ..Default::default()
        }];

        let mut metadata = std::collections::HashMap::new();
        metadata.insert("price_id".to_string(), request.price_id.clone());
        metadata.insert("platform".to_string(), "petsit".to_string());

        let params = CreateCheckoutSession {
            customer,
            customer_email: if request.customer_id.is_none() {
                request.customer_email.as_deref()
            } else {
                None
            },
            mode: Some(CheckoutSessionMode::Subscription),
            line_items: Some(line_items),
            success_url: Some(&request.success_url),
            cancel_url: Some(&request.cancel_url),
            metadata: Some(metadata),
            allow_promotion_codes: Some(true),
            ..Default::default()
        };

        let session = CheckoutSession::create(self.stripe.inner(), params).await?;
        let url = session.url.ok_or_else(|| {
            BillingError::CheckoutCreationFailed("Stripe returned no checkout URL".to_string())
        })?;

        Ok(HostedSession {
            id: session.id.to_string(),
            url,
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> BillingResult<HostedSession> {
        let customer_id = Self::parse_customer_id(customer_id)?;

        let mut params = CreateBillingPortalSession::new(customer_id);
        params.return_url = Some(return_url);

        let session = BillingPortalSession::create(self.stripe.inner(), params).await?;

        Ok(HostedSession {
            id: session.id.to_string(),
            url: session.url,
        })
    }
}
