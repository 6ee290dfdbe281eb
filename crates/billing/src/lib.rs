// Test code patterns (expected in test files):
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Petsit Billing Module
//!
//! Decides whether a tenant keeps access from its billing-provider state.
//!
//! ## Features
//!
//! - **Status Resolution**: Reduce Stripe customer/subscription records to a `SubscriptionStatus`
//! - **Grace Period Policy**: Keep past-due tenants working for a configurable number of days
//! - **Checkout**: Hosted checkout sessions for catalog plans
//! - **Portal**: Hosted self-service billing portal sessions
//! - **Settings**: Administrator-editable grace period length

pub mod checkout;
pub mod client;
pub mod error;
pub mod grace;
pub mod portal;
pub mod provider;
pub mod resolver;
pub mod settings;

use std::sync::Arc;

// Checkout
pub use checkout::CheckoutService;

// Client
pub use client::{PriceIds, StripeClient, StripeConfig};

// Error
pub use error::{BillingError, BillingResult};

// Grace
pub use grace::{evaluate_grace, Clock, FixedClock, SystemClock};

// Portal
pub use portal::PortalService;

// Provider
pub use provider::{
    BillingProvider, CheckoutSessionRequest, HostedSession, ProviderCustomer,
    ProviderSubscription, ProviderSubscriptionState, StripeProvider,
};

// Resolver
pub use resolver::{StatusResolver, LAPSED_LOOKBACK};

// Settings
pub use settings::{GraceSettingsStore, InMemoryGraceSettings, PgGraceSettings};

use petsit_shared::PlanCatalog;

/// Main billing service that combines all billing functionality
pub struct BillingService {
    pub resolver: StatusResolver,
    pub checkout: CheckoutService,
    pub portal: PortalService,
    pub settings: Arc<dyn GraceSettingsStore>,
}

impl BillingService {
    /// Create a new billing service from environment variables
    pub fn from_env(settings: Arc<dyn GraceSettingsStore>) -> BillingResult<Self> {
        let config = StripeConfig::from_env()?;
        Ok(Self::new(config, settings))
    }

    /// Create a new billing service with explicit Stripe config
    pub fn new(config: StripeConfig, settings: Arc<dyn GraceSettingsStore>) -> Self {
        let catalog = config.plan_catalog();
        let app_base_url = config.app_base_url.clone();
        let provider: Arc<dyn BillingProvider> =
            Arc::new(StripeProvider::new(StripeClient::new(config)));

        Self::with_provider(provider, catalog, app_base_url, settings)
    }

    /// Create a billing service over any provider
    pub fn with_provider(
        provider: Arc<dyn BillingProvider>,
        catalog: PlanCatalog,
        app_base_url: impl Into<String>,
        settings: Arc<dyn GraceSettingsStore>,
    ) -> Self {
        Self::with_provider_and_clock(provider, catalog, app_base_url, settings, Arc::new(SystemClock))
    }

    /// Create a billing service over any provider, reading time from `clock`
    pub fn with_provider_and_clock(
        provider: Arc<dyn BillingProvider>,
        catalog: PlanCatalog,
        app_base_url: impl Into<String>,
        settings: Arc<dyn GraceSettingsStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let app_base_url = app_base_url.into();

        Self {
            resolver: StatusResolver::with_clock(provider.clone(), settings.clone(), clock),
            checkout: CheckoutService::new(provider.clone(), catalog, app_base_url.clone()),
            portal: PortalService::new(provider, app_base_url),
            settings,
        }
    }

    /// The plan catalog checkout validates against
    pub fn catalog(&self) -> &PlanCatalog {
        self.checkout.catalog()
    }
}
