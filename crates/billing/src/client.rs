//! Stripe client configuration

use petsit_shared::{BillingInterval, Plan, PlanCatalog};
use stripe::Client;

use crate::error::{BillingError, BillingResult};

/// Configuration for Stripe billing
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Stripe secret API key
    pub secret_key: String,
    /// Price IDs for the subscription plans
    pub price_ids: PriceIds,
    /// Display prices in cents, keyed like the plans
    pub monthly_price_cents: i64,
    pub annual_price_cents: i64,
    pub currency: String,
    /// Base URL for success/cancel/return redirects
    pub app_base_url: String,
}

/// Stripe price and product IDs for subscription plans
/// Plans: Monthly (flexible) → Annual (discounted)
#[derive(Debug, Clone)]
pub struct PriceIds {
    pub monthly: String,
    pub monthly_product: String,
    pub annual: Option<String>,
    pub annual_product: Option<String>,
}

impl StripeConfig {
    /// Create config from environment variables
    pub fn from_env() -> BillingResult<Self> {
        Ok(Self {
            secret_key: std::env::var("STRIPE_SECRET_KEY")
                .map_err(|_| BillingError::Config("STRIPE_SECRET_KEY not set".to_string()))?,
            price_ids: PriceIds {
                monthly: std::env::var("STRIPE_PRICE_MONTHLY")
                    .map_err(|_| BillingError::Config("STRIPE_PRICE_MONTHLY not set".to_string()))?,
                monthly_product: std::env::var("STRIPE_PRODUCT_MONTHLY").map_err(|_| {
                    BillingError::Config("STRIPE_PRODUCT_MONTHLY not set".to_string())
                })?,

                // Annual plan (optional)
                annual: std::env::var("STRIPE_PRICE_ANNUAL").ok(),
                annual_product: std::env::var("STRIPE_PRODUCT_ANNUAL").ok(),
            },
            monthly_price_cents: parse_cents("PLAN_MONTHLY_PRICE_CENTS", 4_990)?,
            annual_price_cents: parse_cents("PLAN_ANNUAL_PRICE_CENTS", 41_916)?,
            currency: std::env::var("PLAN_CURRENCY").unwrap_or_else(|_| "brl".to_string()),
            app_base_url: std::env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
        })
    }

    /// Build the plan catalog; the only place plan prices are defined
    pub fn plan_catalog(&self) -> PlanCatalog {
        let mut plans = vec![Plan {
            key: "monthly".to_string(),
            name: "Monthly".to_string(),
            price_id: self.price_ids.monthly.clone(),
            product_id: self.price_ids.monthly_product.clone(),
            price_cents: self.monthly_price_cents,
            currency: self.currency.clone(),
            interval: BillingInterval::Monthly,
        }];

        if let (Some(price_id), Some(product_id)) =
            (&self.price_ids.annual, &self.price_ids.annual_product)
        {
            plans.push(Plan {
                key: "annual".to_string(),
                name: "Annual".to_string(),
                price_id: price_id.clone(),
                product_id: product_id.clone(),
                price_cents: self.annual_price_cents,
                currency: self.currency.clone(),
                interval: BillingInterval::Annual,
            });
        }

        PlanCatalog::new(plans)
    }

    /// Get price ID for a billing interval
    pub fn price_id_for_interval(&self, interval: BillingInterval) -> Option<&str> {
        match interval {
            BillingInterval::Monthly => Some(&self.price_ids.monthly),
            BillingInterval::Annual => self.price_ids.annual.as_deref(),
        }
    }
}

fn parse_cents(var: &'static str, default: i64) -> BillingResult<i64> {
    match std::env::var(var) {
        Ok(raw) => raw
            .parse::<i64>()
            .ok()
            .filter(|cents| *cents >= 0)
            .ok_or_else(|| BillingError::Config(format!("{} must be a non-negative integer", var))),
        Err(_) => Ok(default),
    }
}

/// Stripe billing client
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    config: StripeConfig,
}

impl StripeClient {
    /// Create a new Stripe client from config
    pub fn new(config: StripeConfig) -> Self {
        let client = Client::new(&config.secret_key);
        Self { client, config }
    }

    /// Create a new Stripe client from environment variables
    pub fn from_env() -> BillingResult<Self> {
        let config = StripeConfig::from_env()?;
        Ok(Self::new(config))
    }

    /// Get the inner Stripe client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Get the config
    pub fn config(&self) -> &StripeConfig {
        &self.config
    }
}
