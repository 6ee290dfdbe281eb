//! Common types used across Petsit

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{PetsitError, WireError};

// =============================================================================
// Tenant identity
// =============================================================================

/// Identity used to look up a tenant's billing-provider customer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TenantIdentity {
    /// Email of the authenticated account owner
    Email(String),
    /// Billing-provider customer key (e.g. `cus_...`)
    CustomerKey(String),
}

impl TenantIdentity {
    pub fn email(email: impl Into<String>) -> Self {
        Self::Email(email.into())
    }

    /// Short form used in log fields
    pub fn as_str(&self) -> &str {
        match self {
            Self::Email(email) => email,
            Self::CustomerKey(key) => key,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().trim().is_empty()
    }
}

impl std::fmt::Display for TenantIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Email(email) => write!(f, "email:{}", email),
            Self::CustomerKey(key) => write!(f, "customer:{}", key),
        }
    }
}

// =============================================================================
// Grace period
// =============================================================================

/// Default grace period length in days
pub const DEFAULT_GRACE_DAYS: u32 = 7;

/// Upper bound accepted from administrators
pub const MAX_GRACE_DAYS: u32 = 90;

/// Grace period configuration, read at resolution time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraceConfig {
    pub grace_days: u32,
}

impl Default for GraceConfig {
    fn default() -> Self {
        Self {
            grace_days: DEFAULT_GRACE_DAYS,
        }
    }
}

impl GraceConfig {
    /// Validated constructor used for admin edits
    pub fn new(grace_days: i64) -> Result<Self, PetsitError> {
        if grace_days < 0 {
            return Err(PetsitError::Validation(
                "grace_days must not be negative".to_string(),
            ));
        }
        if grace_days > i64::from(MAX_GRACE_DAYS) {
            return Err(PetsitError::Validation(format!(
                "grace_days must be at most {}",
                MAX_GRACE_DAYS
            )));
        }
        Ok(Self {
            grace_days: grace_days as u32,
        })
    }
}

/// Result of applying the grace period policy to an overdue period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraceEvaluation {
    /// Configured grace length the evaluation was made with
    pub grace_days: u32,
    /// Whole days elapsed since the period end (never negative)
    pub days_overdue: u32,
    /// `period_end + grace_days`
    pub grace_period_end: OffsetDateTime,
    /// `now < grace_period_end`
    pub within_grace: bool,
    /// `max(0, grace_days - days_overdue)`
    pub grace_period_remaining: u32,
}

impl GraceEvaluation {
    /// Whether a past-due tenant keeps functional access.
    ///
    /// Requires both the timestamp check and `days_overdue < grace_days`, so a
    /// zero-day grace period never yields an in-grace status.
    pub fn allows_access(&self) -> bool {
        self.within_grace && self.days_overdue < self.grace_days
    }
}

// =============================================================================
// Subscription status
// =============================================================================

/// Raw subscription state reported by the billing boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    Active,
    PastDue,
    Canceled,
    Unpaid,
    NoSubscription,
}

impl ProviderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
            Self::Unpaid => "unpaid",
            Self::NoSubscription => "no_subscription",
        }
    }
}

impl std::fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "past_due" => Ok(Self::PastDue),
            "canceled" => Ok(Self::Canceled),
            "unpaid" => Ok(Self::Unpaid),
            "no_subscription" => Ok(Self::NoSubscription),
            _ => Err(format!("Unknown subscription status: {}", s)),
        }
    }
}

/// Normalized access classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// Never subscribed
    NoSubscription,
    Active,
    /// Past due, still inside the grace period
    PastDueInGrace,
    /// Lapsed: grace exceeded, canceled or unpaid
    Blocked,
    /// Backend reported a status value this client does not know
    Unknown,
    /// Resolution failed and nothing was cached
    TransientError,
    /// No authenticated session
    NoSession,
}

impl std::fmt::Display for StatusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusKind::NoSubscription => write!(f, "no_subscription"),
            StatusKind::Active => write!(f, "active"),
            StatusKind::PastDueInGrace => write!(f, "past_due_in_grace"),
            StatusKind::Blocked => write!(f, "blocked"),
            StatusKind::Unknown => write!(f, "unknown"),
            StatusKind::TransientError => write!(f, "transient_error"),
            StatusKind::NoSession => write!(f, "no_session"),
        }
    }
}

/// Plan identifiers carried by a provider subscription
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanIds {
    pub product_id: Option<String>,
    pub price_id: Option<String>,
}

/// Message shown when a subscription was canceled or never paid
pub const LAPSED_MESSAGE: &str =
    "Your subscription was canceled or not paid. Settle it to keep using the system.";

/// Derived subscription snapshot for one tenant.
///
/// Built only through the named constructors below; never mutated after a
/// resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionStatus {
    pub kind: StatusKind,
    pub subscribed: bool,
    pub blocked: bool,
    pub provider_status: Option<ProviderStatus>,
    pub plan_product_id: Option<String>,
    pub plan_price_id: Option<String>,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub period_end: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub grace_period_end: Option<OffsetDateTime>,
    pub days_overdue: Option<u32>,
    pub grace_period_remaining: Option<u32>,
    /// Remediation text for blocked outcomes
    pub message: Option<String>,
    /// Raw diagnostic text for uncertain outcomes
    pub error: Option<String>,
}

impl SubscriptionStatus {
    fn empty(kind: StatusKind) -> Self {
        Self {
            kind,
            subscribed: false,
            blocked: false,
            provider_status: None,
            plan_product_id: None,
            plan_price_id: None,
            period_end: None,
            grace_period_end: None,
            days_overdue: None,
            grace_period_remaining: None,
            message: None,
            error: None,
        }
    }

    pub fn no_subscription() -> Self {
        Self {
            provider_status: Some(ProviderStatus::NoSubscription),
            ..Self::empty(StatusKind::NoSubscription)
        }
    }

    pub fn active(plan: PlanIds, period_end: OffsetDateTime) -> Self {
        Self {
            subscribed: true,
            provider_status: Some(ProviderStatus::Active),
            plan_product_id: plan.product_id,
            plan_price_id: plan.price_id,
            period_end: Some(period_end),
            ..Self::empty(StatusKind::Active)
        }
    }

    /// Past-due subscription; in grace or blocked depending on the evaluation
    pub fn past_due(plan: PlanIds, period_end: OffsetDateTime, grace: &GraceEvaluation) -> Self {
        let in_grace = grace.allows_access();
        let (kind, message) = if in_grace {
            (StatusKind::PastDueInGrace, None)
        } else {
            (
                StatusKind::Blocked,
                Some(format!(
                    "Your subscription is {} day(s) overdue and the {}-day grace period has ended.",
                    grace.days_overdue, grace.grace_days
                )),
            )
        };

        Self {
            subscribed: in_grace,
            blocked: !in_grace,
            provider_status: Some(ProviderStatus::PastDue),
            plan_product_id: plan.product_id,
            plan_price_id: plan.price_id,
            period_end: Some(period_end),
            grace_period_end: Some(grace.grace_period_end),
            days_overdue: Some(grace.days_overdue),
            grace_period_remaining: Some(if in_grace {
                grace.grace_period_remaining
            } else {
                0
            }),
            message,
            ..Self::empty(kind)
        }
    }

    /// Canceled or unpaid subscription
    pub fn lapsed(provider_status: ProviderStatus, message: impl Into<String>) -> Self {
        Self {
            blocked: true,
            provider_status: Some(provider_status),
            message: Some(message.into()),
            ..Self::empty(StatusKind::Blocked)
        }
    }

    pub fn transient_error(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::empty(StatusKind::TransientError)
        }
    }

    pub fn unknown(raw_status: impl Into<String>) -> Self {
        Self {
            error: Some(format!("Unrecognized subscription status: {}", raw_status.into())),
            ..Self::empty(StatusKind::Unknown)
        }
    }

    pub fn no_session() -> Self {
        Self::empty(StatusKind::NoSession)
    }

    /// Functional access right now
    pub fn is_active(&self) -> bool {
        self.subscribed && !self.blocked
    }

    /// Wire form returned by `check-subscription`.
    ///
    /// Only statuses derived from provider state have a wire form.
    pub fn to_wire(&self) -> Option<CheckSubscriptionResponse> {
        let status = self.provider_status?;
        Some(CheckSubscriptionResponse {
            subscribed: self.subscribed,
            blocked: self.blocked,
            status: status.as_str().to_string(),
            price_id: self.plan_price_id.clone(),
            product_id: self.plan_product_id.clone(),
            subscription_end: self.period_end,
            grace_period_end: self.grace_period_end,
            days_overdue: self.days_overdue,
            grace_period_remaining: self.grace_period_remaining,
            message: self.message.clone(),
        })
    }

    /// Rebuild a status from the `check-subscription` payload, rejecting
    /// payloads whose flags contradict their status.
    pub fn from_wire(wire: CheckSubscriptionResponse) -> Result<Self, WireError> {
        let status = match wire.status.parse::<ProviderStatus>() {
            Ok(status) => status,
            Err(_) => return Ok(Self::unknown(wire.status)),
        };

        let plan = PlanIds {
            product_id: wire.product_id,
            price_id: wire.price_id,
        };
        let flags = (wire.subscribed, wire.blocked);

        match status {
            ProviderStatus::Active => {
                if flags != (true, false) {
                    return Err(WireError::inconsistent(status, flags));
                }
                let period_end = wire
                    .subscription_end
                    .ok_or(WireError::MissingField("subscription_end"))?;
                Ok(Self::active(plan, period_end))
            }
            ProviderStatus::PastDue => {
                let kind = match flags {
                    (true, false) => StatusKind::PastDueInGrace,
                    (false, true) => StatusKind::Blocked,
                    _ => return Err(WireError::inconsistent(status, flags)),
                };
                let days_overdue = wire
                    .days_overdue
                    .ok_or(WireError::MissingField("days_overdue"))?;
                let remaining = wire.grace_period_remaining.unwrap_or(0);
                if kind == StatusKind::PastDueInGrace && remaining == 0 {
                    return Err(WireError::Inconsistent(
                        "past_due in grace with no remaining grace days".to_string(),
                    ));
                }
                Ok(Self {
                    subscribed: wire.subscribed,
                    blocked: wire.blocked,
                    provider_status: Some(status),
                    plan_product_id: plan.product_id,
                    plan_price_id: plan.price_id,
                    period_end: wire.subscription_end,
                    grace_period_end: wire.grace_period_end,
                    days_overdue: Some(days_overdue),
                    grace_period_remaining: Some(remaining),
                    message: wire.message,
                    ..Self::empty(kind)
                })
            }
            ProviderStatus::Canceled | ProviderStatus::Unpaid => {
                if flags != (false, true) {
                    return Err(WireError::inconsistent(status, flags));
                }
                Ok(Self::lapsed(
                    status,
                    wire.message.unwrap_or_else(|| LAPSED_MESSAGE.to_string()),
                ))
            }
            ProviderStatus::NoSubscription => {
                if flags != (false, false) {
                    return Err(WireError::inconsistent(status, flags));
                }
                Ok(Self::no_subscription())
            }
        }
    }
}

// =============================================================================
// Plan catalog
// =============================================================================

/// Billing interval for subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BillingInterval {
    #[default]
    Monthly,
    Annual,
}

impl std::str::FromStr for BillingInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monthly" | "month" => Ok(Self::Monthly),
            "annual" | "yearly" | "year" => Ok(Self::Annual),
            _ => Err(format!("Unknown billing interval: {}", s)),
        }
    }
}

/// A purchasable subscription plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub key: String,
    pub name: String,
    pub price_id: String,
    pub product_id: String,
    pub price_cents: i64,
    pub currency: String,
    pub interval: BillingInterval,
}

impl Plan {
    /// Whether this plan is the one a status is billed on
    pub fn is_current(&self, status: &SubscriptionStatus) -> bool {
        status.plan_price_id.as_deref() == Some(self.price_id.as_str())
    }
}

/// The single plan-to-price mapping of the system
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanCatalog {
    pub plans: Vec<Plan>,
}

impl PlanCatalog {
    pub fn new(plans: Vec<Plan>) -> Self {
        Self { plans }
    }

    pub fn find(&self, key: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.key == key)
    }

    pub fn find_by_price_id(&self, price_id: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.price_id == price_id)
    }

    /// Plan the given status is currently billed on, if any
    pub fn current_plan(&self, status: &SubscriptionStatus) -> Option<&Plan> {
        status
            .plan_price_id
            .as_deref()
            .and_then(|price_id| self.find_by_price_id(price_id))
    }
}

// =============================================================================
// Wire types
// =============================================================================

/// `check-subscription` response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSubscriptionResponse {
    pub subscribed: bool,
    pub blocked: bool,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(
        with = "time::serde::rfc3339::option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub subscription_end: Option<OffsetDateTime>,
    #[serde(
        with = "time::serde::rfc3339::option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub grace_period_end: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_overdue: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grace_period_remaining: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `create-checkout` request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCheckoutRequest {
    #[serde(rename = "priceId")]
    pub price_id: String,
}

/// Response carrying a hosted-flow link (checkout or portal)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedUrlResponse {
    pub url: String,
}

/// Grace period setting as exchanged with the admin endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraceSettingBody {
    pub grace_days: i64,
}
