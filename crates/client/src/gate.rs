//! Access gate
//!
//! Pure mapping from the store snapshot to what the protected area shows.
//! Evaluated on every snapshot change.

use petsit_shared::{ProviderStatus, StatusKind, SubscriptionStatus};
use time::OffsetDateTime;

use crate::store::StoreSnapshot;

/// Something the user can do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemediationAction {
    /// Open the plans page to subscribe
    ViewPlans,
    /// Open the hosted billing portal
    ManagePayment,
    /// Run the status check again
    Retry,
    SignIn,
}

/// Persistent banner shown during the grace period; cannot be dismissed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraceWarning {
    pub remaining_days: u32,
    pub days_overdue: u32,
    pub grace_period_end: Option<OffsetDateTime>,
    pub action: RemediationAction,
}

impl GraceWarning {
    pub fn dismissible(&self) -> bool {
        false
    }

    pub fn message(&self) -> String {
        format!(
            "Your payment is {} day(s) overdue. You have {} day(s) left to settle it before access is blocked.",
            self.days_overdue, self.remaining_days
        )
    }
}

/// Why access is blocked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// Past due beyond the grace period
    GracePeriodExceeded { days_overdue: u32 },
    /// Subscription canceled or never paid
    CanceledOrUnpaid,
}

/// Full-page block with remediation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockNotice {
    pub reason: BlockReason,
    pub message: String,
    pub primary_action: RemediationAction,
    pub secondary_action: RemediationAction,
}

/// Render outcome of the protected area
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// First load in progress: neither content nor block
    Loading,
    /// No subscription yet: full-page subscribe prompt
    SubscribeRequired { action: RemediationAction },
    /// Content shown, with a banner while in grace
    Granted { warning: Option<GraceWarning> },
    Blocked(BlockNotice),
    /// Status unknown: soft block offering a retry
    Unavailable {
        error: Option<String>,
        action: RemediationAction,
    },
    SignInRequired { action: RemediationAction },
}

impl AccessDecision {
    /// Whether protected content may be rendered
    pub fn permits_protected_content(&self) -> bool {
        matches!(self, AccessDecision::Granted { .. })
    }

    /// Actions offered to the user, primary first
    pub fn actions(&self) -> Vec<RemediationAction> {
        match self {
            AccessDecision::Loading => Vec::new(),
            AccessDecision::SubscribeRequired { action }
            | AccessDecision::Unavailable { action, .. }
            | AccessDecision::SignInRequired { action } => vec![*action],
            AccessDecision::Granted { warning } => {
                warning.iter().map(|warning| warning.action).collect()
            }
            AccessDecision::Blocked(notice) => {
                vec![notice.primary_action, notice.secondary_action]
            }
        }
    }
}

/// Stateless access gate
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessGate;

impl AccessGate {
    pub fn evaluate(snapshot: &StoreSnapshot) -> AccessDecision {
        match &snapshot.status {
            None => AccessDecision::Loading,
            Some(status) => Self::decide(status),
        }
    }

    fn decide(status: &SubscriptionStatus) -> AccessDecision {
        match status.kind {
            StatusKind::Active => AccessDecision::Granted { warning: None },
            StatusKind::PastDueInGrace => AccessDecision::Granted {
                warning: Some(GraceWarning {
                    remaining_days: status.grace_period_remaining.unwrap_or(0),
                    days_overdue: status.days_overdue.unwrap_or(0),
                    grace_period_end: status.grace_period_end,
                    action: RemediationAction::ManagePayment,
                }),
            },
            StatusKind::NoSubscription => AccessDecision::SubscribeRequired {
                action: RemediationAction::ViewPlans,
            },
            StatusKind::Blocked => AccessDecision::Blocked(block_notice(status)),
            StatusKind::TransientError | StatusKind::Unknown => AccessDecision::Unavailable {
                error: status.error.clone(),
                action: RemediationAction::Retry,
            },
            StatusKind::NoSession => AccessDecision::SignInRequired {
                action: RemediationAction::SignIn,
            },
        }
    }
}

fn block_notice(status: &SubscriptionStatus) -> BlockNotice {
    let reason = match status.provider_status {
        Some(ProviderStatus::PastDue) => BlockReason::GracePeriodExceeded {
            days_overdue: status.days_overdue.unwrap_or(0),
        },
        _ => BlockReason::CanceledOrUnpaid,
    };

    let message = match reason {
        BlockReason::GracePeriodExceeded { days_overdue } => format!(
            "Access is blocked: your payment is {} day(s) overdue and the grace period has ended. Update your payment method to restore access.",
            days_overdue
        ),
        BlockReason::CanceledOrUnpaid => status.message.clone().unwrap_or_else(|| {
            "Access is blocked: your subscription was canceled or not paid. Settle it or choose a new plan.".to_string()
        }),
    };

    BlockNotice {
        reason,
        message,
        primary_action: RemediationAction::ManagePayment,
        secondary_action: RemediationAction::ViewPlans,
    }
}
