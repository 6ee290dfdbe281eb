//! Grace period policy
//!
//! Pure arithmetic over a subscription's period end. Day counts use
//! truncating division of elapsed 24h blocks, not calendar days.

use petsit_shared::GraceEvaluation;
use time::{Duration, OffsetDateTime};

/// Source of "now" for time-based decisions
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock in UTC
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock pinned to one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

/// Evaluate the grace window for a period that ended at `period_end`.
///
/// `grace_days` is trusted; callers validate configuration before it gets here.
pub fn evaluate_grace(
    period_end: OffsetDateTime,
    grace_days: u32,
    now: OffsetDateTime,
) -> GraceEvaluation {
    let grace_period_end = period_end.saturating_add(Duration::days(i64::from(grace_days)));

    // whole_days() truncates toward zero; a future period end counts as 0
    let elapsed_days = (now - period_end).whole_days().max(0);
    let days_overdue = u32::try_from(elapsed_days).unwrap_or(u32::MAX);

    GraceEvaluation {
        grace_days,
        days_overdue,
        grace_period_end,
        within_grace: now < grace_period_end,
        grace_period_remaining: grace_days.saturating_sub(days_overdue),
    }
}
