//! In-memory backend shared by the unit tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use petsit_shared::CheckSubscriptionResponse;
use time::macros::datetime;
use tokio::sync::oneshot;

use crate::backend::SubscriptionBackend;
use crate::error::BackendError;
use crate::session::Session;

/// One scripted `check_subscription` answer, optionally held until released
pub(crate) struct Step {
    pub result: Result<CheckSubscriptionResponse, BackendError>,
    pub gate: Option<oneshot::Receiver<()>>,
}

#[derive(Default)]
pub(crate) struct ScriptedBackend {
    steps: Mutex<VecDeque<Step>>,
    /// Answer used once the script runs out
    pub fallback: Mutex<Option<Result<CheckSubscriptionResponse, BackendError>>>,
    pub checked_emails: Mutex<Vec<String>>,
    pub checkout_result: Mutex<Option<Result<String, BackendError>>>,
    pub portal_result: Mutex<Option<Result<String, BackendError>>>,
}

impl ScriptedBackend {
    pub fn push(&self, result: Result<CheckSubscriptionResponse, BackendError>) {
        self.steps.lock().unwrap().push_back(Step { result, gate: None });
    }

    /// Queue an answer that is only delivered after the returned sender fires
    pub fn push_gated(
        &self,
        result: Result<CheckSubscriptionResponse, BackendError>,
    ) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.steps.lock().unwrap().push_back(Step {
            result,
            gate: Some(rx),
        });
        tx
    }

    pub fn always(&self, result: Result<CheckSubscriptionResponse, BackendError>) {
        *self.fallback.lock().unwrap() = Some(result);
    }

    pub fn check_count(&self) -> usize {
        self.checked_emails.lock().unwrap().len()
    }
}

#[async_trait]
impl SubscriptionBackend for ScriptedBackend {
    async fn check_subscription(
        &self,
        session: &Session,
    ) -> Result<CheckSubscriptionResponse, BackendError> {
        self.checked_emails
            .lock()
            .unwrap()
            .push(session.email.clone());

        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step { result, gate }) => {
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                result
            }
            None => self
                .fallback
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Err(BackendError::Unavailable("script exhausted".to_string()))),
        }
    }

    async fn create_checkout(
        &self,
        _session: &Session,
        price_id: &str,
    ) -> Result<String, BackendError> {
        self.checkout_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(format!("https://checkout.test/{}", price_id)))
    }

    async fn customer_portal(&self, session: &Session) -> Result<String, BackendError> {
        self.portal_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(format!("https://portal.test/{}", session.user_id)))
    }
}

pub(crate) fn session(email: &str) -> Session {
    Session::new(format!("user-{}", email), email, format!("token-{}", email))
}

pub(crate) fn active_wire() -> CheckSubscriptionResponse {
    CheckSubscriptionResponse {
        subscribed: true,
        blocked: false,
        status: "active".to_string(),
        price_id: Some("price_monthly".to_string()),
        product_id: Some("prod_monthly".to_string()),
        subscription_end: Some(datetime!(2025-02-01 00:00 UTC)),
        grace_period_end: None,
        days_overdue: None,
        grace_period_remaining: None,
        message: None,
    }
}

pub(crate) fn past_due_wire(days_overdue: u32, remaining: u32) -> CheckSubscriptionResponse {
    let in_grace = remaining > 0;
    CheckSubscriptionResponse {
        subscribed: in_grace,
        blocked: !in_grace,
        status: "past_due".to_string(),
        price_id: Some("price_monthly".to_string()),
        product_id: Some("prod_monthly".to_string()),
        subscription_end: Some(datetime!(2025-01-01 00:00 UTC)),
        grace_period_end: Some(datetime!(2025-01-08 00:00 UTC)),
        days_overdue: Some(days_overdue),
        grace_period_remaining: Some(remaining),
        message: (!in_grace).then(|| "Grace period ended".to_string()),
    }
}

pub(crate) fn lapsed_wire(status: &str) -> CheckSubscriptionResponse {
    CheckSubscriptionResponse {
        subscribed: false,
        blocked: true,
        status: status.to_string(),
        price_id: None,
        product_id: None,
        subscription_end: None,
        grace_period_end: None,
        days_overdue: None,
        grace_period_remaining: None,
        message: None,
    }
}

pub(crate) fn no_subscription_wire() -> CheckSubscriptionResponse {
    CheckSubscriptionResponse {
        blocked: false,
        ..lapsed_wire("no_subscription")
    }
}
