//! Session lifecycle against a mocked Petsit API
//!
//! Store, access gate and remediation wired to the real HTTP backend.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use mockito::{Mock, Server, ServerGuard};
use petsit_client::{
    AccessDecision, AccessGate, BlockReason, ClientConfig, HttpBackend, RemediationAction,
    RemediationActions, RemediationError, Session, StoreSnapshot, SubscriptionStore, UrlOpener,
};
use petsit_shared::StatusKind;
use tokio::sync::watch;

const IN_GRACE: &str = r#"{"subscribed":true,"blocked":false,"status":"past_due",
    "price_id":"price_monthly","product_id":"prod_monthly",
    "subscription_end":"2025-01-01T00:00:00Z","grace_period_end":"2025-01-08T00:00:00Z",
    "days_overdue":4,"grace_period_remaining":3}"#;

const GRACE_EXCEEDED: &str = r#"{"subscribed":false,"blocked":true,"status":"past_due",
    "price_id":"price_monthly","product_id":"prod_monthly",
    "subscription_end":"2025-01-01T00:00:00Z","grace_period_end":"2025-01-08T00:00:00Z",
    "days_overdue":8,"grace_period_remaining":0,
    "message":"Grace period ended. Update your payment method."}"#;

const ACTIVE: &str = r#"{"subscribed":true,"blocked":false,"status":"active",
    "price_id":"price_monthly","product_id":"prod_monthly",
    "subscription_end":"2025-02-01T00:00:00Z"}"#;

#[derive(Default)]
struct RecordingOpener {
    opened: Mutex<Vec<String>>,
}

impl UrlOpener for RecordingOpener {
    fn open(&self, url: &str) -> Result<(), String> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

fn session() -> Session {
    Session::new("user-1", "tutor@petsit.test", "session-token")
}

fn backend(server: &ServerGuard) -> Arc<HttpBackend> {
    let mut config = ClientConfig::new(server.url());
    config.request_timeout = Duration::from_secs(5);
    Arc::new(HttpBackend::new(&config).unwrap())
}

async fn mock_status(server: &mut ServerGuard, status: usize, body: &str) -> Mock {
    server
        .mock("POST", "/api/v1/check-subscription")
        .match_header("authorization", "Bearer session-token")
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

async fn wait_for(store: &SubscriptionStore, done: impl Fn(&StoreSnapshot) -> bool) -> StoreSnapshot {
    let mut rx = store.subscribe();
    let snapshot = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| done(s)))
        .await
        .expect("timed out waiting for store")
        .expect("store closed");
    snapshot.clone()
}

fn kind_is(kind: StatusKind) -> impl Fn(&StoreSnapshot) -> bool {
    move |s| !s.loading && s.status.as_ref().map(|status| status.kind) == Some(kind)
}

// =============================================================================
// Lapse and recovery
// =============================================================================

#[tokio::test]
async fn test_grace_then_block_then_recovery_through_portal() {
    let mut server = Server::new_async().await;
    let in_grace = mock_status(&mut server, 200, IN_GRACE).await;

    let backend = backend(&server);
    let (_session_tx, sessions) = watch::channel(Some(session()));
    let store = SubscriptionStore::spawn(backend.clone(), sessions, Duration::from_secs(3600));

    // Grace: content with a persistent banner
    let snapshot = wait_for(&store, kind_is(StatusKind::PastDueInGrace)).await;
    let decision = AccessGate::evaluate(&snapshot);
    assert!(decision.permits_protected_content());
    let AccessDecision::Granted {
        warning: Some(warning),
    } = decision
    else {
        panic!("expected a grace banner, got {:?}", decision);
    };
    assert_eq!(warning.remaining_days, 3);
    assert!(!warning.dismissible());
    in_grace.remove_async().await;

    // Grace exceeded: full block
    let exceeded = mock_status(&mut server, 200, GRACE_EXCEEDED).await;
    store.refresh().await;
    let decision = AccessGate::evaluate(&store.snapshot());
    let AccessDecision::Blocked(notice) = &decision else {
        panic!("expected a block, got {:?}", decision);
    };
    assert_eq!(
        notice.reason,
        BlockReason::GracePeriodExceeded { days_overdue: 8 }
    );
    assert_eq!(
        decision.actions(),
        vec![RemediationAction::ManagePayment, RemediationAction::ViewPlans]
    );
    exceeded.remove_async().await;

    // Remediate through the billing portal
    let portal = server
        .mock("POST", "/api/v1/customer-portal")
        .match_header("authorization", "Bearer session-token")
        .with_status(200)
        .with_body(r#"{"url":"https://billing.stripe.test/session/bps_1"}"#)
        .create_async()
        .await;
    let opener = Arc::new(RecordingOpener::default());
    let actions = RemediationActions::new(backend, opener.clone());
    let url = actions
        .open_billing_portal(store.session().as_ref())
        .await
        .unwrap();
    assert_eq!(url, "https://billing.stripe.test/session/bps_1");
    assert_eq!(*opener.opened.lock().unwrap(), vec![url]);
    portal.assert_async().await;

    // Returning to the app picks up the paid invoice
    mock_status(&mut server, 200, ACTIVE).await;
    store.notify_refocus();
    let snapshot = wait_for(&store, kind_is(StatusKind::Active)).await;
    assert_eq!(
        AccessGate::evaluate(&snapshot),
        AccessDecision::Granted { warning: None }
    );
    assert!(store.is_active());
}

// =============================================================================
// Outages and sessions
// =============================================================================

#[tokio::test]
async fn test_outage_keeps_cached_access() {
    let mut server = Server::new_async().await;
    let active = mock_status(&mut server, 200, ACTIVE).await;

    let (_session_tx, sessions) = watch::channel(Some(session()));
    let store = SubscriptionStore::spawn(backend(&server), sessions, Duration::from_secs(3600));
    wait_for(&store, kind_is(StatusKind::Active)).await;
    active.remove_async().await;

    mock_status(
        &mut server,
        503,
        r#"{"error":{"code":"BILLING_UNAVAILABLE","message":"Billing is temporarily unavailable"}}"#,
    )
    .await;
    store.refresh().await;

    let snapshot = store.snapshot();
    assert!(store.is_active());
    assert!(!snapshot.loading);
    assert!(snapshot
        .last_error
        .as_deref()
        .unwrap()
        .contains("temporarily unavailable"));
    assert!(AccessGate::evaluate(&snapshot).permits_protected_content());
}

#[tokio::test]
async fn test_first_load_outage_is_soft_block() {
    let mut server = Server::new_async().await;
    mock_status(
        &mut server,
        502,
        r#"{"error":{"code":"BILLING_PROVIDER_ERROR","message":"Billing provider error"}}"#,
    )
    .await;

    let (_session_tx, sessions) = watch::channel(Some(session()));
    let store = SubscriptionStore::spawn(backend(&server), sessions, Duration::from_secs(3600));

    let snapshot = wait_for(&store, kind_is(StatusKind::TransientError)).await;
    let decision = AccessGate::evaluate(&snapshot);
    assert!(!decision.permits_protected_content());
    assert_eq!(decision.actions(), vec![RemediationAction::Retry]);
}

#[tokio::test]
async fn test_expired_session_requires_sign_in() {
    let mut server = Server::new_async().await;
    mock_status(
        &mut server,
        401,
        r#"{"error":{"code":"INVALID_TOKEN","message":"Invalid or expired token"}}"#,
    )
    .await;

    let (session_tx, sessions) = watch::channel(Some(session()));
    let store = SubscriptionStore::spawn(backend(&server), sessions, Duration::from_secs(3600));

    let snapshot = wait_for(&store, kind_is(StatusKind::NoSession)).await;
    assert_eq!(
        AccessGate::evaluate(&snapshot).actions(),
        vec![RemediationAction::SignIn]
    );

    session_tx.send(None).unwrap();
    let actions = RemediationActions::new(
        backend(&server),
        Arc::new(RecordingOpener::default()),
    );
    assert_eq!(
        actions
            .start_checkout(store.session().as_ref(), "price_monthly")
            .await,
        Err(RemediationError::NoSession)
    );
}

#[tokio::test]
async fn test_signed_out_store_never_calls_api() {
    let mut server = Server::new_async().await;
    let never = server
        .mock("POST", "/api/v1/check-subscription")
        .expect(0)
        .create_async()
        .await;

    let (_session_tx, sessions) = watch::channel(None);
    let store = SubscriptionStore::spawn(backend(&server), sessions, Duration::from_millis(20));
    tokio::time::sleep(Duration::from_millis(80)).await;
    store.refresh().await;

    assert_eq!(
        AccessGate::evaluate(&store.snapshot()),
        AccessDecision::SignInRequired {
            action: RemediationAction::SignIn
        }
    );
    never.assert_async().await;
}
