//! Subscription state store
//!
//! Holds the current [`SubscriptionStatus`] of one signed-in session and
//! publishes every change on a `watch` channel. Only [`SubscriptionStore::refresh`]
//! (and the background loop that calls it) changes the status.
//!
//! Only a change of tenant (login, logout, account switch) discards the held
//! status; a rotated access token for the same tenant just refreshes.
//!
//! Overlapping refreshes are ordered by request token: a result is applied
//! only if no refresh was started after it. After [`SubscriptionStore::shutdown`]
//! late results are dropped.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use petsit_shared::SubscriptionStatus;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::backend::SubscriptionBackend;
use crate::error::BackendError;
use crate::session::Session;

/// What consumers observe
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub status: Option<SubscriptionStatus>,
    pub loading: bool,
    pub last_error: Option<String>,
}

impl StoreSnapshot {
    fn signed_out() -> Self {
        Self {
            status: Some(SubscriptionStatus::no_session()),
            loading: false,
            last_error: None,
        }
    }

    fn awaiting_first_load() -> Self {
        Self {
            status: None,
            loading: true,
            last_error: None,
        }
    }
}

struct Inner {
    backend: Arc<dyn SubscriptionBackend>,
    sessions: watch::Receiver<Option<Session>>,
    snapshot: watch::Sender<StoreSnapshot>,
    latest_token: AtomicU64,
    torn_down: AtomicBool,
    refocus: Notify,
    stop: Notify,
}

impl Inner {
    fn current_session(&self) -> Option<Session> {
        self.sessions.borrow().clone()
    }

    fn issue_token(&self) -> u64 {
        self.latest_token.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, token: u64) -> bool {
        !self.torn_down.load(Ordering::SeqCst) && self.latest_token.load(Ordering::SeqCst) == token
    }

    async fn refresh(&self) {
        if self.torn_down.load(Ordering::SeqCst) {
            return;
        }

        let token = self.issue_token();

        let Some(session) = self.current_session() else {
            self.snapshot.send_replace(StoreSnapshot::signed_out());
            return;
        };

        self.snapshot.send_modify(|snapshot| snapshot.loading = true);

        let result = self.backend.check_subscription(&session).await;

        let outcome = match result {
            Ok(wire) => SubscriptionStatus::from_wire(wire).map_err(|e| {
                tracing::warn!(error = %e, "Discarding inconsistent subscription payload");
                BackendError::Malformed(e.to_string())
            }),
            Err(e) => Err(e),
        };

        self.snapshot.send_if_modified(|snapshot| {
            if !self.is_current(token) {
                tracing::debug!(token, "Dropping stale subscription result");
                return false;
            }

            match outcome {
                Ok(status) => {
                    tracing::debug!(kind = %status.kind, "Subscription status refreshed");
                    *snapshot = StoreSnapshot {
                        status: Some(status),
                        loading: false,
                        last_error: None,
                    };
                }
                Err(BackendError::Unauthorized) => {
                    tracing::info!("Session rejected while refreshing subscription");
                    *snapshot = StoreSnapshot {
                        status: Some(SubscriptionStatus::no_session()),
                        loading: false,
                        last_error: Some(BackendError::Unauthorized.to_string()),
                    };
                }
                Err(e) => {
                    let message = e.to_string();
                    tracing::warn!(error = %message, "Subscription refresh failed");
                    snapshot.loading = false;
                    if snapshot.status.is_none() {
                        snapshot.status = Some(SubscriptionStatus::transient_error(message.clone()));
                    }
                    snapshot.last_error = Some(message);
                }
            }
            true
        });
    }

    /// Forget everything learned under the previous session
    fn reset_for_session(&self, session: Option<&Session>) {
        // Invalidates in-flight results of the previous session
        self.issue_token();
        let snapshot = match session {
            Some(_) => StoreSnapshot::awaiting_first_load(),
            None => StoreSnapshot::signed_out(),
        };
        self.snapshot.send_replace(snapshot);
    }
}

/// Per-session subscription state with automatic refresh
pub struct SubscriptionStore {
    inner: Arc<Inner>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SubscriptionStore {
    /// Start a store bound to a session channel. Must be called inside a tokio runtime.
    pub fn spawn(
        backend: Arc<dyn SubscriptionBackend>,
        sessions: watch::Receiver<Option<Session>>,
        refresh_interval: Duration,
    ) -> Self {
        let initial = if sessions.borrow().is_some() {
            StoreSnapshot::awaiting_first_load()
        } else {
            StoreSnapshot::signed_out()
        };
        let (snapshot, _) = watch::channel(initial);

        let inner = Arc::new(Inner {
            backend,
            sessions,
            snapshot,
            latest_token: AtomicU64::new(0),
            torn_down: AtomicBool::new(false),
            refocus: Notify::new(),
            stop: Notify::new(),
        });

        let task = tokio::spawn(run(inner.clone(), refresh_interval));

        Self {
            inner,
            task: Mutex::new(Some(task)),
        }
    }

    /// Resolve the status again for the current session
    pub async fn refresh(&self) {
        self.inner.refresh().await;
    }

    /// Ask for a refresh because the user came back to the application
    pub fn notify_refocus(&self) {
        self.inner.refocus.notify_one();
    }

    /// Current snapshot
    pub fn snapshot(&self) -> StoreSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Receiver that observes every snapshot change
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.inner.snapshot.subscribe()
    }

    /// Functional access right now (`subscribed` and not `blocked`)
    pub fn is_active(&self) -> bool {
        self.inner
            .snapshot
            .borrow()
            .status
            .as_ref()
            .is_some_and(SubscriptionStatus::is_active)
    }

    /// Current session, if signed in
    pub fn session(&self) -> Option<Session> {
        self.inner.current_session()
    }

    /// Stop automatic refresh and drop any result still in flight
    pub fn shutdown(&self) {
        if self.inner.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.stop.notify_one();
        if let Ok(mut task) = self.task.lock() {
            if let Some(task) = task.take() {
                task.abort();
            }
        }
        tracing::debug!("Subscription store shut down");
    }
}

impl Drop for SubscriptionStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Background loop: initial load, periodic refresh, session changes, refocus
async fn run(inner: Arc<Inner>, refresh_interval: Duration) {
    let mut sessions = inner.sessions.clone();
    let mut current = sessions.borrow_and_update().clone();
    let mut signed_in = current.is_some();

    let mut ticker = interval_at(Instant::now() + refresh_interval, refresh_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    if signed_in {
        spawn_refresh(&inner);
    }

    loop {
        tokio::select! {
            _ = inner.stop.notified() => break,
            changed = sessions.changed() => {
                if changed.is_err() {
                    tracing::debug!("Session source closed, stopping subscription refresh");
                    inner.reset_for_session(None);
                    break;
                }
                let session = sessions.borrow_and_update().clone();
                let tenant_changed = match (&current, &session) {
                    (Some(previous), Some(next)) => !previous.same_tenant(next),
                    (None, None) => false,
                    _ => true,
                };
                current = session;
                signed_in = current.is_some();

                if tenant_changed {
                    tracing::info!(signed_in, "Session changed, reloading subscription");
                    inner.reset_for_session(current.as_ref());
                    if signed_in {
                        spawn_refresh(&inner);
                        ticker.reset();
                    }
                } else if signed_in {
                    // Credential rotation: keep the held status
                    tracing::debug!("Session credential rotated, refreshing subscription");
                    spawn_refresh(&inner);
                }
            }
            _ = ticker.tick(), if signed_in => spawn_refresh(&inner),
            _ = inner.refocus.notified(), if signed_in => spawn_refresh(&inner),
        }
    }
}

fn spawn_refresh(inner: &Arc<Inner>) {
    let inner = inner.clone();
    tokio::spawn(async move { inner.refresh().await });
}
