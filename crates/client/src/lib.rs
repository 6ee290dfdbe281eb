// Test code patterns (expected in test files):
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Petsit Subscription Client
//!
//! Session-side view of the subscription lifecycle.
//!
//! ## Features
//!
//! - **State Store**: Current status per session with 60s auto refresh
//! - **Access Gate**: Decides between content, grace banner and block
//! - **Remediation**: Hosted checkout and billing portal launchers
//! - **HTTP Backend**: Client of the Petsit API

pub mod backend;
pub mod config;
pub mod error;
pub mod gate;
pub mod remediation;
pub mod session;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

// Backend
pub use backend::{HttpBackend, SubscriptionBackend};

// Config
pub use config::{ClientConfig, ConfigError};

// Error
pub use error::{BackendError, RemediationError};

// Gate
pub use gate::{AccessDecision, AccessGate, BlockNotice, BlockReason, GraceWarning, RemediationAction};

// Remediation
pub use remediation::{RemediationActions, UrlOpener};

// Session
pub use session::Session;

// Store
pub use store::{StoreSnapshot, SubscriptionStore};
