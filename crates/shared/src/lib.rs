//! Petsit Shared Types and Utilities
//!
//! Types, errors, and utilities shared by the billing backend, the API server
//! and the session-side subscription client.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod db;
pub mod error;
pub mod types;

pub use db::*;
pub use error::*;
pub use types::*;
