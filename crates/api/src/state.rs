//! Shared application state

use std::sync::Arc;

use petsit_billing::{BillingService, GraceSettingsStore};

use crate::{
    auth::{AuthState, JwtManager},
    config::Config,
};

/// State handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub jwt: JwtManager,
    pub billing: Arc<BillingService>,
}

impl AppState {
    pub fn new(config: Config, billing: BillingService) -> Self {
        let jwt = JwtManager::new(&config.supabase_jwt_secret);
        Self {
            config: Arc::new(config),
            jwt,
            billing: Arc::new(billing),
        }
    }

    /// State for the auth middleware
    pub fn auth_state(&self) -> AuthState {
        AuthState {
            jwt: self.jwt.clone(),
            config: self.config.clone(),
        }
    }

    /// Grace period setting store
    pub fn settings(&self) -> &Arc<dyn GraceSettingsStore> {
        &self.billing.settings
    }
}
