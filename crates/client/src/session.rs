//! Signed-in session as seen by the client

use petsit_shared::TenantIdentity;

/// An authenticated user session
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    /// Bearer credential sent to the API
    pub access_token: String,
}

impl Session {
    pub fn new(
        user_id: impl Into<String>,
        email: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            access_token: access_token.into(),
        }
    }

    pub fn tenant(&self) -> TenantIdentity {
        TenantIdentity::email(self.email.clone())
    }

    /// Same account and billing tenant; the access token may differ
    pub fn same_tenant(&self, other: &Session) -> bool {
        self.user_id == other.user_id && self.tenant() == other.tenant()
    }
}

// Keeps the bearer credential out of logs
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("access_token", &"<redacted>")
            .finish()
    }
}
