//! Authentication middleware

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};
use petsit_shared::TenantIdentity;
use uuid::Uuid;

use crate::{
    auth::jwt::{JwtError, JwtManager},
    config::Config,
    error::ApiError,
};

/// Application roles allowed to edit global settings
const ADMIN_ROLES: &[&str] = &["admin", "master"];

/// State shared by the auth middleware
#[derive(Clone)]
pub struct AuthState {
    pub jwt: JwtManager,
    pub config: Arc<Config>,
}

/// Authenticated caller, inserted as a request extension by [`require_auth`]
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub is_admin: bool,
}

impl AuthUser {
    /// Billing tenant of this caller; the session must carry an email
    pub fn tenant(&self) -> Result<TenantIdentity, ApiError> {
        self.email
            .as_deref()
            .filter(|email| !email.trim().is_empty())
            .map(TenantIdentity::email)
            .ok_or(ApiError::Unauthorized)
    }
}

fn bearer_token(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Require a valid session token
pub async fn require_auth(
    State(auth): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request).ok_or(ApiError::Unauthorized)?;

    let claims = auth.jwt.validate_session_token(token).map_err(|e| {
        match &e {
            JwtError::Expired => tracing::debug!("Session token expired"),
            _ => tracing::warn!(error = %e, "Session token rejected"),
        }
        ApiError::InvalidToken
    })?;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
        tracing::warn!(sub = %claims.sub, "Session subject is not a UUID");
        ApiError::InvalidToken
    })?;

    let is_admin = claims
        .app_role()
        .is_some_and(|role| ADMIN_ROLES.contains(&role))
        || claims
            .email
            .as_deref()
            .is_some_and(|email| auth.config.is_admin_email(email));

    request.extensions_mut().insert(AuthUser {
        user_id,
        email: claims.email,
        is_admin,
    });

    Ok(next.run(request).await)
}

/// Require an administrator; must run after [`require_auth`]
pub async fn require_admin(request: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(ApiError::Unauthorized)?;

    if !user.is_admin {
        tracing::warn!(user_id = %user.user_id, "Non-admin attempted admin action");
        return Err(ApiError::Forbidden);
    }

    Ok(next.run(request).await)
}
