//! Subscription routes: status check, checkout and billing portal

use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    Json,
};
use petsit_shared::{
    CheckSubscriptionResponse, CreateCheckoutRequest, HostedUrlResponse, PlanCatalog,
};

use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Resolve the caller's current subscription status
pub async fn check_subscription(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Json<CheckSubscriptionResponse>> {
    let tenant = auth_user.tenant()?;

    let status = state.billing.resolver.resolve(&tenant).await?;

    tracing::info!(
        user_id = %auth_user.user_id,
        kind = %status.kind,
        subscribed = status.subscribed,
        blocked = status.blocked,
        "Subscription checked"
    );

    // Resolver outcomes always carry a provider status
    status.to_wire().map(Json).ok_or(ApiError::Internal)
}

/// Create a hosted checkout session for a catalog plan
pub async fn create_checkout(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    body: Result<Json<CreateCheckoutRequest>, JsonRejection>,
) -> ApiResult<Json<HostedUrlResponse>> {
    let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let price_id = req.price_id.trim();
    if price_id.is_empty() {
        return Err(ApiError::Validation("priceId is required".to_string()));
    }

    let tenant = auth_user.tenant()?;
    let session = state
        .billing
        .checkout
        .create_subscription_checkout(&tenant, price_id)
        .await?;

    tracing::info!(
        user_id = %auth_user.user_id,
        price_id = %price_id,
        session_id = %session.id,
        "Checkout session created"
    );

    Ok(Json(HostedUrlResponse { url: session.url }))
}

/// Create a self-service billing portal session
pub async fn customer_portal(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Json<HostedUrlResponse>> {
    let tenant = auth_user.tenant()?;
    let session = state.billing.portal.create_portal_session(&tenant).await?;

    tracing::info!(
        user_id = %auth_user.user_id,
        session_id = %session.id,
        "Billing portal session created"
    );

    Ok(Json(HostedUrlResponse { url: session.url }))
}

/// Public plan catalog
pub async fn list_plans(State(state): State<AppState>) -> Json<PlanCatalog> {
    Json(state.billing.catalog().clone())
}
