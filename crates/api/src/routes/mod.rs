//! API routes

pub mod health;
pub mod settings;
pub mod subscription;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    auth::{require_admin, require_auth},
    state::AppState,
};

/// Browser origins allowed to call the API; empty or `*` allows any
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]);

    if origins.iter().any(|s| s.trim() == "*") {
        return cors.allow_origin(Any);
    }

    let origins = origins
        .iter()
        .filter_map(|s| HeaderValue::from_str(s.trim()).ok())
        .collect::<Vec<_>>();

    if origins.is_empty() {
        return cors.allow_origin(Any);
    }

    cors.allow_origin(AllowOrigin::list(origins))
}

/// Create all API routes
pub fn create_router(state: AppState) -> Router {
    let auth_state = state.auth_state();

    // Health check routes (at root level for infrastructure monitoring)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    // Public API routes (no auth required)
    let public_api_routes = Router::new().route("/plans", get(subscription::list_plans));

    // Protected API routes (session required)
    let protected_api_routes = Router::new()
        .route("/check-subscription", post(subscription::check_subscription))
        .route("/create-checkout", post(subscription::create_checkout))
        .route("/customer-portal", post(subscription::customer_portal));

    // Admin routes; require_admin runs after require_auth
    let admin_routes = Router::new()
        .route(
            "/admin/settings/grace-period",
            get(settings::get_grace_period).put(settings::update_grace_period),
        )
        .layer(middleware::from_fn(require_admin));

    let authenticated_routes = protected_api_routes
        .merge(admin_routes)
        .layer(middleware::from_fn_with_state(auth_state, require_auth));

    let api_v1_routes = Router::new()
        .merge(public_api_routes)
        .merge(authenticated_routes);

    Router::new()
        .merge(health_routes)
        .nest("/api/v1", api_v1_routes)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&state.config.cors_allowed_origins))
        .with_state(state)
}
