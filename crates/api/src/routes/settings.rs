//! Admin settings routes

use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    Json,
};
use petsit_shared::{GraceConfig, GraceSettingBody};

use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Current grace period length
pub async fn get_grace_period(State(state): State<AppState>) -> ApiResult<Json<GraceSettingBody>> {
    let config = state.settings().grace_config().await?;
    Ok(Json(GraceSettingBody {
        grace_days: i64::from(config.grace_days),
    }))
}

/// Change the grace period length; applies from the next status check
pub async fn update_grace_period(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    body: Result<Json<GraceSettingBody>, JsonRejection>,
) -> ApiResult<Json<GraceSettingBody>> {
    let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let config = GraceConfig::new(req.grace_days)?;

    state
        .settings()
        .set_grace_config(config, Some(auth_user.user_id))
        .await?;

    tracing::info!(
        admin_id = %auth_user.user_id,
        grace_days = config.grace_days,
        "Grace period updated"
    );

    Ok(Json(GraceSettingBody {
        grace_days: i64::from(config.grace_days),
    }))
}
