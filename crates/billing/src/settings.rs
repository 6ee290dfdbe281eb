//! Grace period setting storage
//!
//! The grace length is an administrator-editable global setting. It is read
//! on every resolution, so edits apply to the next status check only.

use async_trait::async_trait;
use petsit_shared::GraceConfig;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::BillingResult;

/// Settings key of the grace period length
pub const GRACE_PERIOD_KEY: &str = "grace_period_days";

/// Read/write access to the grace period setting
#[async_trait]
pub trait GraceSettingsStore: Send + Sync {
    async fn grace_config(&self) -> BillingResult<GraceConfig>;

    async fn set_grace_config(
        &self,
        config: GraceConfig,
        updated_by: Option<Uuid>,
    ) -> BillingResult<()>;

    /// Cheap connectivity check for readiness probes
    async fn ping(&self) -> BillingResult<()>;

    /// Deployment default (`GRACE_PERIOD_DAYS`), used when the stored value
    /// is missing or cannot be read
    fn fallback_config(&self) -> GraceConfig;
}

/// Postgres-backed settings (`global_settings` table)
pub struct PgGraceSettings {
    pool: PgPool,
    default: GraceConfig,
}

impl PgGraceSettings {
    pub fn new(pool: PgPool, default: GraceConfig) -> Self {
        Self { pool, default }
    }
}

#[async_trait]
impl GraceSettingsStore for PgGraceSettings {
    async fn grace_config(&self) -> BillingResult<GraceConfig> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT value FROM global_settings WHERE key = $1")
                .bind(GRACE_PERIOD_KEY)
                .fetch_optional(&self.pool)
                .await?;

        let Some((value,)) = row else {
            return Ok(self.default);
        };

        match value.as_i64().map(GraceConfig::new) {
            Some(Ok(config)) => Ok(config),
            _ => {
                tracing::warn!(
                    value = %value,
                    default_days = self.default.grace_days,
                    "Invalid grace period setting, using default"
                );
                Ok(self.default)
            }
        }
    }

    async fn set_grace_config(
        &self,
        config: GraceConfig,
        updated_by: Option<Uuid>,
    ) -> BillingResult<()> {
        sqlx::query(
            r#"
            INSERT INTO global_settings (key, value, updated_by, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value,
                updated_by = EXCLUDED.updated_by,
                updated_at = NOW()
            "#,
        )
        .bind(GRACE_PERIOD_KEY)
        .bind(serde_json::Value::from(config.grace_days))
        .bind(updated_by)
        .execute(&self.pool)
        .await?;

        tracing::info!(
            grace_days = config.grace_days,
            updated_by = ?updated_by,
            "Updated grace period setting"
        );

        Ok(())
    }

    async fn ping(&self) -> BillingResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn fallback_config(&self) -> GraceConfig {
        self.default
    }
}

/// Process-local settings, used when no database is configured and in tests
pub struct InMemoryGraceSettings {
    config: RwLock<GraceConfig>,
    default: GraceConfig,
}

impl InMemoryGraceSettings {
    pub fn new(config: GraceConfig) -> Self {
        Self {
            config: RwLock::new(config),
            default: config,
        }
    }
}

impl Default for InMemoryGraceSettings {
    fn default() -> Self {
        Self::new(GraceConfig::default())
    }
}

#[async_trait]
impl GraceSettingsStore for InMemoryGraceSettings {
    async fn grace_config(&self) -> BillingResult<GraceConfig> {
        Ok(*self.config.read().await)
    }

    async fn set_grace_config(
        &self,
        config: GraceConfig,
        _updated_by: Option<Uuid>,
    ) -> BillingResult<()> {
        *self.config.write().await = config;
        Ok(())
    }

    async fn ping(&self) -> BillingResult<()> {
        Ok(())
    }

    fn fallback_config(&self) -> GraceConfig {
        self.default
    }
}
