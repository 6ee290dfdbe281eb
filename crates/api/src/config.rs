//! Application configuration

use std::env;

use petsit_shared::GraceConfig;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,
    pub cors_allowed_origins: Vec<String>,

    // Database (optional; without it the grace setting lives in memory)
    pub database_url: Option<String>,
    pub database_max_connections: u32,

    // Authentication
    pub supabase_jwt_secret: String,
    pub admin_emails: Vec<String>,

    // Billing
    pub default_grace: GraceConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Server
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            cors_allowed_origins: list_var("CORS_ALLOWED_ORIGINS"),

            // Database
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),

            // Authentication
            supabase_jwt_secret: {
                let secret = env::var("SUPABASE_JWT_SECRET")
                    .map_err(|_| ConfigError::Missing("SUPABASE_JWT_SECRET"))?;
                if secret.len() < 32 {
                    return Err(ConfigError::WeakSecret(
                        "SUPABASE_JWT_SECRET must be at least 32 characters",
                    ));
                }
                secret
            },
            admin_emails: list_var("ADMIN_EMAILS")
                .into_iter()
                .map(|email| email.to_lowercase())
                .collect(),

            // Billing
            default_grace: match env::var("GRACE_PERIOD_DAYS") {
                Ok(raw) => raw
                    .parse::<i64>()
                    .ok()
                    .and_then(|days| GraceConfig::new(days).ok())
                    .ok_or(ConfigError::Invalid(
                        "GRACE_PERIOD_DAYS must be a whole number between 0 and 90",
                    ))?,
                Err(_) => GraceConfig::default(),
            },
        })
    }

    /// Whether an email belongs to a configured administrator
    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.to_lowercase();
        self.admin_emails.iter().any(|admin| *admin == email)
    }
}

/// Comma-separated list, empty entries dropped
fn list_var(name: &str) -> Vec<String> {
    env::var(name)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("Weak secret: {0}")]
    WeakSecret(&'static str),
}
