//! Configuration module for dashboard-service.

use crate::actions::DeleteMode;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub delete_mode: DeleteMode,
    pub run_migrations: bool,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `None` selects the in-memory store. Not allowed in production.
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            min_connections: 2,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            common: core_config::Config::default(),
            service_name: "dashboard-service".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            database: DatabaseConfig::default(),
            delete_mode: DeleteMode::default(),
            run_migrations: true,
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").map(|v| v == "prod").unwrap_or(false);

        let database_url = match env::var("DATABASE_URL") {
            Ok(url) if !url.is_empty() => Some(url),
            _ if is_prod => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "DATABASE_URL is required in production"
                )))
            }
            _ => None,
        };

        let delete_mode = if core_config::env_flag("INVOICE_DELETE_ENABLED", false) {
            DeleteMode::Enabled
        } else {
            DeleteMode::Disabled
        };

        Ok(Self {
            common,
            service_name: core_config::get_env("SERVICE_NAME", Some("dashboard-service"), false)?,
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            database: DatabaseConfig {
                url: database_url,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
            },
            delete_mode,
            run_migrations: core_config::env_flag("DATABASE_RUN_MIGRATIONS", true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_delete_disabled() {
        let config = DashboardConfig::default();
        assert_eq!(config.delete_mode, DeleteMode::Disabled);
        assert!(config.database.url.is_none());
        assert!(config.run_migrations);
        assert_eq!(config.common.port, 8080);
    }
}
