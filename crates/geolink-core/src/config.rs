use thiserror::Error;

use crate::app_config::AppConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnvVar(String),
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup
/// function, decoupled from the actual environment so tests can use a
/// plain `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let log_level = or_default("GEOLINK_LOG_LEVEL", "info");
    let request_timeout_secs = parse_u64("GEOLINK_REQUEST_TIMEOUT_SECS", "30")?;
    let connect_timeout_secs = parse_u64("GEOLINK_CONNECT_TIMEOUT_SECS", "10")?;
    let user_agent = or_default("GEOLINK_USER_AGENT", "geolink/0.1 (link-conversion)");

    let connection_permission = or_default("GEOLINK_CONNECTION_PERMISSION", "ask");
    if !matches!(connection_permission.as_str(), "always" | "ask" | "never") {
        return Err(ConfigError::InvalidEnvVar {
            var: "GEOLINK_CONNECTION_PERMISSION".to_string(),
            reason: format!("expected always|ask|never, got \"{connection_permission}\""),
        });
    }

    Ok(AppConfig {
        log_level,
        request_timeout_secs,
        connect_timeout_secs,
        user_agent,
        connection_permission,
    })
}
