use crate::app_config::{AppConfig, Environment, QueryConfig};
use crate::error::ConfigError;
use crate::query::{PageLimits, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Load only the dataset path and page limits, for tools that never bind a socket.
///
/// Calls `dotenvy::dotenv().ok()` first, like [`load_app_config`].
///
/// # Errors
///
/// Returns `ConfigError` if a page limit is present but invalid.
pub fn load_query_config() -> Result<QueryConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_query_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function,
/// so tests can drive it from a `HashMap` instead of the process environment.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let env = parse_environment(&or_default("IMMO_ENV", "development"))?;

    let bind_addr = or_default("IMMO_BIND_ADDR", "0.0.0.0:8000")
        .parse::<SocketAddr>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "IMMO_BIND_ADDR".to_string(),
            reason: e.to_string(),
        })?;
    let log_level = or_default("IMMO_LOG_LEVEL", "info");
    let static_dir = lookup("IMMO_STATIC_DIR")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);

    let QueryConfig {
        dataset_path,
        page_limits,
    } = build_query_config(&lookup)?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        dataset_path,
        static_dir,
        page_limits,
    })
}

fn build_query_config<F>(lookup: F) -> Result<QueryConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: u32| -> Result<u32, ConfigError> {
        lookup(var).map_or(Ok(default), |raw| {
            raw.parse::<u32>().map_err(|e| invalid(var, e.to_string()))
        })
    };

    let dataset_path = PathBuf::from(
        lookup("IMMO_DATASET_PATH").unwrap_or_else(|_| "./thinkimmo_dataset.json".to_string()),
    );

    let max_limit = parse_u32("IMMO_MAX_PAGE_LIMIT", MAX_PAGE_LIMIT)?;
    if max_limit == 0 {
        return Err(invalid("IMMO_MAX_PAGE_LIMIT", "must be at least 1".to_string()));
    }
    let default_limit = parse_u32("IMMO_DEFAULT_PAGE_LIMIT", DEFAULT_PAGE_LIMIT.min(max_limit))?;
    if default_limit == 0 || default_limit > max_limit {
        return Err(invalid(
            "IMMO_DEFAULT_PAGE_LIMIT",
            format!("must be between 1 and IMMO_MAX_PAGE_LIMIT ({max_limit})"),
        ));
    }

    Ok(QueryConfig {
        dataset_path,
        page_limits: PageLimits {
            default_limit,
            max_limit,
        },
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "IMMO_ENV".to_string(),
            reason: format!("expected development, test or production, got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
