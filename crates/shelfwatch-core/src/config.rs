use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
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
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Like [`load_app_config_from_env`], for commands that never open a
/// database connection. `DATABASE_URL` is optional and left empty when unset.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_offline_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_offline_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    build_config(lookup, true)
}

fn build_offline_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    build_config(lookup, false)
}

fn build_config<F>(lookup: F, database_required: bool) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = if database_required {
        require("DATABASE_URL")?
    } else {
        lookup("DATABASE_URL").unwrap_or_default()
    };

    let env = parse_environment(&or_default("SHELFWATCH_ENV", "development"));
    let log_level = or_default("SHELFWATCH_LOG_LEVEL", "info");
    let brands_path = PathBuf::from(or_default("SHELFWATCH_BRANDS_PATH", "./config/brands.yaml"));
    let brands_json = optional("SHELFWATCH_BRANDS_JSON");

    let db_max_connections = parse_u32("SHELFWATCH_DB_MAX_CONNECTIONS", "5")?;
    let db_min_connections = parse_u32("SHELFWATCH_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("SHELFWATCH_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let request_timeout_secs = parse_u64("SHELFWATCH_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default(
        "SHELFWATCH_USER_AGENT",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    );
    let url_delay_ms = parse_u64("SHELFWATCH_URL_DELAY_MS", "2000")?;
    let brand_delay_ms = parse_u64("SHELFWATCH_BRAND_DELAY_MS", "1000")?;
    let max_retries = parse_u32("SHELFWATCH_MAX_RETRIES", "2")?;
    let retry_backoff_base_secs = parse_u64("SHELFWATCH_RETRY_BACKOFF_BASE_SECS", "2")?;

    let browser_bin = or_default("SHELFWATCH_BROWSER_BIN", "chromium");
    let screenshot_dir = PathBuf::from(or_default("SHELFWATCH_SCREENSHOT_DIR", "./screenshots"));
    let screenshot_api_key = optional("SCREENSHOTONE_API_KEY");
    let anthropic_api_key = optional("ANTHROPIC_API_KEY");
    let vision_model = or_default("SHELFWATCH_VISION_MODEL", "claude-3-5-haiku-latest");
    let vision_api_url = or_default("SHELFWATCH_VISION_API_URL", "https://api.anthropic.com");

    let new_window_days = parse_u32("SHELFWATCH_NEW_WINDOW_DAYS", "15")?;
    let baseline_offset_days = parse_u32("SHELFWATCH_BASELINE_OFFSET_DAYS", "30")?;

    if db_min_connections > db_max_connections {
        return Err(ConfigError::InvalidEnvVar {
            var: "SHELFWATCH_DB_MIN_CONNECTIONS".to_string(),
            reason: format!(
                "min connections ({db_min_connections}) exceeds max connections ({db_max_connections})"
            ),
        });
    }

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        brands_path,
        brands_json,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        request_timeout_secs,
        user_agent,
        url_delay_ms,
        brand_delay_ms,
        max_retries,
        retry_backoff_base_secs,
        browser_bin,
        screenshot_dir,
        screenshot_api_key,
        anthropic_api_key,
        vision_model,
        vision_api_url,
        new_window_days,
        baseline_offset_days,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
