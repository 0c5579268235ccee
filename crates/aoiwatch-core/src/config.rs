use std::path::PathBuf;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub const DEFAULT_API_BASE_URL: &str = "https://api.maxar.com/";
pub const DEFAULT_USER_AGENT: &str = "aoiwatch/0.1 (monitoring-dashboard)";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to a value that cannot be parsed.
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
/// Returns `ConfigError` if a variable is set to a value that cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every setting has a default, so an empty environment yields a usable
/// configuration pointed at the production API.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("AOIWATCH_ENV", "development"))?;
    let log_level = or_default("AOIWATCH_LOG_LEVEL", "info");
    let api_base_url = or_default("AOIWATCH_API_BASE_URL", DEFAULT_API_BASE_URL);
    if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
        return Err(invalid(
            "AOIWATCH_API_BASE_URL",
            format!("expected an http(s) URL, got '{api_base_url}'"),
        ));
    }

    let request_timeout_secs = parse_u64("AOIWATCH_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("AOIWATCH_USER_AGENT", DEFAULT_USER_AGENT);

    let monitor_page_limit = parse_u32("AOIWATCH_MONITOR_PAGE_LIMIT", "1000")?;
    if monitor_page_limit == 0 {
        return Err(invalid(
            "AOIWATCH_MONITOR_PAGE_LIMIT",
            "must be greater than zero".to_string(),
        ));
    }
    let preview_size_px = parse_u32("AOIWATCH_PREVIEW_SIZE_PX", "512")?;
    if preview_size_px == 0 {
        return Err(invalid(
            "AOIWATCH_PREVIEW_SIZE_PX",
            "must be greater than zero".to_string(),
        ));
    }

    let demo_mode = parse_bool("AOIWATCH_DEMO_MODE", &or_default("AOIWATCH_DEMO_MODE", "false"))?;
    let demo_image_path = lookup("AOIWATCH_DEMO_IMAGE_PATH")
        .ok()
        .filter(|p| !p.is_empty())
        .map(PathBuf::from);
    let banner_dismiss_secs = parse_u64("AOIWATCH_BANNER_DISMISS_SECS", "5")?;

    let session_path = lookup("AOIWATCH_SESSION_PATH")
        .ok()
        .filter(|p| !p.is_empty())
        .map_or_else(|| default_session_path(&lookup), PathBuf::from);
    let credentials_path = PathBuf::from(or_default(
        "AOIWATCH_CREDENTIALS_PATH",
        ".aoiwatch/credentials.json",
    ));

    Ok(AppConfig {
        env,
        log_level,
        api_base_url,
        request_timeout_secs,
        user_agent,
        monitor_page_limit,
        preview_size_px,
        demo_mode,
        demo_image_path,
        banner_dismiss_secs,
        session_path,
        credentials_path,
    })
}

/// Per-user session file: under `XDG_RUNTIME_DIR` when set, otherwise in a
/// user-named directory in the system temp dir.
fn default_session_path<F>(lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let non_empty = |var: &str| lookup(var).ok().filter(|v| !v.is_empty());

    if let Some(runtime_dir) = non_empty("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir).join("aoiwatch").join("session.json");
    }
    let user: String = non_empty("USER")
        .or_else(|| non_empty("USERNAME"))
        .unwrap_or_else(|| "default".to_string())
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    std::env::temp_dir()
        .join(format!("aoiwatch-{user}"))
        .join("session.json")
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "AOIWATCH_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
