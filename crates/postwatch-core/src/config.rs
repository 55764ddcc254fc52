use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Interval bounds recorded on sessions, matching the scheduler the scraping
/// collaborator runs (1 minute to 24 hours).
const MIN_INTERVAL_MINUTES: u32 = 1;
const MAX_INTERVAL_MINUTES: u32 = 1440;

const DEFAULT_CHANNEL: &str = "César Langreo";
const DEFAULT_SOURCE_URL: &str = "https://www.youtube.com/c/CésarLangreo/posts";

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

/// Load application configuration from environment variables already in the
/// process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for
/// testing or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup — no
/// `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
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

    let parse_i32 = |var: &str, default: &str| -> Result<i32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<i32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("POSTWATCH_ENV", "development"));
    let log_level = or_default("POSTWATCH_LOG_LEVEL", "info");
    let channel = or_default("POSTWATCH_CHANNEL", DEFAULT_CHANNEL);
    let source_url = or_default("POSTWATCH_SOURCE_URL", DEFAULT_SOURCE_URL);

    let webhook_url = lookup("POSTWATCH_WEBHOOK_URL")
        .ok()
        .filter(|v| !v.is_empty());
    let webhook_timeout_secs = parse_u64("POSTWATCH_WEBHOOK_TIMEOUT_SECS", "30")?;

    let max_age_days = parse_u32("POSTWATCH_MAX_AGE_DAYS", "30")?;
    let session_keep = parse_u32("POSTWATCH_SESSION_KEEP", "100")?;
    let session_stale_hours = parse_u64("POSTWATCH_SESSION_STALE_HOURS", "24")?;

    let interval_minutes = parse_u32("POSTWATCH_INTERVAL_MINUTES", "60")?
        .clamp(MIN_INTERVAL_MINUTES, MAX_INTERVAL_MINUTES);

    let utc_offset_hours = parse_i32("POSTWATCH_UTC_OFFSET_HOURS", "-5")?;
    if !(-23..=23).contains(&utc_offset_hours) {
        return Err(ConfigError::InvalidEnvVar {
            var: "POSTWATCH_UTC_OFFSET_HOURS".to_string(),
            reason: format!("{utc_offset_hours} is outside -23..=23"),
        });
    }

    let db_max_connections = parse_u32("POSTWATCH_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("POSTWATCH_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("POSTWATCH_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        channel,
        source_url,
        webhook_url,
        webhook_timeout_secs,
        max_age_days,
        session_keep,
        session_stale_hours,
        interval_minutes,
        utc_offset_hours,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
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
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    /// Returns a map with all required env vars populated with valid values.
    fn full_env<'a>() -> HashMap<&'a str, &'a str> {
        let mut m = HashMap::new();
        m.insert("DATABASE_URL", "sqlite://postwatch.db");
        m
    }

    #[test]
    fn parse_environment_production() {
        assert_eq!(parse_environment("production"), Environment::Production);
    }

    #[test]
    fn parse_environment_unknown_defaults_to_development() {
        assert_eq!(parse_environment("staging"), Environment::Development);
    }

    #[test]
    fn build_app_config_fails_without_database_url() {
        let map: HashMap<&str, &str> = HashMap::new();
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "DATABASE_URL"),
            "expected MissingEnvVar(DATABASE_URL), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_defaults() {
        let map = full_env();
        let config = build_app_config(lookup_from_map(&map)).expect("valid config");

        assert_eq!(config.env, Environment::Development);
        assert_eq!(config.channel, DEFAULT_CHANNEL);
        assert!(config.webhook_url.is_none());
        assert_eq!(config.max_age_days, 30);
        assert_eq!(config.session_keep, 100);
        assert_eq!(config.session_stale_hours, 24);
        assert_eq!(config.interval_minutes, 60);
        assert_eq!(config.utc_offset_hours, -5);
        assert_eq!(config.db_max_connections, 10);
    }

    #[test]
    fn empty_webhook_url_is_treated_as_unset() {
        let mut map = full_env();
        map.insert("POSTWATCH_WEBHOOK_URL", "");
        let config = build_app_config(lookup_from_map(&map)).expect("valid config");
        assert!(config.webhook_url.is_none());
    }

    #[test]
    fn interval_is_clamped_to_scheduler_bounds() {
        let mut map = full_env();
        map.insert("POSTWATCH_INTERVAL_MINUTES", "100000");
        let config = build_app_config(lookup_from_map(&map)).expect("valid config");
        assert_eq!(config.interval_minutes, 1440);

        let mut map = full_env();
        map.insert("POSTWATCH_INTERVAL_MINUTES", "0");
        let config = build_app_config(lookup_from_map(&map)).expect("valid config");
        assert_eq!(config.interval_minutes, 1);
    }

    #[test]
    fn rejects_out_of_range_utc_offset() {
        let mut map = full_env();
        map.insert("POSTWATCH_UTC_OFFSET_HOURS", "30");
        let result = build_app_config(lookup_from_map(&map));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnvVar { ref var, .. })
                if var == "POSTWATCH_UTC_OFFSET_HOURS"
        ));
    }

    #[test]
    fn rejects_non_numeric_max_age() {
        let mut map = full_env();
        map.insert("POSTWATCH_MAX_AGE_DAYS", "a month");
        let result = build_app_config(lookup_from_map(&map));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "POSTWATCH_MAX_AGE_DAYS"
        ));
    }

    #[test]
    fn debug_output_redacts_connection_strings() {
        let mut map = full_env();
        map.insert("POSTWATCH_WEBHOOK_URL", "https://n8n.example/hook/secret");
        let config = build_app_config(lookup_from_map(&map)).expect("valid config");
        let debug = format!("{config:?}");
        assert!(!debug.contains("postwatch.db"));
        assert!(!debug.contains("secret"));
    }
}
