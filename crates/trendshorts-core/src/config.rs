use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

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

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
#[allow(clippy::too_many_lines)] // flat list of env vars, one binding each
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
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

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got \"{other}\""))),
        }
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("TRENDSHORTS_ENV", "development"))?;

    let bind_addr = parse_addr("TRENDSHORTS_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("TRENDSHORTS_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("TRENDSHORTS_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("TRENDSHORTS_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("TRENDSHORTS_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let trending_url = or_default(
        "TRENDSHORTS_TRENDING_URL",
        "https://www.youtube.com/feed/trending",
    );
    let region_code = parse_region_code(&or_default("TRENDSHORTS_REGION_CODE", "KR"))?;

    let scraper_request_timeout_secs =
        parse_u64("TRENDSHORTS_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_user_agent = or_default("TRENDSHORTS_SCRAPER_USER_AGENT", DEFAULT_USER_AGENT);
    let scraper_max_retries = parse_u32("TRENDSHORTS_SCRAPER_MAX_RETRIES", "3")?;
    let scraper_retry_backoff_base_secs =
        parse_u64("TRENDSHORTS_SCRAPER_RETRY_BACKOFF_BASE_SECS", "5")?;

    let extract_max_depth = parse_usize("TRENDSHORTS_EXTRACT_MAX_DEPTH", "15")?;
    let ytdlp_bin = or_default("TRENDSHORTS_YTDLP_BIN", "yt-dlp");
    let metadata_timeout_secs = parse_u64("TRENDSHORTS_METADATA_TIMEOUT_SECS", "30")?;

    let enrich_parallel = parse_bool("TRENDSHORTS_ENRICH_PARALLEL", "true")?;
    let enrich_workers = parse_usize("TRENDSHORTS_ENRICH_WORKERS", "6")?.max(1);
    let enrich_sequential_delay_ms = parse_u64("TRENDSHORTS_ENRICH_SEQUENTIAL_DELAY_MS", "300")?;

    let metadata_cache_ttl_secs = parse_u64("TRENDSHORTS_METADATA_CACHE_TTL_SECS", "3600")?;
    let metadata_cache_capacity = parse_u64("TRENDSHORTS_METADATA_CACHE_CAPACITY", "10000")?;

    let collect_max_candidates = parse_usize("TRENDSHORTS_COLLECT_MAX_CANDIDATES", "50")?;
    let collect_cron = or_default("TRENDSHORTS_COLLECT_CRON", "0 58 23 * * *");
    let retention_days = parse_u32("TRENDSHORTS_RETENTION_DAYS", "30")?;
    let retention_cron = or_default("TRENDSHORTS_RETENTION_CRON", "0 30 3 * * *");

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        trending_url,
        region_code,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_max_retries,
        scraper_retry_backoff_base_secs,
        extract_max_depth,
        ytdlp_bin,
        metadata_timeout_secs,
        enrich_parallel,
        enrich_workers,
        enrich_sequential_delay_ms,
        metadata_cache_ttl_secs,
        metadata_cache_capacity,
        collect_max_candidates,
        collect_cron,
        retention_days,
        retention_cron,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "TRENDSHORTS_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

/// Region codes are stored in a `CHAR(2)`-sized column; normalise to upper case.
fn parse_region_code(s: &str) -> Result<String, ConfigError> {
    let code = s.trim().to_ascii_uppercase();
    if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code)
    } else {
        Err(ConfigError::InvalidEnvVar {
            var: "TRENDSHORTS_REGION_CODE".to_string(),
            reason: format!("expected a two-letter region code, got \"{s}\""),
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
