//! Configuration loader
//!
//! Loads cache configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `DATACACHE_URL` is unset, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Without any file, uses the built-in defaults
//!
//! ## Environment Variables
//! - `DATACACHE_URL`: Store locator (required for environment loading)
//! - `DATACACHE_RECYCLE`: Versions kept per id; `none`, `off` or empty keeps
//!   every version
//! - `DATACACHE_POOL_SIZE`: Connection pool size
//! - `DATACACHE_CONNECTION_TIMEOUT`: Seconds to wait for a pooled connection
//! - `DATACACHE_BUSY_TIMEOUT_MS`: SQLite busy timeout in milliseconds
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./datacache.json` or `./datacache.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use datacache_domain::{parse_recycle, CacheConfig, Config, DataCacheError, Result};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["datacache.json", "datacache.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// Environment first, then a probed config file, then defaults. The result
/// is validated.
///
/// # Errors
/// Returns `DataCacheError::Config` if a present source is malformed or the
/// resulting configuration is invalid.
pub fn load() -> Result<Config> {
    let config = match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            config
        }
        Err(e) if std::env::var_os("DATACACHE_URL").is_some() => return Err(e),
        Err(e) => {
            tracing::debug!(error = ?e, "No environment configuration, trying file");
            match probe_config_paths() {
                Some(path) => load_from_file(Some(path))?,
                None => {
                    tracing::debug!("No config file found; using defaults");
                    Config::default()
                }
            }
        }
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// `DATACACHE_URL` is required; every other variable falls back to its
/// default when unset.
///
/// # Errors
/// Returns `DataCacheError::Config` if `DATACACHE_URL` is missing or a
/// variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let defaults = CacheConfig::default();
    let url = env_var("DATACACHE_URL")?;

    let recycle = match std::env::var("DATACACHE_RECYCLE") {
        Ok(raw) => parse_recycle(&raw).map_err(DataCacheError::Config)?,
        Err(_) => defaults.recycle,
    };

    Ok(Config {
        cache: CacheConfig {
            url,
            recycle,
            pool_size: env_parse("DATACACHE_POOL_SIZE", defaults.pool_size)?,
            connection_timeout_secs: env_parse(
                "DATACACHE_CONNECTION_TIMEOUT",
                defaults.connection_timeout_secs,
            )?,
            busy_timeout_ms: env_parse("DATACACHE_BUSY_TIMEOUT_MS", defaults.busy_timeout_ms)?,
        },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `DataCacheError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(DataCacheError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            DataCacheError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| DataCacheError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration text, format chosen by the file extension
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| DataCacheError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| DataCacheError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(DataCacheError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe the standard locations for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `DataCacheError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        DataCacheError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse an optional numeric environment variable, `default` when unset
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| DataCacheError::Config(format!("Invalid {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}
