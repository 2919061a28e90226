//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Environment variables, when `OPENDATA_BASE_URL` is set
//! 2. Otherwise the first config file found by [`probe_config_paths`]
//!
//! ## Environment Variables
//! - `OPENDATA_BASE_URL`: API base URL including prefix (required)
//! - `OPENDATA_ACCESS_TOKEN`: initial access token
//! - `OPENDATA_REFRESH_TOKEN`: initial refresh token
//! - `OPENDATA_TIMEOUT_SECS`: transport timeout in seconds
//! - `OPENDATA_MAX_ATTEMPTS`: retry wrapper attempt budget
//! - `OPENDATA_BATCH_SIZE`: batch fetcher group size
//!
//! ## File Locations
//! `opendata.{json,toml}` then `config.{json,toml}`, checked in the working
//! directory, its two parents, and the executable's directory.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use opendata_domain::{ClientConfig, OpenDataError, Result};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["opendata.json", "opendata.toml", "config.json", "config.toml"];

/// Load configuration from the environment, falling back to a file
///
/// # Errors
/// Returns `OpenDataError::Config` when neither source yields a valid
/// configuration.
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from `OPENDATA_*` environment variables
///
/// Unset optional variables keep their [`ClientConfig::default`] values.
///
/// # Errors
/// Returns `OpenDataError::Config` if `OPENDATA_BASE_URL` is missing or a
/// numeric variable does not parse.
pub fn load_from_env() -> Result<ClientConfig> {
    let defaults = ClientConfig::default();

    let mut config = ClientConfig {
        base_url: env_var("OPENDATA_BASE_URL")?,
        access_token: env_opt("OPENDATA_ACCESS_TOKEN"),
        refresh_token: env_opt("OPENDATA_REFRESH_TOKEN"),
        timeout_secs: env_parse("OPENDATA_TIMEOUT_SECS", "timeout")?
            .unwrap_or(defaults.timeout_secs),
        ..defaults
    };

    if let Some(max_attempts) = env_parse("OPENDATA_MAX_ATTEMPTS", "max attempts")? {
        config.retry.max_attempts = max_attempts;
    }
    if let Some(batch_size) = env_parse("OPENDATA_BATCH_SIZE", "batch size")? {
        config.batch.batch_size = batch_size;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `OpenDataError::Config` if the file is missing, unreadable, or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(OpenDataError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            OpenDataError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| OpenDataError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration content, choosing the format by file extension
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| OpenDataError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| OpenDataError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(OpenDataError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Return the first existing config file in the standard locations
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.clone());
        dirs.extend(cwd.ancestors().skip(1).take(2).map(Path::to_path_buf));
    }

    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir);
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        OpenDataError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Non-empty value of an optional variable
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T>(key: &str, what: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| OpenDataError::Config(format!("Invalid {what}: {e}")))
        })
        .transpose()
}
