//! Application settings loading from keydist.toml
//!
//! Settings are optional: a missing file yields defaults. The `DATABASE_URL`
//! environment variable (possibly set through `.env`) overrides the file.

use crate::config::database::DEFAULT_DATABASE_URL;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Default settings file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "keydist.toml";

/// Configuration structure representing the entire keydist.toml file
#[derive(Debug, Default, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database URL, e.g. `sqlite://data/keydist.sqlite?mode=rwc`
    #[serde(default)]
    pub database_url: Option<String>,
    /// `tracing_subscriber` filter directive used when `RUST_LOG` is unset
    #[serde(default)]
    pub log_filter: Option<String>,
}

impl AppConfig {
    /// Database URL to connect to, falling back to the default `SQLite` file.
    #[must_use]
    pub fn database_url(&self) -> &str {
        self.database_url.as_deref().unwrap_or(DEFAULT_DATABASE_URL)
    }
}

/// Parses settings from TOML text.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse keydist.toml: {e}"),
    })
}

/// Loads settings from a TOML file.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    if !path.exists() {
        debug!("No settings file at {:?}, using defaults", path);
        return Ok(AppConfig::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;
    parse_config(&contents)
}

/// Loads `.env`, then keydist.toml from `path`, then applies environment overrides.
pub fn load_app_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    // Non-fatal, env vars can be set externally
    dotenvy::dotenv().ok();

    let mut config = load_config(path)?;
    if let Ok(url) = std::env::var("DATABASE_URL") {
        config.database_url = Some(url);
    }
    info!("Settings loaded (database: {})", config.database_url());
    Ok(config)
}
