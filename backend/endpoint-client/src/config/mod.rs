//! File and environment configuration.
//!
//! Connection settings live in `{config_dir}/endpoint-client.toml`:
//!
//! ```toml
//! [connection]
//! base_url = "https://192.168.1.20:10443"
//! plugin_id = "@scrypted/core"
//! client_name = "kitchen-panel"
//! tls = "accept_invalid_certificates"
//! ```
//!
//! Credentials are never read from this file. They come from
//! `ENDPOINT_CLIENT_USERNAME` / `ENDPOINT_CLIENT_PASSWORD`, optionally loaded
//! from a `.env` file first. `ENDPOINT_CLIENT_BASE_URL` and
//! `ENDPOINT_CLIENT_PLUGIN_ID` override the file.

use crate::error::config::ConfigError;
use crate::options::{ConnectionOptions, TlsPolicy};

use common::ErrorLocation;

use std::env;
use std::panic::Location;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "endpoint-client.toml";
const CONFIG_DIR_NAME: &str = "endpoint-client";
const DOTENV_FILE_NAME: &str = ".env";

pub const BASE_URL_ENV: &str = "ENDPOINT_CLIENT_BASE_URL";
pub const PLUGIN_ID_ENV: &str = "ENDPOINT_CLIENT_PLUGIN_ID";
pub const USERNAME_ENV: &str = "ENDPOINT_CLIENT_USERNAME";
pub const PASSWORD_ENV: &str = "ENDPOINT_CLIENT_PASSWORD";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionSection {
    pub base_url: Option<String>,
    pub plugin_id: Option<String>,
    pub client_name: Option<String>,
    #[serde(default)]
    pub tls: TlsPolicy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub connection: ConnectionSection,
}

impl ClientConfig {
    /// Options for an application run: `.env`, then the config file in
    /// [`default_dir`](Self::default_dir), then environment overrides.
    pub fn resolve_options() -> Result<ConnectionOptions, ConfigError> {
        load_dotenv();
        Self::load(&Self::default_dir()?)?
            .with_env_overrides()?
            .into_options()
    }

    /// `{platform config dir}/endpoint-client`
    #[track_caller]
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME))
            .ok_or_else(|| ConfigError::DirectoryNotFound {
                location: ErrorLocation::from(Location::caller()),
            })
    }

    /// Load config from `{config_dir}/endpoint-client.toml`.
    ///
    /// A missing file yields defaults. A file that exists but cannot be read
    /// or parsed is an error.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read config file: {}", e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            }
        })?;

        let config: ClientConfig = toml::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config TOML: {}", e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Apply `ENDPOINT_CLIENT_BASE_URL` and `ENDPOINT_CLIENT_PLUGIN_ID` on top of the file values.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(base_url) = read_env(BASE_URL_ENV)? {
            debug!("Base URL overridden by {BASE_URL_ENV}");
            self.connection.base_url = Some(base_url);
        }
        if let Some(plugin_id) = read_env(PLUGIN_ID_ENV)? {
            debug!("Plugin ID overridden by {PLUGIN_ID_ENV}");
            self.connection.plugin_id = Some(plugin_id);
        }
        Ok(self)
    }

    /// Build validated options, taking credentials from the environment.
    pub fn into_options(self) -> Result<ConnectionOptions, ConfigError> {
        let section = self.connection;
        let mut builder = ConnectionOptions::builder().with_tls_policy(section.tls);

        if let Some(base_url) = section.base_url {
            builder = builder.with_base_url(base_url);
        }
        if let Some(plugin_id) = section.plugin_id {
            builder = builder.with_plugin_id(plugin_id);
        }
        if let Some(client_name) = section.client_name {
            builder = builder.with_client_name(client_name);
        }
        if let Some(username) = read_env(USERNAME_ENV)? {
            builder = builder.with_username(username);
        }
        if let Some(password) = read_env(PASSWORD_ENV)? {
            builder = builder.with_password(password);
        }

        Ok(builder.build()?)
    }
}

/// Load `.env` from the working directory, then from next to the executable.
///
/// Returns the path that was loaded, if any. Variables already set in the
/// process environment are not overwritten.
pub fn load_dotenv() -> Option<PathBuf> {
    if let Ok(path) = dotenvy::dotenv() {
        info!("Loaded .env from: {:?}", path);
        return Some(path);
    }

    let exe_dir = env::current_exe().ok()?.parent()?.to_path_buf();
    let env_path = exe_dir.join(DOTENV_FILE_NAME);
    if !env_path.exists() {
        debug!("No .env file found");
        return None;
    }

    match dotenvy::from_path(&env_path) {
        Ok(()) => {
            info!("Loaded .env from: {:?}", env_path);
            Some(env_path)
        }
        Err(e) => {
            warn!("Failed to parse .env at {:?}: {}", env_path, e);
            None
        }
    }
}

/// Unset and empty variables both read as `None`.
#[track_caller]
fn read_env(variable: &str) -> Result<Option<String>, ConfigError> {
    match env::var(variable) {
        Ok(value) if value.is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::EnvironmentError {
            location: ErrorLocation::from(Location::caller()),
            variable: variable.to_string(),
            reason: String::from("contains invalid unicode"),
        }),
    }
}
