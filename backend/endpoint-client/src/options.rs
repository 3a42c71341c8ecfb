//! Connection options and their builder.
//!
//! Options are validated once, at build time, so the bootstrap never has to
//! branch on half-filled state: credentials are either a complete pair or
//! absent, and the root location is always a parsed `http`/`https` URL.

use crate::error::options::OptionsError;
use crate::{DEFAULT_CLIENT_NAME, DEFAULT_ROOT_LOCATION, ENDPOINT_PATH_PREFIX, ENGINE_IO_PATH_SUFFIX};

use common::{ErrorLocation, RedactedSecret};

use std::panic::Location;

use log::warn;
use serde::{Deserialize, Serialize};
use url::Url;

/// How server certificates are checked, for both the login request and the
/// websocket transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsPolicy {
    /// Validate the certificate chain against the bundled web PKI roots
    /// (`webpki-roots`). The platform trust store is not consulted, for login
    /// or transport.
    #[default]
    Verify,

    /// Accept any certificate. Endpoint servers commonly run with a
    /// self-signed certificate on a LAN address; opt in explicitly.
    AcceptInvalidCertificates,
}

/// Username and password (or login token) for the credential exchange.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: RedactedSecret,
}

/// Validated options for a single connection attempt.
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    root_location: Url,
    plugin_id: String,
    client_name: Option<String>,
    credentials: Option<Credentials>,
    tls_policy: TlsPolicy,
}

impl ConnectionOptions {
    pub fn builder() -> ConnectionOptionsBuilder {
        ConnectionOptionsBuilder::default()
    }

    /// Explicit base URL, or the default root location when none was given.
    pub fn root_location(&self) -> &Url {
        &self.root_location
    }

    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    pub fn client_name(&self) -> &str {
        self.client_name.as_deref().unwrap_or(DEFAULT_CLIENT_NAME)
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn tls_policy(&self) -> TlsPolicy {
        self.tls_policy
    }

    /// `/endpoint/{plugin_id}`
    pub fn endpoint_path(&self) -> String {
        format!("{ENDPOINT_PATH_PREFIX}{}", self.plugin_id)
    }

    /// `/endpoint/{plugin_id}/engine.io/api/`
    pub fn transport_path(&self) -> String {
        format!("{}{ENGINE_IO_PATH_SUFFIX}", self.endpoint_path())
    }
}

/// Builder for [`ConnectionOptions`].
#[derive(Debug, Default)]
pub struct ConnectionOptionsBuilder {
    base_url: Option<String>,
    plugin_id: Option<String>,
    client_name: Option<String>,
    username: Option<String>,
    password: Option<RedactedSecret>,
    tls_policy: TlsPolicy,
}

impl ConnectionOptionsBuilder {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_plugin_id(mut self, plugin_id: impl Into<String>) -> Self {
        self.plugin_id = Some(plugin_id.into());
        self
    }

    pub fn with_client_name(mut self, client_name: impl Into<String>) -> Self {
        self.client_name = Some(client_name.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(RedactedSecret::new(password));
        self
    }

    pub fn with_credentials(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.with_username(username).with_password(password)
    }

    pub fn with_tls_policy(mut self, tls_policy: TlsPolicy) -> Self {
        self.tls_policy = tls_policy;
        self
    }

    /// Build the options with validation.
    #[track_caller]
    pub fn build(self) -> Result<ConnectionOptions, OptionsError> {
        let plugin_id = self.plugin_id.ok_or_else(|| OptionsError::Validation {
            message: String::from("Plugin ID is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if plugin_id.trim().is_empty() {
            return Err(OptionsError::Validation {
                message: String::from("Plugin ID cannot be empty"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let raw_root = self
            .base_url
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| String::from(DEFAULT_ROOT_LOCATION));

        let root_location = Url::parse(&raw_root).map_err(|e| OptionsError::Validation {
            message: format!("Invalid base URL '{raw_root}': {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if !matches!(root_location.scheme(), "http" | "https") {
            return Err(OptionsError::Validation {
                message: format!("Base URL must be http or https: {raw_root}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let credentials = match (self.username, self.password) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some(Credentials { username, password })
            }
            (None, None) => None,
            _ => {
                warn!("Incomplete credentials supplied; connecting without login");
                None
            }
        };

        Ok(ConnectionOptions {
            root_location,
            plugin_id,
            client_name: self.client_name.filter(|name| !name.is_empty()),
            credentials,
            tls_policy: self.tls_policy,
        })
    }
}
