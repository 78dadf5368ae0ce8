//! Construction-time client configuration.
//!
//! [`ClientConfig`] is immutable once built. There is no process-wide
//! mutable default: shared defaults are expressed as an ordinary
//! `ClientConfig` that new configs inherit from via
//! [`ClientConfigBuilder::from_defaults`], overriding only what differs.
//!
//! A TOML file can also seed a builder (see [`FileConfig`]); the CLI uses
//! this together with clap's environment-variable fallbacks.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::error::{ApiError, Result};

/// Connect timeout covering TCP + TLS handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall request timeout including body download.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Default `User-Agent` header value.
pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Client certificate material: a PEM bundle holding the certificate chain
/// with the private key appended.
#[derive(Clone)]
pub struct ClientIdentity {
    pem: Vec<u8>,
}

impl ClientIdentity {
    /// Validates PEM bytes by parsing them into a TLS identity.
    pub fn from_pem(pem: impl Into<Vec<u8>>) -> Result<Self> {
        let pem = pem.into();
        reqwest::Identity::from_pem(&pem)
            .map_err(|e| ApiError::config_with("invalid client certificate", e))?;
        Ok(ClientIdentity { pem })
    }

    /// Reads and validates a PEM file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let pem = std::fs::read(path).map_err(|e| {
            ApiError::config_with(
                format!("failed to read client certificate {}", path.display()),
                e,
            )
        })?;
        Self::from_pem(pem)
    }

    pub(crate) fn to_reqwest(&self) -> Result<reqwest::Identity> {
        reqwest::Identity::from_pem(&self.pem)
            .map_err(|e| ApiError::config_with("invalid client certificate", e))
    }
}

// Private key material must never end up in logs.
impl fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("pem", &format_args!("<{} bytes>", self.pem.len()))
            .finish()
    }
}

/// Immutable client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    base_url: Url,
    client_id: String,
    client_secret: String,
    identity: Option<ClientIdentity>,
    user_agent: String,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl ClientConfig {
    /// Starts an empty builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Base URL of the API, without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Host portion of the base URL, sent as the `Host` header.
    pub fn host(&self) -> &str {
        self.base_url.host_str().unwrap_or_default()
    }

    /// OAuth2 client identifier.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub(crate) fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Client certificate, if configured.
    pub fn identity(&self) -> Option<&ClientIdentity> {
        self.identity.as_ref()
    }

    /// `User-Agent` header value.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// TCP + TLS connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Whole-request timeout.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Joins `path` onto the base URL with exactly one `/` between them.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url(), path.trim_start_matches('/'))
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url())
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("identity", &self.identity)
            .field("user_agent", &self.user_agent)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    identity: Option<ClientIdentity>,
    user_agent: Option<String>,
    connect_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
}

impl ClientConfigBuilder {
    /// Starts a builder pre-filled from an existing config. Every setter
    /// called afterwards overrides the inherited value.
    pub fn from_defaults(defaults: &ClientConfig) -> Self {
        ClientConfigBuilder {
            base_url: Some(defaults.base_url().to_string()),
            client_id: Some(defaults.client_id.clone()),
            client_secret: Some(defaults.client_secret.clone()),
            identity: defaults.identity.clone(),
            user_agent: Some(defaults.user_agent.clone()),
            connect_timeout: Some(defaults.connect_timeout),
            request_timeout: Some(defaults.request_timeout),
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    pub fn identity(mut self, identity: ClientIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Overlays every value present in `file` onto this builder, loading
    /// the certificate from disk when a path is given.
    pub fn merge_file(mut self, file: &FileConfig) -> Result<Self> {
        if let Some(url) = &file.base_url {
            self.base_url = Some(url.clone());
        }
        if let Some(id) = &file.client_id {
            self.client_id = Some(id.clone());
        }
        if let Some(secret) = &file.client_secret {
            self.client_secret = Some(secret.clone());
        }
        if let Some(path) = &file.certificate_path {
            self.identity = Some(ClientIdentity::from_file(path)?);
        }
        if let Some(ua) = &file.user_agent {
            self.user_agent = Some(ua.clone());
        }
        if let Some(secs) = file.connect_timeout_secs {
            self.connect_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(secs) = file.request_timeout_secs {
            self.request_timeout = Some(Duration::from_secs(secs));
        }
        Ok(self)
    }

    /// Validates and freezes the configuration.
    ///
    /// # Errors
    ///
    /// `ApiError::Config` when `base_url`, `client_id`, or `client_secret`
    /// is missing, or when `base_url` is not an absolute http(s) URL with a
    /// host.
    pub fn build(self) -> Result<ClientConfig> {
        let raw_url = self
            .base_url
            .ok_or_else(|| ApiError::config("base_url is required"))?;
        let base_url = Url::parse(&raw_url)
            .map_err(|e| ApiError::config_with(format!("invalid base_url {raw_url:?}"), e))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.host_str().is_none() {
            return Err(ApiError::config(format!(
                "base_url must be an http(s) URL with a host, got {raw_url:?}"
            )));
        }

        Ok(ClientConfig {
            base_url,
            client_id: self
                .client_id
                .ok_or_else(|| ApiError::config("client_id is required"))?,
            client_secret: self
                .client_secret
                .ok_or_else(|| ApiError::config("client_secret is required"))?,
            identity: self.identity,
            user_agent: self
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            connect_timeout: self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            request_timeout: self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        })
    }
}

/// On-disk TOML representation. Every key is optional so a file can hold
/// only the non-secret parts and leave the rest to flags or environment.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// PEM file with the client certificate and its private key appended.
    pub certificate_path: Option<PathBuf>,
    pub user_agent: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Parses TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ApiError::config_with("invalid config file", e))
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ApiError::config_with(format!("failed to read config {}", path.display()), e)
        })?;
        Self::from_toml_str(&content)
    }
}
