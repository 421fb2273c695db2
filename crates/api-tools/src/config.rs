//! Dispatcher configuration: upstream origin and environment-sourced credentials.

use std::fmt;
use thiserror::Error;
use url::Url;

/// Upstream origin used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://klaud-api.klaud0x.workers.dev";

/// Client identifier sent as `User-Agent` on every upstream request.
pub const CLIENT_ID: &str = concat!("klaud-api-mcp/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// An opaque credential value. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a token. Empty strings are treated as "no credential".
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// The credential families understood by the upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// General API key (content endpoints).
    ApiKey,
    /// Token scoping access to one key-value store.
    StoreToken,
    /// Agent identity token (messaging, registry and task endpoints).
    AgentToken,
}

/// Where a credential is attached on the outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialPlacement {
    Query(&'static str),
    Header(&'static str),
    Bearer,
}

impl CredentialKind {
    #[must_use]
    pub fn placement(self) -> CredentialPlacement {
        match self {
            Self::ApiKey => CredentialPlacement::Query("key"),
            Self::StoreToken => CredentialPlacement::Header("X-Store-Token"),
            Self::AgentToken => CredentialPlacement::Bearer,
        }
    }
}

/// Environment-sourced credentials, handed to the dispatcher at construction time.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub api_key: Option<Secret>,
    pub store_token: Option<Secret>,
    pub agent_token: Option<Secret>,
}

impl Credentials {
    #[must_use]
    pub fn get(&self, kind: CredentialKind) -> Option<&Secret> {
        match kind {
            CredentialKind::ApiKey => self.api_key.as_ref(),
            CredentialKind::StoreToken => self.store_token.as_ref(),
            CredentialKind::AgentToken => self.agent_token.as_ref(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub credentials: Credentials,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials: Credentials::default(),
        }
    }
}

impl ClientConfig {
    /// Parse and check the configured origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or is not an `http(s)` URL with a host.
    pub fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason,
        };
        let url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        if url.host_str().is_none() {
            return Err(invalid("missing host".to_string()));
        }
        Ok(url)
    }
}
