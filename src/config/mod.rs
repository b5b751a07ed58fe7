//! Configuration types for the ConvertKit API client.
//!
//! # Overview
//!
//! - [`ConvertKitConfig`]: settings shared by every request the client makes
//! - [`ConvertKitConfigBuilder`]: a builder for constructing [`ConvertKitConfig`]
//! - [`ClientId`], [`ApiKey`], [`ApiSecret`], [`HostUrl`]: validated newtypes
//! - [`ApiVersion`] and [`Environment`]
//!
//! # Example
//!
//! ```rust
//! use convertkit_api::{ConvertKitConfig, ClientId, HostUrl, Environment};
//!
//! let config = ConvertKitConfig::builder()
//!     .client_id(ClientId::new("my-client-id").unwrap())
//!     .redirect_uri(HostUrl::new("https://example.com/oauth/callback").unwrap())
//!     .environment(Environment::Staging)
//!     .build()
//!     .unwrap();
//!
//! assert!(!config.environment().is_production());
//! ```

mod newtypes;
mod version;

pub use newtypes::{ApiKey, ApiSecret, ClientId, HostUrl};
pub use version::{ApiVersion, Environment};

use std::time::Duration;

use crate::error::ConfigError;

/// Default base URL of the Kit REST API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.kit.com";

/// Default OAuth authorization endpoint.
pub const DEFAULT_AUTHORIZE_URL: &str = "https://app.kit.com/oauth/authorize";

/// Default HTTP timeout applied to every request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default wait before the single retry of a rate-limited request.
pub const DEFAULT_RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(2);

/// Configuration for the ConvertKit API client.
///
/// `ConvertKitConfig` is `Clone`, `Send`, and `Sync`.
#[derive(Clone, Debug)]
pub struct ConvertKitConfig {
    client_id: ClientId,
    redirect_uri: HostUrl,
    api_base_url: HostUrl,
    authorize_url: HostUrl,
    timeout: Duration,
    rate_limit_backoff: Duration,
    environment: Environment,
    platform: Option<String>,
    plugin_name: String,
    plugin_version: String,
    site_url: Option<String>,
    context: Option<String>,
}

impl ConvertKitConfig {
    /// Creates a new builder for constructing a `ConvertKitConfig`.
    #[must_use]
    pub fn builder() -> ConvertKitConfigBuilder {
        ConvertKitConfigBuilder::new()
    }

    /// Returns the OAuth client ID.
    #[must_use]
    pub const fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// Returns the OAuth redirect URI.
    #[must_use]
    pub const fn redirect_uri(&self) -> &HostUrl {
        &self.redirect_uri
    }

    /// Returns the API base URL.
    #[must_use]
    pub const fn api_base_url(&self) -> &HostUrl {
        &self.api_base_url
    }

    /// Returns the OAuth authorization endpoint.
    #[must_use]
    pub const fn authorize_url(&self) -> &HostUrl {
        &self.authorize_url
    }

    /// Returns the per-request HTTP timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the wait applied before retrying a rate-limited request.
    #[must_use]
    pub const fn rate_limit_backoff(&self) -> Duration {
        self.rate_limit_backoff
    }

    /// Returns the host's deployment environment.
    #[must_use]
    pub const fn environment(&self) -> Environment {
        self.environment
    }

    /// Builds the semicolon-delimited User-Agent string.
    ///
    /// Format: `<platform>;Rust/<msrv>;<plugin>/<version>;<site url>[;context/<tag>]`.
    ///
    /// `<msrv>` is the minimum Rust version this crate supports (its
    /// `rust-version`), not the version of the compiler that built it.
    #[must_use]
    pub fn user_agent(&self) -> String {
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        let mut parts = vec![
            self.platform
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            format!("Rust/{rust_version}"),
            format!("{}/{}", self.plugin_name, self.plugin_version),
            self.site_url.clone().unwrap_or_default(),
        ];
        if let Some(context) = &self.context {
            parts.push(format!("context/{context}"));
        }
        parts.join(";")
    }
}

// Verify ConvertKitConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ConvertKitConfig>();
};

/// Builder for constructing [`ConvertKitConfig`] instances.
///
/// Required fields are `client_id` and `redirect_uri`.
///
/// # Defaults
///
/// - `api_base_url`: [`DEFAULT_API_BASE_URL`]
/// - `authorize_url`: [`DEFAULT_AUTHORIZE_URL`]
/// - `timeout`: 10 seconds
/// - `rate_limit_backoff`: 2 seconds
/// - `environment`: [`Environment::Production`]
/// - `plugin_name` / `plugin_version`: this crate's name and version
#[derive(Debug, Default)]
pub struct ConvertKitConfigBuilder {
    client_id: Option<ClientId>,
    redirect_uri: Option<HostUrl>,
    api_base_url: Option<HostUrl>,
    authorize_url: Option<HostUrl>,
    timeout: Option<Duration>,
    rate_limit_backoff: Option<Duration>,
    environment: Option<Environment>,
    platform: Option<String>,
    plugin_name: Option<String>,
    plugin_version: Option<String>,
    site_url: Option<String>,
    context: Option<String>,
}

impl ConvertKitConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the OAuth client ID (required).
    #[must_use]
    pub fn client_id(mut self, client_id: ClientId) -> Self {
        self.client_id = Some(client_id);
        self
    }

    /// Sets the OAuth redirect URI (required).
    #[must_use]
    pub fn redirect_uri(mut self, redirect_uri: HostUrl) -> Self {
        self.redirect_uri = Some(redirect_uri);
        self
    }

    /// Overrides the API base URL, e.g. to point at a mock server.
    #[must_use]
    pub fn api_base_url(mut self, url: HostUrl) -> Self {
        self.api_base_url = Some(url);
        self
    }

    /// Overrides the OAuth authorization endpoint.
    #[must_use]
    pub fn authorize_url(mut self, url: HostUrl) -> Self {
        self.authorize_url = Some(url);
        self
    }

    /// Sets the per-request HTTP timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the wait before retrying a rate-limited request.
    #[must_use]
    pub const fn rate_limit_backoff(mut self, backoff: Duration) -> Self {
        self.rate_limit_backoff = Some(backoff);
        self
    }

    /// Sets the host's deployment environment.
    #[must_use]
    pub const fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Sets the host platform and version, e.g. `WordPress/6.7`.
    #[must_use]
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    /// Sets the plugin name and version reported in the User-Agent.
    #[must_use]
    pub fn plugin(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.plugin_name = Some(name.into());
        self.plugin_version = Some(version.into());
        self
    }

    /// Sets the site URL reported in the User-Agent.
    #[must_use]
    pub fn site_url(mut self, site_url: impl Into<String>) -> Self {
        self.site_url = Some(site_url.into());
        self
    }

    /// Sets a free-text context tag appended to the User-Agent.
    #[must_use]
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Builds the [`ConvertKitConfig`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `client_id` or
    /// `redirect_uri` are not set.
    pub fn build(self) -> Result<ConvertKitConfig, ConfigError> {
        let client_id = self
            .client_id
            .ok_or(ConfigError::MissingRequiredField { field: "client_id" })?;
        let redirect_uri = self
            .redirect_uri
            .ok_or(ConfigError::MissingRequiredField {
                field: "redirect_uri",
            })?;

        let api_base_url = match self.api_base_url {
            Some(url) => url,
            None => HostUrl::new(DEFAULT_API_BASE_URL)?,
        };
        let authorize_url = match self.authorize_url {
            Some(url) => url,
            None => HostUrl::new(DEFAULT_AUTHORIZE_URL)?,
        };

        Ok(ConvertKitConfig {
            client_id,
            redirect_uri,
            api_base_url,
            authorize_url,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            rate_limit_backoff: self.rate_limit_backoff.unwrap_or(DEFAULT_RATE_LIMIT_BACKOFF),
            environment: self.environment.unwrap_or_default(),
            platform: self.platform,
            plugin_name: self
                .plugin_name
                .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string()),
            plugin_version: self
                .plugin_version
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            site_url: self.site_url,
            context: self.context,
        })
    }
}
