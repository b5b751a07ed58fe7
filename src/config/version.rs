//! Kit API version and host environment definitions.
//!
//! The API version is not chosen freely: OAuth credentials talk to `v4`,
//! legacy key/secret credentials talk to `v3`. The [`Environment`] type
//! mirrors the host's deployment environment and gates the automatic
//! token refresh.

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Versioned namespace of the general Kit REST API.
///
/// ```rust
/// use convertkit_api::ApiVersion;
///
/// let version: ApiVersion = "v4".parse().unwrap();
/// assert_eq!(version, ApiVersion::V4);
/// assert_eq!(version.to_string(), "v4");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    /// Legacy API, authenticated with `api_key` / `api_secret` parameters.
    V3,
    /// Current API, authenticated with an OAuth bearer token.
    V4,
}

impl ApiVersion {
    /// Returns the path segment for this version.
    #[must_use]
    pub const fn as_path(&self) -> &'static str {
        match self {
            Self::V3 => "v3",
            Self::V4 => "v4",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

impl FromStr for ApiVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v3" => Ok(Self::V3),
            "v4" => Ok(Self::V4),
            _ => Err(ConfigError::InvalidApiVersion {
                version: s.to_string(),
            }),
        }
    }
}

/// Deployment environment of the host site.
///
/// Only [`Environment::Production`] performs automatic token refresh when an
/// access token expires. Staging and development copies of a site commonly
/// share one Kit account with production; letting each refresh on its own
/// would leave them invalidating each other's tokens.
///
/// ```rust
/// use convertkit_api::Environment;
///
/// let env: Environment = "staging".parse().unwrap();
/// assert!(!env.is_production());
/// assert!(Environment::default().is_production());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Environment {
    /// Live site.
    #[default]
    Production,
    /// Pre-production copy of the site.
    Staging,
    /// Shared development environment.
    Development,
    /// Developer machine.
    Local,
}

impl Environment {
    /// Returns `true` for the production environment.
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Production => "production",
            Self::Staging => "staging",
            Self::Development => "development",
            Self::Local => "local",
        };
        f.write_str(s)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => Ok(Self::Development),
            "local" => Ok(Self::Local),
            _ => Err(ConfigError::InvalidEnvironment {
                value: s.to_string(),
            }),
        }
    }
}
