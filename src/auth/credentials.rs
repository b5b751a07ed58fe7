//! Credentials held by an [`ApiClient`](crate::ApiClient).
//!
//! A client authenticates in exactly one way for its whole life:
//!
//! - [`Credentials::OAuth`]: a bearer [`TokenPair`] against the v4 API,
//!   replaced in place when the token is refreshed
//! - [`Credentials::ApiKey`]: a legacy key and secret sent as request
//!   parameters against the v3 API, never mutated

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::config::{ApiKey, ApiSecret, ApiVersion};

/// An OAuth access token and its refresh token.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct TokenPair {
    /// Bearer token sent with every request.
    pub access_token: String,
    /// Token used to obtain a new access token.
    pub refresh_token: String,
    /// When the access token expires, if known.
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenPair {
    /// Creates a token pair with no known expiry.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at: None,
        }
    }

    /// Sets the expiry time.
    #[must_use]
    pub const fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Returns `true` if the access token's expiry time has passed.
    ///
    /// Tokens without an expiry time are considered never expired.
    #[must_use]
    pub fn expired(&self) -> bool {
        self.expires_at.is_some_and(|expires| Utc::now() > expires)
    }

    /// Returns `true` if there is an access token to send.
    #[must_use]
    pub fn has_access_token(&self) -> bool {
        !self.access_token.is_empty()
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"*****")
            .field("refresh_token", &"*****")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// The result of a successful token refresh.
///
/// Hosts persist `current` and may revoke or audit `previous`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenRefresh {
    /// The pair that was replaced.
    pub previous: TokenPair,
    /// The pair now in use.
    pub current: TokenPair,
}

/// Receives token pairs after every successful refresh.
///
/// Automatic refreshes happen inside an unrelated API call, so this is the
/// only way a host learns that it must persist new tokens.
pub trait TokenObserver: Send + Sync {
    /// Called once per successful refresh.
    fn on_token_refresh(&self, refresh: &TokenRefresh);
}

/// How a client authenticates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    /// OAuth bearer token (v4 API).
    OAuth(TokenPair),
    /// Legacy API key and secret (v3 API).
    ApiKey {
        /// The legacy API key.
        api_key: ApiKey,
        /// The legacy API secret.
        api_secret: ApiSecret,
    },
}

impl Credentials {
    /// OAuth credentials with no tokens yet, for running the authorization flow.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::OAuth(TokenPair::default())
    }

    /// OAuth credentials from an existing access and refresh token.
    #[must_use]
    pub fn oauth(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self::OAuth(TokenPair::new(access_token, refresh_token))
    }

    /// Legacy key and secret credentials.
    #[must_use]
    pub const fn api_key(api_key: ApiKey, api_secret: ApiSecret) -> Self {
        Self::ApiKey {
            api_key,
            api_secret,
        }
    }

    /// Returns the API version these credentials authenticate against.
    #[must_use]
    pub const fn api_version(&self) -> ApiVersion {
        match self {
            Self::OAuth(_) => ApiVersion::V4,
            Self::ApiKey { .. } => ApiVersion::V3,
        }
    }

    /// Returns the token pair for OAuth credentials.
    #[must_use]
    pub const fn token_pair(&self) -> Option<&TokenPair> {
        match self {
            Self::OAuth(pair) => Some(pair),
            Self::ApiKey { .. } => None,
        }
    }

    /// Returns the non-empty access token, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.token_pair()
            .filter(|pair| pair.has_access_token())
            .map(|pair| pair.access_token.as_str())
    }

    /// Returns `true` for OAuth credentials.
    #[must_use]
    pub const fn is_oauth(&self) -> bool {
        matches!(self, Self::OAuth(_))
    }
}

/// Token endpoint response.
///
/// `oauth/token` returns `expires_in` and `created_at`; the legacy account
/// exchange returns `expires_at` directly, optionally nested under `oauth`.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct AccessTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl AccessTokenResponse {
    pub(crate) fn into_token_pair(self) -> TokenPair {
        let expires_at = self
            .expires_at
            .or_else(|| {
                self.expires_in
                    .map(|ttl| self.created_at.unwrap_or_else(|| Utc::now().timestamp()) + ttl)
            })
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single());

        TokenPair {
            access_token: self.access_token,
            refresh_token: self.refresh_token.unwrap_or_default(),
            expires_at,
        }
    }
}

// Verify Credentials is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Credentials>();
    assert_send_sync::<TokenRefresh>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_token_pair_debug_masks_secrets() {
        let pair = TokenPair::new("access-secret", "refresh-secret");
        let debug = format!("{pair:?}");
        assert!(!debug.contains("access-secret"));
        assert!(!debug.contains("refresh-secret"));
        assert!(debug.contains("*****"));
    }

    #[test]
    fn test_token_pair_expiry() {
        let expired = TokenPair::new("a", "r").with_expires_at(Utc::now() - Duration::hours(1));
        assert!(expired.expired());

        let valid = TokenPair::new("a", "r").with_expires_at(Utc::now() + Duration::hours(1));
        assert!(!valid.expired());

        assert!(!TokenPair::new("a", "r").expired());
    }

    #[test]
    fn test_credentials_select_api_version() {
        assert_eq!(Credentials::oauth("a", "r").api_version(), ApiVersion::V4);
        let legacy = Credentials::api_key(
            ApiKey::new("key").unwrap(),
            ApiSecret::new("secret").unwrap(),
        );
        assert_eq!(legacy.api_version(), ApiVersion::V3);
        assert!(!legacy.is_oauth());
        assert_eq!(legacy.access_token(), None);
    }

    #[test]
    fn test_unauthenticated_has_no_access_token() {
        let credentials = Credentials::unauthenticated();
        assert!(credentials.is_oauth());
        assert_eq!(credentials.access_token(), None);
        assert_eq!(Credentials::oauth("tok", "").access_token(), Some("tok"));
    }

    #[test]
    fn test_token_response_computes_expiry_from_created_at() {
        let response: AccessTokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "new-access",
            "refresh_token": "new-refresh",
            "token_type": "Bearer",
            "created_at": 1_700_000_000,
            "expires_in": 7200,
            "scope": "public"
        }))
        .unwrap();

        let pair = response.into_token_pair();
        assert_eq!(pair.access_token, "new-access");
        assert_eq!(pair.refresh_token, "new-refresh");
        assert_eq!(pair.expires_at.unwrap().timestamp(), 1_700_007_200);
    }

    #[test]
    fn test_token_response_prefers_explicit_expires_at() {
        let response: AccessTokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "a",
            "expires_at": 1_800_000_000,
            "expires_in": 10
        }))
        .unwrap();

        let pair = response.into_token_pair();
        assert_eq!(pair.refresh_token, "");
        assert_eq!(pair.expires_at.unwrap().timestamp(), 1_800_000_000);
    }
}
