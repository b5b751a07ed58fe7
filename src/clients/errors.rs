//! Error types for Kit API calls.
//!
//! Every fallible client operation returns [`ApiError`]. Transport failures,
//! server errors, rate limiting, API-domain errors and input validation all
//! arrive through this one type, so callers only ever match on one shape.
//!
//! Each error exposes:
//! - a stable machine-readable key via [`ApiError::code`]
//! - the originating HTTP status, when there is one, via [`ApiError::status`]
//! - a human-readable message via `Display`
//!
//! # Example
//!
//! ```rust,ignore
//! use convertkit_api::ApiError;
//!
//! match client.get_account().await {
//!     Ok(account) => println!("{account}"),
//!     Err(ApiError::RateLimited) => println!("slow down"),
//!     Err(e) => println!("{} ({:?}): {}", e.code(), e.status(), e),
//! }
//! ```

use thiserror::Error;

use crate::store::StoreError;

/// Message the API returns when a bearer token has expired.
pub const ACCESS_TOKEN_EXPIRED_MESSAGE: &str = "The access token expired";

/// Input validation failures, raised before any network call is made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// OAuth authorization code is empty.
    #[error("The authorization code is empty.")]
    AuthorizationCodeEmpty,

    /// Legacy API key is empty.
    #[error("The API key is empty.")]
    ApiKeyEmpty,

    /// Legacy API secret is empty.
    #[error("The API secret is empty.")]
    ApiSecretEmpty,

    /// Email address is empty.
    #[error("The email address is empty.")]
    EmailEmpty,

    /// Email address is not a valid address.
    #[error("The email address '{email}' is invalid.")]
    EmailInvalid {
        /// The rejected address.
        email: String,
    },

    /// Form ID is empty.
    #[error("The form_id parameter is empty.")]
    FormIdEmpty,

    /// Subscriber ID is empty.
    #[error("The subscriber_id parameter is empty.")]
    SubscriberIdEmpty,

    /// Tag ID is empty.
    #[error("The tag_id parameter is empty.")]
    TagIdEmpty,

    /// Sequence ID is empty.
    #[error("The sequence_id parameter is empty.")]
    SequenceIdEmpty,

    /// Signed subscriber ID is empty.
    #[error("The signed_subscriber_id parameter is empty.")]
    SignedSubscriberIdEmpty,

    /// Subscriber authentication token is empty.
    #[error("The token parameter is empty.")]
    TokenEmpty,

    /// Subscriber authentication code is empty.
    #[error("The subscriber_code parameter is empty.")]
    SubscriberCodeEmpty,

    /// URL is malformed.
    #[error("The URL '{url}' is invalid.")]
    UrlInvalid {
        /// The rejected URL.
        url: String,
    },

    /// Requested page size is outside what the endpoint accepts.
    #[error("The per_page parameter must be between 1 and {max}; {per_page} given.")]
    PerPageOutOfRange {
        /// The rejected page size.
        per_page: u32,
        /// Largest page size the endpoint accepts.
        max: u32,
    },
}

impl ValidationError {
    /// Returns the stable key identifying this validation failure.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::AuthorizationCodeEmpty => "get_access_token_code_empty",
            Self::ApiKeyEmpty => "api_key_empty",
            Self::ApiSecretEmpty => "api_secret_empty",
            Self::EmailEmpty => "subscriber_email_empty",
            Self::EmailInvalid { .. } => "subscriber_email_invalid",
            Self::FormIdEmpty => "form_id_empty",
            Self::SubscriberIdEmpty => "subscriber_id_empty",
            Self::TagIdEmpty => "tag_id_empty",
            Self::SequenceIdEmpty => "sequence_id_empty",
            Self::SignedSubscriberIdEmpty => "profile_signed_subscriber_id_empty",
            Self::TokenEmpty => "subscriber_authentication_token_empty",
            Self::SubscriberCodeEmpty => "subscriber_authentication_subscriber_code_empty",
            Self::UrlInvalid { .. } => "url_invalid",
            Self::PerPageOutOfRange { .. } => "per_page_out_of_range",
        }
    }
}

/// The uniform error returned by every client operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// DNS, connection, TLS or timeout failure. Never retried.
    #[error("{message}")]
    Transport {
        /// Transport error description.
        message: String,
    },

    /// HTTP 5xx response. Never retried.
    #[error("{message}")]
    Server {
        /// The HTTP status code.
        status: u16,
        /// Fixed message for the status code.
        message: String,
    },

    /// HTTP 429 response (after the optional single retry).
    #[error("ConvertKit API Error: Rate limit hit.")]
    RateLimited,

    /// HTTP 4xx response other than 429.
    #[error("{message}")]
    Client {
        /// The HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// Body was not JSON, or lacked the collection the caller expected.
    #[error("ConvertKit API Error: The response is not of the expected type.")]
    UnexpectedResponse,

    /// Code exchange attempted without a stored PKCE verifier.
    #[error("ConvertKit API Error: No PKCE code verifier was found. Restart the authorization flow.")]
    MissingCodeVerifier,

    /// Token refresh attempted without a refresh token.
    #[error("ConvertKit API Error: No refresh token is available.")]
    MissingRefreshToken,

    /// Input validation failed before the request was sent.
    #[error(transparent)]
    InvalidRequest(#[from] ValidationError),

    /// The persistent store failed.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl ApiError {
    /// Returns the stable key identifying this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "http_request_failed",
            Self::Server { status, .. } => match *status {
                500 => "request_internal_server_error",
                501 => "request_not_implemented",
                502 => "request_bad_gateway",
                503 => "request_service_unavailable",
                504 => "request_gateway_timeout",
                505 => "request_http_version_not_supported",
                _ => "request_server_error",
            },
            Self::RateLimited => "request_rate_limit_exceeded",
            Self::Client { .. } => "convertkit_api_error",
            Self::UnexpectedResponse => "response_type_unexpected",
            Self::MissingCodeVerifier => "get_access_token_missing_code_verifier",
            Self::MissingRefreshToken => "refresh_token_missing",
            Self::InvalidRequest(e) => e.code(),
            Self::Storage(_) => "storage_error",
        }
    }

    /// Returns the HTTP status code that produced this error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } | Self::Client { status, .. } => Some(*status),
            Self::RateLimited => Some(429),
            _ => None,
        }
    }

    /// Returns `true` for a 401 whose message says the access token expired.
    #[must_use]
    pub fn is_access_token_expired(&self) -> bool {
        matches!(
            self,
            Self::Client { status: 401, message } if message == ACCESS_TOKEN_EXPIRED_MESSAGE
        )
    }
}

// Verify ApiError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ApiError>();
};
