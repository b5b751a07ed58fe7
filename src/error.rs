//! Configuration error types for the ConvertKit API client.
//!
//! Every validated newtype and the configuration builder return
//! `Result<T, ConfigError>`, so a misconfigured client is rejected before it
//! can make a single request.
//!
//! # Example
//!
//! ```rust
//! use convertkit_api::{ClientId, ConfigError};
//!
//! let result = ClientId::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyClientId)));
//! ```

use thiserror::Error;

/// Errors that can occur while configuring the client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// OAuth client ID cannot be empty.
    #[error("OAuth client ID cannot be empty. Please provide the client ID issued by Kit.")]
    EmptyClientId,

    /// Legacy API key cannot be empty.
    #[error("API key cannot be empty. Please provide a valid Kit API key.")]
    EmptyApiKey,

    /// Legacy API secret cannot be empty.
    #[error("API secret cannot be empty. Please provide a valid Kit API secret.")]
    EmptyApiSecret,

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// URL is invalid.
    #[error("Invalid URL '{url}'. Please provide a valid URL with scheme (e.g., 'https://example.com').")]
    InvalidUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// Environment type string is not recognised.
    #[error("Invalid environment type '{value}'. Expected one of: production, staging, development, local.")]
    InvalidEnvironment {
        /// The value that was provided.
        value: String,
    },

    /// API version string is not recognised.
    #[error("Invalid API version '{version}'. Expected 'v3' or 'v4'.")]
    InvalidApiVersion {
        /// The invalid version string that was provided.
        version: String,
    },

    /// The underlying HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {reason}")]
    HttpClient {
        /// Why construction failed.
        reason: String,
    },
}
