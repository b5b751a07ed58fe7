//! Authentication types for the ConvertKit API client.
//!
//! # Overview
//!
//! - [`Credentials`]: OAuth token pair or legacy key/secret
//! - [`TokenPair`] and [`TokenRefresh`]: OAuth tokens and refresh results
//! - [`TokenObserver`]: notification hook for refreshed tokens
//! - [`oauth`]: PKCE authorization URL and state helpers
//!
//! # Example
//!
//! ```rust
//! use convertkit_api::{ApiVersion, Credentials};
//!
//! let credentials = Credentials::oauth("access-token", "refresh-token");
//! assert_eq!(credentials.api_version(), ApiVersion::V4);
//! assert_eq!(credentials.access_token(), Some("access-token"));
//! ```

pub mod credentials;
pub mod oauth;

pub(crate) use credentials::AccessTokenResponse;
pub use credentials::{Credentials, TokenObserver, TokenPair, TokenRefresh};
