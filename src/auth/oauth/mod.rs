//! OAuth 2.0 authorization code flow with PKCE.
//!
//! The flow has two halves, both driven through [`ApiClient`](crate::ApiClient):
//!
//! 1. [`ApiClient::get_oauth_url`](crate::ApiClient::get_oauth_url) persists
//!    a PKCE verifier and returns the URL to send the user to.
//! 2. [`ApiClient::get_access_token`](crate::ApiClient::get_access_token)
//!    exchanges the returned code, consuming the verifier.
//!
//! The pieces in this module are usable on their own:
//!
//! - [`pkce`]: verifier generation, S256 challenge and verifier storage
//! - [`OAuthState`]: the `state` parameter carrying the return URL
//! - [`authorization_url`]: URL construction from a config and verifier
//!
//! # Example
//!
//! ```rust,ignore
//! let url = client.get_oauth_url(Some("https://example.com/settings"), None)?;
//! // redirect the user to `url`; on callback:
//! let tokens = client.get_access_token(&code).await?;
//! ```

mod authorize_url;
pub mod pkce;
mod state;

pub use authorize_url::authorization_url;
pub use pkce::{code_challenge, generate_code_verifier, CODE_VERIFIER_KEY};
pub use state::OAuthState;
