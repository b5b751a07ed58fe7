//! OAuth `state` parameter carrying the post-authorization return URL.
//!
//! The state is a base64url (unpadded) JSON object of the form
//! `{"return_to": "...", "client_id": "..."}`. It is opaque to the
//! authorization server and comes back untouched on the redirect, so the host
//! can send the user back to where the flow started.
//!
//! # Example
//!
//! ```rust
//! use convertkit_api::auth::oauth::OAuthState;
//!
//! let state = OAuthState::new("https://example.com/wp-admin/options.php", "client-123");
//! let encoded = state.encode();
//! assert_eq!(OAuthState::decode(&encoded), Some(state));
//! ```

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Decoded OAuth state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthState {
    /// Where to send the user after the code exchange.
    pub return_to: String,
    /// The client ID that started the flow.
    pub client_id: String,
}

impl OAuthState {
    /// Creates a new state value.
    #[must_use]
    pub fn new(return_to: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            return_to: return_to.into(),
            client_id: client_id.into(),
        }
    }

    /// Encodes the state as base64url JSON without padding.
    #[must_use]
    pub fn encode(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json.as_bytes())
    }

    /// Decodes a state value produced by [`OAuthState::encode`].
    ///
    /// Returns `None` if the value is not base64url JSON of the right shape.
    /// Padded input is accepted.
    #[must_use]
    pub fn decode(encoded: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded.trim_end_matches('='))
            .ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

impl fmt::Display for OAuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

// Verify OAuthState is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<OAuthState>();
};
