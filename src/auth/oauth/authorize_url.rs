//! Authorization URL construction.

use crate::auth::oauth::pkce::{code_challenge, CODE_CHALLENGE_METHOD};
use crate::auth::oauth::state::OAuthState;
use crate::config::ConvertKitConfig;

/// Builds the URL the user is sent to in order to grant access.
///
/// The URL carries the client ID, `response_type=code`, the redirect URI and
/// the S256 challenge for `verifier`. A `state` parameter is added when
/// `return_url` is given, and `tenant_name` when a tenant is given.
///
/// # Example
///
/// ```rust
/// use convertkit_api::{ConvertKitConfig, ClientId, HostUrl};
/// use convertkit_api::auth::oauth::authorization_url;
///
/// let config = ConvertKitConfig::builder()
///     .client_id(ClientId::new("client-123").unwrap())
///     .redirect_uri(HostUrl::new("https://example.com/callback").unwrap())
///     .build()
///     .unwrap();
///
/// let url = authorization_url(&config, "verifier", None, None);
/// assert!(url.starts_with("https://app.kit.com/oauth/authorize?client_id=client-123"));
/// assert!(url.contains("code_challenge_method=S256"));
/// ```
#[must_use]
pub fn authorization_url(
    config: &ConvertKitConfig,
    verifier: &str,
    return_url: Option<&str>,
    tenant_name: Option<&str>,
) -> String {
    let mut params = vec![
        ("client_id", config.client_id().as_ref().to_string()),
        ("response_type", "code".to_string()),
        ("redirect_uri", config.redirect_uri().to_string()),
        ("code_challenge", code_challenge(verifier)),
        ("code_challenge_method", CODE_CHALLENGE_METHOD.to_string()),
    ];

    if let Some(return_url) = return_url {
        let state = OAuthState::new(return_url, config.client_id().as_ref());
        params.push(("state", state.encode()));
    }

    if let Some(tenant_name) = tenant_name {
        params.push(("tenant_name", tenant_name.to_string()));
    }

    let query_string = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", config.authorize_url(), query_string)
}
