//! Integration tests for the OAuth flow.
//!
//! These tests verify authorization URL construction with PKCE, the
//! authorization code exchange, explicit refresh and the legacy
//! API key/secret exchange against a local mock server.

use std::sync::Arc;

use convertkit_api::auth::oauth::{code_challenge, OAuthState, CODE_VERIFIER_KEY};
use convertkit_api::store::{KeyValueStore, MemoryStore};
use convertkit_api::{
    ApiClient, ApiError, ApiVersion, ClientId, ConvertKitConfig, Credentials, HostUrl,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a client with an empty token pair and a shared store.
fn create_client(server: &MockServer, store: Arc<MemoryStore>) -> ApiClient {
    let config = ConvertKitConfig::builder()
        .client_id(ClientId::new("test-client-id").unwrap())
        .redirect_uri(HostUrl::new("https://example.com/oauth/callback").unwrap())
        .api_base_url(HostUrl::new(server.uri()).unwrap())
        .build()
        .unwrap();
    ApiClient::new(config, Credentials::unauthenticated(), store).unwrap()
}

/// Extracts and decodes a query parameter from `url`.
fn query_value(url: &str, key: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        if k == key {
            urlencoding::decode(v).ok().map(|v| v.into_owned())
        } else {
            None
        }
    })
}

#[tokio::test]
async fn test_oauth_url_persists_and_reuses_verifier() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    let client = create_client(&server, Arc::clone(&store));

    let first = client.get_oauth_url(None, None).unwrap();
    let verifier = store
        .get(CODE_VERIFIER_KEY)
        .unwrap()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap();

    assert_eq!(
        query_value(&first, "code_challenge"),
        Some(code_challenge(&verifier))
    );
    assert_eq!(
        query_value(&first, "code_challenge_method").as_deref(),
        Some("S256")
    );
    assert_eq!(query_value(&first, "state"), None);

    let second = client.get_oauth_url(None, None).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_oauth_url_carries_state_and_tenant() {
    let server = MockServer::start().await;
    let client = create_client(&server, Arc::new(MemoryStore::new()));

    let url = client
        .get_oauth_url(Some("https://example.com/wp-admin/settings"), Some("site-a"))
        .unwrap();

    assert!(url.starts_with("https://app.kit.com/oauth/authorize?"));
    assert_eq!(
        query_value(&url, "redirect_uri").as_deref(),
        Some("https://example.com/oauth/callback")
    );
    assert_eq!(query_value(&url, "tenant_name").as_deref(), Some("site-a"));

    let state = OAuthState::decode(&query_value(&url, "state").unwrap()).unwrap();
    assert_eq!(state.return_to, "https://example.com/wp-admin/settings");
    assert_eq!(state.client_id, "test-client-id");
}

#[tokio::test]
async fn test_code_exchange_installs_tokens_and_deletes_verifier() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    let client = create_client(&server, Arc::clone(&store));

    client.get_oauth_url(None, None).unwrap();
    let verifier = store.get(CODE_VERIFIER_KEY).unwrap().unwrap();

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_partial_json(json!({
            "client_id": "test-client-id",
            "grant_type": "authorization_code",
            "code": "auth-code",
            "redirect_uri": "https://example.com/oauth/callback",
            "code_verifier": verifier
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-token-1",
            "refresh_token": "refresh-token-1",
            "token_type": "Bearer",
            "created_at": 1_700_000_000,
            "expires_in": 7200
        })))
        .expect(1)
        .mount(&server)
        .await;

    let pair = client.get_access_token("auth-code").await.unwrap();

    assert_eq!(pair.access_token, "access-token-1");
    assert_eq!(pair.refresh_token, "refresh-token-1");
    assert_eq!(
        pair.expires_at.map(|t| t.timestamp()),
        Some(1_700_000_000 + 7200)
    );
    assert_eq!(client.credentials().access_token(), Some("access-token-1"));
    assert_eq!(client.api_version(), ApiVersion::V4);
    assert!(store.get(CODE_VERIFIER_KEY).unwrap().is_none());
}

#[tokio::test]
async fn test_failed_code_exchange_still_deletes_verifier() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    let client = create_client(&server, Arc::clone(&store));

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "The authorization code is invalid."
        })))
        .expect(1)
        .mount(&server)
        .await;

    client.get_oauth_url(None, None).unwrap();
    let error = client.get_access_token("bad-code").await.unwrap_err();

    assert_eq!(error.status(), Some(400));
    assert_eq!(error.to_string(), "The authorization code is invalid.");
    assert!(store.get(CODE_VERIFIER_KEY).unwrap().is_none());
    assert_eq!(client.credentials().access_token(), None);
}

#[tokio::test]
async fn test_code_exchange_without_verifier_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = create_client(&server, Arc::new(MemoryStore::new()));

    let error = client.get_access_token("auth-code").await.unwrap_err();
    assert_eq!(error, ApiError::MissingCodeVerifier);

    let error = client.get_access_token("  ").await.unwrap_err();
    assert_eq!(error.code(), "get_access_token_code_empty");
}

#[tokio::test]
async fn test_explicit_refresh_keeps_refresh_token_when_omitted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_partial_json(json!({
            "grant_type": "refresh_token",
            "refresh_token": "refresh-token-1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-token-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = ConvertKitConfig::builder()
        .client_id(ClientId::new("test-client-id").unwrap())
        .redirect_uri(HostUrl::new("https://example.com/oauth/callback").unwrap())
        .api_base_url(HostUrl::new(server.uri()).unwrap())
        .build()
        .unwrap();
    let client = ApiClient::new(
        config,
        Credentials::oauth("access-token-1", "refresh-token-1"),
        Arc::new(MemoryStore::new()),
    )
    .unwrap();

    let refresh = client.refresh_token().await.unwrap();

    assert_eq!(refresh.previous.access_token, "access-token-1");
    assert_eq!(refresh.current.access_token, "access-token-2");
    assert_eq!(refresh.current.refresh_token, "refresh-token-1");
    assert_eq!(client.credentials().token_pair(), Some(&refresh.current));
}

#[tokio::test]
async fn test_refresh_without_refresh_token_is_rejected() {
    let server = MockServer::start().await;
    let client = create_client(&server, Arc::new(MemoryStore::new()));

    let error = client.refresh_token().await.unwrap_err();
    assert_eq!(error, ApiError::MissingRefreshToken);
}

#[tokio::test]
async fn test_api_key_and_secret_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wordpress/accounts/oauth_access_token"))
        .and(body_partial_json(json!({
            "api_key": "legacy-key",
            "api_secret": "legacy-secret",
            "client_id": "test-client-id",
            "tenant_name": "site-a"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "oauth": {
                "access_token": "access-token-9",
                "refresh_token": "refresh-token-9",
                "expires_at": 1_800_000_000
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(&server, Arc::new(MemoryStore::new()));
    let pair = client
        .get_access_token_by_api_key_and_secret("legacy-key", "legacy-secret", Some("site-a"))
        .await
        .unwrap();

    assert_eq!(pair.access_token, "access-token-9");
    assert_eq!(pair.expires_at.map(|t| t.timestamp()), Some(1_800_000_000));
    assert!(client.credentials().is_oauth());

    let error = client
        .get_access_token_by_api_key_and_secret("", "legacy-secret", None)
        .await
        .unwrap_err();
    assert_eq!(error.code(), "api_key_empty");
}
