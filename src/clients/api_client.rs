//! The Kit API client.
//!
//! [`ApiClient`] owns the credentials, builds authenticated requests,
//! dispatches them and normalizes every outcome into
//! `Result<Value, ApiError>`. Two failures are recovered from automatically,
//! each at most once per call:
//!
//! - HTTP 429: wait for the configured backoff, then re-issue the request
//! - HTTP 401 "The access token expired" on a production host: refresh the
//!   token, then re-issue the request
//!
//! Re-issued requests never recover again, so a call makes at most two
//! dispatches.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use crate::auth::oauth::{authorization_url, pkce};
use crate::auth::{AccessTokenResponse, Credentials, TokenObserver, TokenPair, TokenRefresh};
use crate::clients::errors::{ApiError, ValidationError};
use crate::clients::http_request::{build_query_string, ApiRequest, HttpMethod, Namespace, Params};
use crate::clients::http_response::HttpResponse;
use crate::clients::masking::{mask_endpoint, mask_params};
use crate::config::{ApiVersion, ConvertKitConfig};
use crate::error::ConfigError;
use crate::store::KeyValueStore;

/// Content type sent and accepted on every request.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Client for the Kit REST API.
///
/// # Thread Safety
///
/// `ApiClient` is `Send + Sync`. Share it between tasks behind an `Arc`;
/// token refreshes are visible to every holder.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use convertkit_api::{ApiClient, ConvertKitConfig, ClientId, Credentials, HostUrl};
/// use convertkit_api::store::MemoryStore;
///
/// let config = ConvertKitConfig::builder()
///     .client_id(ClientId::new("client-id").unwrap())
///     .redirect_uri(HostUrl::new("https://example.com/callback").unwrap())
///     .build()?;
///
/// let client = ApiClient::new(
///     config,
///     Credentials::oauth("access-token", "refresh-token"),
///     Arc::new(MemoryStore::new()),
/// )?;
///
/// let account = client.get_account().await?;
/// ```
pub struct ApiClient {
    client: reqwest::Client,
    config: ConvertKitConfig,
    credentials: RwLock<Credentials>,
    store: Arc<dyn KeyValueStore>,
    refresh_lock: tokio::sync::Mutex<()>,
    token_observer: Option<Arc<dyn TokenObserver>>,
    default_headers: HashMap<String, String>,
}

// Verify ApiClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ApiClient>();
};

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("credentials", &self.credentials)
            .field("has_token_observer", &self.token_observer.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the HTTP transport cannot be
    /// initialized.
    pub fn new(
        config: ConvertKitConfig,
        credentials: Credentials,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ConfigError::HttpClient {
                reason: e.to_string(),
            })?;

        let mut default_headers = HashMap::new();
        default_headers.insert("Accept".to_string(), JSON_CONTENT_TYPE.to_string());
        default_headers.insert("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string());
        default_headers.insert("User-Agent".to_string(), config.user_agent());

        Ok(Self {
            client,
            config,
            credentials: RwLock::new(credentials),
            store,
            refresh_lock: tokio::sync::Mutex::new(()),
            token_observer: None,
            default_headers,
        })
    }

    /// Registers an observer notified after every successful token refresh.
    #[must_use]
    pub fn with_token_observer(mut self, observer: Arc<dyn TokenObserver>) -> Self {
        self.token_observer = Some(observer);
        self
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ConvertKitConfig {
        &self.config
    }

    /// Returns the store used for PKCE state and cached resources.
    #[must_use]
    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.store)
    }

    /// Returns the headers sent with every request.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Returns a snapshot of the current credentials.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the API version selected by the credentials.
    #[must_use]
    pub fn api_version(&self) -> ApiVersion {
        self.credentials().api_version()
    }

    fn client_id(&self) -> &str {
        self.config.client_id().as_ref()
    }

    fn install_tokens(&self, pair: TokenPair) {
        let mut credentials = self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *credentials = Credentials::OAuth(pair);
    }

    /// Sends a request, recovering once from rate limiting or token expiry.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] for transport failures, non-2xx responses and
    /// bodies that are not JSON. See the module docs for the retry rules.
    pub async fn request(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let mut retry = request.retry_if_rate_limited;

        loop {
            let credentials = self.credentials();
            match self.dispatch(&request, &credentials).await {
                Err(ApiError::RateLimited) if retry => {
                    let backoff = self.config.rate_limit_backoff();
                    tracing::warn!(
                        endpoint = %mask_endpoint(&request.endpoint),
                        backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                        "ConvertKit API rate limit hit, retrying once"
                    );
                    tokio::time::sleep(backoff).await;
                    retry = false;
                }
                Err(error)
                    if retry
                        && error.is_access_token_expired()
                        && credentials.is_oauth()
                        && self.config.environment().is_production() =>
                {
                    let failed_token = credentials.access_token().unwrap_or_default();
                    self.refresh_expired_token(failed_token).await?;
                    retry = false;
                }
                result => return result,
            }
        }
    }

    /// Sends a GET request with `params` as the query string.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn get(&self, endpoint: &str, params: Params) -> Result<Value, ApiError> {
        self.request(ApiRequest::builder(HttpMethod::Get, endpoint).params(params).build())
            .await
    }

    /// Sends a POST request with `params` as the JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn post(&self, endpoint: &str, params: Params) -> Result<Value, ApiError> {
        self.request(ApiRequest::builder(HttpMethod::Post, endpoint).params(params).build())
            .await
    }

    /// Sends a PUT request with `params` as the JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn put(&self, endpoint: &str, params: Params) -> Result<Value, ApiError> {
        self.request(ApiRequest::builder(HttpMethod::Put, endpoint).params(params).build())
            .await
    }

    /// Sends a DELETE request with `params` as the JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn delete(&self, endpoint: &str, params: Params) -> Result<Value, ApiError> {
        self.request(ApiRequest::builder(HttpMethod::Delete, endpoint).params(params).build())
            .await
    }

    /// Performs exactly one HTTP round trip.
    async fn dispatch(
        &self,
        request: &ApiRequest,
        credentials: &Credentials,
    ) -> Result<Value, ApiError> {
        let namespace = Namespace::resolve(&request.endpoint, credentials.api_version());
        let mut url = namespace.url(self.config.api_base_url(), &request.endpoint);

        let mut params = request.params.clone();
        if let Credentials::ApiKey { api_key, api_secret } = credentials {
            if namespace != Namespace::OAuth {
                let (api_key, api_secret): (&str, &str) = (api_key.as_ref(), api_secret.as_ref());
                params
                    .entry("api_key")
                    .or_insert_with(|| Value::from(api_key));
                params
                    .entry("api_secret")
                    .or_insert_with(|| Value::from(api_secret));
            }
        }

        let masked_params = Value::Object(mask_params(&params));
        tracing::debug!(
            method = %request.method,
            endpoint = %mask_endpoint(&request.endpoint),
            params = %masked_params,
            "Sending ConvertKit API request"
        );

        if request.method == HttpMethod::Get && !params.is_empty() {
            let separator = if url.contains('?') { '&' } else { '?' };
            url = format!("{url}{separator}{}", build_query_string(&params));
        }

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };

        for (key, value) in &self.default_headers {
            builder = builder.header(key, value);
        }

        if namespace != Namespace::OAuth {
            if let Some(token) = credentials.access_token() {
                builder = builder.header("Authorization", format!("Bearer {token}"));
            }
        }

        if request.method != HttpMethod::Get {
            builder = builder.body(Value::Object(params).to_string());
        }

        let response = builder.send().await.map_err(|e| transport_error(&e))?;
        let code = response.status().as_u16();
        let body = response.text().await.map_err(|e| transport_error(&e))?;

        let result = HttpResponse::new(code, body).into_result();
        if let Err(error) = &result {
            tracing::warn!(
                method = %request.method,
                endpoint = %mask_endpoint(&request.endpoint),
                code = error.code(),
                status = ?error.status(),
                "ConvertKit API error: {error}"
            );
        }
        result
    }

    /// Builds the OAuth authorization URL, persisting a PKCE verifier.
    ///
    /// An existing verifier is reused so that reloading the settings page does
    /// not invalidate a flow already in progress.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Storage`] if the verifier cannot be persisted.
    pub fn get_oauth_url(
        &self,
        return_url: Option<&str>,
        tenant_name: Option<&str>,
    ) -> Result<String, ApiError> {
        let verifier = pkce::get_or_create_code_verifier(self.store.as_ref())?;
        Ok(authorization_url(
            &self.config,
            &verifier,
            return_url,
            tenant_name,
        ))
    }

    /// Exchanges an authorization code for a token pair and installs it.
    ///
    /// The stored PKCE verifier is deleted whether or not the exchange
    /// succeeds.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::AuthorizationCodeEmpty`] for an empty code
    /// - [`ApiError::MissingCodeVerifier`] if no verifier is stored
    /// - any error from [`ApiClient::request`]
    pub async fn get_access_token(&self, code: &str) -> Result<TokenPair, ApiError> {
        if code.trim().is_empty() {
            return Err(ValidationError::AuthorizationCodeEmpty.into());
        }

        let verifier = pkce::stored_code_verifier(self.store.as_ref())?
            .ok_or(ApiError::MissingCodeVerifier)?;

        let request = ApiRequest::builder(HttpMethod::Post, "oauth/token")
            .param("client_id", self.client_id())
            .param("grant_type", "authorization_code")
            .param("code", code)
            .param("redirect_uri", self.config.redirect_uri().to_string())
            .param("code_verifier", verifier)
            .build();

        let result = self.request(request).await;
        pkce::delete_code_verifier(self.store.as_ref())?;

        let pair = parse_token_pair(&result?)?;
        self.install_tokens(pair.clone());
        tracing::info!("ConvertKit access token obtained");
        Ok(pair)
    }

    /// Exchanges the current refresh token for a new token pair.
    ///
    /// On success the new pair replaces the old one in this client, the
    /// registered [`TokenObserver`] is notified, and both pairs are returned.
    /// On failure the current tokens are left untouched.
    ///
    /// # Errors
    ///
    /// - [`ApiError::MissingRefreshToken`] without a refresh token
    /// - any error from the token endpoint
    pub async fn refresh_token(&self) -> Result<TokenRefresh, ApiError> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_token_locked().await
    }

    async fn refresh_expired_token(&self, failed_token: &str) -> Result<(), ApiError> {
        let _guard = self.refresh_lock.lock().await;

        if self.credentials().access_token().unwrap_or_default() != failed_token {
            tracing::debug!("ConvertKit access token already refreshed by another task");
            return Ok(());
        }

        self.refresh_token_locked().await.map(|_| ())
    }

    async fn refresh_token_locked(&self) -> Result<TokenRefresh, ApiError> {
        let previous = match self.credentials() {
            Credentials::OAuth(pair) if !pair.refresh_token.is_empty() => pair,
            _ => return Err(ApiError::MissingRefreshToken),
        };

        let request = ApiRequest::builder(HttpMethod::Post, "oauth/token")
            .param("client_id", self.client_id())
            .param("grant_type", "refresh_token")
            .param("refresh_token", previous.refresh_token.as_str())
            .retry_if_rate_limited(false)
            .build();

        let body = self.dispatch(&request, &Credentials::OAuth(previous.clone())).await?;

        let mut current = parse_token_pair(&body)?;
        if current.refresh_token.is_empty() {
            current.refresh_token.clone_from(&previous.refresh_token);
        }
        self.install_tokens(current.clone());

        let refresh = TokenRefresh { previous, current };
        tracing::info!("ConvertKit access token refreshed");
        if let Some(observer) = &self.token_observer {
            observer.on_token_refresh(&refresh);
        }
        Ok(refresh)
    }

    /// Exchanges a legacy API key and secret for an OAuth token pair.
    ///
    /// On success the client switches to the returned OAuth credentials.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::ApiKeyEmpty`] / [`ValidationError::ApiSecretEmpty`]
    /// - any error from [`ApiClient::request`]
    pub async fn get_access_token_by_api_key_and_secret(
        &self,
        api_key: &str,
        api_secret: &str,
        tenant_name: Option<&str>,
    ) -> Result<TokenPair, ApiError> {
        if api_key.trim().is_empty() {
            return Err(ValidationError::ApiKeyEmpty.into());
        }
        if api_secret.trim().is_empty() {
            return Err(ValidationError::ApiSecretEmpty.into());
        }

        let request = ApiRequest::builder(HttpMethod::Post, "accounts/oauth_access_token")
            .param("api_key", api_key)
            .param("api_secret", api_secret)
            .param("client_id", self.client_id())
            .param_opt("tenant_name", tenant_name)
            .build();

        let pair = parse_token_pair(&self.request(request).await?)?;
        self.install_tokens(pair.clone());
        tracing::info!("ConvertKit access token obtained from API key and secret");
        Ok(pair)
    }
}

fn transport_error(error: &reqwest::Error) -> ApiError {
    ApiError::Transport {
        message: error.to_string(),
    }
}

/// Reads a token pair from a token endpoint body, top level or under `oauth`.
fn parse_token_pair(body: &Value) -> Result<TokenPair, ApiError> {
    let payload = body.get("oauth").filter(|v| v.is_object()).unwrap_or(body);
    let response: AccessTokenResponse =
        serde_json::from_value(payload.clone()).map_err(|_| ApiError::UnexpectedResponse)?;
    if response.access_token.is_empty() {
        return Err(ApiError::UnexpectedResponse);
    }
    Ok(response.into_token_pair())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, ApiSecret, ClientId, HostUrl};
    use crate::store::MemoryStore;
    use serde_json::json;

    fn config() -> ConvertKitConfig {
        ConvertKitConfig::builder()
            .client_id(ClientId::new("client-123").unwrap())
            .redirect_uri(HostUrl::new("https://example.com/callback").unwrap())
            .plugin("convertkit", "2.5.0")
            .site_url("https://example.com")
            .build()
            .unwrap()
    }

    fn client(credentials: Credentials) -> ApiClient {
        ApiClient::new(config(), credentials, Arc::new(MemoryStore::new())).unwrap()
    }

    #[test]
    fn test_default_headers() {
        let client = client(Credentials::oauth("access", "refresh"));
        let headers = client.default_headers();
        assert_eq!(headers.get("Accept").unwrap(), JSON_CONTENT_TYPE);
        assert_eq!(headers.get("Content-Type").unwrap(), JSON_CONTENT_TYPE);
        assert!(headers
            .get("User-Agent")
            .unwrap()
            .contains("convertkit/2.5.0;https://example.com"));
        assert!(!headers.contains_key("Authorization"));
    }

    #[test]
    fn test_api_version_follows_credentials() {
        assert_eq!(
            client(Credentials::oauth("a", "r")).api_version(),
            ApiVersion::V4
        );
        let legacy = Credentials::api_key(
            ApiKey::new("key").unwrap(),
            ApiSecret::new("secret").unwrap(),
        );
        assert_eq!(client(legacy).api_version(), ApiVersion::V3);
    }

    #[test]
    fn test_oauth_url_reuses_stored_verifier() {
        let client = client(Credentials::unauthenticated());
        let first = client.get_oauth_url(None, None).unwrap();
        let second = client.get_oauth_url(None, None).unwrap();
        assert_eq!(first, second);
        assert!(pkce::stored_code_verifier(client.store().as_ref())
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_parse_token_pair_accepts_nested_oauth_block() {
        let pair = parse_token_pair(&json!({
            "oauth": {"access_token": "a", "refresh_token": "r", "expires_at": 1_800_000_000}
        }))
        .unwrap();
        assert_eq!(pair.access_token, "a");
        assert_eq!(pair.refresh_token, "r");
    }

    #[test]
    fn test_parse_token_pair_rejects_missing_token() {
        assert_eq!(
            parse_token_pair(&json!({"token_type": "Bearer"})),
            Err(ApiError::UnexpectedResponse)
        );
        assert_eq!(
            parse_token_pair(&json!({"access_token": ""})),
            Err(ApiError::UnexpectedResponse)
        );
    }

    #[tokio::test]
    async fn test_get_access_token_requires_code_and_verifier() {
        let client = client(Credentials::unauthenticated());
        assert_eq!(
            client.get_access_token("").await,
            Err(ApiError::InvalidRequest(
                ValidationError::AuthorizationCodeEmpty
            ))
        );
        assert_eq!(
            client.get_access_token("code").await,
            Err(ApiError::MissingCodeVerifier)
        );
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token_fails_fast() {
        let client = client(Credentials::oauth("access", ""));
        assert_eq!(
            client.refresh_token().await,
            Err(ApiError::MissingRefreshToken)
        );
    }

    #[tokio::test]
    async fn test_api_key_exchange_validates_inputs() {
        let client = client(Credentials::unauthenticated());
        assert_eq!(
            client
                .get_access_token_by_api_key_and_secret("", "secret", None)
                .await
                .unwrap_err()
                .code(),
            "api_key_empty"
        );
        assert_eq!(
            client
                .get_access_token_by_api_key_and_secret("key", " ", None)
                .await
                .unwrap_err()
                .code(),
            "api_secret_empty"
        );
    }
}
