//! Request types and URL routing for the Kit API.
//!
//! A logical request is an endpoint name, an HTTP method, a parameter map
//! and a retry flag. Which base path the endpoint lives under is decided by
//! [`Namespace::resolve`], independently of the credentials in use.

use std::fmt;

use serde_json::{Map, Value};

use crate::config::{ApiVersion, HostUrl};

/// Request parameters: query string for GET, JSON body otherwise.
pub type Params = Map<String, Value>;

/// Endpoints served from the OAuth namespace (`/oauth/...`).
pub const OAUTH_ENDPOINTS: &[&str] = &["oauth/token", "oauth/revoke"];

/// Endpoints served from the WordPress namespace (`/wordpress/...`).
///
/// Matched by substring because several carry dynamic path segments
/// (e.g. `profile/<signed subscriber id>`).
pub const WORDPRESS_ENDPOINTS: &[&str] = &[
    "accounts/oauth_access_token",
    "posts",
    "products",
    "profile",
    "recommendations_script",
    "subscriber_authentication",
];

/// HTTP methods supported by the Kit API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    /// HTTP GET; parameters go in the query string.
    Get,
    /// HTTP POST; parameters go in a JSON body.
    Post,
    /// HTTP PUT; parameters go in a JSON body.
    Put,
    /// HTTP DELETE; parameters go in a JSON body.
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// Base-path namespace an endpoint belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Namespace {
    /// Token exchange and refresh.
    OAuth,
    /// Host-specific convenience endpoints.
    WordPress,
    /// General versioned resource endpoints.
    Versioned(ApiVersion),
}

impl Namespace {
    /// Determines the namespace for `endpoint`.
    ///
    /// The OAuth table is checked first, then the WordPress table; anything
    /// else belongs to the versioned API.
    ///
    /// ```rust
    /// use convertkit_api::clients::Namespace;
    /// use convertkit_api::ApiVersion;
    ///
    /// assert_eq!(Namespace::resolve("oauth/token", ApiVersion::V4), Namespace::OAuth);
    /// assert_eq!(Namespace::resolve("profile/abc", ApiVersion::V4), Namespace::WordPress);
    /// assert_eq!(
    ///     Namespace::resolve("forms", ApiVersion::V4),
    ///     Namespace::Versioned(ApiVersion::V4)
    /// );
    /// ```
    #[must_use]
    pub fn resolve(endpoint: &str, version: ApiVersion) -> Self {
        if OAUTH_ENDPOINTS.iter().any(|e| endpoint.contains(e)) {
            Self::OAuth
        } else if WORDPRESS_ENDPOINTS.iter().any(|e| endpoint.contains(e)) {
            Self::WordPress
        } else {
            Self::Versioned(version)
        }
    }

    /// Builds the full URL for `endpoint` under this namespace.
    #[must_use]
    pub fn url(&self, base: &HostUrl, endpoint: &str) -> String {
        let endpoint = endpoint.trim_start_matches('/');
        match self {
            Self::OAuth => base.join(endpoint),
            Self::WordPress => base.join(&format!("wordpress/{endpoint}")),
            Self::Versioned(version) => base.join(&format!("{version}/{endpoint}")),
        }
    }
}

/// Encodes `params` as a query string.
///
/// Keys and values are percent-encoded individually, so `=` characters in
/// cursor tokens survive as `%3D` instead of being mistaken for separators.
/// Arrays become repeated `key[]=` pairs and objects become `key[sub]=`
/// pairs; `null` values are omitted.
///
/// ```rust
/// use convertkit_api::clients::build_query_string;
/// use serde_json::json;
///
/// let params = json!({"after": "WzE2XQ==", "per_page": 100});
/// let query = build_query_string(params.as_object().unwrap());
/// assert_eq!(query, "after=WzE2XQ%3D%3D&per_page=100");
/// ```
#[must_use]
pub fn build_query_string(params: &Params) -> String {
    let mut pairs = Vec::new();
    for (key, value) in params {
        push_pairs(&mut pairs, key, value);
    }
    pairs.join("&")
}

fn push_pairs(pairs: &mut Vec<String>, key: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            let key = format!("{key}[]");
            for item in items {
                push_pairs(pairs, &key, item);
            }
        }
        Value::Object(map) => {
            for (sub, item) in map {
                push_pairs(pairs, &format!("{key}[{sub}]"), item);
            }
        }
        scalar => pairs.push(format!(
            "{}={}",
            urlencoding::encode(key),
            urlencoding::encode(&scalar_to_string(scalar))
        )),
    }
}

/// Renders a JSON scalar the way it should appear in a URL.
pub(crate) fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A logical request to the Kit API.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    /// Endpoint name, relative to its namespace.
    pub endpoint: String,
    /// The HTTP method.
    pub method: HttpMethod,
    /// Parameters for the query string or JSON body.
    pub params: Params,
    /// Whether a 429 response is retried once after the backoff delay.
    pub retry_if_rate_limited: bool,
}

impl ApiRequest {
    /// Creates a new builder for an `ApiRequest`.
    ///
    /// ```rust
    /// use convertkit_api::clients::{ApiRequest, HttpMethod};
    ///
    /// let request = ApiRequest::builder(HttpMethod::Get, "tags")
    ///     .param("per_page", 100)
    ///     .build();
    /// assert!(request.retry_if_rate_limited);
    /// ```
    #[must_use]
    pub fn builder(method: HttpMethod, endpoint: impl Into<String>) -> ApiRequestBuilder {
        ApiRequestBuilder::new(method, endpoint)
    }
}

/// Builder for [`ApiRequest`].
#[derive(Debug)]
pub struct ApiRequestBuilder {
    endpoint: String,
    method: HttpMethod,
    params: Params,
    retry_if_rate_limited: bool,
}

impl ApiRequestBuilder {
    fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            params: Params::new(),
            retry_if_rate_limited: true,
        }
    }

    /// Adds a single parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Adds a parameter only when `value` is `Some`.
    #[must_use]
    pub fn param_opt<V: Into<Value>>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    /// Merges a whole parameter map.
    #[must_use]
    pub fn params(mut self, params: Params) -> Self {
        self.params.extend(params);
        self
    }

    /// Sets whether a 429 response is retried once. Defaults to `true`.
    #[must_use]
    pub const fn retry_if_rate_limited(mut self, retry: bool) -> Self {
        self.retry_if_rate_limited = retry;
        self
    }

    /// Builds the [`ApiRequest`].
    #[must_use]
    pub fn build(self) -> ApiRequest {
        ApiRequest {
            endpoint: self.endpoint,
            method: self.method,
            params: self.params,
            retry_if_rate_limited: self.retry_if_rate_limited,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> HostUrl {
        HostUrl::new("https://api.kit.com").unwrap()
    }

    #[test]
    fn test_http_method_display() {
        assert_eq!(HttpMethod::Get.to_string(), "GET");
        assert_eq!(HttpMethod::Post.to_string(), "POST");
        assert_eq!(HttpMethod::Put.to_string(), "PUT");
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_namespace_routing_checks_oauth_before_wordpress() {
        assert_eq!(
            Namespace::resolve("oauth/token", ApiVersion::V4),
            Namespace::OAuth
        );
        assert_eq!(
            Namespace::resolve("accounts/oauth_access_token", ApiVersion::V4),
            Namespace::WordPress
        );
        assert_eq!(
            Namespace::resolve("subscriber_authentication/send_code", ApiVersion::V4),
            Namespace::WordPress
        );
        assert_eq!(
            Namespace::resolve("subscribers", ApiVersion::V3),
            Namespace::Versioned(ApiVersion::V3)
        );
    }

    #[test]
    fn test_namespace_urls() {
        let base = base();
        assert_eq!(
            Namespace::OAuth.url(&base, "oauth/token"),
            "https://api.kit.com/oauth/token"
        );
        assert_eq!(
            Namespace::WordPress.url(&base, "posts"),
            "https://api.kit.com/wordpress/posts"
        );
        assert_eq!(
            Namespace::Versioned(ApiVersion::V4).url(&base, "/forms"),
            "https://api.kit.com/v4/forms"
        );
    }

    #[test]
    fn test_query_string_preserves_cursor_padding() {
        let params = json!({"after": "WzEsMl0=", "include_total_count": false});
        let query = build_query_string(params.as_object().unwrap());
        assert!(query.contains("after=WzEsMl0%3D"));
        assert!(query.contains("include_total_count=false"));
    }

    #[test]
    fn test_query_string_arrays_objects_and_nulls() {
        let params = json!({
            "ids": [1, 2],
            "fields": {"last_name": "Doe"},
            "skip": null
        });
        let query = build_query_string(params.as_object().unwrap());
        assert!(query.contains("ids%5B%5D=1&ids%5B%5D=2"));
        assert!(query.contains("fields%5Blast_name%5D=Doe"));
        assert!(!query.contains("skip"));
    }

    #[test]
    fn test_builder_defaults_and_params() {
        let request = ApiRequest::builder(HttpMethod::Post, "subscribers")
            .param("email_address", "jane@example.com")
            .param_opt("first_name", None::<String>)
            .retry_if_rate_limited(false)
            .build();

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.endpoint, "subscribers");
        assert_eq!(request.params.len(), 1);
        assert!(!request.retry_if_rate_limited);
    }
}
