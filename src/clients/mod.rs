//! HTTP client layer for the Kit API.
//!
//! # Overview
//!
//! - [`ApiClient`]: authenticated client with retry and token refresh
//! - [`ApiRequest`] and [`HttpMethod`]: a logical request
//! - [`Namespace`]: which base path an endpoint is served from
//! - [`HttpResponse`]: response normalization into `Result<Value, ApiError>`
//! - [`CursorPage`] and [`Listing`]: cursor-paginated collections
//! - [`ApiError`] and [`ValidationError`]: the uniform error type
//! - [`mask_string`], [`mask_params`], [`mask_endpoint`]: log redaction
//!
//! # Retry Behavior
//!
//! A request is dispatched at most twice. The second dispatch happens only
//! after a 429 (following the rate-limit backoff) or after a 401 reporting
//! an expired access token on a production host (following a successful
//! token refresh). Transport failures and 5xx responses are never retried.
//!
//! # Example
//!
//! ```rust,ignore
//! use convertkit_api::clients::{ApiRequest, HttpMethod};
//!
//! let request = ApiRequest::builder(HttpMethod::Get, "tags")
//!     .param("per_page", 100)
//!     .build();
//! let body = client.request(request).await?;
//! ```

mod api_client;
mod endpoints;
pub mod errors;
mod http_request;
mod http_response;
mod masking;

pub use api_client::{ApiClient, JSON_CONTENT_TYPE};
pub use endpoints::{validate_email, Listing, MAX_PER_PAGE, MAX_POSTS_PER_PAGE};
pub use errors::{ApiError, ValidationError, ACCESS_TOKEN_EXPIRED_MESSAGE};
pub(crate) use http_request::scalar_to_string;
pub use http_request::{
    build_query_string, ApiRequest, ApiRequestBuilder, HttpMethod, Namespace, Params,
    OAUTH_ENDPOINTS, WORDPRESS_ENDPOINTS,
};
pub use http_response::{
    extract_error_message, server_error_message, CursorPage, CursorPagination, HttpResponse,
};
pub use masking::{mask_endpoint, mask_params, mask_string, SENSITIVE_PARAMS};
