//! Response interpretation for the Kit API.
//!
//! [`HttpResponse::into_result`] turns a status code and raw body into the
//! normalized result every caller sees: a decoded JSON payload, or an
//! [`ApiError`] whose shape does not depend on what went wrong.

use serde::Deserialize;
use serde_json::Value;

use crate::clients::errors::ApiError;

/// Returns the fixed message for a 5xx status code.
#[must_use]
pub const fn server_error_message(status: u16) -> &'static str {
    match status {
        500 => "ConvertKit API Error: Internal server error.",
        501 => "ConvertKit API Error: This request method is not supported.",
        502 => "ConvertKit API Error: Bad gateway.",
        503 => "ConvertKit API Error: Service unavailable.",
        504 => "ConvertKit API Error: Gateway timeout.",
        505 => "ConvertKit API Error: HTTP version not supported.",
        _ => "ConvertKit API Error: Unexpected server error.",
    }
}

/// Extracts the domain error message from a 4xx body.
///
/// Fallback chain: the `errors` array (string elements and the strings of
/// nested arrays, joined with newlines), then `error_description`, then
/// `error` with an optional `message` suffix, then an empty string.
///
/// ```rust
/// use convertkit_api::clients::extract_error_message;
/// use serde_json::json;
///
/// let body = json!({"errors": ["Email address is invalid", ["Name too long"]]});
/// assert_eq!(
///     extract_error_message(&body),
///     "Email address is invalid\nName too long"
/// );
/// ```
#[must_use]
pub fn extract_error_message(body: &Value) -> String {
    if let Some(errors) = body.get("errors") {
        match errors {
            Value::Array(items) => {
                let mut lines = Vec::new();
                for item in items {
                    match item {
                        Value::String(s) => lines.push(s.clone()),
                        Value::Array(nested) => lines.extend(
                            nested
                                .iter()
                                .filter_map(Value::as_str)
                                .map(str::to_string),
                        ),
                        _ => {}
                    }
                }
                return lines.join("\n");
            }
            Value::String(s) => return s.clone(),
            _ => {}
        }
    }

    if let Some(description) = body.get("error_description").and_then(Value::as_str) {
        return description.to_string();
    }

    if let Some(error) = body.get("error").and_then(Value::as_str) {
        return match body.get("message").and_then(Value::as_str) {
            Some(message) if !message.is_empty() => format!("{error}: {message}"),
            _ => error.to_string(),
        };
    }

    String::new()
}

/// A raw HTTP response from the Kit API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub code: u16,
    /// The undecoded response body.
    pub body: String,
}

impl HttpResponse {
    /// Creates a new `HttpResponse`.
    #[must_use]
    pub fn new(code: u16, body: impl Into<String>) -> Self {
        Self {
            code,
            body: body.into(),
        }
    }

    /// Returns `true` if the status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    /// Normalizes this response into a payload or an [`ApiError`].
    ///
    /// - 5xx: [`ApiError::Server`] with the fixed message for the code
    /// - 429: [`ApiError::RateLimited`]
    /// - other 4xx: [`ApiError::Client`] with the extracted message
    /// - 2xx with empty body: `Value::Null`
    /// - 2xx with a body that is not JSON: [`ApiError::UnexpectedResponse`]
    ///
    /// # Errors
    ///
    /// See above.
    pub fn into_result(self) -> Result<Value, ApiError> {
        if self.code >= 500 {
            return Err(ApiError::Server {
                status: self.code,
                message: server_error_message(self.code).to_string(),
            });
        }

        if self.code == 429 {
            return Err(ApiError::RateLimited);
        }

        if self.code >= 400 {
            let body: Value = serde_json::from_str(&self.body).unwrap_or(Value::Null);
            return Err(ApiError::Client {
                status: self.code,
                message: extract_error_message(&body),
            });
        }

        if !self.is_ok() {
            return Err(ApiError::UnexpectedResponse);
        }

        if self.body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&self.body).map_err(|_| ApiError::UnexpectedResponse)
    }
}

/// Cursor pagination block returned alongside every paged collection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CursorPagination {
    /// Whether another page follows this one.
    #[serde(default)]
    pub has_next_page: bool,
    /// Whether a page precedes this one.
    #[serde(default)]
    pub has_previous_page: bool,
    /// Cursor of the first item on this page.
    #[serde(default)]
    pub start_cursor: Option<String>,
    /// Cursor to pass as `after` to fetch the next page.
    #[serde(default)]
    pub end_cursor: Option<String>,
}

/// One page of a cursor-paginated collection.
#[derive(Clone, Debug, PartialEq)]
pub struct CursorPage {
    /// The entities on this page, as returned by the API.
    pub items: Vec<Value>,
    /// Pagination state after this page.
    pub pagination: CursorPagination,
}

impl CursorPage {
    /// Narrows a decoded response body into a page.
    ///
    /// A missing `pagination` block is read as "no further pages" so that
    /// unpaginated listings share this type.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UnexpectedResponse`] if `collection_key` is not
    /// an array in `body`.
    pub fn from_body(body: &Value, collection_key: &str) -> Result<Self, ApiError> {
        let items = body
            .get(collection_key)
            .and_then(Value::as_array)
            .ok_or(ApiError::UnexpectedResponse)?
            .clone();

        let pagination = match body.get("pagination") {
            Some(block) if !block.is_null() => serde_json::from_value(block.clone())
                .map_err(|_| ApiError::UnexpectedResponse)?,
            _ => CursorPagination::default(),
        };

        Ok(Self { items, pagination })
    }

    /// Returns the cursor for the next page, if there is one.
    #[must_use]
    pub fn next_cursor(&self) -> Option<&str> {
        if self.pagination.has_next_page {
            self.pagination.end_cursor.as_deref()
        } else {
            None
        }
    }
}
