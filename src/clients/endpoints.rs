//! Typed endpoint methods on [`ApiClient`].
//!
//! Each method validates its inputs before any network call and then
//! delegates to [`ApiClient::request`]. Collection listings return a
//! [`CursorPage`]; callers that need the whole collection follow
//! [`CursorPage::next_cursor`] until it is `None`.

use serde_json::{json, Value};

use crate::clients::api_client::ApiClient;
use crate::clients::errors::{ApiError, ValidationError};
use crate::clients::http_request::{ApiRequest, HttpMethod, Params};
use crate::clients::http_response::CursorPage;
use crate::config::HostUrl;

/// Largest page size the versioned API accepts.
pub const MAX_PER_PAGE: u32 = 1000;

/// Largest page size the posts endpoint accepts.
pub const MAX_POSTS_PER_PAGE: u32 = 50;

/// A paged collection endpoint and how to read it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Listing {
    /// Endpoint name.
    pub endpoint: &'static str,
    /// Response key holding the collection array.
    pub collection_key: &'static str,
    /// Fixed query filters sent with every page.
    pub filters: &'static [(&'static str, &'static str)],
    /// Largest accepted `per_page`.
    pub max_per_page: u32,
    /// Whether the endpoint accepts cursor parameters at all.
    pub paginated: bool,
}

impl Listing {
    /// Active embedded forms.
    pub const FORMS: Self = Self::paged("forms", "forms", &[("status", "active"), ("type", "embed")]);
    /// Forms created before the current form builder.
    pub const LEGACY_FORMS: Self = Self::paged("legacy_forms", "legacy_forms", &[]);
    /// Active hosted landing pages.
    pub const LANDING_PAGES: Self =
        Self::paged("forms", "forms", &[("status", "active"), ("type", "hosted")]);
    /// Landing pages created before the current builder.
    pub const LEGACY_LANDING_PAGES: Self =
        Self::paged("legacy_landing_pages", "legacy_landing_pages", &[]);
    /// Subscriber tags.
    pub const TAGS: Self = Self::paged("tags", "tags", &[]);
    /// Email sequences.
    pub const SEQUENCES: Self = Self::paged("sequences", "sequences", &[]);
    /// Subscriber custom fields.
    pub const CUSTOM_FIELDS: Self = Self::paged("custom_fields", "custom_fields", &[]);
    /// Broadcasts.
    pub const BROADCASTS: Self = Self::paged("broadcasts", "broadcasts", &[]);
    /// Published posts (WordPress namespace).
    pub const POSTS: Self = Self {
        max_per_page: MAX_POSTS_PER_PAGE,
        ..Self::paged("posts", "posts", &[])
    };
    /// Commerce products (WordPress namespace, single page).
    pub const PRODUCTS: Self = Self {
        paginated: false,
        ..Self::paged("products", "products", &[])
    };

    const fn paged(
        endpoint: &'static str,
        collection_key: &'static str,
        filters: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self {
            endpoint,
            collection_key,
            filters,
            max_per_page: MAX_PER_PAGE,
            paginated: true,
        }
    }

    /// Checks `per_page` against this listing's bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::PerPageOutOfRange`] outside `1..=max_per_page`.
    pub const fn validate_per_page(&self, per_page: u32) -> Result<(), ValidationError> {
        if per_page == 0 || per_page > self.max_per_page {
            return Err(ValidationError::PerPageOutOfRange {
                per_page,
                max: self.max_per_page,
            });
        }
        Ok(())
    }
}

fn require_id(id: u64, error: ValidationError) -> Result<u64, ValidationError> {
    if id == 0 {
        Err(error)
    } else {
        Ok(id)
    }
}

fn require_text<'a>(value: &'a str, error: ValidationError) -> Result<&'a str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        Err(error)
    } else {
        Ok(value)
    }
}

/// Validates an email address: non-empty, one `@`, a dotted domain.
///
/// # Errors
///
/// Returns [`ValidationError::EmailEmpty`] or [`ValidationError::EmailInvalid`].
pub fn validate_email(email: &str) -> Result<&str, ValidationError> {
    let email = require_text(email, ValidationError::EmailEmpty)?;
    let invalid = || ValidationError::EmailInvalid {
        email: email.to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@');
    if local.is_empty() || !domain_ok || email.contains(char::is_whitespace) {
        return Err(invalid());
    }
    Ok(email)
}

fn string_field(body: &Value, key: &str) -> Result<String, ApiError> {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ApiError::UnexpectedResponse)
}

impl ApiClient {
    /// Fetches one page of `listing`.
    ///
    /// `after` is the previous page's end cursor; `None` fetches the first
    /// page. Unpaginated listings ignore both `after` and `per_page`.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::PerPageOutOfRange`] before any network call
    /// - [`ApiError::UnexpectedResponse`] if the collection key is not an array
    /// - any error from [`ApiClient::request`]
    pub async fn list(
        &self,
        listing: &Listing,
        after: Option<&str>,
        per_page: u32,
    ) -> Result<CursorPage, ApiError> {
        let mut builder = ApiRequest::builder(HttpMethod::Get, listing.endpoint);
        for (key, value) in listing.filters {
            builder = builder.param(*key, *value);
        }
        if listing.paginated {
            listing.validate_per_page(per_page)?;
            builder = builder
                .param("include_total_count", false)
                .param("per_page", per_page)
                .param_opt("after", after.filter(|cursor| !cursor.is_empty()));
        }

        let body = self.request(builder.build()).await?;
        CursorPage::from_body(&body, listing.collection_key)
    }

    /// Returns the authenticated account.
    ///
    /// # Errors
    ///
    /// Any error from [`ApiClient::request`].
    pub async fn get_account(&self) -> Result<Value, ApiError> {
        self.get("account", Params::new()).await
    }

    /// Creates (or updates) a subscriber.
    ///
    /// # Errors
    ///
    /// Email validation errors, or any error from [`ApiClient::request`].
    pub async fn create_subscriber(
        &self,
        email: &str,
        first_name: Option<&str>,
        fields: Params,
    ) -> Result<Value, ApiError> {
        let email = validate_email(email)?;
        let request = ApiRequest::builder(HttpMethod::Post, "subscribers")
            .param("email_address", email)
            .param_opt("first_name", first_name.filter(|name| !name.is_empty()))
            .param_opt(
                "fields",
                (!fields.is_empty()).then_some(Value::Object(fields)),
            )
            .build();
        self.request(request).await
    }

    /// Looks up a subscriber by email address, in any state.
    ///
    /// Returns `Ok(None)` if the API knows no such subscriber.
    ///
    /// # Errors
    ///
    /// Email validation errors, [`ApiError::UnexpectedResponse`], or any
    /// error from [`ApiClient::request`].
    pub async fn get_subscriber_by_email(&self, email: &str) -> Result<Option<Value>, ApiError> {
        let email = validate_email(email)?;
        let request = ApiRequest::builder(HttpMethod::Get, "subscribers")
            .param("email_address", email)
            .param("status", "all")
            .param("include_total_count", false)
            .build();

        let body = self.request(request).await?;
        let subscribers = body
            .get("subscribers")
            .and_then(Value::as_array)
            .ok_or(ApiError::UnexpectedResponse)?;
        Ok(subscribers.first().cloned())
    }

    /// Fetches a subscriber by ID.
    ///
    /// # Errors
    ///
    /// [`ValidationError::SubscriberIdEmpty`] for ID 0, or any error from
    /// [`ApiClient::request`].
    pub async fn get_subscriber_by_id(&self, subscriber_id: u64) -> Result<Value, ApiError> {
        let subscriber_id = require_id(subscriber_id, ValidationError::SubscriberIdEmpty)?;
        self.get(&format!("subscribers/{subscriber_id}"), Params::new())
            .await
    }

    /// Adds an existing subscriber to a form.
    ///
    /// # Errors
    ///
    /// ID validation errors, or any error from [`ApiClient::request`].
    pub async fn add_subscriber_to_form(
        &self,
        form_id: u64,
        subscriber_id: u64,
    ) -> Result<Value, ApiError> {
        let form_id = require_id(form_id, ValidationError::FormIdEmpty)?;
        let subscriber_id = require_id(subscriber_id, ValidationError::SubscriberIdEmpty)?;
        self.post(
            &format!("forms/{form_id}/subscribers/{subscriber_id}"),
            Params::new(),
        )
        .await
    }

    /// Adds a subscriber to a form by email address.
    ///
    /// `referrer` is the page the subscriber signed up on.
    ///
    /// # Errors
    ///
    /// ID, email or URL validation errors, or any error from
    /// [`ApiClient::request`].
    pub async fn add_subscriber_to_form_by_email(
        &self,
        form_id: u64,
        email: &str,
        referrer: Option<&str>,
    ) -> Result<Value, ApiError> {
        let form_id = require_id(form_id, ValidationError::FormIdEmpty)?;
        let email = validate_email(email)?;
        if let Some(referrer) = referrer {
            HostUrl::new(referrer).map_err(|_| ValidationError::UrlInvalid {
                url: referrer.to_string(),
            })?;
        }

        let request = ApiRequest::builder(HttpMethod::Post, format!("forms/{form_id}/subscribers"))
            .param("email_address", email)
            .param_opt("referrer", referrer)
            .build();
        self.request(request).await
    }

    /// Tags a subscriber.
    ///
    /// # Errors
    ///
    /// ID validation errors, or any error from [`ApiClient::request`].
    pub async fn tag_subscriber(&self, tag_id: u64, subscriber_id: u64) -> Result<Value, ApiError> {
        let tag_id = require_id(tag_id, ValidationError::TagIdEmpty)?;
        let subscriber_id = require_id(subscriber_id, ValidationError::SubscriberIdEmpty)?;
        self.post(
            &format!("tags/{tag_id}/subscribers/{subscriber_id}"),
            Params::new(),
        )
        .await
    }

    /// Adds a subscriber to a sequence.
    ///
    /// # Errors
    ///
    /// ID validation errors, or any error from [`ApiClient::request`].
    pub async fn add_subscriber_to_sequence(
        &self,
        sequence_id: u64,
        subscriber_id: u64,
    ) -> Result<Value, ApiError> {
        let sequence_id = require_id(sequence_id, ValidationError::SequenceIdEmpty)?;
        let subscriber_id = require_id(subscriber_id, ValidationError::SubscriberIdEmpty)?;
        self.post(
            &format!("sequences/{sequence_id}/subscribers/{subscriber_id}"),
            Params::new(),
        )
        .await
    }

    /// Fetches one page of broadcasts.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::list`].
    pub async fn get_broadcasts(
        &self,
        after: Option<&str>,
        per_page: u32,
    ) -> Result<CursorPage, ApiError> {
        self.list(&Listing::BROADCASTS, after, per_page).await
    }

    /// Fetches one page of active embedded forms.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::list`].
    pub async fn get_forms(&self, after: Option<&str>, per_page: u32) -> Result<CursorPage, ApiError> {
        self.list(&Listing::FORMS, after, per_page).await
    }

    /// Fetches one page of legacy forms.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::list`].
    pub async fn get_legacy_forms(
        &self,
        after: Option<&str>,
        per_page: u32,
    ) -> Result<CursorPage, ApiError> {
        self.list(&Listing::LEGACY_FORMS, after, per_page).await
    }

    /// Fetches one page of active hosted landing pages.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::list`].
    pub async fn get_landing_pages(
        &self,
        after: Option<&str>,
        per_page: u32,
    ) -> Result<CursorPage, ApiError> {
        self.list(&Listing::LANDING_PAGES, after, per_page).await
    }

    /// Fetches one page of legacy landing pages.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::list`].
    pub async fn get_legacy_landing_pages(
        &self,
        after: Option<&str>,
        per_page: u32,
    ) -> Result<CursorPage, ApiError> {
        self.list(&Listing::LEGACY_LANDING_PAGES, after, per_page)
            .await
    }

    /// Fetches one page of tags.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::list`].
    pub async fn get_tags(&self, after: Option<&str>, per_page: u32) -> Result<CursorPage, ApiError> {
        self.list(&Listing::TAGS, after, per_page).await
    }

    /// Fetches one page of sequences.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::list`].
    pub async fn get_sequences(
        &self,
        after: Option<&str>,
        per_page: u32,
    ) -> Result<CursorPage, ApiError> {
        self.list(&Listing::SEQUENCES, after, per_page).await
    }

    /// Fetches one page of custom fields.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::list`].
    pub async fn get_custom_fields(
        &self,
        after: Option<&str>,
        per_page: u32,
    ) -> Result<CursorPage, ApiError> {
        self.list(&Listing::CUSTOM_FIELDS, after, per_page).await
    }

    /// Fetches one page of posts; at most 50 per page.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::list`].
    pub async fn get_posts(&self, after: Option<&str>, per_page: u32) -> Result<CursorPage, ApiError> {
        self.list(&Listing::POSTS, after, per_page).await
    }

    /// Fetches all products in a single request.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::list`].
    pub async fn get_products(&self) -> Result<CursorPage, ApiError> {
        self.list(&Listing::PRODUCTS, None, MAX_PER_PAGE).await
    }

    /// Fetches the subscriber profile for a signed subscriber ID.
    ///
    /// # Errors
    ///
    /// [`ValidationError::SignedSubscriberIdEmpty`], or any error from
    /// [`ApiClient::request`].
    pub async fn profile(&self, signed_subscriber_id: &str) -> Result<Value, ApiError> {
        let id = require_text(signed_subscriber_id, ValidationError::SignedSubscriberIdEmpty)?;
        self.get(&format!("profile/{id}"), Params::new()).await
    }

    /// Fetches the Creator Network Recommendations script settings.
    ///
    /// # Errors
    ///
    /// Any error from [`ApiClient::request`].
    pub async fn recommendations_script(&self) -> Result<Value, ApiError> {
        self.get("recommendations_script", Params::new()).await
    }

    /// Emails a subscriber a sign-in code and returns the verification token.
    ///
    /// # Errors
    ///
    /// Email or URL validation errors, [`ApiError::UnexpectedResponse`] if
    /// the response has no token, or any error from [`ApiClient::request`].
    pub async fn subscriber_authentication_send_code(
        &self,
        email: &str,
        redirect_url: &str,
    ) -> Result<String, ApiError> {
        let email = validate_email(email)?;
        HostUrl::new(redirect_url).map_err(|_| ValidationError::UrlInvalid {
            url: redirect_url.to_string(),
        })?;

        let mut params = Params::new();
        params.insert("email_address".to_string(), json!(email));
        params.insert("redirect_url".to_string(), json!(redirect_url));

        let body = self
            .post("subscriber_authentication/send_code", params)
            .await?;
        string_field(&body, "token")
    }

    /// Verifies a sign-in code and returns the signed subscriber ID.
    ///
    /// # Errors
    ///
    /// [`ValidationError::TokenEmpty`], [`ValidationError::SubscriberCodeEmpty`],
    /// [`ApiError::UnexpectedResponse`] if the response has no signed ID, or
    /// any error from [`ApiClient::request`].
    pub async fn subscriber_authentication_verify(
        &self,
        token: &str,
        subscriber_code: &str,
    ) -> Result<String, ApiError> {
        let token = require_text(token, ValidationError::TokenEmpty)?;
        let subscriber_code = require_text(subscriber_code, ValidationError::SubscriberCodeEmpty)?;

        let mut params = Params::new();
        params.insert("token".to_string(), json!(token));
        params.insert("subscriber_code".to_string(), json!(subscriber_code));

        let body = self.post("subscriber_authentication/verify", params).await?;
        string_field(&body, "signed_subscriber_id")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_bounds() {
        assert_eq!(Listing::POSTS.max_per_page, 50);
        assert_eq!(Listing::TAGS.max_per_page, 1000);
        assert!(!Listing::PRODUCTS.paginated);
        assert!(Listing::POSTS.validate_per_page(50).is_ok());
        assert_eq!(
            Listing::POSTS.validate_per_page(51),
            Err(ValidationError::PerPageOutOfRange {
                per_page: 51,
                max: 50
            })
        );
        assert!(Listing::TAGS.validate_per_page(0).is_err());
    }

    #[test]
    fn test_forms_and_landing_pages_share_endpoint_with_different_type() {
        assert_eq!(Listing::FORMS.endpoint, Listing::LANDING_PAGES.endpoint);
        assert!(Listing::FORMS.filters.contains(&("type", "embed")));
        assert!(Listing::LANDING_PAGES.filters.contains(&("type", "hosted")));
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email(" jane@example.com "), Ok("jane@example.com"));
        assert_eq!(validate_email(""), Err(ValidationError::EmailEmpty));
        for invalid in ["jane", "@example.com", "jane@example", "jane@.com", "ja ne@example.com"] {
            assert!(
                matches!(validate_email(invalid), Err(ValidationError::EmailInvalid { .. })),
                "{invalid} should be rejected"
            );
        }
    }

    #[test]
    fn test_require_helpers() {
        assert_eq!(require_id(0, ValidationError::TagIdEmpty), Err(ValidationError::TagIdEmpty));
        assert_eq!(require_id(7, ValidationError::TagIdEmpty), Ok(7));
        assert_eq!(
            require_text("  ", ValidationError::TokenEmpty),
            Err(ValidationError::TokenEmpty)
        );
    }
}
