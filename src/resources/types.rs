//! Typed views of cached entries.
//!
//! The cache stores entries as raw attribute maps so that fields added by
//! the API survive a round trip through the store. These structs pick out
//! the fields callers usually need; unknown fields are ignored and missing
//! optional fields default.

use serde::{Deserialize, Serialize};

/// An embedded form (current or legacy).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    /// Form ID.
    pub id: u64,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// `inline`, `modal`, `slide in` or `sticky bar`; absent on legacy forms.
    #[serde(default)]
    pub format: Option<String>,
    /// Script tag URL for embedding.
    #[serde(default)]
    pub embed_js: Option<String>,
    /// Hosted URL of the form.
    #[serde(default)]
    pub embed_url: Option<String>,
    /// Whether the form is archived.
    #[serde(default)]
    pub archived: bool,
    /// Public UID.
    #[serde(default)]
    pub uid: Option<String>,
    /// Creation time as returned by the API.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A hosted landing page (current or legacy).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandingPage {
    /// Landing page ID.
    pub id: u64,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Hosted URL.
    #[serde(default)]
    pub embed_url: Option<String>,
    /// Legacy landing page URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Whether the page is archived.
    #[serde(default)]
    pub archived: bool,
    /// Public UID.
    #[serde(default)]
    pub uid: Option<String>,
}

/// A subscriber tag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag ID.
    pub id: u64,
    /// Tag name.
    #[serde(default)]
    pub name: String,
    /// Creation time as returned by the API.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// An email sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    /// Sequence ID.
    pub id: u64,
    /// Sequence name.
    #[serde(default)]
    pub name: String,
    /// Whether subscribers are held at the end of the sequence.
    #[serde(default)]
    pub hold: bool,
    /// Whether subscribers can repeat the sequence.
    #[serde(default)]
    pub repeat: bool,
    /// Creation time as returned by the API.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A subscriber custom field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    /// Custom field ID.
    pub id: u64,
    /// Internal name.
    #[serde(default)]
    pub name: String,
    /// Key used in subscriber `fields`.
    #[serde(default)]
    pub key: String,
    /// Human-readable label.
    #[serde(default)]
    pub label: String,
}

/// A published post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Post ID.
    pub id: u64,
    /// Post title.
    #[serde(default)]
    pub title: String,
    /// Public URL.
    #[serde(default)]
    pub url: String,
    /// Publication time as returned by the API.
    #[serde(default)]
    pub published_at: Option<String>,
    /// Whether the post is paywalled.
    #[serde(default)]
    pub is_paid: Option<bool>,
    /// Summary text.
    #[serde(default)]
    pub description: Option<String>,
    /// Thumbnail image URL.
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// Thumbnail alt text.
    #[serde(default)]
    pub thumbnail_alt: Option<String>,
}

/// A commerce product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: u64,
    /// Product name.
    #[serde(default)]
    pub name: String,
    /// Checkout URL.
    #[serde(default)]
    pub url: String,
    /// Whether the product is published.
    #[serde(default)]
    pub published: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_form_tolerates_unknown_and_missing_fields() {
        let form: Form = serde_json::from_value(json!({
            "id": 3003590,
            "name": "Third Party Integrations Form",
            "format": "inline",
            "embed_js": "https://example.kit.com/f1e4d2c1/index.js",
            "type": "embed",
            "something_new": {"nested": true}
        }))
        .unwrap();
        assert_eq!(form.id, 3_003_590);
        assert_eq!(form.format.as_deref(), Some("inline"));
        assert!(!form.archived);
        assert_eq!(form.uid, None);
    }

    #[test]
    fn test_legacy_form_has_no_format() {
        let form: Form = serde_json::from_value(json!({
            "id": 470099,
            "name": "Legacy Form",
            "embed_url": "https://app.kit.com/landing_pages/470099"
        }))
        .unwrap();
        assert_eq!(form.format, None);
    }

    #[test]
    fn test_post_fields() {
        let post: Post = serde_json::from_value(json!({
            "id": 224758,
            "title": "Test Subscriber",
            "url": "https://example.kit.com/posts/test-subscriber",
            "published_at": "2023-08-02T16:34:51.000Z",
            "is_paid": null
        }))
        .unwrap();
        assert_eq!(post.is_paid, None);
        assert_eq!(post.published_at.as_deref(), Some("2023-08-02T16:34:51.000Z"));
    }
}
