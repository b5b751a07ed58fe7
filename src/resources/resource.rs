//! The [`Resource`] trait and one implementation per cached entity type.
//!
//! A resource type is pure configuration: where it is stored, how it is
//! fetched, how it is ordered and how long a snapshot stays fresh. All
//! behavior lives in [`ResourceCache`](super::ResourceCache).

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::clients::Listing;
use crate::resources::types::{CustomField, Form, LandingPage, Post, Product, Sequence, Tag};

/// Default lifetime of a cached snapshot: one year.
pub const DEFAULT_CACHE_DURATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Sort direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("Invalid sort order '{other}'. Expected 'asc' or 'desc'.")),
        }
    }
}

/// How a resource type's collection is fetched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Every page of one cursor-paginated listing.
    Paged(Listing),
    /// A single unpaginated request.
    Single(Listing),
    /// Every page of a current listing, then every page of its legacy
    /// counterpart; legacy entries only fill IDs the current listing lacks.
    Merged {
        /// The current-style listing, merged first.
        current: Listing,
        /// The legacy listing.
        legacy: Listing,
        /// Drop current entries whose `format` is present and `null`.
        skip_null_format: bool,
    },
}

/// A remote collection type that can be cached.
///
/// # Example
///
/// ```rust
/// use convertkit_api::resources::{Resource, Tags};
///
/// assert_eq!(Tags::store_key(), "convertkit_tags");
/// assert_eq!(Tags::last_queried_key(), "convertkit_tags_last_queried");
/// ```
pub trait Resource: Send + Sync + 'static {
    /// Typed view of one cached entry.
    type Item: DeserializeOwned;

    /// Resource type name, used in store keys and logs.
    const TYPE: &'static str;

    /// How the collection is fetched.
    const STRATEGY: FetchStrategy;

    /// Attribute the collection is ordered by.
    const ORDER_BY: &'static str = "name";

    /// Default sort direction.
    const ORDER: SortOrder = SortOrder::Asc;

    /// How long a snapshot stays fresh.
    const CACHE_DURATION: Duration = DEFAULT_CACHE_DURATION;

    /// Store key holding the snapshot.
    fn store_key() -> String {
        format!("convertkit_{}", Self::TYPE)
    }

    /// Store key holding the snapshot's fetch time (Unix seconds).
    fn last_queried_key() -> String {
        format!("convertkit_{}_last_queried", Self::TYPE)
    }
}

/// Embedded forms, current and legacy.
#[derive(Clone, Copy, Debug, Default)]
pub struct Forms;

impl Resource for Forms {
    type Item = Form;
    const TYPE: &'static str = "forms";
    const STRATEGY: FetchStrategy = FetchStrategy::Merged {
        current: Listing::FORMS,
        legacy: Listing::LEGACY_FORMS,
        skip_null_format: true,
    };
}

/// Hosted landing pages, current and legacy.
#[derive(Clone, Copy, Debug, Default)]
pub struct LandingPages;

impl Resource for LandingPages {
    type Item = LandingPage;
    const TYPE: &'static str = "landing_pages";
    const STRATEGY: FetchStrategy = FetchStrategy::Merged {
        current: Listing::LANDING_PAGES,
        legacy: Listing::LEGACY_LANDING_PAGES,
        skip_null_format: false,
    };
}

/// Subscriber tags.
#[derive(Clone, Copy, Debug, Default)]
pub struct Tags;

impl Resource for Tags {
    type Item = Tag;
    const TYPE: &'static str = "tags";
    const STRATEGY: FetchStrategy = FetchStrategy::Paged(Listing::TAGS);
}

/// Email sequences.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sequences;

impl Resource for Sequences {
    type Item = Sequence;
    const TYPE: &'static str = "sequences";
    const STRATEGY: FetchStrategy = FetchStrategy::Paged(Listing::SEQUENCES);
}

/// Subscriber custom fields, ordered by label.
#[derive(Clone, Copy, Debug, Default)]
pub struct CustomFields;

impl Resource for CustomFields {
    type Item = CustomField;
    const TYPE: &'static str = "custom_fields";
    const STRATEGY: FetchStrategy = FetchStrategy::Paged(Listing::CUSTOM_FIELDS);
    const ORDER_BY: &'static str = "label";
}

/// Published posts, newest first.
#[derive(Clone, Copy, Debug, Default)]
pub struct Posts;

impl Resource for Posts {
    type Item = Post;
    const TYPE: &'static str = "posts";
    const STRATEGY: FetchStrategy = FetchStrategy::Paged(Listing::POSTS);
    const ORDER_BY: &'static str = "published_at";
    const ORDER: SortOrder = SortOrder::Desc;
}

/// Commerce products.
#[derive(Clone, Copy, Debug, Default)]
pub struct Products;

impl Resource for Products {
    type Item = Product;
    const TYPE: &'static str = "products";
    const STRATEGY: FetchStrategy = FetchStrategy::Single(Listing::PRODUCTS);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_keys_follow_type() {
        assert_eq!(Forms::store_key(), "convertkit_forms");
        assert_eq!(
            LandingPages::last_queried_key(),
            "convertkit_landing_pages_last_queried"
        );
    }

    #[test]
    fn test_default_ordering() {
        assert_eq!(Tags::ORDER_BY, "name");
        assert_eq!(Tags::ORDER, SortOrder::Asc);
        assert_eq!(CustomFields::ORDER_BY, "label");
        assert_eq!(Posts::ORDER_BY, "published_at");
        assert_eq!(Posts::ORDER, SortOrder::Desc);
    }

    #[test]
    fn test_default_cache_duration_is_one_year() {
        assert_eq!(Sequences::CACHE_DURATION.as_secs(), 31_536_000);
    }

    #[test]
    fn test_only_forms_skip_null_format() {
        assert!(matches!(
            Forms::STRATEGY,
            FetchStrategy::Merged {
                skip_null_format: true,
                ..
            }
        ));
        assert!(matches!(
            LandingPages::STRATEGY,
            FetchStrategy::Merged {
                skip_null_format: false,
                ..
            }
        ));
        assert!(matches!(Products::STRATEGY, FetchStrategy::Single(_)));
    }

    #[test]
    fn test_sort_order_parsing() {
        assert_eq!("ASC".parse::<SortOrder>(), Ok(SortOrder::Asc));
        assert_eq!("desc".parse::<SortOrder>(), Ok(SortOrder::Desc));
        assert!("up".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::Desc.to_string(), "desc");
    }
}
