//! Cached copies of account-level collections.
//!
//! Each entity type (forms, landing pages, tags, sequences, custom fields,
//! posts, products) is described by a unit struct implementing
//! [`Resource`]. [`ResourceCache`] mirrors one such collection: it loads a
//! persisted snapshot from the [`KeyValueStore`](crate::store::KeyValueStore),
//! refetches it when stale, and answers reads from memory.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use convertkit_api::resources::{Forms, ResourceCache, SortOrder};
//!
//! let forms = ResourceCache::<Forms>::new(Arc::clone(&client))
//!     .with_order("name", SortOrder::Desc);
//! forms.init().await?;
//!
//! if let Some(inline) = forms.get_by("format", "inline") {
//!     println!("{} inline forms", inline.len());
//! }
//!
//! let page = forms.get_paginated_subset(1, 20);
//! ```

mod cache;
mod query;
mod resource;
mod schedule;
mod types;

pub use cache::{Collection, ResourceCache, REFRESH_PAGE_SIZE};
pub use query::{
    filter_entries, paginate, sort_entries, Attributes, Entry, FieldMatch, PaginatedSubset,
};
pub use resource::{
    CustomFields, FetchStrategy, Forms, LandingPages, Posts, Products, Resource, Sequences,
    SortOrder, Tags, DEFAULT_CACHE_DURATION,
};
pub use schedule::{RefreshSchedule, MAX_REFRESH_INTERVAL};
pub use types::{CustomField, Form, LandingPage, Post, Product, Sequence, Tag};
