//! Persistent, time-expiring mirror of one remote collection.
//!
//! A [`ResourceCache`] holds the last fetched snapshot of a resource type in
//! memory and in the [`KeyValueStore`]. Reads never touch the network;
//! [`ResourceCache::init`] and [`ResourceCache::refresh`] do.
//!
//! # Refresh semantics
//!
//! - The fetch time is stamped and persisted before the fetch result is
//!   inspected, so a failing API is not hammered on every access.
//! - A failed fetch leaves the previous snapshot untouched, in memory and in
//!   the store, and returns the error.
//! - A successful fetch writes the snapshot and its fetch time in one
//!   [`KeyValueStore::set_many`] call.
//! - Any error on any page aborts the whole fetch; partial results are
//!   discarded.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Map, Value};

use crate::clients::{ApiClient, ApiError, Listing};
use crate::resources::query::{
    filter_entries, paginate, sort_entries, Attributes, Entry, FieldMatch, PaginatedSubset,
};
use crate::resources::resource::{FetchStrategy, Resource, SortOrder};
use crate::store::{KeyValueStore, StoreError};

/// Page size requested while refreshing, capped by each listing's maximum.
pub const REFRESH_PAGE_SIZE: u32 = 100;

/// A collection keyed by entity ID.
pub type Collection = BTreeMap<u64, Attributes>;

#[derive(Clone, Debug)]
struct Ordering {
    order_by: String,
    order: SortOrder,
}

/// Cache of one resource type.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use convertkit_api::resources::{ResourceCache, Tags};
///
/// let tags = ResourceCache::<Tags>::new(Arc::clone(&client));
/// tags.init().await?;
/// for (id, tag) in tags.get() {
///     println!("{id}: {}", tag["name"]);
/// }
/// ```
pub struct ResourceCache<R: Resource> {
    client: Arc<ApiClient>,
    store: Arc<dyn KeyValueStore>,
    snapshot: RwLock<Option<Collection>>,
    last_queried: RwLock<Option<DateTime<Utc>>>,
    ordering: RwLock<Ordering>,
    cache_duration: Duration,
    resource: PhantomData<fn() -> R>,
}

// Verify ResourceCache is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ResourceCache<crate::resources::Forms>>();
};

impl<R: Resource> std::fmt::Debug for ResourceCache<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("type", &R::TYPE)
            .field("last_queried", &self.last_queried())
            .field("cache_duration", &self.cache_duration)
            .finish_non_exhaustive()
    }
}

impl<R: Resource> ResourceCache<R> {
    /// Creates an empty cache backed by the client's store.
    ///
    /// Nothing is loaded until [`ResourceCache::init`] is called.
    #[must_use]
    pub fn new(client: Arc<ApiClient>) -> Self {
        let store = client.store();
        Self {
            client,
            store,
            snapshot: RwLock::new(None),
            last_queried: RwLock::new(None),
            ordering: RwLock::new(Ordering {
                order_by: R::ORDER_BY.to_string(),
                order: R::ORDER,
            }),
            cache_duration: R::CACHE_DURATION,
            resource: PhantomData,
        }
    }

    /// Sets the attribute and direction used by [`ResourceCache::get`].
    #[must_use]
    pub fn with_order(self, order_by: impl Into<String>, order: SortOrder) -> Self {
        self.set_order(order_by, order);
        self
    }

    /// Sets how long a snapshot stays fresh.
    #[must_use]
    pub const fn with_cache_duration(mut self, cache_duration: Duration) -> Self {
        self.cache_duration = cache_duration;
        self
    }

    /// Changes the ordering of subsequent reads.
    pub fn set_order(&self, order_by: impl Into<String>, order: SortOrder) {
        let mut ordering = self.ordering.write().unwrap_or_else(PoisonError::into_inner);
        ordering.order_by = order_by.into();
        ordering.order = order;
    }

    /// Returns the current ordering attribute and direction.
    #[must_use]
    pub fn order(&self) -> (String, SortOrder) {
        let ordering = self.ordering.read().unwrap_or_else(PoisonError::into_inner);
        (ordering.order_by.clone(), ordering.order)
    }

    /// Returns how long a snapshot stays fresh.
    #[must_use]
    pub const fn cache_duration(&self) -> Duration {
        self.cache_duration
    }

    /// Returns when the snapshot was last fetched (or a fetch last failed).
    #[must_use]
    pub fn last_queried(&self) -> Option<DateTime<Utc>> {
        *self
            .last_queried
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` if there is no fetch time or it is older than the
    /// cache duration.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        let Some(last_queried) = self.last_queried() else {
            return true;
        };
        let Ok(duration) = chrono::Duration::from_std(self.cache_duration) else {
            return false;
        };
        last_queried
            .checked_add_signed(duration)
            .is_some_and(|expires| Utc::now() > expires)
    }

    /// Loads the persisted snapshot and refreshes it if absent or expired.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Storage`] if the store cannot be read or holds a
    /// corrupt snapshot, or the refresh error if a refresh was needed and
    /// failed.
    pub async fn init(&self) -> Result<(), ApiError> {
        self.load()?;

        if self.is_expired() {
            tracing::debug!(resource = R::TYPE, "ConvertKit resource cache stale");
            self.refresh().await?;
        }
        Ok(())
    }

    fn load(&self) -> Result<(), StoreError> {
        let last_queried = self
            .store
            .get(&R::last_queried_key())?
            .as_ref()
            .and_then(timestamp_from_value);

        let snapshot = match self.store.get(&R::store_key())? {
            Some(Value::Object(map)) => Some(collection_from_map(map)),
            Some(Value::Null) | None => None,
            Some(_) => {
                return Err(StoreError::Corrupt {
                    key: R::store_key(),
                    message: "expected a JSON object keyed by ID".to_string(),
                })
            }
        };

        *self
            .last_queried
            .write()
            .unwrap_or_else(PoisonError::into_inner) = last_queried;
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
        Ok(())
    }

    /// Fetches the whole collection from the API.
    ///
    /// Safe to call repeatedly and from several tasks at once; the last
    /// writer wins.
    ///
    /// # Errors
    ///
    /// Returns the fetch error, or [`ApiError::Storage`] if persisting a
    /// successful fetch fails. A store failure while recording a failed
    /// fetch is logged and the fetch error is returned.
    pub async fn refresh(&self) -> Result<Vec<Entry>, ApiError> {
        tracing::info!(resource = R::TYPE, "Refreshing ConvertKit resources");

        let fetched = fetch_collection(&self.client, R::STRATEGY).await;

        let now = Utc::now();
        *self
            .last_queried
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(now);

        let collection = match fetched {
            Ok(collection) => collection,
            Err(error) => {
                if let Err(store_error) = self
                    .store
                    .set(&R::last_queried_key(), json!(now.timestamp()))
                {
                    tracing::warn!(
                        resource = R::TYPE,
                        "Could not persist ConvertKit resource fetch time: {store_error}"
                    );
                }
                tracing::warn!(
                    resource = R::TYPE,
                    code = error.code(),
                    "ConvertKit resource refresh failed: {error}"
                );
                return Err(error);
            }
        };

        self.store.set_many(vec![
            (R::store_key(), collection_to_value(&collection)),
            (R::last_queried_key(), json!(now.timestamp())),
        ])?;

        tracing::info!(
            resource = R::TYPE,
            count = collection.len(),
            "ConvertKit resources refreshed"
        );
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Some(collection);
        Ok(self.get())
    }

    /// Returns the snapshot sorted by the current ordering.
    ///
    /// Sorting works on a copy; the stored snapshot keeps ID order.
    #[must_use]
    pub fn get(&self) -> Vec<Entry> {
        let (order_by, order) = self.order();
        self.sort(self.entries(), &order_by, order)
    }

    /// Sorts `entries` by `order_by` in `order`.
    #[must_use]
    pub fn sort(&self, entries: Vec<Entry>, order_by: &str, order: SortOrder) -> Vec<Entry> {
        sort_entries(entries, order_by, order)
    }

    fn entries(&self) -> Vec<Entry> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|collection| {
                collection
                    .iter()
                    .map(|(id, attributes)| (*id, attributes.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the entry with `id`, if cached.
    #[must_use]
    pub fn get_by_id(&self, id: u64) -> Option<Attributes> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(|collection| collection.get(&id).cloned())
    }

    /// Returns the sorted entries whose `key` attribute matches, or `None`
    /// if none do.
    ///
    /// ```rust,ignore
    /// let both = forms.get_by("name", vec!["A Name", "Z Name"]);
    /// let inline = forms.get_by("format", "inline");
    /// ```
    #[must_use]
    pub fn get_by(&self, key: &str, matcher: impl Into<FieldMatch>) -> Option<Vec<Entry>> {
        let matched = filter_entries(self.entries(), key, &matcher.into());
        if matched.is_empty() {
            return None;
        }
        let (order_by, order) = self.order();
        Some(self.sort(matched, &order_by, order))
    }

    /// Returns page `page` of the sorted snapshot.
    ///
    /// See [`paginate`] for the clamping rules.
    #[must_use]
    pub fn get_paginated_subset(&self, page: i64, per_page: i64) -> PaginatedSubset {
        paginate(self.get(), page, per_page)
    }

    /// Returns the sorted snapshot as typed items.
    ///
    /// Entries that do not fit the item type are skipped.
    #[must_use]
    pub fn items(&self) -> Vec<R::Item> {
        self.get()
            .into_iter()
            .filter_map(|(_, attributes)| serde_json::from_value(Value::Object(attributes)).ok())
            .collect()
    }

    /// Returns `true` if the snapshot holds at least one entry.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|collection| !collection.is_empty())
    }

    /// Deletes the snapshot and its fetch time, in memory and in the store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be written.
    pub fn delete(&self) -> Result<(), StoreError> {
        self.store.delete(&R::store_key())?;
        self.store.delete(&R::last_queried_key())?;
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = None;
        *self
            .last_queried
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Fetches a collection according to `strategy`.
pub(crate) async fn fetch_collection(
    client: &ApiClient,
    strategy: FetchStrategy,
) -> Result<Collection, ApiError> {
    match strategy {
        FetchStrategy::Paged(listing) => fetch_all_pages(client, &listing).await,
        FetchStrategy::Single(listing) => {
            let page = client.list(&listing, None, listing.max_per_page).await?;
            let mut collection = Collection::new();
            merge_items(&mut collection, page.items);
            Ok(collection)
        }
        FetchStrategy::Merged {
            current,
            legacy,
            skip_null_format,
        } => {
            let mut collection = fetch_all_pages(client, &current).await?;
            if skip_null_format {
                collection.retain(|_, attributes| {
                    !matches!(attributes.get("format"), Some(Value::Null))
                });
            }
            for (id, attributes) in fetch_all_pages(client, &legacy).await? {
                collection.entry(id).or_insert(attributes);
            }
            Ok(collection)
        }
    }
}

async fn fetch_all_pages(client: &ApiClient, listing: &Listing) -> Result<Collection, ApiError> {
    let per_page = listing.max_per_page.min(REFRESH_PAGE_SIZE);
    let mut collection = Collection::new();
    let mut after: Option<String> = None;

    loop {
        let page = client.list(listing, after.as_deref(), per_page).await?;
        let next = page.next_cursor().map(str::to_string);
        merge_items(&mut collection, page.items);

        match next {
            // A repeated cursor would loop forever
            Some(cursor) if after.as_deref() != Some(cursor.as_str()) => after = Some(cursor),
            _ => break,
        }
    }

    Ok(collection)
}

fn merge_items(collection: &mut Collection, items: Vec<Value>) {
    for item in items {
        let Value::Object(attributes) = item else {
            continue;
        };
        match attributes.get("id").and_then(id_from_value) {
            Some(id) => {
                collection.insert(id, attributes);
            }
            None => tracing::debug!("Skipping ConvertKit resource without an ID"),
        }
    }
}

fn id_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn timestamp_from_value(value: &Value) -> Option<DateTime<Utc>> {
    let seconds = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    Utc.timestamp_opt(seconds, 0).single()
}

fn collection_from_map(map: Map<String, Value>) -> Collection {
    map.into_iter()
        .filter_map(|(key, value)| match value {
            Value::Object(attributes) => Some((key.parse().ok()?, attributes)),
            _ => None,
        })
        .collect()
}

fn collection_to_value(collection: &Collection) -> Value {
    Value::Object(
        collection
            .iter()
            .map(|(id, attributes)| (id.to_string(), Value::Object(attributes.clone())))
            .collect(),
    )
}
