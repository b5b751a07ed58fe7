//! Read-side operations over a cached snapshot: sorting, matching and
//! page slicing. None of these touch the network or the store.

use serde_json::{Map, Value};

use crate::clients::scalar_to_string;
use crate::resources::resource::SortOrder;

/// Attributes of one cached entry, as returned by the API.
pub type Attributes = Map<String, Value>;

/// A cached entry: its ID and its attributes.
pub type Entry = (u64, Attributes);

/// Sorts `entries` by the `order_by` attribute, compared as strings.
///
/// Ties are broken by ID, so the result depends only on the set of entries
/// and never on their input order. If the first entry lacks `order_by`,
/// the input is returned unchanged. Entries missing the attribute further
/// down compare as the empty string.
#[must_use]
pub fn sort_entries(mut entries: Vec<Entry>, order_by: &str, order: SortOrder) -> Vec<Entry> {
    let sortable = entries
        .first()
        .is_some_and(|(_, first)| first.contains_key(order_by));
    if !sortable {
        return entries;
    }

    entries.sort_by(|(a_id, a), (b_id, b)| {
        sort_key(a, order_by)
            .cmp(&sort_key(b, order_by))
            .then_with(|| a_id.cmp(b_id))
    });

    if order == SortOrder::Desc {
        entries.reverse();
    }
    entries
}

fn sort_key(attributes: &Attributes, order_by: &str) -> String {
    attributes
        .get(order_by)
        .map(scalar_to_string)
        .unwrap_or_default()
}

/// The value(s) an attribute is matched against in
/// [`ResourceCache::get_by`](super::ResourceCache::get_by).
#[derive(Clone, Debug, PartialEq)]
pub enum FieldMatch {
    /// The attribute equals this value.
    One(Value),
    /// The attribute equals any of these values.
    Any(Vec<Value>),
}

impl FieldMatch {
    /// Returns `true` if `candidate` satisfies this match.
    ///
    /// Scalars compare loosely: `42` matches `"42"`.
    #[must_use]
    pub fn matches(&self, candidate: &Value) -> bool {
        match self {
            Self::One(expected) => loosely_equal(candidate, expected),
            Self::Any(expected) => expected.iter().any(|e| loosely_equal(candidate, e)),
        }
    }
}

fn loosely_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    let scalar = |v: &Value| matches!(v, Value::String(_) | Value::Number(_) | Value::Bool(_));
    scalar(a) && scalar(b) && scalar_to_string(a) == scalar_to_string(b)
}

impl From<Value> for FieldMatch {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(values) => Self::Any(values),
            other => Self::One(other),
        }
    }
}

impl From<&str> for FieldMatch {
    fn from(value: &str) -> Self {
        Self::One(Value::from(value))
    }
}

impl From<String> for FieldMatch {
    fn from(value: String) -> Self {
        Self::One(Value::from(value))
    }
}

impl From<u64> for FieldMatch {
    fn from(value: u64) -> Self {
        Self::One(Value::from(value))
    }
}

impl From<bool> for FieldMatch {
    fn from(value: bool) -> Self {
        Self::One(Value::from(value))
    }
}

impl<T: Into<Value>> From<Vec<T>> for FieldMatch {
    fn from(values: Vec<T>) -> Self {
        Self::Any(values.into_iter().map(Into::into).collect())
    }
}

/// Keeps the entries whose `key` attribute exists and satisfies `matcher`.
#[must_use]
pub fn filter_entries(entries: Vec<Entry>, key: &str, matcher: &FieldMatch) -> Vec<Entry> {
    entries
        .into_iter()
        .filter(|(_, attributes)| attributes.get(key).is_some_and(|v| matcher.matches(v)))
        .collect()
}

/// One page of a sorted collection, for list UIs.
#[derive(Clone, Debug, PartialEq)]
pub struct PaginatedSubset {
    /// Entries on this page.
    pub items: Vec<Entry>,
    /// Whether a later page exists.
    pub has_next_page: bool,
    /// Whether an earlier page exists.
    pub has_prev_page: bool,
    /// The page returned, after clamping.
    pub page: i64,
    /// The page size used.
    pub per_page: i64,
}

/// Slices `entries` into page `page` of `per_page` items.
///
/// `page` is clamped to the last page first and then to 1, so an
/// out-of-range request returns the last page rather than nothing. A
/// `per_page` of zero or less means a single page holding everything.
///
/// ```rust
/// use convertkit_api::resources::paginate;
///
/// let entries: Vec<_> = (1..=5).map(|id| (id, serde_json::Map::new())).collect();
/// let subset = paginate(entries, 10, 2);
/// assert_eq!(subset.page, 3);
/// assert_eq!(subset.items.len(), 1);
/// assert!(subset.has_prev_page);
/// assert!(!subset.has_next_page);
/// ```
#[must_use]
pub fn paginate(entries: Vec<Entry>, page: i64, per_page: i64) -> PaginatedSubset {
    let count = i64::try_from(entries.len()).unwrap_or(i64::MAX);
    let total_pages = if per_page > 0 {
        count / per_page + i64::from(count % per_page != 0)
    } else {
        1
    };

    let mut page = page;
    if page > total_pages {
        page = total_pages;
    }
    if page < 1 {
        page = 1;
    }

    let items = if per_page > 0 {
        let start = usize::try_from((page - 1).saturating_mul(per_page)).unwrap_or(usize::MAX);
        let len = usize::try_from(per_page).unwrap_or(usize::MAX);
        entries.into_iter().skip(start).take(len).collect()
    } else {
        entries
    };

    PaginatedSubset {
        items,
        has_next_page: page < total_pages,
        has_prev_page: page > 1,
        page,
        per_page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(id: u64, attributes: Value) -> Entry {
        (id, attributes.as_object().cloned().unwrap_or_default())
    }

    fn ids(entries: &[Entry]) -> Vec<u64> {
        entries.iter().map(|(id, _)| *id).collect()
    }

    fn fixture() -> Vec<Entry> {
        vec![
            entry(1, json!({"id": 1, "name": "Charlie", "label": "b"})),
            entry(2, json!({"id": 2, "name": "alpha", "label": "c"})),
            entry(3, json!({"id": 3, "name": "Bravo", "label": "a"})),
        ]
    }

    #[test]
    fn test_sort_is_string_comparison() {
        let sorted = sort_entries(fixture(), "name", SortOrder::Asc);
        // Byte order: uppercase before lowercase
        assert_eq!(ids(&sorted), vec![3, 1, 2]);
    }

    #[test]
    fn test_sort_descending_reverses() {
        let sorted = sort_entries(fixture(), "name", SortOrder::Desc);
        assert_eq!(ids(&sorted), vec![2, 1, 3]);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let once = sort_entries(fixture(), "name", SortOrder::Asc);
        let twice = sort_entries(once.clone(), "name", SortOrder::Asc);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_sort_has_no_residual_effect() {
        let by_label = sort_entries(fixture(), "label", SortOrder::Asc);
        let then_name = sort_entries(by_label, "name", SortOrder::Asc);
        assert_eq!(then_name, sort_entries(fixture(), "name", SortOrder::Asc));
    }

    #[test]
    fn test_sort_ties_break_by_id() {
        let entries = vec![
            entry(9, json!({"name": "Same"})),
            entry(4, json!({"name": "Same"})),
        ];
        assert_eq!(ids(&sort_entries(entries, "name", SortOrder::Asc)), vec![4, 9]);
    }

    #[test]
    fn test_sort_unknown_key_leaves_input_unchanged() {
        let input = fixture();
        assert_eq!(sort_entries(input.clone(), "published_at", SortOrder::Asc), input);
        assert!(sort_entries(Vec::new(), "name", SortOrder::Asc).is_empty());
    }

    #[test]
    fn test_field_match_is_loose_for_scalars() {
        assert!(FieldMatch::from(42_u64).matches(&json!("42")));
        assert!(FieldMatch::from("42").matches(&json!(42)));
        assert!(FieldMatch::from(vec!["a", "b"]).matches(&json!("b")));
        assert!(!FieldMatch::from("").matches(&Value::Null));
        assert!(!FieldMatch::from("x").matches(&json!(["x"])));
    }

    #[test]
    fn test_field_match_from_json_array_is_any() {
        assert_eq!(
            FieldMatch::from(json!(["a", 1])),
            FieldMatch::Any(vec![json!("a"), json!(1)])
        );
    }

    #[test]
    fn test_filter_requires_attribute() {
        let entries = vec![
            entry(1, json!({"format": null})),
            entry(2, json!({"format": "inline"})),
            entry(3, json!({})),
        ];
        let matched = filter_entries(entries, "format", &FieldMatch::from("inline"));
        assert_eq!(ids(&matched), vec![2]);
    }

    #[test]
    fn test_paginate_five_items_two_per_page() {
        let entries: Vec<Entry> = (1..=5).map(|id| entry(id, json!({}))).collect();

        let first = paginate(entries.clone(), 1, 2);
        assert_eq!(ids(&first.items), vec![1, 2]);
        assert!(!first.has_prev_page);
        assert!(first.has_next_page);

        let last = paginate(entries.clone(), 3, 2);
        assert_eq!(ids(&last.items), vec![5]);
        assert!(!last.has_next_page);
        assert!(last.has_prev_page);

        let clamped = paginate(entries.clone(), 10, 2);
        assert_eq!(clamped.page, 3);
        assert_eq!(ids(&clamped.items), vec![5]);

        let low = paginate(entries, -4, 2);
        assert_eq!(low.page, 1);
        assert_eq!(ids(&low.items), vec![1, 2]);
    }

    #[test]
    fn test_paginate_empty_collection() {
        let subset = paginate(Vec::new(), 2, 10);
        assert_eq!(subset.page, 1);
        assert!(subset.items.is_empty());
        assert!(!subset.has_next_page);
        assert!(!subset.has_prev_page);
    }

    #[test]
    fn test_paginate_huge_per_page_is_one_page() {
        let entries: Vec<Entry> = (1..=5).map(|id| entry(id, json!({}))).collect();

        let subset = paginate(entries.clone(), 1, i64::MAX);
        assert_eq!(subset.page, 1);
        assert_eq!(subset.items.len(), 5);
        assert!(!subset.has_next_page);
        assert!(!subset.has_prev_page);

        let far = paginate(entries, i64::MAX, i64::MAX - 1);
        assert_eq!(far.page, 1);
        assert_eq!(far.items.len(), 5);
    }

    #[test]
    fn test_paginate_non_positive_per_page_returns_everything() {
        let entries: Vec<Entry> = (1..=3).map(|id| entry(id, json!({}))).collect();
        let subset = paginate(entries, 5, 0);
        assert_eq!(subset.page, 1);
        assert_eq!(subset.items.len(), 3);
        assert!(!subset.has_next_page);
        assert_eq!(subset.per_page, 0);
    }
}
