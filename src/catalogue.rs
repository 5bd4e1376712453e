//! Catalogue requests and responses.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

use crate::content::ContentItem;
use crate::error::CatalogueError;

/// Filter field holding the content type.
pub const CONTENT_TYPE_FILTER: &str = "contentType";

/// Filter field requesting a cache bypass. Never hashed and never sent upstream.
pub const NO_CACHE_FILTER: &str = "no_cache";

/// Filters for a catalogue request.
///
/// `fields` are forwarded to the catalogue API as query parameters and are part of
/// the cache key. `no_cache` only controls caching.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogueFilters {
    pub fields: BTreeMap<String, Value>,
    #[serde(default)]
    pub no_cache: bool,
}

impl CatalogueFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build filters from a loose map, pulling out the `no_cache` flag.
    ///
    /// `no_cache` counts as set when it is `true`, a non-zero number, or one of the
    /// strings `"1"`, `"true"`, `"yes"`.
    pub fn from_map(mut map: HashMap<String, Value>) -> Self {
        let no_cache = map.remove(NO_CACHE_FILTER).is_some_and(|v| truthy(&v));
        CatalogueFilters {
            fields: map.into_iter().collect(),
            no_cache,
        }
    }

    pub fn with_content_type(self, content_type: impl Into<String>) -> Self {
        self.with(CONTENT_TYPE_FILTER, Value::String(content_type.into()))
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        if key == NO_CACHE_FILTER {
            self.no_cache = truthy(&value);
        } else {
            self.fields.insert(key, value);
        }
        self
    }

    pub fn no_cache(mut self, no_cache: bool) -> Self {
        self.no_cache = no_cache;
        self
    }

    /// The `contentType` filter, when it is a non-empty string.
    pub fn content_type(&self) -> Option<&str> {
        self.fields
            .get(CONTENT_TYPE_FILTER)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.to_lowercase().as_str(), "1" | "true" | "yes"),
        _ => false,
    }
}

/// Pagination metadata for a catalogue page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueMetadata {
    pub total_items: u64,
    pub current_page: u32,
    pub per_page: u32,
    pub total_pages: u64,
    pub next_page_url: Option<String>,
    pub previous_page_url: Option<String>,
}

impl CatalogueMetadata {
    /// Read pagination from the upstream `data` object.
    ///
    /// Missing fields fall back to the request: `total_items` to the item count,
    /// `current_page`/`per_page` to the requested values and `total_pages` to
    /// `ceil(total_items / per_page)`.
    pub fn from_upstream(
        data: &Map<String, Value>,
        item_count: usize,
        page: u32,
        per_page: u32,
    ) -> Self {
        let total_items = data
            .get("total_items")
            .and_then(as_u64)
            .unwrap_or(item_count as u64);
        let divisor = if per_page == 0 { 10 } else { per_page as u64 };

        CatalogueMetadata {
            total_items,
            current_page: data
                .get("current_page")
                .and_then(as_u64)
                .map(|n| n as u32)
                .unwrap_or(page),
            per_page: data
                .get("per_page")
                .and_then(as_u64)
                .map(|n| n as u32)
                .unwrap_or(per_page),
            total_pages: data
                .get("total_pages")
                .and_then(as_u64)
                .unwrap_or_else(|| total_items.div_ceil(divisor)),
            next_page_url: data
                .get("next_page_url")
                .and_then(Value::as_str)
                .map(str::to_string),
            previous_page_url: data
                .get("previous_page_url")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.ceil() as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// One page of the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogueResult {
    pub items: Vec<ContentItem>,
    pub metadata: CatalogueMetadata,
}

/// Locate the catalogue `data` object in an upstream body.
///
/// Three shapes are accepted:
/// - `{ "status": "Complete", "data": { "items": [...], ... } }`
/// - `{ "data": { "items": [...], ... } }`
/// - `{ "items": [...], ... }`
pub fn extract_catalogue_data(body: &Value) -> Result<&Map<String, Value>, CatalogueError> {
    let nested = body
        .get("data")
        .and_then(Value::as_object)
        .filter(|data| has_item_list(data));

    if let Some(data) = nested {
        return Ok(data);
    }

    if let Some(data) = body.as_object().filter(|data| has_item_list(data)) {
        return Ok(data);
    }

    Err(CatalogueError::Format(format!(
        "catalogue body has no item list: {}",
        truncate(body)
    )))
}

fn has_item_list(data: &Map<String, Value>) -> bool {
    data.get("items").is_some_and(Value::is_array)
}

/// Locate a single content record in an upstream body.
///
/// Either a non-empty `{ "items": [...] }` list (the first element is taken) or a
/// direct record carrying `contentid` or `id`.
pub fn extract_item_record(body: &Value) -> Result<&Value, CatalogueError> {
    if let Some(first) = body
        .get("items")
        .and_then(Value::as_array)
        .and_then(|items| items.first())
    {
        return Ok(first);
    }

    let is_record = body
        .as_object()
        .is_some_and(|record| record.contains_key("contentid") || record.contains_key("id"));
    if is_record {
        return Ok(body);
    }

    Err(CatalogueError::Format(format!(
        "invalid content data format: {}",
        truncate(body)
    )))
}

fn truncate(body: &Value) -> String {
    let mut text = body.to_string();
    if text.len() > 256 {
        let mut cut = 256;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push_str("...");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filters_from_map_strips_no_cache() {
        let mut map = HashMap::new();
        map.insert("contentType".to_string(), json!("course"));
        map.insert("no_cache".to_string(), json!("true"));
        let filters = CatalogueFilters::from_map(map);

        assert!(filters.no_cache);
        assert!(!filters.fields.contains_key(NO_CACHE_FILTER));
        assert_eq!(filters.content_type(), Some("course"));
    }

    #[test]
    fn test_with_routes_no_cache_to_flag() {
        let filters = CatalogueFilters::new().with("no_cache", true).with("nameFilter", "rust");
        assert!(filters.no_cache);
        assert_eq!(filters.fields.len(), 1);
    }

    #[test]
    fn test_empty_content_type_ignored() {
        let filters = CatalogueFilters::new().with_content_type("");
        assert_eq!(filters.content_type(), None);
    }

    #[test]
    fn test_extract_all_three_shapes() {
        let complete = json!({"status": "Complete", "data": {"items": [], "total_items": 0}});
        let wrapped = json!({"data": {"items": [{"contentid": 1}]}});
        let flat = json!({"items": [], "total_items": 3});

        assert!(extract_catalogue_data(&complete).unwrap().contains_key("total_items"));
        assert_eq!(extract_catalogue_data(&wrapped).unwrap()["items"][0]["contentid"], 1);
        assert_eq!(extract_catalogue_data(&flat).unwrap()["total_items"], 3);
    }

    #[test]
    fn test_extract_rejects_unknown_shape() {
        for body in [json!({"data": {"rows": []}}), json!({"items": "nope"}), json!([1, 2])] {
            let err = extract_catalogue_data(&body).unwrap_err();
            assert!(matches!(err, CatalogueError::Format(_)));
        }
    }

    #[test]
    fn test_extract_item_record() {
        let listed = json!({"items": [{"contentid": 1}, {"contentid": 2}]});
        assert_eq!(extract_item_record(&listed).unwrap()["contentid"], 1);

        let direct = json!({"id": 7, "contenttype": "course"});
        assert_eq!(extract_item_record(&direct).unwrap()["id"], 7);

        let empty = json!({"items": []});
        assert!(matches!(
            extract_item_record(&empty),
            Err(CatalogueError::Format(_))
        ));
    }

    #[test]
    fn test_metadata_fallbacks() {
        let data = json!({"items": [], "total_items": 21});
        let meta = CatalogueMetadata::from_upstream(data.as_object().unwrap(), 10, 2, 10);
        assert_eq!(meta.total_items, 21);
        assert_eq!(meta.current_page, 2);
        assert_eq!(meta.per_page, 10);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.next_page_url.is_none());
    }

    #[test]
    fn test_metadata_from_upstream_values() {
        let data = json!({
            "items": [],
            "total_items": 5,
            "current_page": 1,
            "per_page": 2,
            "total_pages": 3,
            "next_page_url": "?page=2",
        });
        let meta = CatalogueMetadata::from_upstream(data.as_object().unwrap(), 2, 1, 10);
        assert_eq!(meta.per_page, 2);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.next_page_url.as_deref(), Some("?page=2"));
    }

    #[test]
    fn test_metadata_zero_per_page_uses_ten() {
        let data = json!({"items": []});
        let meta = CatalogueMetadata::from_upstream(data.as_object().unwrap(), 25, 1, 0);
        assert_eq!(meta.total_pages, 3);
    }
}
