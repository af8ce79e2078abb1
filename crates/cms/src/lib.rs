mod client;
mod criteria;
mod filter;
mod item;

pub use client::{CmsClient, CollectionQuery};
pub use criteria::FilterCriteria;
pub use filter::{matches, select};
pub use item::{CollectionItem, FieldValue, ItemShape, APPLICATION_STATUS_FIELD, USER_NAME_FIELD};

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CmsError {
    #[error("Upstream returned {status}: {body}")] Status { status: u16, body: String },
    #[error("Timeout")] Timeout,
    #[error("Upstream request failed: {0}")] Transport(String),
    #[error("Invalid upstream payload: {0}")] Decode(String),
}

pub type CmsResult<T> = Result<T, CmsError>;

/// One page of a collection as returned by the upstream, in upstream order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectionPage {
    pub items: Vec<CollectionItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<serde_json::Value>,
}

impl CollectionPage {
    /// Accepts the upstream envelope; a missing `items` key is an empty page.
    pub fn from_value(mut value: serde_json::Value) -> CmsResult<Self> {
        let Some(obj) = value.as_object_mut() else {
            return Err(CmsError::Decode("collection payload is not an object".into()));
        };
        let pagination = obj.remove("pagination");
        let items = match obj.remove("items") {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(serde_json::Value::Array(arr)) => arr.into_iter().map(CollectionItem::from_value).collect(),
            Some(_) => return Err(CmsError::Decode("`items` is not an array".into())),
        };
        Ok(Self { items, pagination })
    }

    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
}

/// Source of collection items. The HTTP client is the production implementation;
/// tests plug in in-memory sources.
#[async_trait::async_trait]
pub trait CollectionSource: Send + Sync + 'static {
    async fn fetch_items(&self, query: &CollectionQuery) -> CmsResult<CollectionPage>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_items_is_empty_page() {
        let page = CollectionPage::from_value(json!({ "pagination": { "total": 0 } })).unwrap();
        assert!(page.is_empty());
        assert!(page.pagination.is_some());
    }

    #[test]
    fn null_items_is_empty_page() {
        let page = CollectionPage::from_value(json!({ "items": null })).unwrap();
        assert_eq!(page.len(), 0);
    }

    #[test]
    fn non_array_items_is_rejected() {
        let err = CollectionPage::from_value(json!({ "items": "nope" })).unwrap_err();
        assert!(matches!(err, CmsError::Decode(_)));
        assert!(CollectionPage::from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn items_keep_upstream_order() {
        let page = CollectionPage::from_value(json!({
            "items": [ { "id": "b" }, { "id": "a" }, { "id": "c" } ]
        }))
        .unwrap();
        let ids: Vec<_> = page.items.iter().filter_map(|i| i.id()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }
}
