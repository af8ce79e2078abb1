use serde::{Serialize, Serializer};
use serde_json::Value;

pub const USER_NAME_FIELD: &str = "user-name";
pub const APPLICATION_STATUS_FIELD: &str = "application-status";

const FIELD_DATA: &str = "fieldData";

/// Which wire representation an item arrived in.
///
/// Raw list reads return fields at the top level; field-mapped reads nest them
/// under `fieldData`. Decoding tries the nested shape first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemShape {
    Nested,
    Flat,
}

/// A logical field read from both of its possible locations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValue {
    pub nested: Option<String>,
    pub flat: Option<String>,
}

impl FieldValue {
    fn probe(raw: &Value, key: &str) -> Self {
        Self {
            nested: raw.get(FIELD_DATA).and_then(|fd| fd.get(key)).and_then(scalar),
            flat: raw.get(key).and_then(scalar),
        }
    }

    pub fn is_present(&self) -> bool {
        self.nested.is_some() || self.flat.is_some()
    }

    /// True when either location satisfies `pred`.
    pub fn any(&self, pred: impl Fn(&str) -> bool) -> bool {
        self.nested.as_deref().is_some_and(&pred) || self.flat.as_deref().is_some_and(&pred)
    }

    /// The value from the location matching `shape`, falling back to the other.
    pub fn preferred(&self, shape: ItemShape) -> Option<&str> {
        match shape {
            ItemShape::Nested => self.nested.as_deref().or(self.flat.as_deref()),
            ItemShape::Flat => self.flat.as_deref().or(self.nested.as_deref()),
        }
    }
}

/// An upstream collection record, normalized for filtering.
///
/// The raw JSON is kept untouched and is what gets serialized back to callers.
#[derive(Debug, Clone)]
pub struct CollectionItem {
    shape: ItemShape,
    user_name: FieldValue,
    application_status: FieldValue,
    raw: Value,
}

impl CollectionItem {
    pub fn from_value(raw: Value) -> Self {
        let shape = if raw.get(FIELD_DATA).is_some_and(Value::is_object) {
            ItemShape::Nested
        } else {
            ItemShape::Flat
        };
        Self {
            shape,
            user_name: FieldValue::probe(&raw, USER_NAME_FIELD),
            application_status: FieldValue::probe(&raw, APPLICATION_STATUS_FIELD),
            raw,
        }
    }

    pub fn shape(&self) -> ItemShape { self.shape }
    pub fn user_name(&self) -> &FieldValue { &self.user_name }
    pub fn application_status(&self) -> &FieldValue { &self.application_status }
    pub fn raw(&self) -> &Value { &self.raw }
    pub fn into_raw(self) -> Value { self.raw }

    pub fn id(&self) -> Option<&str> {
        self.raw.get("id").and_then(Value::as_str)
    }
}

impl Serialize for CollectionItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

// Numbers and booleans compare by their JSON text; objects and arrays never match.
fn scalar(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_shape_detected() {
        let item = CollectionItem::from_value(json!({
            "id": "1",
            "fieldData": { "user-name": "alice@example.com", "application-status": "Draft" }
        }));
        assert_eq!(item.shape(), ItemShape::Nested);
        assert_eq!(item.user_name().nested.as_deref(), Some("alice@example.com"));
        assert_eq!(item.user_name().flat, None);
        assert_eq!(item.application_status().preferred(item.shape()), Some("Draft"));
    }

    #[test]
    fn flat_shape_detected() {
        let item = CollectionItem::from_value(json!({
            "id": "2", "user-name": "bob@example.com", "application-status": "Submitted"
        }));
        assert_eq!(item.shape(), ItemShape::Flat);
        assert_eq!(item.user_name().flat.as_deref(), Some("bob@example.com"));
        assert!(item.application_status().is_present());
    }

    #[test]
    fn non_object_field_data_is_flat() {
        let item = CollectionItem::from_value(json!({ "fieldData": "x", "user-name": "c" }));
        assert_eq!(item.shape(), ItemShape::Flat);
        assert_eq!(item.user_name().preferred(ItemShape::Flat), Some("c"));
    }

    #[test]
    fn scalars_are_stringified_and_containers_ignored() {
        let item = CollectionItem::from_value(json!({
            "user-name": 42, "application-status": ["draft"]
        }));
        assert_eq!(item.user_name().flat.as_deref(), Some("42"));
        assert!(!item.application_status().is_present());
    }

    #[test]
    fn serializes_as_raw() {
        let raw = json!({ "id": "9", "fieldData": { "name": "n" }, "isDraft": false });
        let item = CollectionItem::from_value(raw.clone());
        assert_eq!(serde_json::to_value(&item).unwrap(), raw);
    }
}
