//! Filter extraction from query strings and request bodies.
//!
//! Both the hyphenated field names used by the CMS and their camelCase
//! aliases are accepted. The first non-empty value wins.

use axum::{
    body::Bytes,
    http::{header, HeaderMap},
};
use serde_json::{Map, Value};
use wfg_cms::{FilterCriteria, APPLICATION_STATUS_FIELD, USER_NAME_FIELD};

const USER_NAME_KEYS: [&str; 2] = [USER_NAME_FIELD, "userName"];
const STATUS_KEYS: [&str; 2] = [APPLICATION_STATUS_FIELD, "applicationStatus"];
const FORM_MEDIA_TYPE: &str = "application/x-www-form-urlencoded";

/// Filters from a raw query string, if any.
pub fn from_query(raw: Option<&str>) -> FilterCriteria {
    let Some(raw) = raw else { return FilterCriteria::default() };
    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(raw.as_bytes()).into_owned().collect();
    let lookup = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| pairs.iter().find(|(name, v)| name.as_str() == *k && !v.trim().is_empty()).map(|(_, v)| v.clone()))
    };
    FilterCriteria::new(lookup(&USER_NAME_KEYS[..]), lookup(&STATUS_KEYS[..]))
}

/// Filters from a decoded body. Non-object bodies carry no filters.
pub fn from_body(body: &Value) -> FilterCriteria {
    let Some(obj) = body.as_object() else { return FilterCriteria::default() };
    let lookup = |keys: &[&str]| keys.iter().find_map(|k| obj.get(*k).and_then(text).filter(|v| !v.trim().is_empty()));
    FilterCriteria::new(lookup(&USER_NAME_KEYS[..]), lookup(&STATUS_KEYS[..]))
}

/// Decodes a trigger body as JSON or form data. Anything missing or
/// unparsable becomes `{}`.
pub fn lenient_body(headers: &HeaderMap, body: &Bytes) -> Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Value::Object(Map::new());
    }
    let is_form = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|media| media.trim().eq_ignore_ascii_case(FORM_MEDIA_TYPE));
    if is_form {
        // Repeated keys keep the first non-empty value, as in `from_query`.
        let mut map = Map::new();
        for (k, v) in url::form_urlencoded::parse(body).into_owned() {
            let slot = map.entry(k).or_insert_with(|| Value::String(String::new()));
            if slot.as_str().is_some_and(|s| s.trim().is_empty()) {
                *slot = Value::String(v);
            }
        }
        return Value::Object(map);
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "unparsable trigger body, treating as empty");
            Value::Object(Map::new())
        }
    }
}

fn text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    #[test]
    fn query_accepts_both_spellings() {
        let c = from_query(Some("user-name=alice%40example.com&applicationStatus=draft"));
        assert_eq!(c.identifier.as_deref(), Some("alice@example.com"));
        assert_eq!(c.status.as_deref(), Some("draft"));
    }

    #[test]
    fn hyphenated_name_takes_precedence() {
        let c = from_query(Some("userName=b&user-name=a"));
        assert_eq!(c.identifier.as_deref(), Some("a"));
    }

    #[test]
    fn empty_query_values_are_absent() {
        let c = from_query(Some("user-name=&userName=&application-status="));
        assert!(c.is_unconstrained());
        assert!(from_query(None).is_unconstrained());
    }

    #[test]
    fn body_fields_and_aliases() {
        let c = from_body(&json!({ "userName": "a", "application-status": "Submitted", "other": 1 }));
        assert_eq!(c.identifier.as_deref(), Some("a"));
        assert_eq!(c.status.as_deref(), Some("Submitted"));
        assert!(from_body(&json!([1, 2])).is_unconstrained());
        assert!(from_body(&json!({ "userName": { "nested": true } })).is_unconstrained());
    }

    #[test]
    fn lenient_body_falls_back_to_empty_object() {
        let headers = HeaderMap::new();
        assert_eq!(lenient_body(&headers, &Bytes::from_static(b"{not json")), json!({}));
        assert_eq!(lenient_body(&headers, &Bytes::new()), json!({}));
        assert_eq!(lenient_body(&headers, &Bytes::from_static(b"{\"a\":1}")), json!({ "a": 1 }));
    }

    #[test]
    fn lenient_body_reads_forms() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"));
        let body = lenient_body(&headers, &Bytes::from_static(b"user-name=a%40b.com&application-status=draft"));
        assert_eq!(body, json!({ "user-name": "a@b.com", "application-status": "draft" }));
    }

    #[test]
    fn form_media_type_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("Application/X-WWW-Form-Urlencoded; charset=UTF-8"),
        );
        let body = lenient_body(&headers, &Bytes::from_static(b"user-name=a"));
        assert_eq!(body, json!({ "user-name": "a" }));
    }

    #[test]
    fn repeated_form_keys_follow_query_rule() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"));
        let raw = "user-name=&user-name=first&user-name=second";
        let body = lenient_body(&headers, &Bytes::from_static(raw.as_bytes()));
        assert_eq!(body, json!({ "user-name": "first" }));
        assert_eq!(from_body(&body), from_query(Some(raw)));
    }
}
