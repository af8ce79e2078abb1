use crate::{CollectionItem, FilterCriteria};

/// Whether `item` satisfies every constraint in `criteria`.
///
/// Identifiers compare exactly, statuses ignore case. Either wire location may
/// satisfy a constraint; a constrained field missing from both does not.
pub fn matches(item: &CollectionItem, criteria: &FilterCriteria) -> bool {
    let identifier_ok = match criteria.identifier.as_deref() {
        None => true,
        Some(want) => item.user_name().any(|v| v == want),
    };
    let status_ok = match criteria.status.as_deref() {
        None => true,
        Some(want) => {
            let want = want.to_lowercase();
            item.application_status().any(|v| v.to_lowercase() == want)
        }
    };
    identifier_ok && status_ok
}

/// Keeps matching items in upstream order.
pub fn select(items: Vec<CollectionItem>, criteria: &FilterCriteria) -> Vec<CollectionItem> {
    if criteria.is_unconstrained() {
        return items;
    }
    items.into_iter().filter(|item| matches(item, criteria)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn nested(user: &str, status: &str) -> CollectionItem {
        CollectionItem::from_value(json!({ "fieldData": { "user-name": user, "application-status": status } }))
    }

    fn flat(user: &str, status: &str) -> CollectionItem {
        CollectionItem::from_value(json!({ "user-name": user, "application-status": status }))
    }

    fn criteria(identifier: Option<&str>, status: Option<&str>) -> FilterCriteria {
        FilterCriteria::new(identifier.map(Into::into), status.map(Into::into))
    }

    #[test]
    fn unconstrained_matches_everything() {
        let c = FilterCriteria::default();
        assert!(matches(&nested("a", "Draft"), &c));
        assert!(matches(&flat("b", "Submitted"), &c));
        assert!(matches(&CollectionItem::from_value(json!({})), &c));
        assert!(matches(&CollectionItem::from_value(Value::Null), &c));
    }

    #[test]
    fn status_ignores_case() {
        assert!(matches(&flat("a", "Draft"), &criteria(None, Some("draft"))));
        assert!(matches(&nested("a", "DRAFT"), &criteria(None, Some("Draft"))));
        assert!(!matches(&nested("a", "Drafted"), &criteria(None, Some("draft"))));
    }

    #[test]
    fn identifier_is_exact() {
        assert!(matches(&flat("alice@example.com", "x"), &criteria(Some("alice@example.com"), None)));
        assert!(!matches(&flat("Alice@example.com", "x"), &criteria(Some("alice@example.com"), None)));
    }

    #[test]
    fn shape_does_not_change_the_outcome() {
        let cases = [
            (Some("alice@example.com"), Some("draft")),
            (Some("alice@example.com"), None),
            (None, Some("submitted")),
            (Some("bob@example.com"), Some("draft")),
            (None, None),
        ];
        for (id, status) in cases {
            let c = criteria(id, status);
            assert_eq!(
                matches(&nested("alice@example.com", "Draft"), &c),
                matches(&flat("alice@example.com", "Draft"), &c),
                "criteria {c:?}"
            );
        }
    }

    #[test]
    fn missing_field_fails_constrained_match() {
        let item = CollectionItem::from_value(json!({ "fieldData": { "user-name": "a" } }));
        assert!(!matches(&item, &criteria(None, Some("draft"))));
        assert!(matches(&item, &criteria(Some("a"), None)));
    }

    #[test]
    fn either_location_can_satisfy() {
        let item = CollectionItem::from_value(json!({
            "user-name": "flat@example.com",
            "fieldData": { "user-name": "nested@example.com", "application-status": "Draft" }
        }));
        assert!(matches(&item, &criteria(Some("flat@example.com"), Some("draft"))));
        assert!(matches(&item, &criteria(Some("nested@example.com"), Some("draft"))));
    }

    #[test]
    fn select_preserves_order_and_returns_all_matches() {
        let items = vec![nested("a", "Draft"), flat("b", "Draft"), nested("a", "Submitted"), flat("a", "draft")];
        let out = select(items, &criteria(Some("a"), Some("draft")));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].shape(), crate::ItemShape::Nested);
        assert_eq!(out[1].shape(), crate::ItemShape::Flat);
    }
}
