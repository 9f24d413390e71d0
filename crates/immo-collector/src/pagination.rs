//! Offset pagination over search responses.
//!
//! A page is a JSON object holding the listing array under `content` (or one
//! of a few alternative keys). A page shorter than the requested size is the
//! last one.

use serde_json::Value;

/// Key the listing array lives under unless configured otherwise.
pub const DEFAULT_ITEMS_KEY: &str = "content";

const FALLBACK_ITEMS_KEYS: [&str; 4] = ["items", "results", "data", "listings"];
const ID_KEYS: [&str; 3] = ["id", "_id", "objectId"];

/// Takes the listing array out of a response page, trying `items_key` first.
///
/// Returns `None` when the page is not an object or has no array under any
/// known key.
#[must_use]
pub fn extract_items(page: Value, items_key: &str) -> Option<Vec<Value>> {
    let Value::Object(mut page) = page else {
        return None;
    };
    std::iter::once(items_key)
        .chain(FALLBACK_ITEMS_KEYS)
        .find_map(|key| match page.remove(key) {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        })
}

/// Stable identifier of a listing: the first non-null of `id`, `_id` and
/// `objectId`, with numbers rendered as their decimal text.
#[must_use]
pub fn extract_id(item: &Value) -> Option<String> {
    ID_KEYS.into_iter().find_map(|key| match item.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Whether another page should be requested after one with `received` items.
#[must_use]
pub fn has_next_page(received: usize, page_size: u32) -> bool {
    received > 0 && u32::try_from(received).is_ok_and(|n| n >= page_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn items_come_from_configured_key() {
        let page = json!({ "total": 2, "content": [{ "id": "a" }, { "id": "b" }] });
        let items = extract_items(page, DEFAULT_ITEMS_KEY).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn items_fall_back_to_known_keys() {
        let page = json!({ "content": null, "results": [{ "id": "a" }] });
        let items = extract_items(page, DEFAULT_ITEMS_KEY).unwrap();
        assert_eq!(items, vec![json!({ "id": "a" })]);
    }

    #[test]
    fn page_without_array_has_no_items() {
        assert!(extract_items(json!({ "content": "none" }), DEFAULT_ITEMS_KEY).is_none());
        assert!(extract_items(json!([{ "id": "a" }]), DEFAULT_ITEMS_KEY).is_none());
    }

    #[test]
    fn id_prefers_id_then_alternatives() {
        assert_eq!(extract_id(&json!({ "id": "x1", "_id": "y" })).as_deref(), Some("x1"));
        assert_eq!(extract_id(&json!({ "id": null, "_id": "y" })).as_deref(), Some("y"));
        assert_eq!(extract_id(&json!({ "objectId": 1234 })).as_deref(), Some("1234"));
        assert_eq!(extract_id(&json!({ "title": "no id" })), None);
    }

    #[test]
    fn short_page_is_last() {
        assert!(has_next_page(20, 20));
        assert!(!has_next_page(19, 20));
        assert!(!has_next_page(0, 20));
    }
}
