use chrono::{DateTime, Utc};

/// Get the current time as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Parse an RFC 3339 timestamp. Returns None for empty or malformed input.
pub fn parse_rfc3339(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Shallow-merge a JSON patch into a base object.
///
/// Every top-level key of `patch` replaces the same key in `base`; nested
/// objects are replaced whole, not merged. A `null` value removes the key.
/// Keys listed in `protected` are never touched.
pub fn shallow_merge(
    base: &mut serde_json::Value,
    patch: &serde_json::Value,
    protected: &[&str],
) {
    if let (Some(base_obj), Some(patch_obj)) = (base.as_object_mut(), patch.as_object()) {
        for (key, value) in patch_obj {
            if protected.contains(&key.as_str()) {
                continue;
            }
            if value.is_null() {
                base_obj.remove(key);
            } else {
                base_obj.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_rfc3339() {
        let ts = now_rfc3339();
        assert!(ts.contains('T'));
        assert!(parse_rfc3339(&ts).is_some());
    }

    #[test]
    fn test_parse_rfc3339_invalid() {
        assert!(parse_rfc3339("").is_none());
        assert!(parse_rfc3339("yesterday").is_none());
    }

    #[test]
    fn test_shallow_merge() {
        let mut base = serde_json::json!({"id": 1, "a": 1, "b": 2, "c": {"d": 3}});
        let patch = serde_json::json!({"id": 9, "b": null, "c": {"e": 4}, "f": 5});
        shallow_merge(&mut base, &patch, &["id"]);
        assert_eq!(
            base,
            serde_json::json!({"id": 1, "a": 1, "c": {"e": 4}, "f": 5})
        );
    }

    #[test]
    fn test_shallow_merge_non_object_patch_is_ignored() {
        let mut base = serde_json::json!({"a": 1});
        shallow_merge(&mut base, &serde_json::json!([1, 2]), &[]);
        assert_eq!(base, serde_json::json!({"a": 1}));
    }
}
