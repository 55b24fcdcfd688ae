//! Dotted field paths into JSON document bodies (`"memberships.shop-1.status"`).

use serde_json::{Map, Value};

/// Splits a dotted path into segments, rejecting empty segments.
pub fn parse_path(path: &str) -> Option<Vec<&str>> {
    if path.is_empty() {
        return None;
    }
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }
    Some(segments)
}

/// Returns true if `path` is a well-formed dotted path.
pub fn is_valid_path(path: &str) -> bool {
    parse_path(path).is_some()
}

/// Joins segments into a dotted path.
///
/// Returns None if any segment is empty or contains a dot, since it could
/// not be addressed unambiguously.
pub fn join_path(segments: &[&str]) -> Option<String> {
    if segments.is_empty() || segments.iter().any(|s| s.is_empty() || s.contains('.')) {
        return None;
    }
    Some(segments.join("."))
}

/// Reads the value at `path`, if every segment resolves.
pub fn get<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    let segments = parse_path(path)?;
    let mut current = body;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Writes `value` at `path`, creating intermediate objects as needed.
///
/// Returns false without modifying anything if an intermediate value exists
/// and is not an object.
pub fn set(body: &mut Value, path: &str, value: Value) -> bool {
    let Some(segments) = parse_path(path) else {
        return false;
    };
    if !body.is_object() {
        if body.is_null() {
            *body = Value::Object(Map::new());
        } else {
            return false;
        }
    }

    let Some((last, parents)) = segments.split_last() else {
        return false;
    };

    // Check the whole chain before writing so a mismatch leaves `body` intact.
    let mut probe = &*body;
    for segment in parents {
        match probe.as_object().and_then(|o| o.get(*segment)) {
            Some(next) if next.is_object() => probe = next,
            Some(Value::Null) | None => break,
            Some(_) => return false,
        }
    }

    let mut current = body;
    for segment in parents {
        let Some(object) = current.as_object_mut() else {
            return false;
        };
        let entry = object
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if entry.is_null() {
            *entry = Value::Object(Map::new());
        }
        current = entry;
    }

    match current.as_object_mut() {
        Some(object) => {
            object.insert((*last).to_string(), value);
            true
        }
        None => false,
    }
}

/// Removes the value at `path`. Returns true if something was removed.
pub fn remove(body: &mut Value, path: &str) -> bool {
    let Some(segments) = parse_path(path) else {
        return false;
    };
    let Some((last, parents)) = segments.split_last() else {
        return false;
    };

    let mut current = body;
    for segment in parents {
        match current.as_object_mut().and_then(|o| o.get_mut(*segment)) {
            Some(next) => current = next,
            None => return false,
        }
    }

    current
        .as_object_mut()
        .map(|o| o.remove(*last).is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_malformed_paths() {
        assert!(!is_valid_path(""));
        assert!(!is_valid_path("a..b"));
        assert!(!is_valid_path(".a"));
        assert!(!is_valid_path("a."));
        assert!(is_valid_path("a.b.c"));
    }

    #[test]
    fn join_rejects_dotted_segments() {
        assert_eq!(join_path(&["a", "b"]).as_deref(), Some("a.b"));
        assert_eq!(join_path(&["a", "b.c"]), None);
        assert_eq!(join_path(&["a", ""]), None);
    }

    #[test]
    fn get_nested_value() {
        let body = json!({"a": {"b": {"c": 3}}});
        assert_eq!(get(&body, "a.b.c"), Some(&json!(3)));
        assert_eq!(get(&body, "a.x"), None);
        assert_eq!(get(&body, "a.b.c.d"), None);
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let mut body = json!({});
        assert!(set(&mut body, "memberships.s1.status", json!("pending")));
        assert_eq!(body, json!({"memberships": {"s1": {"status": "pending"}}}));
    }

    #[test]
    fn set_overwrites_existing_value() {
        let mut body = json!({"isActive": true});
        assert!(set(&mut body, "isActive", json!(false)));
        assert_eq!(body, json!({"isActive": false}));
    }

    #[test]
    fn set_refuses_to_cross_scalar() {
        let mut body = json!({"a": 1});
        assert!(!set(&mut body, "a.b", json!(2)));
        assert_eq!(body, json!({"a": 1}));
    }

    #[test]
    fn remove_nested_value() {
        let mut body = json!({"m": {"s1": 1, "s2": 2}});
        assert!(remove(&mut body, "m.s1"));
        assert_eq!(body, json!({"m": {"s2": 2}}));
        assert!(!remove(&mut body, "m.s1"));
        assert!(!remove(&mut body, "x.y"));
    }
}
