//! Nested translation dictionaries and dot-path helpers.

use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// A nested string dictionary as found in a translation file.
///
/// Backed by `serde_json::Map` with `preserve_order`, so flattening follows
/// document order.
pub type Dictionary = Map<String, Value>;

static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

pub(crate) fn placeholder_regex() -> &'static Regex {
    PLACEHOLDER_REGEX
        .get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}").expect("valid regex"))
}

/// Flatten a dictionary into `(dot.path, leaf)` pairs in document order.
pub fn flatten(dict: &Dictionary) -> Vec<(String, Value)> {
    let mut pairs = Vec::new();
    flatten_into(dict, None, &mut pairs);
    pairs
}

fn flatten_into(dict: &Dictionary, prefix: Option<&str>, out: &mut Vec<(String, Value)>) {
    for (key, value) in dict {
        let full_key = prefix.map_or_else(|| key.clone(), |p| format!("{p}.{key}"));
        match value {
            Value::Object(nested) => flatten_into(nested, Some(&full_key), out),
            leaf => out.push((full_key, leaf.clone())),
        }
    }
}

/// Sorted list of every leaf key.
pub fn flat_keys(dict: &Dictionary) -> Vec<String> {
    let mut keys: Vec<String> = flatten(dict).into_iter().map(|(k, _)| k).collect();
    keys.sort();
    keys
}

/// Rebuild a nested dictionary from dot-path pairs.
pub fn unflatten<I>(pairs: I) -> Dictionary
where
    I: IntoIterator<Item = (String, Value)>,
{
    let mut root = Dictionary::new();
    for (path, value) in pairs {
        insert_path(&mut root, &path, value);
    }
    root
}

fn insert_path(root: &mut Dictionary, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut current = root;

    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return;
        }

        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Dictionary::new()));
        if !entry.is_object() {
            *entry = Value::Object(Dictionary::new());
        }
        current = match entry {
            Value::Object(map) => map,
            _ => unreachable!("entry was just made an object"),
        };
    }
}

/// Resolve a dot-path key to its value.
pub fn lookup<'a>(dict: &'a Dictionary, key: &str) -> Option<&'a Value> {
    let mut segments = key.split('.');
    let first = segments.next()?;
    let mut current = dict.get(first)?;

    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Deep-merge `from` into `into`. Leaves in `from` win on conflict.
pub fn merge(into: &mut Dictionary, from: &Dictionary) {
    for (key, value) in from {
        match (into.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => merge(existing, incoming),
            _ => {
                into.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Replace `{{name}}` placeholders with values from `params`.
///
/// Unknown placeholders are left untouched.
pub fn interpolate(template: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return template.to_string();
    }

    placeholder_regex()
        .replace_all(template, |caps: &Captures<'_>| {
            let name = &caps[1];
            params
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dict(value: Value) -> Dictionary {
        match value {
            Value::Object(map) => map,
            _ => panic!("test fixture must be an object"),
        }
    }

    #[test]
    fn test_flatten_nested_in_document_order() {
        let d = dict(json!({
            "nav": { "home": "Home", "blog": "Blog" },
            "title": "Portfolio"
        }));

        let keys: Vec<_> = flatten(&d).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["nav.home", "nav.blog", "title"]);
    }

    #[test]
    fn test_flat_keys_sorted() {
        let d = dict(json!({ "z": "1", "a": { "c": "2", "b": "3" } }));
        assert_eq!(flat_keys(&d), vec!["a.b", "a.c", "z"]);
    }

    #[test]
    fn test_unflatten_restores_structure() {
        let d = dict(json!({
            "contact": { "form": { "email": "Email", "name": "Name" } },
            "footer": "Thanks"
        }));

        assert_eq!(unflatten(flatten(&d)), d);
    }

    #[test]
    fn test_unflatten_replaces_conflicting_leaf() {
        let rebuilt = unflatten(vec![
            ("a".to_string(), json!("leaf")),
            ("a.b".to_string(), json!("nested")),
        ]);
        assert_eq!(Value::Object(rebuilt), json!({ "a": { "b": "nested" } }));
    }

    #[test]
    fn test_lookup() {
        let d = dict(json!({ "a": { "b": { "c": "X" } } }));
        assert_eq!(lookup(&d, "a.b.c"), Some(&json!("X")));
        assert_eq!(lookup(&d, "a.b.missing"), None);
        assert_eq!(lookup(&d, "a.b.c.d"), None);
        assert!(lookup(&d, "a.b").unwrap().is_object());
    }

    #[test]
    fn test_merge_is_deep_and_later_wins() {
        let mut base = dict(json!({ "nav": { "home": "Home", "blog": "Blog" } }));
        let extra = dict(json!({ "nav": { "blog": "Articles", "admin": "Admin" } }));

        merge(&mut base, &extra);

        assert_eq!(
            Value::Object(base),
            json!({ "nav": { "home": "Home", "blog": "Articles", "admin": "Admin" } })
        );
    }

    #[test]
    fn test_interpolate() {
        assert_eq!(
            interpolate("Hello, {{name}}! You are visitor {{ count }}.", &[("name", "Ana"), ("count", "7")]),
            "Hello, Ana! You are visitor 7."
        );
        assert_eq!(interpolate("Hi {{missing}}", &[("name", "Ana")]), "Hi {{missing}}");
        assert_eq!(interpolate("No params {{x}}", &[]), "No params {{x}}");
    }
}
