//! Nested decoding of `application/x-www-form-urlencoded` bodies.
//!
//! Bracketed keys build nested values the way browser forms encode them:
//!
//! ```text
//! data[name]=A&data[price]=1          -> {"data": {"name": "A", "price": "1"}}
//! data[0][name]=A&data[1][name]=B     -> {"data": [{"name": "A"}, {"name": "B"}]}
//! data[][name]=A&data[][name]=B       -> {"data": [{"name": "A"}, {"name": "B"}]}
//! ```
//!
//! Every leaf is a string.

use serde_json::{Map, Value};
use url::form_urlencoded;

/// Decode a form body into a JSON object.
pub fn decode_nested(body: &[u8]) -> Value {
    let mut root = Map::new();

    for (key, value) in form_urlencoded::parse(body) {
        let path = split_key(&key);
        if path.is_empty() {
            continue;
        }
        insert(&mut root, &path, Value::String(value.into_owned()));
    }

    let mut root = Value::Object(root);
    collapse_arrays(&mut root);
    root
}

/// `a[b][c]` -> `["a", "b", "c"]`. A key with unbalanced brackets is kept whole.
fn split_key(key: &str) -> Vec<String> {
    let Some(open) = key.find('[') else {
        return vec![key.to_string()];
    };
    if open == 0 {
        return vec![key.to_string()];
    }

    let mut segments = vec![key[..open].to_string()];
    let mut rest = &key[open..];
    while let Some(stripped) = rest.strip_prefix('[') {
        match stripped.find(']') {
            Some(close) => {
                segments.push(stripped[..close].to_string());
                rest = &stripped[close + 1..];
            }
            None => return vec![key.to_string()],
        }
    }

    if rest.is_empty() {
        segments
    } else {
        vec![key.to_string()]
    }
}

fn insert(map: &mut Map<String, Value>, path: &[String], leaf: Value) {
    let (head, tail) = match path.split_first() {
        Some(split) => split,
        None => return,
    };

    // `[]` appends: it takes the next free index
    let key = if head.is_empty() {
        map.len().to_string()
    } else {
        head.clone()
    };

    if tail.is_empty() {
        match map.get_mut(&key) {
            // Repeated keys collect into a list
            Some(Value::Array(items)) => items.push(leaf),
            Some(existing @ Value::String(_)) => {
                let first = std::mem::take(existing);
                *existing = Value::Array(vec![first, leaf]);
            }
            _ => {
                map.insert(key, leaf);
            }
        }
        return;
    }

    let child = map.entry(key).or_insert_with(|| Value::Object(Map::new()));
    if !child.is_object() {
        *child = Value::Object(Map::new());
    }
    if let Value::Object(child) = child {
        insert(child, tail, leaf);
    }
}

/// Objects keyed exactly `0..n` become arrays, in index order.
fn collapse_arrays(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for child in map.values_mut() {
                collapse_arrays(child);
            }

            let indexed = (0..map.len()).all(|i| map.contains_key(&i.to_string()));
            if indexed && !map.is_empty() {
                let items = (0..map.len())
                    .filter_map(|i| map.remove(&i.to_string()))
                    .collect();
                *value = Value::Array(items);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(collapse_arrays),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn nests_bracketed_keys() {
        let value = decode_nested(b"data[name]=A&data[price]=1.5&data[quantity]=2");
        assert_eq!(
            value,
            json!({"data": {"name": "A", "price": "1.5", "quantity": "2"}})
        );
    }

    #[test]
    fn indexed_keys_become_arrays_in_order() {
        let value = decode_nested(b"data[1][name]=B&data[0][name]=A");
        assert_eq!(value, json!({"data": [{"name": "A"}, {"name": "B"}]}));
    }

    #[test]
    fn empty_brackets_append() {
        let value = decode_nested(b"tags[]=a&tags[]=b");
        assert_eq!(value, json!({"tags": ["a", "b"]}));
    }

    #[test]
    fn repeated_plain_keys_collect() {
        let value = decode_nested(b"a=1&a=2&b=x");
        assert_eq!(value, json!({"a": ["1", "2"], "b": "x"}));
    }

    #[test]
    fn decodes_percent_and_plus() {
        let value = decode_nested(b"data[name]=Blue+Widget%21");
        assert_eq!(value, json!({"data": {"name": "Blue Widget!"}}));
    }

    #[test]
    fn unbalanced_keys_stay_flat() {
        assert_eq!(split_key("data[name"), vec!["data[name"]);
        assert_eq!(split_key("[x]"), vec!["[x]"]);
        assert_eq!(split_key("a[b]c"), vec!["a[b]c"]);
        assert_eq!(split_key("a[b][]"), vec!["a", "b", ""]);
    }

    #[test]
    fn empty_body_is_empty_object() {
        assert_eq!(decode_nested(b""), json!({}));
    }
}
