//! Object builtins (§4.H): `to_entries`, `from_entries`, `has(k)`. `del`
//! is a dedicated AST node (it needs a path, not a value) and lives in
//! `eval`.

use serde_json::{Map, Value};

pub fn dispatch(name: &str, input: &Value, args: &[Value]) -> Option<Vec<Value>> {
    match name {
        "to_entries" => Some(vec![to_entries(input)?]),
        "from_entries" => Some(vec![from_entries(input)?]),
        "has" => Some(vec![Value::Bool(has(input, args.first()?))]),
        _ => None,
    }
}

fn to_entries(v: &Value) -> Option<Value> {
    let Value::Object(map) = v else { return None };
    let entries = map
        .iter()
        .map(|(k, v)| {
            let mut entry = Map::new();
            entry.insert("key".to_string(), Value::String(k.clone()));
            entry.insert("value".to_string(), v.clone());
            Value::Object(entry)
        })
        .collect();
    Some(Value::Array(entries))
}

fn from_entries(v: &Value) -> Option<Value> {
    let Value::Array(arr) = v else { return None };
    let mut map = Map::new();
    for entry in arr {
        let Value::Object(obj) = entry else { continue };
        let key = obj
            .get("key")
            .or_else(|| obj.get("k"))
            .or_else(|| obj.get("name"))
            .map(|k| match k {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })?;
        let value = obj.get("value").or_else(|| obj.get("v")).cloned().unwrap_or(Value::Null);
        map.insert(key, value);
    }
    Some(Value::Object(map))
}

fn has(v: &Value, key: &Value) -> bool {
    match (v, key) {
        (Value::Object(map), Value::String(k)) => map.contains_key(k),
        (Value::Array(arr), Value::Number(n)) => n
            .as_i64()
            .map(|i| i >= 0 && (i as usize) < arr.len())
            .unwrap_or(false),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn to_entries_then_from_entries_is_identity_modulo_order() {
        let input = json!({"a": 1, "b": 2});
        let entries = dispatch("to_entries", &input, &[]).unwrap();
        let back = dispatch("from_entries", &entries[0], &[]).unwrap();
        assert_eq!(back, vec![input]);
    }

    #[test]
    fn has_checks_object_key() {
        assert_eq!(dispatch("has", &json!({"a": 1}), &[json!("a")]), Some(vec![json!(true)]));
        assert_eq!(dispatch("has", &json!({"a": 1}), &[json!("b")]), Some(vec![json!(false)]));
    }
}
