//! Hierarchical deep-merge (§4.C). Objects merge recursively with the right
//! side winning; arrays and scalars are replaced wholesale, never
//! concatenated.

use serde_json::Value;

pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value.clone();
        }
    }
}

pub fn deep_merged(base: &Value, overlay: &Value) -> Value {
    let mut result = base.clone();
    deep_merge(&mut result, overlay);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn objects_merge_recursively_right_wins() {
        let base = json!({"a": {"x": 1, "y": 2}, "b": 1});
        let overlay = json!({"a": {"y": 99}, "c": 3});
        let merged = deep_merged(&base, &overlay);
        assert_eq!(merged, json!({"a": {"x": 1, "y": 99}, "b": 1, "c": 3}));
    }

    #[test]
    fn arrays_are_replaced_not_concatenated() {
        let base = json!({"xs": [1, 2, 3]});
        let overlay = json!({"xs": [9]});
        assert_eq!(deep_merged(&base, &overlay), json!({"xs": [9]}));
    }

    #[test]
    fn scalar_replaces_object_and_vice_versa() {
        assert_eq!(deep_merged(&json!({"a": 1}), &json!({"a": {"b": 2}})), json!({"a": {"b": 2}}));
        assert_eq!(deep_merged(&json!({"a": {"b": 2}}), &json!({"a": 1})), json!({"a": 1}));
    }
}
