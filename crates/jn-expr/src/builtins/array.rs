//! Array builtins that need no access to the AST (§4.H): `first`, `last`,
//! `reverse`, `sort`, `unique`, `flatten`, `add`, `min`, `max`. The `_by`
//! family and `map` need to evaluate a sub-expression per element and so
//! live in `eval` instead, where the AST is in scope.

use serde_json::Value;

use crate::ordering::compare_values;

pub fn dispatch(name: &str, input: &Value, _args: &[Value]) -> Option<Vec<Value>> {
    let Value::Array(arr) = input else {
        return match name {
            "first" | "last" | "reverse" | "sort" | "unique" | "flatten" | "add" | "min" | "max" => Some(Vec::new()),
            _ => None,
        };
    };

    let out = match name {
        "first" => arr.first().cloned().into_iter().collect(),
        "last" => arr.last().cloned().into_iter().collect(),
        "reverse" => {
            let mut r = arr.clone();
            r.reverse();
            vec![Value::Array(r)]
        }
        "sort" => {
            let mut s = arr.clone();
            s.sort_by(compare_values);
            vec![Value::Array(s)]
        }
        "unique" => {
            let mut s = arr.clone();
            s.sort_by(compare_values);
            s.dedup_by(|a, b| compare_values(a, b) == std::cmp::Ordering::Equal);
            vec![Value::Array(s)]
        }
        "flatten" => vec![Value::Array(flatten(arr))],
        "add" => vec![add_all(arr)],
        "min" => arr.iter().min_by(|a, b| compare_values(a, b)).cloned().into_iter().collect(),
        "max" => arr.iter().max_by(|a, b| compare_values(a, b)).cloned().into_iter().collect(),
        _ => return None,
    };
    Some(out)
}

fn flatten(arr: &[Value]) -> Vec<Value> {
    let mut out = Vec::with_capacity(arr.len());
    for v in arr {
        match v {
            Value::Array(inner) => out.extend(flatten(inner)),
            other => out.push(other.clone()),
        }
    }
    out
}

fn add_all(arr: &[Value]) -> Value {
    let mut iter = arr.iter();
    let Some(first) = iter.next() else {
        return Value::Null;
    };
    let mut acc = first.clone();
    for v in iter {
        acc = crate::eval::add_values(&acc, v);
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sort_then_reverse_is_descending() {
        let sorted = dispatch("sort", &json!([3, 1, 2]), &[]).unwrap();
        let Value::Array(sorted_arr) = &sorted[0] else { unreachable!() };
        let reversed = dispatch("reverse", &sorted[0], &[]).unwrap();
        assert_eq!(sorted_arr, &vec![json!(1), json!(2), json!(3)]);
        assert_eq!(reversed, vec![json!([3, 2, 1])]);
    }

    #[test]
    fn unique_keeps_types_distinct() {
        let out = dispatch("unique", &json!(["1", 1, "1", 1]), &[]).unwrap();
        assert_eq!(out, vec![json!([1, "1"])]);
    }

    #[test]
    fn flatten_recurses_fully() {
        let out = dispatch("flatten", &json!([1, [2, [3, 4]], 5]), &[]).unwrap();
        assert_eq!(out, vec![json!([1, 2, 3, 4, 5])]);
    }

    #[test]
    fn add_sums_numbers() {
        let out = dispatch("add", &json!([1, 2, 3]), &[]).unwrap();
        assert_eq!(out, vec![json!(6)]);
    }

    #[test]
    fn min_max_on_empty_array_is_empty() {
        assert_eq!(dispatch("min", &json!([]), &[]), Some(vec![]));
    }
}
