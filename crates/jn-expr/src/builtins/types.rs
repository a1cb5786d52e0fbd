//! Type coercion and inspection builtins (§4.H).

use serde_json::Value;

pub fn dispatch(name: &str, input: &Value, _args: &[Value]) -> Option<Vec<Value>> {
    let out = match name {
        "tonumber" => vec![tonumber(input)?],
        "tostring" => vec![Value::String(tostring(input))],
        "type" => vec![Value::String(type_name(input).to_string())],
        "length" => vec![length(input)?],
        "keys" => vec![keys(input)?],
        "values" => vec![values(input)?],
        "isnumber" => vec![Value::Bool(matches!(input, Value::Number(_)))],
        "isstring" => vec![Value::Bool(matches!(input, Value::String(_)))],
        "isboolean" => vec![Value::Bool(matches!(input, Value::Bool(_)))],
        "isnull" => vec![Value::Bool(matches!(input, Value::Null))],
        "isarray" => vec![Value::Bool(matches!(input, Value::Array(_)))],
        "isobject" => vec![Value::Bool(matches!(input, Value::Object(_)))],
        _ => return None,
    };
    Some(out)
}

fn tonumber(v: &Value) -> Option<Value> {
    match v {
        Value::Number(_) => Some(v.clone()),
        Value::String(s) => {
            if let Ok(i) = s.trim().parse::<i64>() {
                Some(Value::from(i))
            } else {
                s.trim().parse::<f64>().ok().and_then(|f| serde_json::Number::from_f64(f).map(Value::Number))
            }
        }
        _ => None,
    }
}

fn tostring(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn length(v: &Value) -> Option<Value> {
    let n = match v {
        Value::String(s) => s.chars().count(),
        Value::Array(a) => a.len(),
        Value::Object(o) => o.len(),
        Value::Null => 0,
        _ => return None,
    };
    Some(Value::from(n as i64))
}

fn keys(v: &Value) -> Option<Value> {
    match v {
        Value::Object(o) => Some(Value::Array(o.keys().map(|k| Value::String(k.clone())).collect())),
        _ => None,
    }
}

fn values(v: &Value) -> Option<Value> {
    match v {
        Value::Object(o) => Some(Value::Array(o.values().cloned().collect())),
        Value::Array(a) => Some(Value::Array(a.clone())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tonumber_parses_strings() {
        assert_eq!(dispatch("tonumber", &json!("1200"), &[]).unwrap(), vec![json!(1200)]);
    }

    #[test]
    fn tonumber_rejects_garbage_by_returning_empty() {
        assert_eq!(dispatch("tonumber", &json!("not a number"), &[]), None);
    }

    #[test]
    fn type_reports_kind() {
        assert_eq!(dispatch("type", &json!([1, 2]), &[]).unwrap(), vec![json!("array")]);
    }

    #[test]
    fn length_of_string_counts_chars() {
        assert_eq!(dispatch("length", &json!("hello"), &[]).unwrap(), vec![json!(5)]);
    }
}
