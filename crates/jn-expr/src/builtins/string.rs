//! String builtins (§4.H). `test(pattern)` is deliberately not a full
//! regex engine: anchors `^`/`$` and a literal substring match only,
//! richer regex is refused by the unsupported-feature gate before this
//! is ever reached.

use serde_json::Value;

pub fn dispatch(name: &str, input: &Value, args: &[Value]) -> Option<Vec<Value>> {
    let s = match input {
        Value::String(s) => s.as_str(),
        _ => return no_input_is_empty(name),
    };
    let arg_str = |i: usize| args.get(i).and_then(|v| v.as_str());

    let out = match name {
        "split" => {
            let sep = arg_str(0)?;
            let parts: Vec<Value> = if sep.is_empty() {
                s.chars().map(|c| Value::String(c.to_string())).collect()
            } else {
                s.split(sep).map(|p| Value::String(p.to_string())).collect()
            };
            vec![Value::Array(parts)]
        }
        "join" => return None, // array-input builtin; see below
        "startswith" => vec![Value::Bool(s.starts_with(arg_str(0)?))],
        "endswith" => vec![Value::Bool(s.ends_with(arg_str(0)?))],
        "contains" => vec![Value::Bool(s.contains(arg_str(0)?))],
        "ltrimstr" => vec![Value::String(s.strip_prefix(arg_str(0)?).unwrap_or(s).to_string())],
        "rtrimstr" => vec![Value::String(s.strip_suffix(arg_str(0)?).unwrap_or(s).to_string())],
        "ascii_downcase" => vec![Value::String(s.to_ascii_lowercase())],
        "ascii_upcase" => vec![Value::String(s.to_ascii_uppercase())],
        "trim" => vec![Value::String(s.trim().to_string())],
        "ltrim" => vec![Value::String(s.trim_start().to_string())],
        "rtrim" => vec![Value::String(s.trim_end().to_string())],
        "slugify" => vec![Value::String(slugify(s))],
        "words" => vec![Value::Array(s.split_whitespace().map(|w| Value::String(w.to_string())).collect())],
        "lines" => vec![Value::Array(s.lines().map(|l| Value::String(l.to_string())).collect())],
        "chars" => vec![Value::Array(s.chars().map(|c| Value::String(c.to_string())).collect())],
        "test" => vec![Value::Bool(test_pattern(s, arg_str(0)?))],
        _ => return None,
    };
    Some(out)
}

/// `join(sep)` operates on an array, not a string; handled here too since
/// it belongs to the same builtin catalogue category.
pub fn dispatch_array_input(name: &str, input: &Value, args: &[Value]) -> Option<Vec<Value>> {
    if name != "join" {
        return None;
    }
    let Value::Array(arr) = input else { return Some(Vec::new()) };
    let sep = args.first().and_then(|v| v.as_str()).unwrap_or("");
    let joined = arr
        .iter()
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(sep);
    Some(vec![Value::String(joined)])
}

fn no_input_is_empty(name: &str) -> Option<Vec<Value>> {
    match name {
        "split" | "startswith" | "endswith" | "contains" | "ltrimstr" | "rtrimstr" | "ascii_downcase"
        | "ascii_upcase" | "trim" | "ltrim" | "rtrim" | "slugify" | "words" | "lines" | "chars" | "test" => {
            Some(Vec::new())
        }
        _ => None,
    }
}

fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_dash = true;
    for ch in s.chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            last_was_dash = false;
        } else if !last_was_dash {
            out.push('-');
            last_was_dash = true;
        }
    }
    if out.ends_with('-') {
        out.pop();
    }
    out
}

fn test_pattern(s: &str, pattern: &str) -> bool {
    let starts = pattern.starts_with('^');
    let ends = pattern.ends_with('$');
    let body = &pattern[starts as usize..pattern.len() - (ends as usize)];
    match (starts, ends) {
        (true, true) => s == body,
        (true, false) => s.starts_with(body),
        (false, true) => s.ends_with(body),
        (false, false) => s.contains(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn split_and_join_round_trip() {
        let parts = dispatch("split", &json!("a,b,c"), &[json!(",")]).unwrap();
        let joined = dispatch_array_input("join", &parts[0], &[json!(",")]).unwrap();
        assert_eq!(joined, vec![json!("a,b,c")]);
    }

    #[test]
    fn test_pattern_supports_anchors() {
        assert!(test_pattern("hello world", "^hello"));
        assert!(test_pattern("hello world", "world$"));
        assert!(test_pattern("hello world", "^hello world$"));
        assert!(!test_pattern("hello world", "^world"));
    }

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Hello, World!  Foo"), "hello-world-foo");
    }
}
