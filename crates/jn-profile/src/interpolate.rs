//! Environment-variable interpolation (§4.C). `${NAME}` is required;
//! `${NAME:-default}` falls back when `NAME` is unset. A literal `$` is
//! written `$$`. Substitution recurses into every string leaf of the
//! document and is applied repeatedly at the document level until a pass
//! makes no change, so a default value that itself references another
//! variable still resolves.

use serde_json::Value;

use crate::error::ProfileError;

const MAX_PASSES: usize = 16;

pub trait EnvLookup {
    fn get(&self, name: &str) -> Option<String>;
}

pub struct SystemEnv;

impl EnvLookup for SystemEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

pub fn interpolate_document(doc: &mut Value, env: &dyn EnvLookup) -> Result<(), ProfileError> {
    for _ in 0..MAX_PASSES {
        let mut changed = false;
        interpolate_walk(doc, env, &mut changed)?;
        if !changed {
            return Ok(());
        }
    }
    Err(ProfileError::Malformed(
        "interpolation did not converge after the maximum number of passes".into(),
    ))
}

fn interpolate_walk(value: &mut Value, env: &dyn EnvLookup, changed: &mut bool) -> Result<(), ProfileError> {
    match value {
        Value::String(s) => {
            let resolved = interpolate_string(s, env)?;
            if &resolved != s {
                *changed = true;
                *s = resolved;
            }
        }
        Value::Array(items) => {
            for item in items {
                interpolate_walk(item, env, changed)?;
            }
        }
        Value::Object(map) => {
            for (_, v) in map.iter_mut() {
                interpolate_walk(v, env, changed)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Resolve every `${...}` token in `s`. Recurses into a default expression
/// so `${A:-${B}}` resolves in one call.
fn interpolate_string(s: &str, env: &dyn EnvLookup) -> Result<String, ProfileError> {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' && bytes.get(i + 1) == Some(&b'$') {
            out.push('$');
            i += 2;
            continue;
        }
        if bytes[i] == b'$' && bytes.get(i + 1) == Some(&b'{') {
            let (token, consumed) = extract_braced(&s[i + 2..])?;
            let (name, default) = split_name_default(token);
            match env.get(name) {
                Some(val) => out.push_str(&val),
                None => match default {
                    Some(default_expr) => {
                        out.push_str(&interpolate_string(default_expr, env)?);
                    }
                    None => return Err(ProfileError::MissingVariable(name.to_string())),
                },
            }
            i += 2 + consumed;
            continue;
        }
        let ch = s[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }
    Ok(out)
}

/// Given the text right after `${`, find the matching `}` accounting for
/// nested `${...}` inside a default expression, and return (inner, bytes
/// consumed including the closing brace).
fn extract_braced(rest: &str) -> Result<(&str, usize), ProfileError> {
    let bytes = rest.as_bytes();
    let mut depth = 1usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&rest[..i], i + 1));
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(ProfileError::Malformed(format!(
        "unterminated '${{' in '{rest}'"
    )))
}

fn split_name_default(token: &str) -> (&str, Option<&str>) {
    match token.find(":-") {
        Some(pos) => (&token[..pos], Some(&token[pos + 2..])),
        None => (token, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    struct MapEnv(HashMap<&'static str, &'static str>);
    impl EnvLookup for MapEnv {
        fn get(&self, name: &str) -> Option<String> {
            self.0.get(name).map(|s| s.to_string())
        }
    }

    #[test]
    fn s3_bearer_token_substitution() {
        let env = MapEnv(HashMap::from([("API_TOKEN", "abc")]));
        let mut doc = json!({"Authorization": "Bearer ${API_TOKEN}"});
        interpolate_document(&mut doc, &env).unwrap();
        assert_eq!(doc["Authorization"], "Bearer abc");
    }

    #[test]
    fn missing_required_variable_errors() {
        let env = MapEnv(HashMap::new());
        let mut doc = json!({"k": "${MISSING}"});
        assert!(interpolate_document(&mut doc, &env).is_err());
    }

    #[test]
    fn default_is_used_when_missing() {
        let env = MapEnv(HashMap::new());
        let mut doc = json!({"k": "${MISSING:-fallback}"});
        interpolate_document(&mut doc, &env).unwrap();
        assert_eq!(doc["k"], "fallback");
    }

    #[test]
    fn default_can_reference_another_variable() {
        let env = MapEnv(HashMap::from([("OTHER", "resolved")]));
        let mut doc = json!({"k": "${MISSING:-${OTHER}}"});
        interpolate_document(&mut doc, &env).unwrap();
        assert_eq!(doc["k"], "resolved");
    }

    #[test]
    fn literal_dollar_escape() {
        let env = MapEnv(HashMap::new());
        let mut doc = json!({"k": "costs $$5"});
        interpolate_document(&mut doc, &env).unwrap();
        assert_eq!(doc["k"], "costs $5");
    }

    #[test]
    fn no_unresolved_token_survives() {
        let env = MapEnv(HashMap::from([("A", "1"), ("B", "2")]));
        let mut doc = json!({"nested": {"arr": ["${A}", "${B}", "plain"]}});
        interpolate_document(&mut doc, &env).unwrap();
        let rendered = doc.to_string();
        assert!(!rendered.contains("${"));
    }
}
