//! Unsupported-feature gate (§4.H): rejects jq constructs this engine does
//! not implement before the parser ever sees them, so the parser itself
//! can stay small and never has to special-case "recognized but refused"
//! syntax.

use crate::error::ExprError;

struct Banned {
    feature: &'static str,
    suggestion: &'static str,
}

/// Replace the contents of every quoted string literal with spaces so
/// keyword scanning never matches text a user only meant as data, while
/// keeping every other byte (and therefore every other offset) in place.
fn mask_strings(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut in_string = false;
    let mut escaped = false;
    for ch in source.chars() {
        if in_string {
            if escaped {
                escaped = false;
                out.push(' ');
            } else if ch == '\\' {
                escaped = true;
                out.push(' ');
            } else if ch == '"' {
                in_string = false;
                out.push('"');
            } else {
                out.push(' ');
            }
        } else if ch == '"' {
            in_string = true;
            out.push('"');
        } else {
            out.push(ch);
        }
    }
    out
}

fn is_word_boundary(bytes: &[u8], idx: isize) -> bool {
    if idx < 0 || idx as usize >= bytes.len() {
        return true;
    }
    let b = bytes[idx as usize];
    !(b.is_ascii_alphanumeric() || b == b'_')
}

/// Does `masked` contain `word` as a whole identifier (not a substring of
/// a longer identifier such as a field name)?
fn contains_word(masked: &str, word: &str) -> bool {
    let bytes = masked.as_bytes();
    let wbytes = word.as_bytes();
    let mut start = 0;
    while let Some(pos) = masked[start..].find(word) {
        let abs = start + pos;
        let before_ok = is_word_boundary(bytes, abs as isize - 1);
        let after_ok = is_word_boundary(bytes, (abs + wbytes.len()) as isize);
        if before_ok && after_ok {
            return true;
        }
        start = abs + 1;
        if start >= masked.len() {
            break;
        }
    }
    false
}

pub fn check(source: &str) -> Result<(), ExprError> {
    let masked = mask_strings(source);

    let variable_binding = Banned {
        feature: "variable binding",
        suggestion: "restructure using pipes (`a | b`) instead of binding `as $x`",
    };
    if contains_word(&masked, "as") && masked.contains('$') {
        return Err(reject(source, &variable_binding));
    }

    for (needle, feature, suggestion) in [
        ("reduce", "reduce", "compose `map`/pipe stages instead of `reduce`"),
        ("recurse", "recursive descent (recurse)", "write out the explicit field path instead"),
        ("walk", "recursive descent (walk)", "write out the explicit field path instead"),
        ("try", "try/catch", "use the `//` alternative operator instead"),
        ("catch", "try/catch", "use the `//` alternative operator instead"),
        ("def", "function definition (def)", "inline the logic with pipes instead of defining a function"),
        ("import", "module import", "this engine has no module system; inline the expression"),
        ("include", "module import", "this engine has no module system; inline the expression"),
        ("debug", "debug", "remove; not supported in streaming mode"),
        ("input", "input/inputs", "not supported; this engine evaluates one record at a time"),
        ("limit", "limit", "use the `head` tool to bound output instead"),
        ("match", "regex functions beyond `test`", "only `test` is supported; restructure the check around it"),
        ("capture", "regex functions beyond `test`", "only `test` is supported; restructure the check around it"),
        ("scan", "regex functions beyond `test`", "only `test` is supported; restructure the check around it"),
        ("sub", "regex functions beyond `test`", "only `test` is supported; restructure the check around it"),
        ("gsub", "regex functions beyond `test`", "only `test` is supported; restructure the check around it"),
        ("splits", "regex functions beyond `test`", "only `test` is supported; restructure the check around it"),
        ("getpath", "path functions", "write out the explicit field path instead"),
        ("setpath", "path functions", "write out the explicit field path instead"),
        ("leaf_paths", "path functions", "write out the explicit field path instead"),
        ("paths", "path functions", "write out the explicit field path instead"),
        ("path", "path functions", "write out the explicit field path instead"),
    ] {
        if contains_word(&masked, needle) {
            return Err(ExprError::UnsupportedFeature {
                expression: source.to_string(),
                feature: feature.to_string(),
                suggestion: suggestion.to_string(),
            });
        }
    }

    if masked.contains("..") {
        return Err(ExprError::UnsupportedFeature {
            expression: source.to_string(),
            feature: "recursive descent (..)".to_string(),
            suggestion: "write out the explicit field path instead".to_string(),
        });
    }

    if let Some(at_pos) = find_format_string(&masked) {
        return Err(ExprError::UnsupportedFeature {
            expression: source.to_string(),
            feature: format!("format string at offset {at_pos}"),
            suggestion: "use explicit string builtins (e.g. `ascii_downcase`, `join`) instead".to_string(),
        });
    }

    Ok(())
}

fn find_format_string(masked: &str) -> Option<usize> {
    let bytes = masked.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'@' && bytes.get(i + 1).is_some_and(|c| c.is_ascii_alphabetic()) {
            return Some(i);
        }
    }
    None
}

fn reject(source: &str, banned: &Banned) -> ExprError {
    ExprError::UnsupportedFeature {
        expression: source.to_string(),
        feature: banned.feature.to_string(),
        suggestion: banned.suggestion.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variable_binding_is_rejected() {
        let err = check(". as $x | $x.y").unwrap_err();
        assert!(matches!(err, ExprError::UnsupportedFeature { ref feature, .. } if feature == "variable binding"));
    }

    #[test]
    fn field_named_reduce_like_is_not_falsely_rejected() {
        assert!(check(".reducer").is_ok());
    }

    #[test]
    fn recursive_descent_is_rejected() {
        assert!(check("..|.a").is_err());
    }

    #[test]
    fn format_string_is_rejected() {
        let err = check("@base64").unwrap_err();
        assert!(matches!(err, ExprError::UnsupportedFeature { ref feature, .. } if feature.contains("format string")));
    }

    #[test]
    fn ordinary_expression_passes() {
        assert!(check(".amount | tonumber | select(. > 1000)").is_ok());
    }

    #[test]
    fn dollar_inside_a_string_literal_does_not_trigger_the_gate() {
        assert!(check(r#".msg | contains("as $5 fee")"#).is_ok());
    }

    #[test]
    fn reduce_as_a_field_name_suffix_is_not_rejected() {
        assert!(check(".map_reduce").is_ok());
    }

    #[test]
    fn regex_functions_beyond_test_are_rejected() {
        for expr in [".x | match(\"a\")", ".x | capture(\"a\")", ".x | scan(\"a\")", ".x | sub(\"a\"; \"b\")", ".x | gsub(\"a\"; \"b\")", ".x | splits(\",\")"] {
            let err = check(expr).unwrap_err();
            assert!(
                matches!(err, ExprError::UnsupportedFeature { ref feature, .. } if feature == "regex functions beyond `test`"),
                "expected {expr} to be rejected as a regex function"
            );
        }
    }

    #[test]
    fn test_itself_is_still_allowed() {
        assert!(check(".x | test(\"a\")").is_ok());
    }

    #[test]
    fn path_functions_are_rejected() {
        for expr in [".x | path(.a)", ".x | paths", ".x | getpath([\"a\"])", ".x | setpath([\"a\"]; 1)", ".x | leaf_paths"] {
            let err = check(expr).unwrap_err();
            assert!(
                matches!(err, ExprError::UnsupportedFeature { ref feature, .. } if feature == "path functions"),
                "expected {expr} to be rejected as a path function"
            );
        }
    }
}
