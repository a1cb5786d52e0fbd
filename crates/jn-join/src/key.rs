//! Join key modes (§4.I): natural (the same field name(s) read from both
//! sides), named (a separate field-name list per side), composite (more
//! than one field name in either list). All three reduce to the same
//! extraction: look up each named field on a record and fail the match
//! (return `None`) if any of them is absent.

use jn_core::Record;

#[derive(Debug, Clone)]
pub enum JoinKeySpec {
    /// `--on a,b`: the same field name(s), present on both sides.
    Natural(Vec<String>),
    /// `--left-key a,b --right-key x,y`: distinct field names per side,
    /// matched positionally.
    Named { left: Vec<String>, right: Vec<String> },
}

impl JoinKeySpec {
    pub fn left_fields(&self) -> &[String] {
        match self {
            JoinKeySpec::Natural(fields) => fields,
            JoinKeySpec::Named { left, .. } => left,
        }
    }

    pub fn right_fields(&self) -> &[String] {
        match self {
            JoinKeySpec::Natural(fields) => fields,
            JoinKeySpec::Named { right, .. } => right,
        }
    }
}

/// A canonical, hashable key extracted from a record: `None` if any
/// named field is missing, which excludes the record from matching
/// rather than raising (the evaluator's "never raise on mismatch" rule
/// applies equally to the join engine, §4.I/§7).
pub fn extract_key(record: &Record, fields: &[String]) -> Option<String> {
    let values: Option<Vec<&serde_json::Value>> = fields.iter().map(|f| record.get(f)).collect();
    let values = values?;
    // serde_json serialization already distinguishes value types (a
    // string "1" and a number 1 produce different bytes), so this is a
    // type-tagged key for free, matching the total order's type
    // separation used elsewhere in the engine (jn_expr::ordering).
    Some(serde_json::to_string(&values).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_field_has_no_key() {
        let record = json!({"name": "A"});
        assert_eq!(extract_key(&record, &["id".to_string()]), None);
    }

    #[test]
    fn string_and_number_keys_do_not_collide() {
        let a = extract_key(&json!({"id": 1}), &["id".to_string()]).unwrap();
        let b = extract_key(&json!({"id": "1"}), &["id".to_string()]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn composite_key_combines_all_fields() {
        let record = json!({"a": 1, "b": "x"});
        let key = extract_key(&record, &["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(key, serde_json::to_string(&[&json!(1), &json!("x")]).unwrap());
    }
}
