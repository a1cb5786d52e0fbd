//! Hash join (§4.I, example S4). The right source is consumed fully into
//! buckets keyed by the join key (and/or filtered by a condition
//! expression); the left source then streams through unchanged order,
//! each left record combined with its matching bucket.

use std::collections::HashMap;

use jn_core::Record;
use jn_expr::{evaluate, parse, Ast, EvalContext};
use serde_json::{Map, Value};

use crate::error::JoinError;
use crate::key::{extract_key, JoinKeySpec};

#[derive(Debug, Clone)]
pub enum AggKind {
    Count,
    Sum(String),
    Avg(String),
    Min(String),
    Max(String),
}

#[derive(Debug, Clone)]
pub struct AggSpec {
    pub name: String,
    pub kind: AggKind,
}

/// Parse `"name: fn"` or `"name: fn(field)"` (e.g. `"cnt: count"`,
/// `"total: sum(amount)"`).
pub fn parse_agg_spec(spec: &str) -> Result<AggSpec, JoinError> {
    let (name, rest) = spec.split_once(':').ok_or_else(|| JoinError::BadAggSpec(spec.to_string()))?;
    let name = name.trim().to_string();
    let rest = rest.trim();
    if name.is_empty() || rest.is_empty() {
        return Err(JoinError::BadAggSpec(spec.to_string()));
    }
    let kind = if let Some(open) = rest.find('(') {
        let fn_name = rest[..open].trim();
        let field = rest[open + 1..].trim_end_matches(')').trim().trim_matches('"').to_string();
        if field.is_empty() {
            return Err(JoinError::BadAggSpec(spec.to_string()));
        }
        match fn_name {
            "sum" => AggKind::Sum(field),
            "avg" => AggKind::Avg(field),
            "min" => AggKind::Min(field),
            "max" => AggKind::Max(field),
            "count" => AggKind::Count,
            _ => return Err(JoinError::BadAggSpec(spec.to_string())),
        }
    } else if rest == "count" {
        AggKind::Count
    } else {
        return Err(JoinError::BadAggSpec(spec.to_string()));
    };
    Ok(AggSpec { name, kind })
}

fn compute_agg(bucket: &[Record], kind: &AggKind) -> Value {
    match kind {
        AggKind::Count => Value::from(bucket.len() as i64),
        AggKind::Sum(field) => {
            let total: f64 = bucket.iter().filter_map(|r| r.get(field)).filter_map(|v| v.as_f64()).sum();
            number_value(total)
        }
        AggKind::Avg(field) => {
            let nums: Vec<f64> = bucket.iter().filter_map(|r| r.get(field)).filter_map(|v| v.as_f64()).collect();
            if nums.is_empty() {
                Value::Null
            } else {
                number_value(nums.iter().sum::<f64>() / nums.len() as f64)
            }
        }
        AggKind::Min(field) => bucket
            .iter()
            .filter_map(|r| r.get(field))
            .cloned()
            .min_by(jn_expr::ordering::compare_values)
            .unwrap_or(Value::Null),
        AggKind::Max(field) => bucket
            .iter()
            .filter_map(|r| r.get(field))
            .cloned()
            .max_by(jn_expr::ordering::compare_values)
            .unwrap_or(Value::Null),
    }
}

fn number_value(f: f64) -> Value {
    if !f.is_finite() {
        return Value::Null;
    }
    if f.fract() == 0.0 && f.abs() < 9e15 {
        Value::from(f as i64)
    } else {
        serde_json::Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone)]
pub enum OutputMode {
    /// Merge the first matching right record's fields into the left
    /// record (right overrides left on overlapping field names, matching
    /// `jn_expr`'s `+` object semantics).
    Flatten,
    /// Embed all matches as a named array field.
    Embed { target: String },
    /// Embed a projected subset of fields from each match as a named
    /// array field.
    Project { target: String, fields: Vec<String> },
}

/// The right source's buffered size is checked against `limit_bytes`
/// (estimated from each record's serialized length): a warning fires at
/// half the limit, a fatal error at the limit itself (§9 Open Question
/// 2 — the exact ceiling is implementation-defined, but the warn/fail
/// split is not).
#[derive(Debug, Clone, Copy)]
pub struct RightLimits {
    pub limit_bytes: usize,
}

impl Default for RightLimits {
    fn default() -> Self {
        RightLimits { limit_bytes: 256 * 1024 * 1024 }
    }
}

pub struct JoinConfig {
    pub key: Option<JoinKeySpec>,
    pub output: OutputMode,
    pub aggs: Vec<AggSpec>,
    pub condition: Option<String>,
    pub limits: RightLimits,
}

struct CompiledCondition {
    ast: Ast,
    ctx: EvalContext,
}

pub struct JoinEngine {
    config: JoinConfig,
    /// Buckets keyed by the extracted join key; when there is no key
    /// spec (a pure condition join) everything lands in one bucket under
    /// a fixed sentinel key.
    buckets: HashMap<String, Vec<Record>>,
    condition: Option<CompiledCondition>,
}

const NO_KEY_BUCKET: &str = "\0";

impl JoinEngine {
    pub fn build(config: JoinConfig, right_records: impl IntoIterator<Item = Record>) -> Result<Self, JoinError> {
        let condition = match &config.condition {
            Some(expr) => Some(CompiledCondition { ast: parse(expr)?, ctx: EvalContext::default() }),
            None => None,
        };

        let mut buckets: HashMap<String, Vec<Record>> = HashMap::new();
        let mut buffered = 0usize;
        let warned_at = config.limits.limit_bytes / 2;
        let mut warned = false;

        for record in right_records {
            buffered += serde_json::to_vec(&record).map(|b| b.len()).unwrap_or(0);
            if buffered > config.limits.limit_bytes {
                return Err(JoinError::RightSourceOverflow { limit: config.limits.limit_bytes, buffered });
            }
            if !warned && buffered >= warned_at {
                tracing::warn!(buffered, limit = config.limits.limit_bytes, "join right source past half its memory limit");
                warned = true;
            }

            let key = match &config.key {
                Some(spec) => extract_key(&record, spec.right_fields()).unwrap_or_else(|| NO_KEY_BUCKET.to_string()),
                None => NO_KEY_BUCKET.to_string(),
            };
            buckets.entry(key).or_default().push(record);
        }

        Ok(JoinEngine { config, buckets, condition })
    }

    fn candidates(&self, left: &Record) -> Vec<&Record> {
        let pool: Vec<&Record> = match &self.config.key {
            Some(spec) => {
                let key = match extract_key(left, spec.left_fields()) {
                    Some(k) => k,
                    None => return Vec::new(),
                };
                self.buckets.get(&key).map(|v| v.iter().collect()).unwrap_or_default()
            }
            None => self.buckets.get(NO_KEY_BUCKET).map(|v| v.iter().collect()).unwrap_or_default(),
        };

        match &self.condition {
            None => pool,
            Some(cond) => pool.into_iter().filter(|right| self.matches_condition(cond, left, right)).collect(),
        }
    }

    fn matches_condition(&self, cond: &CompiledCondition, left: &Record, right: &Record) -> bool {
        let mut combined = Map::new();
        combined.insert("left".to_string(), left.clone());
        combined.insert("right".to_string(), right.clone());
        evaluate(&cond.ast, &Value::Object(combined), &cond.ctx)
            .iter()
            .any(|v| !matches!(v, Value::Null | Value::Bool(false)))
    }

    /// Join one left record against the buffered right side, producing
    /// exactly one output record (left-side order and cardinality are
    /// preserved, §5).
    pub fn join_one(&self, left: &Record) -> Record {
        let matches = self.candidates(left);
        let mut out = match left.clone() {
            Value::Object(map) => map,
            other => {
                let mut m = Map::new();
                m.insert("value".to_string(), other);
                m
            }
        };

        match &self.config.output {
            OutputMode::Flatten => {
                if let Some(first) = matches.first() {
                    if let Value::Object(right_map) = first {
                        for (k, v) in right_map {
                            out.insert(k.clone(), v.clone());
                        }
                    }
                }
            }
            OutputMode::Embed { target } => {
                out.insert(target.clone(), Value::Array(matches.iter().map(|r| (*r).clone()).collect()));
            }
            OutputMode::Project { target, fields } => {
                let projected: Vec<Value> = matches
                    .iter()
                    .map(|r| {
                        let mut p = Map::new();
                        for f in fields {
                            if let Some(v) = r.get(f) {
                                p.insert(f.clone(), v.clone());
                            }
                        }
                        Value::Object(p)
                    })
                    .collect();
                out.insert(target.clone(), Value::Array(projected));
            }
        }

        let bucket_owned: Vec<Record> = matches.iter().map(|r| (*r).clone()).collect();
        for agg in &self.config.aggs {
            out.insert(agg.name.clone(), compute_agg(&bucket_owned, &agg.kind));
        }

        Value::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> JoinEngine {
        let right = vec![json!({"id": 1, "name": "A"}), json!({"id": 1, "name": "B"}), json!({"id": 2, "name": "C"})];
        let config = JoinConfig {
            key: Some(JoinKeySpec::Natural(vec!["id".to_string()])),
            output: OutputMode::Embed { target: "matches".to_string() },
            aggs: vec![parse_agg_spec("cnt: count").unwrap()],
            condition: None,
            limits: RightLimits::default(),
        };
        JoinEngine::build(config, right).unwrap()
    }

    #[test]
    fn s4_hash_join_example() {
        let engine = fixture();
        let out1 = engine.join_one(&json!({"id": 1}));
        assert_eq!(out1, json!({"id": 1, "matches": [{"id": 1, "name": "A"}, {"id": 1, "name": "B"}], "cnt": 2}));
        let out2 = engine.join_one(&json!({"id": 2}));
        assert_eq!(out2, json!({"id": 2, "matches": [{"id": 2, "name": "C"}], "cnt": 1}));
    }

    #[test]
    fn unmatched_left_gets_empty_matches() {
        let engine = fixture();
        let out = engine.join_one(&json!({"id": 99}));
        assert_eq!(out, json!({"id": 99, "matches": [], "cnt": 0}));
    }

    #[test]
    fn flatten_mode_merges_first_match() {
        let right = vec![json!({"id": 1, "name": "A"})];
        let config = JoinConfig {
            key: Some(JoinKeySpec::Natural(vec!["id".to_string()])),
            output: OutputMode::Flatten,
            aggs: vec![],
            condition: None,
            limits: RightLimits::default(),
        };
        let engine = JoinEngine::build(config, right).unwrap();
        let out = engine.join_one(&json!({"id": 1, "qty": 5}));
        assert_eq!(out, json!({"id": 1, "qty": 5, "name": "A"}));
    }

    #[test]
    fn right_source_over_limit_is_a_fatal_error() {
        let right = vec![json!({"id": 1, "payload": "x".repeat(1000)})];
        let config = JoinConfig {
            key: Some(JoinKeySpec::Natural(vec!["id".to_string()])),
            output: OutputMode::Embed { target: "matches".to_string() },
            aggs: vec![],
            condition: None,
            limits: RightLimits { limit_bytes: 10 },
        };
        assert!(matches!(JoinEngine::build(config, right), Err(JoinError::RightSourceOverflow { .. })));
    }

    #[test]
    fn condition_join_restricts_to_both_sides_predicate() {
        let right = vec![json!({"id": 1, "flag": true}), json!({"id": 1, "flag": false})];
        let config = JoinConfig {
            key: Some(JoinKeySpec::Natural(vec!["id".to_string()])),
            output: OutputMode::Embed { target: "matches".to_string() },
            aggs: vec![],
            condition: Some(".right.flag".to_string()),
            limits: RightLimits::default(),
        };
        let engine = JoinEngine::build(config, right).unwrap();
        let out = engine.join_one(&json!({"id": 1}));
        assert_eq!(out, json!({"id": 1, "matches": [{"id": 1, "flag": true}]}));
    }

    #[test]
    fn bad_agg_spec_is_rejected() {
        assert!(parse_agg_spec("no colon here").is_err());
        assert!(parse_agg_spec("total: nonsense(field)").is_err());
    }
}
