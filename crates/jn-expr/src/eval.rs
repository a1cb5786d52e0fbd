//! Pure evaluator (§4.H): `(AST, record) → EvalResult`. Every function
//! here returns a plain `Vec<Value>` rather than a `Result`, because the
//! evaluator's contract is to never raise on a value-type mismatch (only
//! out-of-memory aborts the process, and that unwinds on its own); a
//! mismatch or an absent path simply produces an empty sequence.

use serde_json::{Map, Value};

use crate::ast::{ArithOp, Ast, CmpOp, CondNode, ExprNode, NodeId, ObjectKey};
use crate::builtins;
use crate::ordering::compare_values;

#[derive(Debug, Clone, Copy, Default)]
pub struct EvalContext {
    /// When set, a non-optional field access (`.field` without the `?`
    /// suffix) landing on a non-object logs at debug level instead of
    /// silently producing empty; the result is still empty either way,
    /// since the evaluator never raises mid-stream (§7).
    pub strict: bool,
}

/// Evaluate `ast` against `input`, the top-level entry point tools call
/// once per record.
pub fn evaluate(ast: &Ast, input: &Value, ctx: &EvalContext) -> Vec<Value> {
    eval(ast, ast.root, input, ctx)
}

fn eval(ast: &Ast, node: NodeId, input: &Value, ctx: &EvalContext) -> Vec<Value> {
    match ast.node(node) {
        ExprNode::Identity => vec![input.clone()],
        ExprNode::Field { target, name, optional } => eval(ast, *target, input, ctx)
            .into_iter()
            .filter_map(|v| field_access(&v, name, *optional, ctx))
            .collect(),
        ExprNode::Index { target, index } => {
            eval(ast, *target, input, ctx).into_iter().filter_map(|v| index_access(&v, *index)).collect()
        }
        ExprNode::Slice { target, start, end } => eval(ast, *target, input, ctx)
            .into_iter()
            .filter_map(|v| slice_access(&v, *start, *end))
            .collect(),
        ExprNode::Iterate { target } => {
            eval(ast, *target, input, ctx).into_iter().flat_map(|v| iterate(&v)).collect()
        }
        ExprNode::Pipe(a, b) => eval(ast, *a, input, ctx).into_iter().flat_map(|v| eval(ast, *b, &v, ctx)).collect(),
        ExprNode::Alt(a, b) => {
            let left: Vec<Value> = eval(ast, *a, input, ctx).into_iter().filter(is_truthy).collect();
            if !left.is_empty() {
                left
            } else {
                eval(ast, *b, input, ctx)
            }
        }
        ExprNode::If { cond, then_branch, else_branch } => {
            if eval_cond(ast, *cond, input, ctx) {
                eval(ast, *then_branch, input, ctx)
            } else {
                eval(ast, *else_branch, input, ctx)
            }
        }
        ExprNode::ObjectConstruct(entries) => vec![build_object(ast, entries, input, ctx)],
        ExprNode::ArrayConstruct(elements) => {
            vec![Value::Array(elements.iter().flat_map(|&e| eval(ast, e, input, ctx)).collect())]
        }
        ExprNode::BinOp { op, left, right } => {
            let lefts = eval(ast, *left, input, ctx);
            let rights = eval(ast, *right, input, ctx);
            lefts.iter().flat_map(|l| rights.iter().map(move |r| apply_arith(*op, l, r))).collect()
        }
        ExprNode::Literal(v) => vec![v.clone()],
        ExprNode::Call { name, args } => call_builtin(ast, name, args, input, ctx),
        ExprNode::Select(cond) => {
            if eval_cond(ast, *cond, input, ctx) {
                vec![input.clone()]
            } else {
                vec![]
            }
        }
        ExprNode::Delete(path) => vec![delete_path(ast, *path, input, ctx)],
    }
}

fn is_truthy(v: &Value) -> bool {
    !matches!(v, Value::Null | Value::Bool(false))
}

fn field_access(v: &Value, name: &str, optional: bool, ctx: &EvalContext) -> Option<Value> {
    match v {
        Value::Object(map) => map.get(name).cloned(),
        Value::Null => None,
        _ => {
            if ctx.strict && !optional {
                tracing::debug!(field = name, "strict mode: field access on a non-object");
            }
            None
        }
    }
}

fn resolve_index(i: i64, len: usize) -> Option<usize> {
    let len_i = len as i64;
    let real = if i >= 0 { i } else { len_i.saturating_add(i) };
    if real < 0 || real >= len_i {
        None
    } else {
        Some(real as usize)
    }
}

fn index_access(v: &Value, index: i64) -> Option<Value> {
    match v {
        Value::Array(arr) => resolve_index(index, arr.len()).map(|i| arr[i].clone()),
        _ => None,
    }
}

fn slice_bound(opt: Option<i64>, len: i64, default: i64) -> i64 {
    match opt {
        None => default,
        Some(i) if i >= 0 => i.min(len),
        Some(i) => len.saturating_add(i).max(0),
    }
}

fn slice_access(v: &Value, start: Option<i64>, end: Option<i64>) -> Option<Value> {
    let Value::Array(arr) = v else { return None };
    let len = arr.len() as i64;
    let s = slice_bound(start, len, 0).clamp(0, len);
    let e = slice_bound(end, len, len).clamp(0, len);
    if s >= e {
        return Some(Value::Array(Vec::new()));
    }
    Some(Value::Array(arr[s as usize..e as usize].to_vec()))
}

fn iterate(v: &Value) -> Vec<Value> {
    match v {
        Value::Array(arr) => arr.clone(),
        Value::Object(map) => map.values().cloned().collect(),
        _ => Vec::new(),
    }
}

fn build_object(ast: &Ast, entries: &[(ObjectKey, NodeId)], input: &Value, ctx: &EvalContext) -> Value {
    let mut map = Map::new();
    for (key, value_node) in entries {
        let key_str = match key {
            ObjectKey::Literal(s) => s.clone(),
            ObjectKey::Computed(node) => eval(ast, *node, input, ctx)
                .into_iter()
                .next()
                .map(|v| match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
                .unwrap_or_default(),
        };
        let value = eval(ast, *value_node, input, ctx).into_iter().next().unwrap_or(Value::Null);
        map.insert(key_str, value);
    }
    Value::Object(map)
}

/// `+` dispatches by argument type (§4.H): number+number, string
/// concatenation, array concatenation, and object merge where the right
/// operand's keys win at the top level. Mismatched types never raise;
/// they fall through to `null`.
pub(crate) fn add_values(l: &Value, r: &Value) -> Value {
    match (l, r) {
        (Value::Number(_), Value::Number(_)) => numeric_op(l, r, |a, b| a + b),
        (Value::String(a), Value::String(b)) => Value::String(format!("{a}{b}")),
        (Value::Array(a), Value::Array(b)) => {
            let mut out = a.clone();
            out.extend(b.iter().cloned());
            Value::Array(out)
        }
        (Value::Object(a), Value::Object(b)) => {
            let mut out = a.clone();
            for (k, v) in b {
                out.insert(k.clone(), v.clone());
            }
            Value::Object(out)
        }
        _ => Value::Null,
    }
}

fn apply_arith(op: ArithOp, l: &Value, r: &Value) -> Value {
    match op {
        ArithOp::Add => add_values(l, r),
        ArithOp::Sub => numeric_op(l, r, |a, b| a - b),
        ArithOp::Mul => numeric_op(l, r, |a, b| a * b),
        ArithOp::Div => numeric_op(l, r, |a, b| if b == 0.0 { f64::NAN } else { a / b }),
        ArithOp::Mod => numeric_op(l, r, |a, b| if b == 0.0 { f64::NAN } else { a % b }),
    }
}

fn numeric_op(l: &Value, r: &Value, f: impl Fn(f64, f64) -> f64) -> Value {
    let (Some(a), Some(b)) = (l.as_f64(), r.as_f64()) else {
        return Value::Null;
    };
    finite_or_null(f(a, b))
}

fn finite_or_null(f: f64) -> Value {
    if !f.is_finite() {
        return Value::Null;
    }
    if f.fract() == 0.0 && f.abs() < 9e15 {
        Value::from(f as i64)
    } else {
        serde_json::Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn eval_cond(ast: &Ast, cond: crate::ast::CondId, input: &Value, ctx: &EvalContext) -> bool {
    match ast.cond(cond) {
        CondNode::Compare { left, op, right } => {
            let lefts = eval(ast, *left, input, ctx);
            let rights = eval(ast, *right, input, ctx);
            lefts.iter().any(|l| rights.iter().any(|r| compare(*op, l, r)))
        }
        CondNode::And(a, b) => eval_cond(ast, *a, input, ctx) && eval_cond(ast, *b, input, ctx),
        CondNode::Or(a, b) => eval_cond(ast, *a, input, ctx) || eval_cond(ast, *b, input, ctx),
        CondNode::Not(a) => !eval_cond(ast, *a, input, ctx),
        CondNode::Truthy(node) => eval(ast, *node, input, ctx).iter().any(is_truthy),
    }
}

fn compare(op: CmpOp, l: &Value, r: &Value) -> bool {
    use std::cmp::Ordering;
    let c = compare_values(l, r);
    match op {
        CmpOp::Eq => c == Ordering::Equal,
        CmpOp::Ne => c != Ordering::Equal,
        CmpOp::Lt => c == Ordering::Less,
        CmpOp::Le => c != Ordering::Greater,
        CmpOp::Gt => c == Ordering::Greater,
        CmpOp::Ge => c != Ordering::Less,
    }
}

enum PathStep {
    Field(String),
    Index(i64),
}

fn path_steps(ast: &Ast, node: NodeId) -> Option<Vec<PathStep>> {
    match ast.node(node) {
        ExprNode::Identity => Some(Vec::new()),
        ExprNode::Field { target, name, .. } => {
            let mut steps = path_steps(ast, *target)?;
            steps.push(PathStep::Field(name.clone()));
            Some(steps)
        }
        ExprNode::Index { target, index } => {
            let mut steps = path_steps(ast, *target)?;
            steps.push(PathStep::Index(*index));
            Some(steps)
        }
        _ => None,
    }
}

fn delete_path(ast: &Ast, path_node: NodeId, input: &Value, _ctx: &EvalContext) -> Value {
    let Some(steps) = path_steps(ast, path_node) else {
        tracing::warn!("del() argument is not a plain field/index path; leaving input unchanged");
        return input.clone();
    };
    delete_at(input, &steps)
}

fn delete_at(v: &Value, steps: &[PathStep]) -> Value {
    match steps.split_first() {
        None => Value::Null,
        Some((head, rest)) if rest.is_empty() => remove_one(v, head),
        Some((head, rest)) => match (v, head) {
            (Value::Object(map), PathStep::Field(name)) => {
                let mut out = map.clone();
                if let Some(child) = map.get(name) {
                    out.insert(name.clone(), delete_at(child, rest));
                }
                Value::Object(out)
            }
            (Value::Array(arr), PathStep::Index(i)) => {
                let mut out = arr.clone();
                if let Some(real) = resolve_index(*i, arr.len()) {
                    out[real] = delete_at(&arr[real], rest);
                }
                Value::Array(out)
            }
            _ => v.clone(),
        },
    }
}

fn remove_one(v: &Value, step: &PathStep) -> Value {
    match (v, step) {
        (Value::Object(map), PathStep::Field(name)) => {
            let mut out = map.clone();
            out.remove(name);
            Value::Object(out)
        }
        (Value::Array(arr), PathStep::Index(i)) => {
            let mut out = arr.clone();
            if let Some(real) = resolve_index(*i, arr.len()) {
                out.remove(real);
            }
            Value::Array(out)
        }
        _ => v.clone(),
    }
}

fn call_builtin(ast: &Ast, name: &str, args: &[NodeId], input: &Value, ctx: &EvalContext) -> Vec<Value> {
    match name {
        "map" => {
            let Some(&body) = args.first() else { return Vec::new() };
            match input {
                Value::Array(arr) => vec![Value::Array(arr.iter().flat_map(|el| eval(ast, body, el, ctx)).collect())],
                _ => Vec::new(),
            }
        }
        "group_by" => by_group(ast, args, input, ctx),
        "sort_by" => by_sort(ast, args, input, ctx),
        "unique_by" => by_unique(ast, args, input, ctx),
        "min_by" => by_extreme(ast, args, input, ctx, true),
        "max_by" => by_extreme(ast, args, input, ctx, false),
        _ => {
            let arg_values: Vec<Value> =
                args.iter().map(|&a| eval(ast, a, input, ctx).into_iter().next().unwrap_or(Value::Null)).collect();
            builtins::dispatch(name, input, &arg_values)
        }
    }
}

fn keyed_elements(ast: &Ast, key_node: NodeId, input: &Value, ctx: &EvalContext) -> Option<Vec<(Value, Value)>> {
    let Value::Array(arr) = input else { return None };
    Some(
        arr.iter()
            .map(|el| (eval(ast, key_node, el, ctx).into_iter().next().unwrap_or(Value::Null), el.clone()))
            .collect(),
    )
}

fn by_group(ast: &Ast, args: &[NodeId], input: &Value, ctx: &EvalContext) -> Vec<Value> {
    let Some(&key_node) = args.first() else { return Vec::new() };
    let Some(mut keyed) = keyed_elements(ast, key_node, input, ctx) else { return Vec::new() };
    keyed.sort_by(|a, b| compare_values(&a.0, &b.0));

    let mut groups: Vec<Vec<Value>> = Vec::new();
    for (key, el) in keyed {
        match groups.last_mut() {
            Some(group) if matches_group_key(ast, key_node, group, &key, ctx) => group.push(el),
            _ => groups.push(vec![el]),
        }
    }
    let _ = ctx;
    vec![Value::Array(groups.into_iter().map(Value::Array).collect())]
}

fn matches_group_key(ast: &Ast, key_node: NodeId, group: &[Value], key: &Value, ctx: &EvalContext) -> bool {
    let Some(last) = group.last() else { return false };
    let last_key = eval(ast, key_node, last, ctx).into_iter().next().unwrap_or(Value::Null);
    compare_values(&last_key, key) == std::cmp::Ordering::Equal
}

fn by_sort(ast: &Ast, args: &[NodeId], input: &Value, ctx: &EvalContext) -> Vec<Value> {
    let Some(&key_node) = args.first() else { return Vec::new() };
    let Some(mut keyed) = keyed_elements(ast, key_node, input, ctx) else { return Vec::new() };
    keyed.sort_by(|a, b| compare_values(&a.0, &b.0));
    vec![Value::Array(keyed.into_iter().map(|(_, el)| el).collect())]
}

fn by_unique(ast: &Ast, args: &[NodeId], input: &Value, ctx: &EvalContext) -> Vec<Value> {
    let Some(&key_node) = args.first() else { return Vec::new() };
    let Some(mut keyed) = keyed_elements(ast, key_node, input, ctx) else { return Vec::new() };
    keyed.sort_by(|a, b| compare_values(&a.0, &b.0));
    keyed.dedup_by(|a, b| compare_values(&a.0, &b.0) == std::cmp::Ordering::Equal);
    vec![Value::Array(keyed.into_iter().map(|(_, el)| el).collect())]
}

fn by_extreme(ast: &Ast, args: &[NodeId], input: &Value, ctx: &EvalContext, want_min: bool) -> Vec<Value> {
    let Some(&key_node) = args.first() else { return Vec::new() };
    let Some(mut keyed) = keyed_elements(ast, key_node, input, ctx) else { return Vec::new() };
    if keyed.is_empty() {
        return Vec::new();
    }
    keyed.sort_by(|a, b| compare_values(&a.0, &b.0));
    let (_, el) = if want_min { keyed.remove(0) } else { keyed.pop().unwrap() };
    vec![el]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use serde_json::json;

    fn run(expr: &str, input: &Value) -> Vec<Value> {
        let ast = parse(expr).unwrap();
        evaluate(&ast, input, &EvalContext::default())
    }

    #[test]
    fn field_and_select_pipeline() {
        let input = json!({"amount": "1200"});
        let out = run(".amount | tonumber | select(. > 1000)", &input);
        assert_eq!(out, vec![json!(1200)]);
    }

    #[test]
    fn negative_slice() {
        let input = json!({"xs": [10, 20, 30, 40, 50]});
        assert_eq!(run(".xs[-2:]", &input), vec![json!([40, 50])]);
    }

    #[test]
    fn min_int_slice_start_does_not_overflow() {
        let input = json!({"xs": [10, 20, 30, 40, 50]});
        assert_eq!(run(".xs[-9223372036854775808:]", &input), vec![json!([10, 20, 30, 40, 50])]);
    }

    #[test]
    fn missing_path_with_optional_and_alt_is_null() {
        let input = json!({"a": 1});
        assert_eq!(run(".b? // null", &input), vec![Value::Null]);
    }

    #[test]
    fn group_by_separates_same_string_and_number() {
        let input = json!([{"k": 1}, {"k": "1"}, {"k": 1}]);
        let out = run("group_by(.k) | map(.[0].k)", &input);
        assert_eq!(out, vec![json!([1, "1"])]);
    }

    #[test]
    fn sort_then_reverse_equals_descending() {
        let input = json!([3, 1, 2]);
        assert_eq!(run("sort | reverse", &input), vec![json!([3, 2, 1])]);
    }

    #[test]
    fn to_entries_from_entries_is_identity() {
        let input = json!({"a": 1, "b": 2});
        assert_eq!(run("to_entries | from_entries", &input), vec![input]);
    }

    #[test]
    fn object_construction_with_computed_key() {
        let input = json!({"k": "name", "v": "Alice"});
        let out = run("{(.k): .v}", &input);
        assert_eq!(out, vec![json!({"name": "Alice"})]);
    }

    #[test]
    fn arithmetic_plus_overloads_by_type() {
        assert_eq!(run(". + 1", &json!(2)), vec![json!(3)]);
        assert_eq!(run(". + \"b\"", &json!("a")), vec![json!("ab")]);
    }

    #[test]
    fn division_by_zero_is_null_not_infinity() {
        assert_eq!(run(". / 0", &json!(5)), vec![Value::Null]);
    }

    #[test]
    fn del_preserves_surviving_key_order() {
        let input = json!({"a": 1, "b": 2, "c": 3});
        assert_eq!(run("del(.b)", &input), vec![json!({"a": 1, "c": 3})]);
    }

    #[test]
    fn if_then_else_end_branches() {
        assert_eq!(run("if . > 0 then \"pos\" else \"neg\" end", &json!(5)), vec![json!("pos")]);
        assert_eq!(run("if . > 0 then \"pos\" else \"neg\" end", &json!(-5)), vec![json!("neg")]);
    }
}
