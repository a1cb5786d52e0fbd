//! Math builtins (§4.H). Non-finite results (e.g. `ln(-1)`, `1/0` handled
//! upstream in `eval::add_values`'s arithmetic siblings) serialize as
//! `null`, which falls out for free here since `serde_json::Number` simply
//! cannot represent NaN/Infinity.

use serde_json::Value;

pub fn dispatch(name: &str, input: &Value, _args: &[Value]) -> Option<Vec<Value>> {
    let n = input.as_f64()?;
    let result = match name {
        "floor" => n.floor(),
        "ceil" => n.ceil(),
        "round" => n.round(),
        "abs" => n.abs(),
        "exp" => n.exp(),
        "ln" => n.ln(),
        "log2" => n.log2(),
        "log10" => n.log10(),
        "sqrt" => n.sqrt(),
        "sin" => n.sin(),
        "cos" => n.cos(),
        "tan" => n.tan(),
        _ => return None,
    };
    Some(vec![finite_or_null(result)])
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn floor_and_ceil() {
        assert_eq!(dispatch("floor", &json!(1.7), &[]), Some(vec![json!(1)]));
        assert_eq!(dispatch("ceil", &json!(1.2), &[]), Some(vec![json!(2)]));
    }

    #[test]
    fn sqrt_of_negative_is_null_not_nan() {
        assert_eq!(dispatch("sqrt", &json!(-1), &[]), Some(vec![Value::Null]));
    }

    #[test]
    fn ln_of_zero_is_null_not_negative_infinity() {
        assert_eq!(dispatch("ln", &json!(0), &[]), Some(vec![Value::Null]));
    }
}
