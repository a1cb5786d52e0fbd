pub mod array;
pub mod ids;
pub mod math;
pub mod object;
pub mod string;
pub mod time;
pub mod types;

use serde_json::Value;

/// Try each builtin category in turn; an unrecognized name (or a
/// recognized name whose argument types don't fit) resolves to an empty
/// sequence rather than an error, per the evaluator's "never raise" rule.
pub fn dispatch(name: &str, input: &Value, args: &[Value]) -> Vec<Value> {
    types::dispatch(name, input, args)
        .or_else(|| array::dispatch(name, input, args))
        .or_else(|| object::dispatch(name, input, args))
        .or_else(|| string::dispatch(name, input, args))
        .or_else(|| string::dispatch_array_input(name, input, args))
        .or_else(|| math::dispatch(name, input, args))
        .or_else(|| time::dispatch(name, input, args))
        .or_else(|| ids::dispatch(name, input, args))
        .unwrap_or_default()
}
