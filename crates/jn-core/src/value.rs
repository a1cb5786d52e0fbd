/// A record is a dynamically-typed JSON value (§3). We reuse
/// `serde_json::Value` directly rather than inventing a parallel enum: with
/// the `preserve_order` feature its object variant already preserves
/// insertion order, its `Number` cannot represent NaN/±Infinity (so a
/// non-finite arithmetic result must be mapped to `Value::Null` by the
/// producer, satisfying the bit-exact serialization rule in §4.A for free),
/// and its writer emits the same compact, control-character-escaped form
/// spec.md requires.
pub type Record = serde_json::Value;

pub use serde_json::Map as RecordMap;
pub use serde_json::Number as RecordNumber;
