//! The expression engine (§4.H): a small filter/transform language,
//! deliberately not a full jq clone (`gate` rejects the constructs the
//! engine does not support) with a bit-exact-serialization-friendly
//! evaluator over `serde_json::Value`.

pub mod ast;
pub mod builtins;
pub mod error;
pub mod eval;
pub mod gate;
pub mod lexer;
pub mod ordering;
pub mod parser;

pub use ast::Ast;
pub use error::ExprError;
pub use eval::{evaluate, EvalContext};
pub use parser::{parse, parse_with_max_depth};
