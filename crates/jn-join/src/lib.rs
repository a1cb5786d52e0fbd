//! Join and merge engines (§4.I): a right-buffered hash join and a
//! multi-source concatenation merge, both NDJSON-to-NDJSON transforms
//! that participate in pipelines like any other record stage.

pub mod error;
pub mod join;
pub mod key;
pub mod merge;

pub use error::{JoinError, MergeError};
pub use join::{parse_agg_spec, AggKind, AggSpec, JoinConfig, JoinEngine, OutputMode, RightLimits};
pub use key::JoinKeySpec;
pub use merge::{FailPolicy, MergeConfig, MergeReport, MergeSource};
