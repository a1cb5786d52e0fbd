pub mod bridge;
pub mod error;
pub mod executor;
pub mod planner;
pub mod spec;

pub use bridge::{open_read, open_write, BridgeError, InputSource, OutputSink};
pub use error::{ExecError, PlannerError};
pub use executor::RunningPipeline;
pub use planner::plan;
pub use spec::{Direction, IoShape, PipelineSpec, StageRole, StageSpec};
