//! The planner's output type (§3, §4.F): an ordered, already-resolved list
//! of external commands to run. Nothing in this module touches a process;
//! that is `executor`'s job.

use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

/// Why a stage exists, for diagnostics and for the trace a caller can ask
/// `jn` to print (`--explain`); never interpreted by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageRole {
    Protocol,
    Decompress,
    Compress,
    Format,
}

/// What crosses a stage's stdin/stdout boundary. Exactly the four shapes
/// §4.F names; a pipeline is only valid if consecutive stages' shapes
/// chain (one stage's output side matches the next stage's input side).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoShape {
    BytesToBytes,
    BytesToRecords,
    RecordsToRecords,
    RecordsToBytes,
}

impl IoShape {
    fn input_is_records(self) -> bool {
        matches!(self, IoShape::RecordsToRecords | IoShape::RecordsToBytes)
    }

    fn output_is_records(self) -> bool {
        matches!(self, IoShape::BytesToRecords | IoShape::RecordsToRecords)
    }
}

#[derive(Debug, Clone)]
pub struct StageSpec {
    pub command: PathBuf,
    pub args: Vec<String>,
    pub role: StageRole,
    pub io_shape: IoShape,
}

/// An ordered chain of external processes plus whether the caller itself
/// must do file/stdio I/O before the first or after the last stage (§4.F:
/// stdio and plain files are handled in-process, never via a subprocess).
#[derive(Debug, Clone, Default)]
pub struct PipelineSpec {
    pub stages: Vec<StageSpec>,
}

impl PipelineSpec {
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Confirms adjacent stages' I/O shapes actually chain. The planner is
    /// expected to produce specs that always pass this; kept as a
    /// debug-time invariant check rather than inlined into construction.
    pub fn validate(&self) -> Result<(), String> {
        for pair in self.stages.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if a.io_shape.output_is_records() != b.io_shape.input_is_records() {
                return Err(format!(
                    "stage '{}' output does not match stage '{}' input",
                    a.command.display(),
                    b.command.display()
                ));
            }
        }
        Ok(())
    }
}
