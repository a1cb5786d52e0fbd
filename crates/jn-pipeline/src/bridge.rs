//! Wires a planned `PipelineSpec` to the in-process side of the pipe: the
//! tool binaries (`jn-cat`, `jn-filter`, ...) are themselves the final (or
//! first) stage conceptually, so this module bridges "the planner's
//! subprocess chain" to "a `Read`/`Write` the binary's own NDJSON loop can
//! use", opening plain files directly rather than always degrading to a
//! no-op subprocess for the common stdio/ndjson case (§4.F: "stdio and
//! plain files are handled in-process, never via a subprocess").

use std::fs::File;
use std::io::{self, Read, Write};
use std::process::Stdio;

use jn_core::{Address, AddressKind};
use jn_registry::Registry;

use crate::error::{ExecError, PlannerError};
use crate::executor::RunningPipeline;
use crate::planner::plan;
use crate::spec::Direction;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error(transparent)]
    Planner(#[from] PlannerError),
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error(transparent)]
    Address(#[from] jn_core::CoreError),
    #[error("opening '{path}': {source}")]
    OpenFile { path: String, source: io::Error },
}

/// The readable end of a resolved source: either a subprocess pipeline's
/// final stdout (in which case the pipeline must be waited on once
/// reading finishes) or a plain file/stdin handle opened directly.
pub enum InputSource {
    Direct(Box<dyn Read>),
    Piped { stdout: Box<dyn Read>, pipeline: RunningPipeline },
}

impl InputSource {
    pub fn into_reader(self) -> (Box<dyn Read>, Option<RunningPipeline>) {
        match self {
            InputSource::Direct(r) => (r, None),
            InputSource::Piped { stdout, pipeline } => (stdout, Some(pipeline)),
        }
    }
}

pub enum OutputSink {
    Direct(Box<dyn Write>),
    Piped { stdin: Box<dyn Write>, pipeline: RunningPipeline },
}

impl OutputSink {
    pub fn into_writer(self) -> (Box<dyn Write>, Option<RunningPipeline>) {
        match self {
            OutputSink::Direct(w) => (w, None),
            OutputSink::Piped { stdin, pipeline } => (stdin, Some(pipeline)),
        }
    }
}

/// Resolve `address` for reading, spawning whatever decompress/protocol/
/// format stages the planner decides are needed.
pub fn open_read(address_raw: &str, registry: &Registry) -> Result<InputSource, BridgeError> {
    let address = Address::parse(address_raw)?;
    let spec = plan(&address, Direction::Read, registry)?;

    if spec.is_empty() {
        return Ok(InputSource::Direct(open_address_for_read(&address)?));
    }

    let stage_stdin = match address.kind {
        AddressKind::Stdio => Stdio::inherit(),
        AddressKind::Url => Stdio::null(),
        _ => Stdio::from(open_address_for_read(&address)?),
    };

    let mut pipeline = RunningPipeline::spawn(&spec, stage_stdin, Stdio::piped())?;
    let stdout = pipeline.take_final_stdout().ok_or_else(|| {
        BridgeError::Exec(ExecError::Wiring(io::Error::other("pipeline produced no readable stdout")))
    })?;
    Ok(InputSource::Piped { stdout: Box::new(stdout), pipeline })
}

/// Resolve `address` for writing, spawning whatever format/compress/
/// protocol stages the planner decides are needed.
pub fn open_write(address_raw: &str, registry: &Registry) -> Result<OutputSink, BridgeError> {
    let address = Address::parse(address_raw)?;
    let spec = plan(&address, Direction::Write, registry)?;

    if spec.is_empty() {
        return Ok(OutputSink::Direct(open_address_for_write(&address)?));
    }

    let stage_stdout = match address.kind {
        AddressKind::Stdio => Stdio::inherit(),
        AddressKind::Url => Stdio::null(),
        _ => Stdio::from(open_address_for_write(&address)?),
    };

    let mut pipeline = RunningPipeline::spawn(&spec, Stdio::piped(), stage_stdout)?;
    let stdin = pipeline.take_first_stdin().ok_or_else(|| {
        BridgeError::Exec(ExecError::Wiring(io::Error::other("pipeline produced no writable stdin")))
    })?;
    Ok(OutputSink::Piped { stdin: Box::new(stdin), pipeline })
}

fn open_address_for_read(address: &Address) -> Result<Box<dyn Read>, BridgeError> {
    match address.kind {
        AddressKind::Stdio => Ok(Box::new(io::stdin())),
        _ => File::open(&address.base)
            .map(|f| Box::new(f) as Box<dyn Read>)
            .map_err(|source| BridgeError::OpenFile { path: address.base.clone(), source }),
    }
}

fn open_address_for_write(address: &Address) -> Result<Box<dyn Write>, BridgeError> {
    match address.kind {
        AddressKind::Stdio => Ok(Box::new(io::stdout())),
        _ => File::create(&address.base)
            .map(|f| Box::new(f) as Box<dyn Write>)
            .map_err(|source| BridgeError::OpenFile { path: address.base.clone(), source }),
    }
}
