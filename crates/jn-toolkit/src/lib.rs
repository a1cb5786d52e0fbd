//! Shared plumbing for the tool binaries (`jn-cat`, `jn-filter`, ...):
//! tracing setup, address-to-stream resolution via `jn_pipeline::bridge`,
//! and the exit-code fold once both the upstream and downstream halves of
//! a subprocess chain (if any) have been waited on. Each binary is itself
//! a stage (§4.F/§4.G): it may sit between two planned subprocess chains,
//! one feeding its stdin-equivalent and one draining its stdout-equivalent.

use std::io::{Read, Write};

use jn_core::io::{LineReader, RecordWriter};
use jn_core::{CoreError, Record};
use jn_pipeline::{BridgeError, RunningPipeline};
use jn_registry::Registry;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error(transparent)]
    Exec(#[from] jn_pipeline::ExecError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Join(#[from] jn_join::JoinError),
    #[error(transparent)]
    Merge(#[from] jn_join::MergeError),
    #[error(transparent)]
    Expr(#[from] jn_expr::ExprError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
}

/// Build a registry rooted at the current working directory, the only
/// starting point a CLI invocation has (§4.D).
pub fn registry() -> Registry {
    let cwd = std::env::current_dir().unwrap_or_else(|_| ".".into());
    Registry::discover(&cwd)
}

/// One tool's resolved input/output: a record reader and writer, each
/// possibly backed by a subprocess chain this binary must wait on before
/// exiting so the final exit code folds correctly (§4.G).
pub struct Endpoints {
    reader: LineReader<Box<dyn Read>>,
    input_pipeline: Option<RunningPipeline>,
    writer: RecordWriter<Box<dyn Write>>,
    output_pipeline: Option<RunningPipeline>,
}

impl Endpoints {
    pub fn open(registry: &Registry, from: &str, to: &str) -> Result<Endpoints, ToolError> {
        let (input, input_pipeline) = jn_pipeline::open_read(from, registry)?.into_reader();
        let (output, output_pipeline) = jn_pipeline::open_write(to, registry)?.into_writer();
        Ok(Endpoints {
            reader: LineReader::new(input),
            input_pipeline,
            writer: RecordWriter::new(output),
            output_pipeline,
        })
    }

    pub fn read_record(&mut self, strict: bool) -> Result<Option<Record>, ToolError> {
        Ok(self.reader.read_record(strict)?)
    }

    pub fn write_record(&mut self, record: &Record) -> Result<(), ToolError> {
        self.writer.write_record(record)?;
        Ok(())
    }

    /// Flush and wait on both halves of the chain, folding their exit
    /// statuses: an upstream (input-side) failure is reported first,
    /// since it is the earlier stage in the overall left-to-right chain
    /// (§4.G); otherwise the downstream (output-side) status wins.
    pub fn finish(mut self) -> Result<i32, ToolError> {
        let _ = self.writer.flush();
        drop(self.reader);

        let input_code = match self.input_pipeline.take() {
            Some(p) => p.wait()?,
            None => 0,
        };
        let output_code = match self.output_pipeline.take() {
            Some(p) => p.wait()?,
            None => 0,
        };
        if input_code != 0 {
            return Ok(input_code);
        }
        Ok(output_code)
    }
}

impl ToolError {
    /// True when this error is the downstream reader having gone away
    /// mid-write. §4.A/§5/§7 treat this as graceful termination, not a
    /// fatal error: the tool must stop immediately (no further records
    /// read or written) and exit with `jn_core::SIGPIPE_EXIT_CODE`
    /// rather than going through `fail`.
    pub fn is_broken_pipe(&self) -> bool {
        match self {
            ToolError::Core(e) => e.is_broken_pipe(),
            ToolError::Io(e) => e.kind() == std::io::ErrorKind::BrokenPipe,
            _ => false,
        }
    }
}

/// Print the conventional `Error: {e}` line and exit 1, matching the
/// teacher's `bins/server` convention.
pub fn fail(err: impl std::fmt::Display) -> ! {
    eprintln!("Error: {err}");
    std::process::exit(1);
}

/// The standard top-level dispatch for a tool's `main`: a clean run
/// exits with the folded subprocess exit code (§4.G), a broken pipe
/// exits silently with `jn_core::SIGPIPE_EXIT_CODE` (§4.A, §5, §7)
/// instead of printing an error, and anything else goes through `fail`.
pub fn exit_with(result: Result<i32, ToolError>) -> ! {
    match result {
        Ok(code) => std::process::exit(code),
        Err(e) if e.is_broken_pipe() => std::process::exit(jn_core::SIGPIPE_EXIT_CODE),
        Err(e) => fail(e),
    }
}
