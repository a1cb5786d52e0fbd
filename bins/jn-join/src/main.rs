//! `jn join`: hash join (§4.I, example S4). The right address is
//! consumed fully into memory, bucketed by key; the left address (or
//! stdin) streams through, one output record per left record.

use clap::Parser;
use jn_join::{
    parse_agg_spec, AggSpec, JoinConfig, JoinEngine, JoinKeySpec, OutputMode, RightLimits,
};

#[derive(Parser)]
#[command(name = "jn-join")]
struct Cli {
    /// Right-side address, consumed fully into memory.
    right: String,

    /// Left-side (streaming) source address; '-' or omitted means stdin.
    #[arg(default_value = "-")]
    left: String,

    /// Destination address; '-' or omitted means stdout.
    #[arg(long = "to", default_value = "-")]
    to: String,

    /// Shared field name(s) on both sides (comma-separated for a
    /// composite key). Mutually exclusive with `--left-key`/`--right-key`.
    #[arg(long)]
    on: Option<String>,

    #[arg(long = "left-key")]
    left_key: Option<String>,
    #[arg(long = "right-key")]
    right_key: Option<String>,

    /// Embed matches as a named array field (the default output mode).
    #[arg(long, default_value = "matches")]
    target: String,

    /// Merge the first match's fields into the left record instead of
    /// embedding an array.
    #[arg(long)]
    flatten: bool,

    /// Comma-separated field subset to project into each embedded match.
    #[arg(long)]
    project: Option<String>,

    /// `name: fn` or `name: fn(field)` aggregation over the right
    /// bucket; repeatable.
    #[arg(long = "agg")]
    agg: Vec<String>,

    /// A boolean expression over `{"left": ..., "right": ...}`
    /// restricting which candidate pairs count as matches.
    #[arg(long)]
    condition: Option<String>,

    /// Right source memory ceiling in bytes before the join fails
    /// (warns at half this value).
    #[arg(long = "limit-bytes", default_value_t = RightLimits::default().limit_bytes)]
    limit_bytes: usize,

    #[arg(long)]
    strict: bool,
}

fn main() {
    jn_toolkit::init_tracing();
    let cli = Cli::parse();
    jn_toolkit::exit_with(run(cli));
}

fn split_fields(s: &str) -> Vec<String> {
    s.split(',').map(|f| f.trim().to_string()).collect()
}

fn build_config(cli: &Cli) -> Result<JoinConfig, jn_toolkit::ToolError> {
    let key = match (&cli.on, &cli.left_key, &cli.right_key) {
        (Some(on), None, None) => Some(JoinKeySpec::Natural(split_fields(on))),
        (None, Some(l), Some(r)) => Some(JoinKeySpec::Named { left: split_fields(l), right: split_fields(r) }),
        (None, None, None) => None,
        _ => {
            return Err(jn_toolkit::ToolError::Join(jn_join::JoinError::BadKeySpec(
                "specify either --on or both --left-key/--right-key".to_string(),
            )))
        }
    };

    let output = if cli.flatten {
        OutputMode::Flatten
    } else if let Some(fields) = &cli.project {
        OutputMode::Project { target: cli.target.clone(), fields: split_fields(fields) }
    } else {
        OutputMode::Embed { target: cli.target.clone() }
    };

    let aggs: Vec<AggSpec> =
        cli.agg.iter().map(|s| parse_agg_spec(s)).collect::<Result<_, _>>().map_err(jn_toolkit::ToolError::Join)?;

    Ok(JoinConfig {
        key,
        output,
        aggs,
        condition: cli.condition.clone(),
        limits: RightLimits { limit_bytes: cli.limit_bytes },
    })
}

fn run(cli: Cli) -> Result<i32, jn_toolkit::ToolError> {
    let registry = jn_toolkit::registry();
    let config = build_config(&cli)?;

    let (mut right_input, right_pipeline) = jn_pipeline_open_read(&cli.right, &registry)?;
    let mut right_records = Vec::new();
    while let Some(record) = right_input.read_record(cli.strict)? {
        right_records.push(record);
    }
    let right_exit = match right_pipeline {
        Some(p) => p.wait()?,
        None => 0,
    };

    let engine = JoinEngine::build(config, right_records)?;

    let mut endpoints = jn_toolkit::Endpoints::open(&registry, &cli.left, &cli.to)?;
    while let Some(left) = endpoints.read_record(cli.strict)? {
        endpoints.write_record(&engine.join_one(&left))?;
    }
    let left_side_code = endpoints.finish()?;

    if right_exit != 0 {
        return Ok(right_exit);
    }
    Ok(left_side_code)
}

/// Thin, read-only wrapper so the right source can be drained without
/// pulling in the write-side half of `Endpoints`.
struct RightReader(jn_core::io::LineReader<Box<dyn std::io::Read>>);

impl RightReader {
    fn read_record(&mut self, strict: bool) -> Result<Option<jn_core::Record>, jn_toolkit::ToolError> {
        Ok(self.0.read_record(strict)?)
    }
}

fn jn_pipeline_open_read(
    address: &str,
    registry: &jn_registry::Registry,
) -> Result<(RightReader, Option<jn_pipeline::RunningPipeline>), jn_toolkit::ToolError> {
    let (reader, pipeline) = jn_pipeline::open_read(address, registry)?.into_reader();
    Ok((RightReader(jn_core::io::LineReader::new(reader)), pipeline))
}
