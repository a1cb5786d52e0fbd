//! `jn merge`: concatenate multiple sources in declared order (§4.I),
//! optionally tagging each record with its source label.

use clap::Parser;
use jn_join::{FailPolicy, MergeConfig, MergeSource};

#[derive(Parser)]
#[command(name = "jn-merge")]
struct Cli {
    /// Source addresses, read in this order.
    #[arg(required = true)]
    sources: Vec<String>,

    /// Destination address; '-' or omitted means stdout.
    #[arg(long = "to", default_value = "-")]
    to: String,

    /// Field name under which each record's source label is written.
    #[arg(long = "tag-field")]
    tag_field: Option<String>,

    /// One label per source, matched positionally; defaults to the
    /// source address itself.
    #[arg(long = "label")]
    labels: Vec<String>,

    /// Abort on the first source failure instead of skipping it.
    #[arg(long = "fail-fast")]
    fail_fast: bool,
}

fn main() {
    jn_toolkit::init_tracing();
    let cli = Cli::parse();
    jn_toolkit::exit_with(run(cli));
}

fn run(cli: Cli) -> Result<i32, jn_toolkit::ToolError> {
    let registry = jn_toolkit::registry();

    let mut sources = Vec::with_capacity(cli.sources.len());
    let mut pipelines = Vec::new();
    for (i, address) in cli.sources.iter().enumerate() {
        let label = cli.labels.get(i).cloned().unwrap_or_else(|| address.clone());
        let (reader, pipeline) = jn_pipeline::open_read(address, &registry)?.into_reader();
        if let Some(p) = pipeline {
            pipelines.push(p);
        }
        sources.push(MergeSource::new(label, reader));
    }

    let config = MergeConfig {
        tag_field: cli.tag_field,
        policy: if cli.fail_fast { FailPolicy::FailFast } else { FailPolicy::ContinueOnError },
    };
    let report = jn_join::merge::run(sources, &config)?;

    for label in &report.failed_sources {
        tracing::warn!(source = %label, "merge source failed and was skipped");
    }

    let (output, output_pipeline) = jn_pipeline::open_write(&cli.to, &registry)?.into_writer();
    let mut writer = jn_core::io::RecordWriter::new(output);
    for record in &report.records {
        writer.write_record(record)?;
    }
    writer.flush()?;

    for p in pipelines {
        let _ = p.wait();
    }
    match output_pipeline {
        Some(p) => Ok(p.wait()?),
        None => Ok(0),
    }
}
