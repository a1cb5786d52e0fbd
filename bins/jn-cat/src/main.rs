//! `jn cat`: read records from a source address and write them to a
//! destination address unchanged. The simplest record-stage tool,
//! exercising the address-to-pipeline bridge with no per-record
//! transform.

use clap::Parser;

/// Stream NDJSON records from one address to another.
#[derive(Parser)]
#[command(name = "jn-cat")]
struct Cli {
    /// Source address; '-' or omitted means stdin.
    #[arg(default_value = "-")]
    source: String,

    /// Destination address; '-' or omitted means stdout.
    #[arg(long = "to", default_value = "-")]
    to: String,

    /// Abort on the first malformed input line instead of skipping it.
    #[arg(long)]
    strict: bool,
}

fn main() {
    jn_toolkit::init_tracing();
    let cli = Cli::parse();
    jn_toolkit::exit_with(run(cli));
}

fn run(cli: Cli) -> Result<i32, jn_toolkit::ToolError> {
    let registry = jn_toolkit::registry();
    let mut endpoints = jn_toolkit::Endpoints::open(&registry, &cli.source, &cli.to)?;

    while let Some(record) = endpoints.read_record(cli.strict)? {
        endpoints.write_record(&record)?;
    }

    endpoints.finish()
}
