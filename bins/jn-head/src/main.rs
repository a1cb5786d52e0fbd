//! `jn head`: emit the first N records, then stop reading. Closing the
//! input side once satisfied is what lets SIGPIPE propagate backward
//! through any upstream stage (§5) — `Endpoints::finish` still waits on
//! that upstream chain even though we never drained it.

use clap::Parser;

#[derive(Parser)]
#[command(name = "jn-head")]
struct Cli {
    /// Number of records to emit.
    #[arg(short = 'n', long, default_value_t = 10)]
    count: usize,

    /// Source address; '-' or omitted means stdin.
    #[arg(default_value = "-")]
    source: String,

    /// Destination address; '-' or omitted means stdout.
    #[arg(long = "to", default_value = "-")]
    to: String,

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

    let mut emitted = 0usize;
    while emitted < cli.count {
        let Some(record) = endpoints.read_record(cli.strict)? else { break };
        endpoints.write_record(&record)?;
        emitted += 1;
    }

    endpoints.finish()
}
