//! `jn tail`: emit the last N records. Requires draining the whole input
//! first, so it keeps a fixed-size ring buffer (§9 "per-record arenas ...
//! the tail ring buffer") rather than an unbounded `Vec`.

use std::collections::VecDeque;

use clap::Parser;

#[derive(Parser)]
#[command(name = "jn-tail")]
struct Cli {
    /// Number of trailing records to emit.
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

    let mut ring: VecDeque<jn_core::Record> = VecDeque::with_capacity(cli.count);
    while let Some(record) = endpoints.read_record(cli.strict)? {
        if ring.len() == cli.count {
            ring.pop_front();
        }
        if cli.count > 0 {
            ring.push_back(record);
        }
    }

    for record in ring {
        endpoints.write_record(&record)?;
    }

    endpoints.finish()
}
