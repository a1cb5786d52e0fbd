//! `jn filter`: run an expression-engine program over every record,
//! emitting each non-empty result (a pipe/iterate expression can emit
//! zero, one, or many outputs per input record).

use clap::Parser;

#[derive(Parser)]
#[command(name = "jn-filter")]
struct Cli {
    /// The expression to evaluate against each record.
    expression: String,

    /// Source address; '-' or omitted means stdin.
    #[arg(default_value = "-")]
    source: String,

    /// Destination address; '-' or omitted means stdout.
    #[arg(long = "to", default_value = "-")]
    to: String,

    #[arg(long)]
    strict: bool,
}

/// Parse errors are a usage error (exit 2, §4.H S6): "no records are
/// read" is enforced by parsing before the pipeline/registry are even
/// touched.
const USAGE_ERROR_EXIT: i32 = 2;

fn main() {
    jn_toolkit::init_tracing();
    let cli = Cli::parse();

    let ast = match jn_expr::parse(&cli.expression) {
        Ok(ast) => ast,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(USAGE_ERROR_EXIT);
        }
    };

    jn_toolkit::exit_with(run(cli, ast));
}

fn run(cli: Cli, ast: jn_expr::Ast) -> Result<i32, jn_toolkit::ToolError> {
    let registry = jn_toolkit::registry();
    let mut endpoints = jn_toolkit::Endpoints::open(&registry, &cli.source, &cli.to)?;
    let ctx = jn_expr::EvalContext { strict: cli.strict };

    while let Some(record) = endpoints.read_record(cli.strict)? {
        for out in jn_expr::evaluate(&ast, &record, &ctx) {
            endpoints.write_record(&out)?;
        }
    }

    endpoints.finish()
}
