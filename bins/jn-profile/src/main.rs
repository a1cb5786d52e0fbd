//! `jn profile`: resolve a `@namespace/name` reference to its merged,
//! interpolated JSON document (§4.C).

use clap::Parser;
use jn_core::{Address, AddressKind};
use jn_profile::ProfileStore;

#[derive(Parser)]
#[command(name = "jn-profile")]
struct Cli {
    /// Profile reference, e.g. `@myapi/users` or `@myapi/users?limit=10`.
    reference: String,

    /// Destination address for the resolved document; '-' or omitted
    /// means stdout.
    #[arg(long = "to", default_value = "-")]
    to: String,

    /// Pretty-print the resolved document.
    #[arg(long)]
    pretty: bool,
}

fn main() {
    jn_toolkit::init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) if e.is_broken_pipe() => std::process::exit(jn_core::SIGPIPE_EXIT_CODE),
        Err(e) => jn_toolkit::fail(e),
    }
}

#[derive(Debug, thiserror::Error)]
enum ProfileCliError {
    #[error(transparent)]
    Address(#[from] jn_core::CoreError),
    #[error("'{0}' is not a profile reference (expected @namespace/name)")]
    NotAReference(String),
    #[error(transparent)]
    Profile(#[from] jn_profile::ProfileError),
    #[error(transparent)]
    Tool(#[from] jn_toolkit::ToolError),
}

impl ProfileCliError {
    /// See `jn_toolkit::ToolError::is_broken_pipe` (§4.A, §5, §7).
    fn is_broken_pipe(&self) -> bool {
        match self {
            ProfileCliError::Tool(e) => e.is_broken_pipe(),
            ProfileCliError::Address(e) => e.is_broken_pipe(),
            _ => false,
        }
    }
}

fn run(cli: Cli) -> Result<i32, ProfileCliError> {
    let address = Address::parse(&cli.reference)?;
    let (namespace, name) = match address.kind {
        AddressKind::ProfileRef => address.profile.clone().expect("ProfileRef always carries (ns, name)"),
        _ => return Err(ProfileCliError::NotAReference(cli.reference)),
    };

    let cwd = std::env::current_dir().unwrap_or_else(|_| ".".into());
    let store = ProfileStore::new(cwd);
    let resolved = store.resolve(&namespace, &name, &address.parameters)?;

    let registry = jn_toolkit::registry();
    let (output, output_pipeline) = jn_pipeline::open_write(&cli.to, &registry)?.into_writer();
    let mut output = output;
    let serialized =
        if cli.pretty { serde_json::to_string_pretty(&resolved) } else { serde_json::to_string(&resolved) }
            .expect("resolved profile document is always serializable");
    use std::io::Write;
    writeln!(output, "{serialized}").map_err(|e| ProfileCliError::Tool(jn_toolkit::ToolError::Io(e)))?;
    output.flush().map_err(|e| ProfileCliError::Tool(jn_toolkit::ToolError::Io(e)))?;

    match output_pipeline {
        Some(p) => Ok(p.wait().map_err(|e| ProfileCliError::Tool(jn_toolkit::ToolError::Exec(e)))?),
        None => Ok(0),
    }
}
