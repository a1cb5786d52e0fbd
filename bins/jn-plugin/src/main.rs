//! `jn plugin`: inspect the discovered plugin registry (§4.D, §4.E, §6).

use std::io::{self, Write};
use std::str::FromStr;

use clap::{Parser, Subcommand};
use jn_registry::{Mode, PluginRecord};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "jn-plugin")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every discovered plugin, one NDJSON descriptor per line.
    List {
        /// Restrict to plugins supporting this mode (read|write|raw|profiles).
        #[arg(long)]
        mode: Option<String>,
    },
    /// Print a single plugin's full descriptor.
    Info { name: String },
    /// Show which plugin would be chosen for an address and mode.
    Which {
        source: String,
        #[arg(long, default_value = "read")]
        mode: String,
    },
}

fn main() {
    jn_toolkit::init_tracing();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        jn_toolkit::fail(e);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let registry = jn_toolkit::registry();

    match cli.command {
        Command::List { mode } => {
            let mode = mode.as_deref().map(Mode::from_str).transpose()?;
            let stdout = io::stdout();
            let mut out = stdout.lock();
            for plugin in registry.all() {
                if mode.is_none_or(|m| plugin.supports(m)) {
                    if let Err(e) = writeln!(out, "{}", descriptor(plugin)) {
                        if e.kind() == io::ErrorKind::BrokenPipe {
                            std::process::exit(jn_core::SIGPIPE_EXIT_CODE);
                        }
                        return Err(e.to_string());
                    }
                }
            }
        }
        Command::Info { name } => {
            let plugin = registry
                .all()
                .iter()
                .find(|p| p.name == name)
                .ok_or_else(|| format!("no plugin named '{name}'"))?;
            println!("{}", serde_json::to_string_pretty(&descriptor(plugin)).unwrap());
        }
        Command::Which { source, mode } => {
            let mode = Mode::from_str(&mode)?;
            match registry.matching(&source, mode) {
                Some(plugin) => println!("{}", plugin.name),
                None => return Err(format!("no plugin matches '{source}' for mode '{mode}'")),
            }
        }
    }
    Ok(())
}

fn descriptor(plugin: &PluginRecord) -> Value {
    json!({
        "name": plugin.name,
        "path": plugin.path.display().to_string(),
        "kind": match plugin.kind {
            jn_registry::PluginKind::Native => "native",
            jn_registry::PluginKind::Scripted => "scripted",
        },
        "role": plugin.role,
        "patterns": plugin.patterns.iter().map(|p| p.source.clone()).collect::<Vec<_>>(),
        "modes": plugin.modes.iter().map(|m| m.to_string()).collect::<Vec<_>>(),
        "profile_type": plugin.profile_type,
        "bundled_profiles": plugin.bundled_profiles,
        "tier": match plugin.tier {
            jn_registry::Tier::Project => "project",
            jn_registry::Tier::User => "user",
            jn_registry::Tier::System => "system",
        },
    })
}
