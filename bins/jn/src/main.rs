//! The orchestrator dispatcher (§6 "Orchestrator CLI"). Maps the first
//! positional argument to a tool, forwarding all remaining arguments
//! unchanged; unrecognized verbs fall through to an external `jn-<verb>`
//! on `PATH`.

use std::env;
use std::process::Command;

const BUILTIN_TOOLS: &[(&str, &str)] = &[
    ("cat", "jn-cat — pass records through unchanged, across addresses"),
    ("put", "jn-put — set literal fields on every record"),
    ("filter", "jn-filter — keep/transform records via an expression"),
    ("head", "jn-head — emit the first N records"),
    ("tail", "jn-tail — emit the last N records"),
    ("join", "jn-join — hash join against a right-side source"),
    ("merge", "jn-merge — concatenate multiple sources in order"),
    ("profile", "jn-profile — resolve a @namespace/name profile reference"),
    ("plugin", "jn-plugin — inspect the discovered plugin registry"),
];

/// Named by §6 but out of scope per §1; routed to an external plugin if
/// one is found on `PATH`, erroring otherwise.
const OUT_OF_SCOPE_TOOLS: &[&str] = &["inspect", "analyze", "table"];

fn main() {
    jn_toolkit::init_tracing();
    let mut args = env::args();
    let _argv0 = args.next();
    let rest: Vec<String> = args.collect();

    match rest.split_first() {
        None => {
            print_help();
            std::process::exit(2);
        }
        Some((verb, tail)) if verb.as_str() == "--help" || verb.as_str() == "-h" => {
            let _ = tail;
            print_help();
            std::process::exit(0);
        }
        Some((verb, _)) if verb.as_str() == "--version" => {
            println!("jn {}", env!("CARGO_PKG_VERSION"));
            std::process::exit(0);
        }
        Some((verb, tail)) => std::process::exit(dispatch(verb, tail)),
    }
}

fn print_help() {
    println!("jn <tool> [args...]\n");
    println!("Built-in tools:");
    for (name, description) in BUILTIN_TOOLS {
        println!("  {name:<8} {description}");
    }
    println!("\n{} are named but out of scope; routed to an external jn-<name> if present.", OUT_OF_SCOPE_TOOLS.join(", "));
}

fn dispatch(verb: &str, tail: &[String]) -> i32 {
    if !BUILTIN_TOOLS.iter().any(|(name, _)| *name == verb) && !OUT_OF_SCOPE_TOOLS.contains(&verb) {
        eprintln!("Error: unknown tool '{verb}'");
        return 2;
    }

    let binary_name = format!("jn-{verb}");
    let exe = match resolve_binary(&binary_name) {
        Some(path) => path,
        None => {
            eprintln!("Error: no '{binary_name}' tool found on PATH");
            return 2;
        }
    };

    tracing::debug!(tool = %binary_name, "dispatching");
    match Command::new(exe).args(tail).status() {
        Ok(status) => status.code().unwrap_or(1),
        Err(e) => {
            eprintln!("Error: failed to run '{binary_name}': {e}");
            1
        }
    }
}

/// Prefer a sibling binary next to this executable (the built-in tools
/// are always installed alongside the dispatcher); fall back to `PATH`
/// for out-of-scope verbs served by an external plugin.
fn resolve_binary(name: &str) -> Option<std::path::PathBuf> {
    if let Ok(exe) = env::current_exe() {
        if let Some(dir) = exe.parent() {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    env::var_os("PATH").and_then(|paths| {
        env::split_paths(&paths).map(|dir| dir.join(name)).find(|candidate| candidate.is_file())
    })
}
