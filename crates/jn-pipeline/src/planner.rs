//! Translates an `Address` and a read/write `Direction` into an ordered
//! `PipelineSpec` (§4.F). Pure and synchronous: no subprocess is spawned
//! here, only plugin lookups against an already-built `Registry`.

use jn_core::{Address, AddressKind};
use jn_registry::{Mode, PluginRecord, Registry};

use crate::error::PlannerError;
use crate::spec::{Direction, IoShape, PipelineSpec, StageSpec, StageRole};

/// Strip the same trailing extensions `Address::parse` already recorded in
/// `compressions`, so the format stage is matched against the underlying
/// format extension (`data.csv` from `data.csv.gz`) rather than `.gz`.
fn strip_compression_suffixes(base: &str, compressions: &[String]) -> String {
    let mut stripped = base.to_string();
    for ext in compressions {
        let suffix = format!(".{ext}");
        if let Some(s) = stripped.strip_suffix(&suffix) {
            stripped = s.to_string();
        }
    }
    stripped
}

fn param_args(parameters: &[(String, String)]) -> Vec<String> {
    parameters.iter().map(|(k, v)| format!("--{k}={v}")).collect()
}

fn protocol_stage(protocol: &str, address: &Address, registry: &Registry) -> Result<StageSpec, PlannerError> {
    let plugin: &PluginRecord = registry
        .find_by_name(protocol, Mode::Raw)
        .ok_or_else(|| PlannerError::NoProtocolPlugin(protocol.to_string()))?;
    Ok(StageSpec {
        command: plugin.path.clone(),
        args: vec!["--mode=raw".to_string(), format!("--address={address}")],
        role: StageRole::Protocol,
        io_shape: IoShape::BytesToBytes,
    })
}

fn compression_stage(layer: &str, registry: &Registry, role: StageRole) -> Result<StageSpec, PlannerError> {
    let plugin = registry
        .find_by_name(layer, Mode::Raw)
        .ok_or_else(|| PlannerError::NoCompressionPlugin(layer.to_string()))?;
    Ok(StageSpec {
        command: plugin.path.clone(),
        args: vec!["--mode=raw".to_string()],
        role,
        io_shape: IoShape::BytesToBytes,
    })
}

fn format_stage(
    address: &Address,
    registry: &Registry,
    mode: Mode,
    io_shape: IoShape,
) -> Result<StageSpec, PlannerError> {
    let matched = match &address.format_override {
        Some(fmt) => registry
            .find_by_name(fmt, mode)
            .ok_or_else(|| PlannerError::NoFormatPlugin {
                source: fmt.clone(),
                mode: mode_name(mode),
            })?,
        None => {
            let stripped = strip_compression_suffixes(&address.base, &address.compressions);
            registry
                .matching(&stripped, mode)
                .ok_or_else(|| PlannerError::NoFormatPlugin {
                    source: stripped.clone(),
                    mode: mode_name(mode),
                })?
        }
    };
    let mut args = vec![format!("--mode={mode}")];
    args.extend(param_args(&address.parameters));
    Ok(StageSpec {
        command: matched.path.clone(),
        args,
        role: StageRole::Format,
        io_shape,
    })
}

fn mode_name(mode: Mode) -> &'static str {
    match mode {
        Mode::Read => "read",
        Mode::Write => "write",
        Mode::Raw => "raw",
        Mode::Profiles => "profiles",
    }
}

/// Plan the stage chain that turns `address` into a stream of records
/// (`Direction::Read`) or consumes a stream of records into `address`
/// (`Direction::Write`). Stdio and plain files need no stage at all for
/// their own sake: the caller binary reads/writes them directly, so an
/// address like `-` or `data.json` with `Direction::Read` produces a
/// pipeline of just the format stage (or none, if the format is already
/// NDJSON and no decompression is needed).
pub fn plan(address: &Address, direction: Direction, registry: &Registry) -> Result<PipelineSpec, PlannerError> {
    match direction {
        Direction::Read => plan_read(address, registry),
        Direction::Write => plan_write(address, registry),
    }
}

fn plan_read(address: &Address, registry: &Registry) -> Result<PipelineSpec, PlannerError> {
    let mut stages = Vec::new();

    if let Some(protocol) = &address.protocol {
        if address.kind == AddressKind::Url {
            stages.push(protocol_stage(protocol, address, registry)?);
        }
    }

    for layer in &address.compressions {
        stages.push(compression_stage(layer, registry, StageRole::Decompress)?);
    }

    if needs_format_stage(address) {
        stages.push(format_stage(address, registry, Mode::Read, IoShape::BytesToRecords)?);
    }

    let spec = PipelineSpec { stages };
    spec.validate().map_err(PlannerError::AmbiguousFormat)?;
    Ok(spec)
}

fn plan_write(address: &Address, registry: &Registry) -> Result<PipelineSpec, PlannerError> {
    let mut stages = Vec::new();

    if needs_format_stage(address) {
        stages.push(format_stage(address, registry, Mode::Write, IoShape::RecordsToBytes)?);
    }

    for layer in address.compressions.iter().rev() {
        stages.push(compression_stage(layer, registry, StageRole::Compress)?);
    }

    if let Some(protocol) = &address.protocol {
        if address.kind == AddressKind::Url {
            stages.push(protocol_stage(protocol, address, registry)?);
        }
    }

    let spec = PipelineSpec { stages };
    spec.validate().map_err(PlannerError::AmbiguousFormat)?;
    Ok(spec)
}

/// NDJSON is the wire format between `jn` tools themselves; an address
/// whose resolved format is exactly `ndjson`/`json-lines` with no explicit
/// override needs no format stage at all; everything else does.
fn needs_format_stage(address: &Address) -> bool {
    match &address.format_override {
        Some(fmt) => !is_ndjson_name(fmt),
        None => {
            if address.kind == AddressKind::Stdio {
                return false;
            }
            let stripped = strip_compression_suffixes(&address.base, &address.compressions);
            match stripped.rsplit('.').next() {
                Some(ext) => !is_ndjson_name(ext),
                None => true,
            }
        }
    }
}

fn is_ndjson_name(name: &str) -> bool {
    matches!(name, "ndjson" | "jsonl" | "jsonlines" | "json-lines")
}

#[cfg(test)]
mod tests {
    use super::*;
    use jn_registry::{PluginKind, Tier};
    use std::path::PathBuf;

    fn dummy_plugin(name: &str, modes: &[Mode]) -> PluginRecord {
        PluginRecord {
            name: name.to_string(),
            path: PathBuf::from(format!("/plugins/{name}")),
            kind: PluginKind::Native,
            patterns: vec![jn_registry::Pattern::normalize(&format!("*.{name}")).unwrap()],
            modes: modes.to_vec(),
            profile_type: None,
            bundled_profiles: Vec::new(),
            tier: Tier::Project,
            role: "format".to_string(),
        }
    }

    #[test]
    fn stdio_to_ndjson_needs_no_stage() {
        let address = Address::parse("-").unwrap();
        assert!(!needs_format_stage(&address));
    }

    #[test]
    fn csv_file_needs_a_format_stage() {
        let address = Address::parse("data.csv").unwrap();
        assert!(needs_format_stage(&address));
    }

    #[test]
    fn ndjson_extension_needs_no_stage() {
        let address = Address::parse("data.ndjson").unwrap();
        assert!(!needs_format_stage(&address));
    }

    #[test]
    fn compression_suffix_is_stripped_before_extension_check() {
        let address = Address::parse("data.ndjson.gz").unwrap();
        assert!(!needs_format_stage(&address));
    }

    #[test]
    fn csv_read_plans_a_single_format_stage() {
        let registry = Registry::from_plugins(vec![dummy_plugin("csv", &[Mode::Read, Mode::Write])]);
        let address = Address::parse("data.csv").unwrap();
        let plan = plan_read(&address, &registry).unwrap();
        assert_eq!(plan.stages.len(), 1);
        assert_eq!(plan.stages[0].role, StageRole::Format);
        assert_eq!(plan.stages[0].io_shape, IoShape::BytesToRecords);
    }

    #[test]
    fn gz_csv_read_plans_decompress_then_format_in_outer_to_inner_order() {
        let registry = Registry::from_plugins(vec![
            dummy_plugin("csv", &[Mode::Read, Mode::Write]),
            dummy_plugin("gz", &[Mode::Raw]),
        ]);
        let address = Address::parse("data.csv.gz").unwrap();
        let plan = plan_read(&address, &registry).unwrap();
        assert_eq!(plan.stages.len(), 2);
        assert_eq!(plan.stages[0].role, StageRole::Decompress);
        assert_eq!(plan.stages[1].role, StageRole::Format);
    }

    #[test]
    fn missing_format_plugin_is_reported() {
        let registry = Registry::from_plugins(vec![]);
        let address = Address::parse("data.csv").unwrap();
        assert!(matches!(
            plan_read(&address, &registry),
            Err(PlannerError::NoFormatPlugin { .. })
        ));
    }

    #[test]
    fn csv_write_plans_format_then_compress_in_inner_to_outer_order() {
        let registry = Registry::from_plugins(vec![
            dummy_plugin("csv", &[Mode::Read, Mode::Write]),
            dummy_plugin("gz", &[Mode::Raw]),
        ]);
        let address = Address::parse("out.csv.gz").unwrap();
        let plan = plan_write(&address, &registry).unwrap();
        assert_eq!(plan.stages.len(), 2);
        assert_eq!(plan.stages[0].role, StageRole::Format);
        assert_eq!(plan.stages[0].io_shape, IoShape::RecordsToBytes);
        assert_eq!(plan.stages[1].role, StageRole::Compress);
    }

    #[test]
    fn ndjson_write_to_stdout_needs_no_stages() {
        let registry = Registry::from_plugins(vec![]);
        let address = Address::parse("-").unwrap();
        let plan = plan_write(&address, &registry).unwrap();
        assert!(plan.is_empty());
    }
}
