//! `jn put`: write literal `key=value` fields into every record, parsing
//! each value as JSON when it parses and falling back to a plain string
//! otherwise (so `count=3` becomes a number but `name=3 little pigs`
//! stays a string).

use clap::Parser;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "jn-put")]
struct Cli {
    /// Source address; '-' or omitted means stdin.
    #[arg(default_value = "-")]
    source: String,

    /// Destination address; '-' or omitted means stdout.
    #[arg(long = "to", default_value = "-")]
    to: String,

    /// `key=value` field to set on every record; repeatable.
    #[arg(long = "set", value_parser = parse_field)]
    set: Vec<(String, Value)>,

    #[arg(long)]
    strict: bool,
}

fn parse_field(s: &str) -> Result<(String, Value), String> {
    let (key, raw) = s.split_once('=').ok_or_else(|| format!("'{s}' is not 'key=value'"))?;
    if key.is_empty() {
        return Err(format!("'{s}' has an empty key"));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
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
        let record = apply(record, &cli.set);
        endpoints.write_record(&record)?;
    }

    endpoints.finish()
}

fn apply(record: Value, set: &[(String, Value)]) -> Value {
    match record {
        Value::Object(mut map) => {
            for (k, v) in set {
                map.insert(k.clone(), v.clone());
            }
            Value::Object(map)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_value_parses_as_json() {
        let out = apply(json!({"a": 1}), &[("b".to_string(), json!(2))]);
        assert_eq!(out, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn unparseable_value_falls_back_to_string() {
        let (k, v) = parse_field("name=3 little pigs").unwrap();
        assert_eq!(k, "name");
        assert_eq!(v, json!("3 little pigs"));
    }

    #[test]
    fn non_object_record_passes_through_unchanged() {
        let out = apply(json!([1, 2]), &[("b".to_string(), json!(2))]);
        assert_eq!(out, json!([1, 2]));
    }
}
