//! Time builtins (§4.H). Component extractors operate on the piped-in
//! value (a timestamp string or epoch number), not on the wall clock;
//! `now`/`today`/`epoch`/`epoch_ms` read the wall clock and reject a
//! negative system clock by returning empty rather than wrapping.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde_json::Value;

pub fn dispatch(name: &str, input: &Value, args: &[Value]) -> Option<Vec<Value>> {
    match name {
        "now" => return Some(wall_clock().map(|dt| vec![Value::String(dt.to_rfc3339())]).unwrap_or_default()),
        "today" => {
            return Some(
                wall_clock()
                    .map(|dt| vec![Value::String(dt.date_naive().to_string())])
                    .unwrap_or_default(),
            )
        }
        "epoch" => return Some(wall_clock().map(|dt| vec![Value::from(dt.timestamp())]).unwrap_or_default()),
        "epoch_ms" => {
            return Some(wall_clock().map(|dt| vec![Value::from(dt.timestamp_millis())]).unwrap_or_default())
        }
        _ => {}
    }

    let dt = parse_time(input)?;
    let out = match name {
        "year" => vec![Value::from(dt.year() as i64)],
        "month" => vec![Value::from(dt.month() as i64)],
        "day" => vec![Value::from(dt.day() as i64)],
        "hour" => vec![Value::from(dt.hour() as i64)],
        "minute" => vec![Value::from(dt.minute() as i64)],
        "second" => vec![Value::from(dt.second() as i64)],
        "week" => vec![Value::from(dt.iso_week().week() as i64)],
        "weekday" => vec![Value::String(dt.format("%A").to_string())],
        "ago" => vec![Value::String(humanize_ago(dt)?)],
        "delta" => {
            let other = parse_time(args.first()?)?;
            vec![Value::from((dt - other).num_seconds())]
        }
        _ => return None,
    };
    Some(out)
}

fn wall_clock() -> Option<DateTime<Utc>> {
    let duration = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    DateTime::<Utc>::from_timestamp(duration.as_secs() as i64, duration.subsec_nanos())
}

fn parse_time(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::String(s) => DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => {
            let f = n.as_f64()?;
            if f < 0.0 {
                return None;
            }
            let (secs, nanos) = if f.abs() > 1e12 {
                ((f / 1000.0) as i64, (((f / 1000.0).fract()) * 1e9) as u32)
            } else {
                (f as i64, ((f.fract()) * 1e9) as u32)
            };
            DateTime::<Utc>::from_timestamp(secs, nanos)
        }
        _ => None,
    }
}

fn humanize_ago(dt: DateTime<Utc>) -> Option<String> {
    let now = wall_clock()?;
    let secs = (now - dt).num_seconds();
    if secs < 0 {
        return Some("in the future".to_string());
    }
    let text = match secs {
        0..=59 => "just now".to_string(),
        60..=3599 => format!("{}m ago", secs / 60),
        3600..=86399 => format!("{}h ago", secs / 3600),
        _ => format!("{}d ago", secs / 86400),
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn epoch_number_roundtrips_to_year() {
        let out = dispatch("year", &json!(1_700_000_000), &[]).unwrap();
        assert_eq!(out, vec![json!(2023)]);
    }

    #[test]
    fn rfc3339_string_extracts_components() {
        let out = dispatch("month", &json!("2024-03-15T10:00:00Z"), &[]).unwrap();
        assert_eq!(out, vec![json!(3)]);
    }

    #[test]
    fn negative_epoch_is_rejected_not_wrapped() {
        assert_eq!(dispatch("year", &json!(-5), &[]), None);
    }

    #[test]
    fn delta_computes_seconds_between_two_timestamps() {
        let out = dispatch(
            "delta",
            &json!("2024-01-01T00:01:40Z"),
            &[json!("2024-01-01T00:00:00Z")],
        )
        .unwrap();
        assert_eq!(out, vec![json!(100)]);
    }
}
