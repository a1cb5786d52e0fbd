//! Address parsing (§3, §4.B). Pure, no I/O: a source/destination string in,
//! an immutable `Address` out.

use std::fmt;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Stdio,
    File,
    Glob,
    Url,
    ProfileRef,
}

const COMPRESSION_EXTENSIONS: &[&str] = &["gz", "bz2", "xz"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub raw: String,
    pub kind: AddressKind,
    pub protocol: Option<String>,
    pub base: String,
    pub format_override: Option<String>,
    /// Ordered `?k=v` pairs, percent-decoded.
    pub parameters: Vec<(String, String)>,
    /// Outer-to-inner compression layers inferred from trailing extensions
    /// of `base` (after the format override has been removed).
    pub compressions: Vec<String>,
    /// `(namespace, name)` when `kind == ProfileRef`.
    pub profile: Option<(String, String)>,
}

impl Address {
    pub fn parse(raw: &str) -> Result<Address, CoreError> {
        if let Some(rest) = raw.strip_prefix('@') {
            return parse_profile_ref(raw, rest);
        }

        if raw.is_empty() || raw == "-" {
            return Ok(Address {
                raw: raw.to_string(),
                kind: AddressKind::Stdio,
                protocol: None,
                base: "-".to_string(),
                format_override: None,
                parameters: Vec::new(),
                compressions: Vec::new(),
                profile: None,
            });
        }

        let (protocol, rest) = match raw.find("://") {
            Some(pos) => (Some(raw[..pos].to_string()), &raw[pos + 3..]),
            None => (None, raw),
        };

        let (pre_query, query_str) = match rest.find('?') {
            Some(pos) => (&rest[..pos], &rest[pos + 1..]),
            None => (rest, ""),
        };

        let (base, format_override) = match pre_query.rfind('~') {
            Some(pos) => {
                let ov = &pre_query[pos + 1..];
                if ov.is_empty() {
                    return Err(CoreError::address(format!(
                        "empty format override in address '{raw}'"
                    )));
                }
                (pre_query[..pos].to_string(), Some(ov.to_string()))
            }
            None => (pre_query.to_string(), None),
        };

        if base.is_empty() && protocol.is_none() {
            return Ok(Address {
                raw: raw.to_string(),
                kind: AddressKind::Stdio,
                protocol: None,
                base: "-".to_string(),
                format_override,
                parameters: parse_query(query_str)?,
                compressions: Vec::new(),
                profile: None,
            });
        }

        let compressions = peel_compressions(&base);
        let parameters = parse_query(query_str)?;

        let kind = if protocol.is_some() {
            AddressKind::Url
        } else if is_glob(&base) {
            AddressKind::Glob
        } else {
            AddressKind::File
        };

        Ok(Address {
            raw: raw.to_string(),
            kind,
            protocol,
            base,
            format_override,
            parameters,
            compressions,
            profile: None,
        })
    }
}

fn parse_profile_ref(raw: &str, rest: &str) -> Result<Address, CoreError> {
    let slash = rest.find('/').ok_or_else(|| {
        CoreError::address(format!("profile reference '{raw}' is missing a namespace/name separator"))
    })?;
    let namespace = &rest[..slash];
    let after_ns = &rest[slash + 1..];
    let (name, query_str) = match after_ns.find('?') {
        Some(pos) => (&after_ns[..pos], &after_ns[pos + 1..]),
        None => (after_ns, ""),
    };
    if namespace.is_empty() || name.is_empty() {
        return Err(CoreError::address(format!(
            "profile reference '{raw}' has an empty namespace or name"
        )));
    }
    Ok(Address {
        raw: raw.to_string(),
        kind: AddressKind::ProfileRef,
        protocol: None,
        base: name.to_string(),
        format_override: None,
        parameters: parse_query(query_str)?,
        compressions: Vec::new(),
        profile: Some((namespace.to_string(), name.to_string())),
    })
}

/// Scan (without mutating) the trailing extensions of `base`, peeling
/// outer-most first so the result is already in outer→inner order.
fn peel_compressions(base: &str) -> Vec<String> {
    let mut layers = Vec::new();
    let mut cursor = base;
    loop {
        let mut matched = None;
        for ext in COMPRESSION_EXTENSIONS {
            let suffix = format!(".{ext}");
            if cursor.len() > suffix.len() && cursor.ends_with(&suffix) {
                matched = Some((*ext, suffix.len()));
                break;
            }
        }
        match matched {
            Some((ext, len)) => {
                layers.push(ext.to_string());
                cursor = &cursor[..cursor.len() - len];
            }
            None => break,
        }
    }
    layers
}

fn is_glob(base: &str) -> bool {
    let bytes = base.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'*' | b'?' => return true,
            _ => i += 1,
        }
    }
    false
}

fn parse_query(query: &str) -> Result<Vec<(String, String)>, CoreError> {
    if query.is_empty() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (k, v) = match pair.find('=') {
            Some(pos) => (&pair[..pos], &pair[pos + 1..]),
            None => (pair, ""),
        };
        out.push((k.to_string(), percent_decode(v)?));
    }
    Ok(out)
}

fn percent_decode(s: &str) -> Result<String, CoreError> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .and_then(|h| std::str::from_utf8(h).ok())
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .ok_or_else(|| CoreError::address(format!("invalid percent-escape in '{s}'")))?;
                out.push(hex);
                i += 3;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).map_err(|e| CoreError::address(e.to_string()))
}

fn percent_encode_value(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some((ns, name)) = &self.profile {
            write!(f, "@{ns}/{name}")?;
        } else {
            if let Some(p) = &self.protocol {
                write!(f, "{p}://")?;
            }
            write!(f, "{}", self.base)?;
            if let Some(fmt_override) = &self.format_override {
                write!(f, "~{fmt_override}")?;
            }
        }
        if !self.parameters.is_empty() {
            f.write_str("?")?;
            for (i, (k, v)) in self.parameters.iter().enumerate() {
                if i > 0 {
                    f.write_str("&")?;
                }
                write!(f, "{k}={}", percent_encode_value(v))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdio_dash() {
        let a = Address::parse("-").unwrap();
        assert_eq!(a.kind, AddressKind::Stdio);
        assert_eq!(a.base, "-");
    }

    #[test]
    fn s2_format_override_and_compression() {
        let a = Address::parse("data.txt.gz~csv?delimiter=;").unwrap();
        assert_eq!(a.kind, AddressKind::File);
        assert_eq!(a.base, "data.txt.gz");
        assert_eq!(a.format_override.as_deref(), Some("csv"));
        assert_eq!(a.compressions, vec!["gz".to_string()]);
        assert_eq!(a.parameters, vec![("delimiter".to_string(), ";".to_string())]);
    }

    #[test]
    fn multi_layer_compression_is_outer_to_inner() {
        let a = Address::parse("data.csv.gz.bz2").unwrap();
        assert_eq!(a.compressions, vec!["bz2".to_string(), "gz".to_string()]);
    }

    #[test]
    fn empty_override_is_invalid() {
        assert!(Address::parse("data.csv~").is_err());
    }

    #[test]
    fn multiple_tildes_take_the_last() {
        let a = Address::parse("a~b~json").unwrap();
        assert_eq!(a.base, "a~b");
        assert_eq!(a.format_override.as_deref(), Some("json"));
    }

    #[test]
    fn glob_detection() {
        let a = Address::parse("logs/*.json").unwrap();
        assert_eq!(a.kind, AddressKind::Glob);
    }

    #[test]
    fn url_scheme_and_params() {
        let a = Address::parse("http://example.com/data?limit=10").unwrap();
        assert_eq!(a.protocol.as_deref(), Some("http"));
        assert_eq!(a.kind, AddressKind::Url);
        assert_eq!(a.parameters, vec![("limit".to_string(), "10".to_string())]);
    }

    #[test]
    fn profile_ref_with_params() {
        let a = Address::parse("@myapi/users?limit=5").unwrap();
        assert_eq!(a.kind, AddressKind::ProfileRef);
        assert_eq!(a.profile, Some(("myapi".to_string(), "users".to_string())));
        assert_eq!(a.parameters, vec![("limit".to_string(), "5".to_string())]);
    }

    #[test]
    fn nested_profile_name_with_slashes() {
        let a = Address::parse("@ns/path/to/name").unwrap();
        assert_eq!(a.profile, Some(("ns".to_string(), "path/to/name".to_string())));
    }

    #[test]
    fn round_trip_preserves_internal_form() {
        for raw in [
            "-",
            "data.txt.gz~csv?delimiter=%3B",
            "http://example.com/data?limit=10",
            "@myapi/users?limit=5",
            "plain/path.json",
        ] {
            let a = Address::parse(raw).unwrap();
            let reserialized = a.to_string();
            let b = Address::parse(&reserialized).unwrap();
            assert_eq!(a.kind, b.kind, "raw={raw}");
            assert_eq!(a.protocol, b.protocol, "raw={raw}");
            assert_eq!(a.base, b.base, "raw={raw}");
            assert_eq!(a.format_override, b.format_override, "raw={raw}");
            assert_eq!(a.parameters, b.parameters, "raw={raw}");
            assert_eq!(a.compressions, b.compressions, "raw={raw}");
            assert_eq!(a.profile, b.profile, "raw={raw}");
        }
    }
}
