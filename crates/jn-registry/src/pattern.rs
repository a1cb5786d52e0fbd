//! Pattern normalization and matching (§3, §4.E). Deliberately not a
//! general regex engine: the small fixed set of shapes below covers the
//! vast majority of plugin patterns at O(pattern-length) per test, which
//! is why only the `regex` tag pays for a real regex compile.

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternTag {
    Extension,
    Prefix,
    Suffix,
    Contains,
    Regex,
}

#[derive(Debug, Clone)]
pub struct Pattern {
    pub source: String,
    pub tag: PatternTag,
    pub literal: String,
    pub specificity: usize,
    compiled: Option<Regex>,
}

impl Pattern {
    /// Normalize a plugin-declared pattern string into a tagged literal.
    ///
    /// - `/re/`            → `Regex`, compiled eagerly (rare, pays the cost)
    /// - `*.ext`            → `Extension`
    /// - `prefix*`          → `Prefix`
    /// - `*suffix`          → `Suffix`
    /// - anything else containing `*` → `Contains` (stars stripped)
    /// - a bare literal      → `Contains` (substring match)
    pub fn normalize(source: &str) -> Result<Pattern, String> {
        let specificity = source.len();

        if source.len() >= 2 && source.starts_with('/') && source.ends_with('/') {
            let body = &source[1..source.len() - 1];
            let compiled = Regex::new(body).map_err(|e| e.to_string())?;
            return Ok(Pattern {
                source: source.to_string(),
                tag: PatternTag::Regex,
                literal: body.to_string(),
                specificity,
                compiled: Some(compiled),
            });
        }

        if let Some(ext) = source.strip_prefix("*.") {
            if !ext.contains('*') {
                return Ok(Pattern {
                    source: source.to_string(),
                    tag: PatternTag::Extension,
                    literal: ext.to_string(),
                    specificity,
                    compiled: None,
                });
            }
        }

        if let Some(prefix) = source.strip_suffix('*') {
            if !prefix.is_empty() && !prefix.contains('*') {
                return Ok(Pattern {
                    source: source.to_string(),
                    tag: PatternTag::Prefix,
                    literal: prefix.to_string(),
                    specificity,
                    compiled: None,
                });
            }
        }

        if let Some(suffix) = source.strip_prefix('*') {
            if !suffix.is_empty() && !suffix.contains('*') {
                return Ok(Pattern {
                    source: source.to_string(),
                    tag: PatternTag::Suffix,
                    literal: suffix.to_string(),
                    specificity,
                    compiled: None,
                });
            }
        }

        Ok(Pattern {
            source: source.to_string(),
            tag: PatternTag::Contains,
            literal: source.replace('*', ""),
            specificity,
            compiled: None,
        })
    }

    pub fn matches(&self, candidate: &str) -> bool {
        match self.tag {
            PatternTag::Extension => candidate.ends_with(&format!(".{}", self.literal)),
            PatternTag::Prefix => candidate.starts_with(&self.literal),
            PatternTag::Suffix => candidate.ends_with(&self.literal),
            PatternTag::Contains => candidate.contains(&self.literal),
            PatternTag::Regex => self
                .compiled
                .as_ref()
                .map(|re| re.is_match(candidate))
                .unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_pattern() {
        let p = Pattern::normalize("*.csv").unwrap();
        assert_eq!(p.tag, PatternTag::Extension);
        assert!(p.matches("data.csv"));
        assert!(!p.matches("data.csvx"));
        assert_eq!(p.specificity, 5);
    }

    #[test]
    fn prefix_pattern() {
        let p = Pattern::normalize("http://*").unwrap();
        assert_eq!(p.tag, PatternTag::Prefix);
        assert!(p.matches("http://example.com"));
        assert!(!p.matches("https://example.com"));
    }

    #[test]
    fn suffix_pattern() {
        let p = Pattern::normalize("*.tar.gz").unwrap();
        assert!(p.matches("archive.tar.gz"));
    }

    #[test]
    fn regex_pattern() {
        let p = Pattern::normalize("/^data-\\d+\\.json$/").unwrap();
        assert_eq!(p.tag, PatternTag::Regex);
        assert!(p.matches("data-42.json"));
        assert!(!p.matches("data-x.json"));
    }

    #[test]
    fn bare_literal_is_contains() {
        let p = Pattern::normalize("duckdb").unwrap();
        assert_eq!(p.tag, PatternTag::Contains);
        assert!(p.matches("duckdb://local.db"));
    }
}
