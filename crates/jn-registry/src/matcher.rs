//! Pattern matcher (§4.E): choose the best plugin for `(source, mode)`.

use std::cmp::Reverse;

use crate::plugin::{Mode, PluginKind, PluginRecord};

/// Among plugins supporting `mode`, return the best match for `source`
/// ordered by `(specificity, tier, kind, name)` — highest specificity
/// wins, ties broken by directory tier (project > user > system), then
/// plugin kind (native > scripted), then the lexicographically smallest
/// name (§8 property 7).
pub fn best_match<'a>(
    plugins: impl Iterator<Item = &'a PluginRecord>,
    source: &str,
    mode: Mode,
) -> Option<&'a PluginRecord> {
    plugins
        .filter(|p| p.supports(mode))
        .flat_map(|p| p.patterns.iter().map(move |pat| (p, pat)))
        .filter(|(_, pat)| pat.matches(source))
        .max_by_key(|(p, pat)| {
            let kind_rank = match p.kind {
                PluginKind::Native => 1u8,
                PluginKind::Scripted => 0u8,
            };
            (pat.specificity, p.tier, kind_rank, Reverse(p.name.clone()))
        })
        .map(|(p, _)| p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Pattern;
    use crate::plugin::Tier;
    use std::path::PathBuf;

    fn plugin(name: &str, kind: PluginKind, tier: Tier, patterns: &[&str]) -> PluginRecord {
        PluginRecord {
            name: name.to_string(),
            path: PathBuf::from(name),
            kind,
            patterns: patterns.iter().map(|p| Pattern::normalize(p).unwrap()).collect(),
            modes: vec![Mode::Read],
            profile_type: None,
            bundled_profiles: Vec::new(),
            tier,
            role: "format".to_string(),
        }
    }

    #[test]
    fn higher_specificity_wins() {
        let short = plugin("short", PluginKind::Native, Tier::System, &["*.gz"]);
        let long = plugin("long", PluginKind::Native, Tier::System, &["*.tar.gz"]);
        let plugins = vec![short, long];
        let picked = best_match(plugins.iter(), "archive.tar.gz", Mode::Read).unwrap();
        assert_eq!(picked.name, "long");
    }

    #[test]
    fn tier_breaks_ties_before_kind() {
        let system = plugin("sys", PluginKind::Native, Tier::System, &["*.csv"]);
        let project = plugin("proj", PluginKind::Scripted, Tier::Project, &["*.csv"]);
        let plugins = vec![system, project];
        let picked = best_match(plugins.iter(), "a.csv", Mode::Read).unwrap();
        assert_eq!(picked.name, "proj");
    }

    #[test]
    fn native_beats_scripted_at_same_tier() {
        let scripted = plugin("scripted", PluginKind::Scripted, Tier::User, &["*.csv"]);
        let native = plugin("native", PluginKind::Native, Tier::User, &["*.csv"]);
        let plugins = vec![scripted, native];
        let picked = best_match(plugins.iter(), "a.csv", Mode::Read).unwrap();
        assert_eq!(picked.name, "native");
    }

    #[test]
    fn name_tie_break_is_smallest() {
        let b = plugin("bbb", PluginKind::Native, Tier::User, &["*.csv"]);
        let a = plugin("aaa", PluginKind::Native, Tier::User, &["*.csv"]);
        let plugins = vec![b, a];
        let picked = best_match(plugins.iter(), "a.csv", Mode::Read).unwrap();
        assert_eq!(picked.name, "aaa");
    }

    #[test]
    fn mode_filters_candidates() {
        let mut writer = plugin("writer", PluginKind::Native, Tier::User, &["*.csv"]);
        writer.modes = vec![Mode::Write];
        let plugins = vec![writer];
        assert!(best_match(plugins.iter(), "a.csv", Mode::Read).is_none());
    }
}
