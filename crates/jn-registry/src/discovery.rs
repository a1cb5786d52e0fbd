//! Directory scanning and metadata extraction (§4.D, §6).

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::UNIX_EPOCH;

use crate::cache::Cache;
use crate::pattern::Pattern;
use crate::plugin::{Mode, PluginKind, PluginMeta, PluginRecord, Tier};

const SENTINEL: &str = "jn-meta:";

pub struct Roots {
    /// `(directory, tier)`, each containing `native/` and `scripted/`
    /// subdirectories. Scanned in the given order; callers should list
    /// project before user before system.
    pub tiers: Vec<(PathBuf, Tier)>,
}

impl Roots {
    /// Default search path: `JN_PLUGIN_PATH` entries (project tier,
    /// highest priority first), the first `.jn/plugins` found walking up
    /// from `start_dir`, `~/.local/jn/plugins`, and `$JN_HOME/plugins`.
    pub fn discover(start_dir: &Path) -> Roots {
        let mut tiers = Vec::new();

        if let Ok(extra) = std::env::var("JN_PLUGIN_PATH") {
            for entry in extra.split(':').filter(|s| !s.is_empty()) {
                tiers.push((PathBuf::from(entry), Tier::Project));
            }
        }

        let mut dir = Some(start_dir.to_path_buf());
        while let Some(d) = dir {
            let candidate = d.join(".jn/plugins");
            if candidate.is_dir() {
                tiers.push((candidate, Tier::Project));
                break;
            }
            dir = d.parent().map(|p| p.to_path_buf());
        }

        if let Some(home) = dirs::home_dir() {
            tiers.push((home.join(".local/jn/plugins"), Tier::User));
        }

        let jn_home = std::env::var("JN_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_jn_home());
        tiers.push((jn_home.join("plugins"), Tier::System));

        Roots { tiers }
    }
}

fn default_jn_home() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn scan_all(roots: &Roots, cache: &mut Cache) -> Vec<PluginRecord> {
    let mut out = Vec::new();
    for (root, tier) in &roots.tiers {
        out.extend(scan_kind(root, *tier, "native", PluginKind::Native, cache));
        out.extend(scan_kind(root, *tier, "scripted", PluginKind::Scripted, cache));
    }
    out
}

fn scan_kind(
    root: &Path,
    tier: Tier,
    subdir: &str,
    kind: PluginKind,
    cache: &mut Cache,
) -> Vec<PluginRecord> {
    let dir = root.join(subdir);
    if !dir.is_dir() {
        return Vec::new();
    }

    let mut out = Vec::new();
    let walker = walkdir::WalkDir::new(&dir).min_depth(1).max_depth(1);
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "could not read plugin directory");
                continue;
            }
        };
        let plugin_dir = entry.path().to_path_buf();
        if !plugin_dir.is_dir() {
            continue;
        }
        match find_candidate_file(&plugin_dir, kind) {
            Some(candidate) => {
                if let Some(record) = classify(&candidate, kind, tier, cache) {
                    out.push(record);
                }
            }
            None => {
                tracing::warn!(dir = %plugin_dir.display(), "no candidate plugin file found");
            }
        }
    }
    out
}

fn find_candidate_file(plugin_dir: &Path, kind: PluginKind) -> Option<PathBuf> {
    let mut entries: Vec<PathBuf> = walkdir::WalkDir::new(plugin_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .flatten()
        .map(|e| e.path().to_path_buf())
        .filter(|p| p.is_file())
        .filter(|p| p.file_name().and_then(|n| n.to_str()).map(|n| !n.starts_with('.')).unwrap_or(false))
        .collect();
    entries.sort();

    match kind {
        PluginKind::Native => entries.into_iter().find(|p| is_executable(p)),
        PluginKind::Scripted => entries.into_iter().find(|p| {
            p.extension().and_then(|e| e.to_str()) != Some("json")
        }),
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("exe")
}

fn mtime_nanos(path: &Path) -> Option<i128> {
    let meta = std::fs::metadata(path).ok()?;
    let modified = meta.modified().ok()?;
    modified.duration_since(UNIX_EPOCH).ok().map(|d| d.as_nanos() as i128)
}

fn classify(
    candidate: &Path,
    kind: PluginKind,
    tier: Tier,
    cache: &mut Cache,
) -> Option<PluginRecord> {
    let abs_path = std::fs::canonicalize(candidate).unwrap_or_else(|_| candidate.to_path_buf());
    let abs_str = abs_path.to_string_lossy().to_string();
    let mtime = mtime_nanos(&abs_path)?;

    let meta = if let Some(cached) = cache.get(&abs_str, mtime) {
        cached.clone()
    } else {
        let fresh = match kind {
            PluginKind::Native => extract_native_meta(&abs_path),
            PluginKind::Scripted => extract_scripted_meta(&abs_path),
        };
        let meta = match fresh {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(path = %abs_path.display(), error = %e, "dropping plugin: metadata extraction failed");
                return None;
            }
        };
        cache.insert(abs_str, mtime, meta.clone());
        meta
    };

    let patterns = meta
        .patterns
        .iter()
        .filter_map(|p| match Pattern::normalize(p) {
            Ok(pat) => Some(pat),
            Err(e) => {
                tracing::warn!(pattern = %p, error = %e, "dropping invalid pattern");
                None
            }
        })
        .collect();

    Some(PluginRecord {
        name: meta.name,
        path: abs_path,
        kind,
        patterns,
        modes: meta.modes,
        profile_type: meta.profile_type,
        bundled_profiles: meta.bundled_profiles,
        tier,
        role: meta.role,
    })
}

fn extract_native_meta(path: &Path) -> Result<PluginMeta, String> {
    let output = Command::new(path)
        .arg("--meta")
        .output()
        .map_err(|e| format!("spawn failed: {e}"))?;
    if !output.status.success() {
        return Err(format!("exited with {}", output.status));
    }
    let meta: PluginMeta =
        serde_json::from_slice(&output.stdout).map_err(|e| format!("invalid --meta JSON: {e}"))?;
    meta.validate()?;
    Ok(meta)
}

fn extract_scripted_meta(path: &Path) -> Result<PluginMeta, String> {
    let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let line = content
        .lines()
        .find(|l| l.contains(SENTINEL))
        .ok_or_else(|| format!("no '{SENTINEL}' sentinel found"))?;
    let json_start = line.find(SENTINEL).unwrap() + SENTINEL.len();
    let meta: PluginMeta =
        serde_json::from_str(line[json_start..].trim()).map_err(|e| format!("invalid sentinel JSON: {e}"))?;
    meta.validate()?;
    Ok(meta)
}

pub fn mode_from_any(modes: &[&str]) -> Vec<Mode> {
    modes.iter().filter_map(|m| m.parse().ok()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    fn make_executable(path: &Path) {
        let mut perm = fs::metadata(path).unwrap().permissions();
        perm.set_mode(0o755);
        fs::set_permissions(path, perm).unwrap();
    }

    #[test]
    fn scripted_plugin_parsed_without_execution() {
        let dir = tempdir().unwrap();
        let plugin_dir = dir.path().join("scripted/csv");
        fs::create_dir_all(&plugin_dir).unwrap();
        let script = plugin_dir.join("run.sh");
        fs::write(
            &script,
            "#!/bin/sh\n# jn-meta: {\"name\":\"csv\",\"patterns\":[\"*.csv\"],\"role\":\"format\",\"modes\":[\"read\",\"write\"]}\necho hi\n",
        )
        .unwrap();

        let mut cache = Cache::default();
        let roots = Roots {
            tiers: vec![(dir.path().to_path_buf(), Tier::Project)],
        };
        let plugins = scan_all(&roots, &mut cache);
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].name, "csv");
        assert_eq!(plugins[0].kind, PluginKind::Scripted);
    }

    #[test]
    fn native_plugin_meta_failure_is_dropped_not_fatal() {
        let dir = tempdir().unwrap();
        let plugin_dir = dir.path().join("native/broken");
        fs::create_dir_all(&plugin_dir).unwrap();
        let bin = plugin_dir.join("broken");
        fs::write(&bin, "#!/bin/sh\nexit 1\n").unwrap();
        make_executable(&bin);

        let mut cache = Cache::default();
        let roots = Roots {
            tiers: vec![(dir.path().to_path_buf(), Tier::Project)],
        };
        let plugins = scan_all(&roots, &mut cache);
        assert!(plugins.is_empty());
    }

    #[test]
    fn unreadable_directory_does_not_abort_scan() {
        let dir = tempdir().unwrap();
        let roots = Roots {
            tiers: vec![(dir.path().join("does-not-exist"), Tier::Project)],
        };
        let mut cache = Cache::default();
        let plugins = scan_all(&roots, &mut cache);
        assert!(plugins.is_empty());
    }
}
