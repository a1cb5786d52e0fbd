//! On-disk plugin metadata cache (§4.D, §6: `$JN_HOME/cache/plugins.json`).
//! Keyed by absolute path with the file's mtime embedded; a cached entry
//! is reused only when the mtime is exactly equal, so a clock adjustment
//! can never cause a stale entry to look fresh (§9, Open Question 3).

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::plugin::PluginMeta;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub mtime_unix_nanos: i128,
    pub meta: PluginMeta,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Cache {
    entries: HashMap<String, CacheEntry>,
}

impl Cache {
    /// Load the cache file. A malformed cache is discarded and rebuilt
    /// rather than treated as fatal (§4.D failure taxonomy).
    pub fn load(path: &Path) -> Cache {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "discarding corrupt plugin cache");
                Cache::default()
            }),
            Err(_) => Cache::default(),
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, content)
    }

    pub fn get(&self, abs_path: &str, mtime_unix_nanos: i128) -> Option<&PluginMeta> {
        self.entries
            .get(abs_path)
            .filter(|e| e.mtime_unix_nanos == mtime_unix_nanos)
            .map(|e| &e.meta)
    }

    pub fn insert(&mut self, abs_path: String, mtime_unix_nanos: i128, meta: PluginMeta) {
        self.entries.insert(abs_path, CacheEntry { mtime_unix_nanos, meta });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn meta() -> PluginMeta {
        PluginMeta {
            name: "csv".into(),
            version: "1.0".into(),
            patterns: vec!["*.csv".into()],
            role: "format".into(),
            modes: vec![crate::plugin::Mode::Read],
            profile_type: None,
            bundled_profiles: Vec::new(),
        }
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plugins.json");
        let mut cache = Cache::default();
        cache.insert("/bin/csv".into(), 123, meta());
        cache.save(&path).unwrap();

        let loaded = Cache::load(&path);
        assert!(loaded.get("/bin/csv", 123).is_some());
        assert!(loaded.get("/bin/csv", 124).is_none());
    }

    #[test]
    fn corrupt_cache_is_discarded_not_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plugins.json");
        std::fs::write(&path, b"not json").unwrap();
        let loaded = Cache::load(&path);
        assert!(loaded.get("/bin/csv", 123).is_none());
    }
}
