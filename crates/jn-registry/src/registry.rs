//! Registry query surface (§4.D).

use std::path::{Path, PathBuf};

use crate::cache::Cache;
use crate::discovery::{scan_all, Roots};
use crate::matcher::best_match;
use crate::plugin::{Mode, PluginRecord};

pub struct Registry {
    plugins: Vec<PluginRecord>,
    cache_path: PathBuf,
}

impl Registry {
    /// Scan all directory tiers starting from `start_dir` and build the
    /// in-memory index, using (and refreshing) the on-disk cache.
    pub fn build(start_dir: &Path, cache_path: PathBuf) -> Registry {
        let roots = Roots::discover(start_dir);
        let mut cache = Cache::load(&cache_path);
        let plugins = scan_all(&roots, &mut cache);
        if let Err(e) = cache.save(&cache_path) {
            tracing::warn!(path = %cache_path.display(), error = %e, "could not persist plugin cache");
        }
        Registry { plugins, cache_path }
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// `Registry::build` with the default cache location from §6's
    /// on-disk layout (`$JN_HOME/cache/plugins.json`), for callers (the
    /// tool binaries) that have no reason to override it.
    pub fn discover(start_dir: &Path) -> Registry {
        let jn_home = std::env::var("JN_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                std::env::current_exe()
                    .ok()
                    .and_then(|p| p.parent().map(|p| p.to_path_buf()))
                    .unwrap_or_else(|| PathBuf::from("."))
            });
        Registry::build(start_dir, jn_home.join("cache/plugins.json"))
    }

    /// Build a registry directly from an already-known plugin list, for
    /// callers (tests, or a future `--no-discovery` mode) that want to
    /// skip filesystem scanning entirely.
    pub fn from_plugins(plugins: Vec<PluginRecord>) -> Registry {
        Registry {
            plugins,
            cache_path: PathBuf::new(),
        }
    }

    pub fn find_by_name(&self, name: &str, mode: Mode) -> Option<&PluginRecord> {
        self.plugins.iter().find(|p| p.name == name && p.supports(mode))
    }

    pub fn matching(&self, source: &str, mode: Mode) -> Option<&PluginRecord> {
        best_match(self.plugins.iter(), source, mode)
    }

    pub fn plugins_with_mode(&self, mode: Mode) -> impl Iterator<Item = &PluginRecord> {
        self.plugins.iter().filter(move |p| p.supports(mode))
    }

    pub fn all(&self) -> &[PluginRecord] {
        &self.plugins
    }
}
