//! Profile search, hierarchical merge, and caller-parameter application
//! (§4.C). Plugin-bundled and plugin-discovered profiles (search tiers 3
//! and 4) are reached through `PluginCatalog` rather than a direct
//! dependency on `jn-registry`, so discovery and profile resolution stay
//! decoupled the way `libs/pipeline` keeps `server-api` as its only
//! dependency on the plugin world.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::ProfileError;
use crate::interpolate::{interpolate_document, EnvLookup, SystemEnv};
use crate::merge::deep_merge;

pub trait PluginCatalog {
    fn bundled_profile(&self, namespace: &str, name: &str) -> Option<Value>;
    fn discover(&self, namespace: &str, url: &str) -> Vec<Value>;
}

pub struct NoPlugins;
impl PluginCatalog for NoPlugins {
    fn bundled_profile(&self, _namespace: &str, _name: &str) -> Option<Value> {
        None
    }
    fn discover(&self, _namespace: &str, _url: &str) -> Vec<Value> {
        Vec::new()
    }
}

pub struct ProfileStore<'a> {
    start_dir: PathBuf,
    user_root: Option<PathBuf>,
    catalog: &'a dyn PluginCatalog,
    env: &'a dyn EnvLookup,
}

static DEFAULT_ENV: SystemEnv = SystemEnv;
static DEFAULT_CATALOG: NoPlugins = NoPlugins;

impl<'a> ProfileStore<'a> {
    pub fn new(start_dir: impl Into<PathBuf>) -> Self {
        ProfileStore {
            start_dir: start_dir.into(),
            user_root: dirs::home_dir().map(|h| h.join(".local/jn/profiles")),
            catalog: &DEFAULT_CATALOG,
            env: &DEFAULT_ENV,
        }
    }

    pub fn with_catalog(mut self, catalog: &'a dyn PluginCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_env(mut self, env: &'a dyn EnvLookup) -> Self {
        self.env = env;
        self
    }

    /// Resolve `@namespace/name`, merging `caller_params` into the
    /// profile's `params` block (caller wins) after interpolation.
    pub fn resolve(
        &self,
        namespace: &str,
        name: &str,
        caller_params: &[(String, String)],
    ) -> Result<Value, ProfileError> {
        let mut doc = self.load_merged(namespace, name)?;
        interpolate_document(&mut doc, self.env)?;
        apply_caller_params(&mut doc, namespace, name, caller_params)?;
        Ok(doc)
    }

    fn load_merged(&self, namespace: &str, name: &str) -> Result<Value, ProfileError> {
        if let Some(root) = find_project_profiles_root(&self.start_dir, namespace, name) {
            return load_from_directory(&root, namespace, name);
        }
        if let Some(root) = &self.user_root {
            if profile_file_path(root, namespace, name).is_file() {
                return load_from_directory(root, namespace, name);
            }
        }
        if let Some(doc) = self.catalog.bundled_profile(namespace, name) {
            return Ok(doc);
        }
        Err(ProfileError::NotFound {
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }
}

fn profile_file_path(profiles_root: &Path, namespace: &str, name: &str) -> PathBuf {
    profiles_root.join(namespace).join(format!("{name}.json"))
}

/// Walk upward from `start_dir`, returning the first ancestor's
/// `.jn/profiles` directory that contains the requested profile.
fn find_project_profiles_root(start_dir: &Path, namespace: &str, name: &str) -> Option<PathBuf> {
    let mut dir = Some(start_dir.to_path_buf());
    while let Some(d) = dir {
        let candidate_root = d.join(".jn/profiles");
        if profile_file_path(&candidate_root, namespace, name).is_file() {
            return Some(candidate_root);
        }
        dir = d.parent().map(|p| p.to_path_buf());
    }
    None
}

/// Merge every `_meta.json` found from the profiles root down to the
/// namespace directory, shallowest first, then the leaf `<name>.json`.
fn load_from_directory(profiles_root: &Path, namespace: &str, name: &str) -> Result<Value, ProfileError> {
    let mut doc = Value::Object(Default::default());

    let top_meta = profiles_root.join("_meta.json");
    if top_meta.is_file() {
        deep_merge(&mut doc, &read_json(&top_meta)?);
    }
    let ns_meta = profiles_root.join(namespace).join("_meta.json");
    if ns_meta.is_file() {
        deep_merge(&mut doc, &read_json(&ns_meta)?);
    }

    let leaf_path = profile_file_path(profiles_root, namespace, name);
    let leaf = read_json(&leaf_path)?;
    deep_merge(&mut doc, &leaf);
    Ok(doc)
}

fn read_json(path: &Path) -> Result<Value, ProfileError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn apply_caller_params(
    doc: &mut Value,
    namespace: &str,
    name: &str,
    caller_params: &[(String, String)],
) -> Result<(), ProfileError> {
    if caller_params.is_empty() {
        return Ok(());
    }

    let allowed: Option<Vec<String>> = doc
        .get("params_schema")
        .and_then(|s| s.as_object())
        .map(|schema| schema.keys().cloned().collect());

    if let Some(allowed) = &allowed {
        for (k, _) in caller_params {
            if !allowed.contains(k) {
                return Err(ProfileError::UnknownParameter {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                    param: k.clone(),
                });
            }
        }
    }

    let obj = doc
        .as_object_mut()
        .ok_or_else(|| ProfileError::Malformed("profile document is not an object".into()))?;
    let params = obj
        .entry("params")
        .or_insert_with(|| Value::Object(Default::default()));
    let params_obj = params
        .as_object_mut()
        .ok_or_else(|| ProfileError::Malformed("'params' is not an object".into()))?;
    for (k, v) in caller_params {
        params_obj.insert(k.clone(), Value::String(v.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn s3_profile_substitution_end_to_end() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(
            &root.join(".jn/profiles/myapi/users.json"),
            r#"{"Authorization": "Bearer ${API_TOKEN}"}"#,
        );

        struct OneVar;
        impl EnvLookup for OneVar {
            fn get(&self, name: &str) -> Option<String> {
                if name == "API_TOKEN" { Some("abc".into()) } else { None }
            }
        }
        let env = OneVar;
        let store = ProfileStore::new(root).with_env(&env);
        let resolved = store.resolve("myapi", "users", &[]).unwrap();
        assert_eq!(resolved["Authorization"], "Bearer abc");
        assert!(!resolved.to_string().contains('$'));
    }

    #[test]
    fn meta_json_chain_merges_before_leaf() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(&root.join(".jn/profiles/_meta.json"), r#"{"timeout": 30, "shared": 1}"#);
        write(&root.join(".jn/profiles/http/_meta.json"), r#"{"timeout": 10}"#);
        write(&root.join(".jn/profiles/http/api.json"), r#"{"url": "https://x"}"#);

        let store = ProfileStore::new(root);
        let resolved = store.resolve("http", "api", &[]).unwrap();
        assert_eq!(resolved["timeout"], 10);
        assert_eq!(resolved["shared"], 1);
        assert_eq!(resolved["url"], "https://x");
    }

    #[test]
    fn caller_params_win_on_conflict() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(
            &root.join(".jn/profiles/db/main.json"),
            r#"{"params": {"limit": "10"}}"#,
        );
        let store = ProfileStore::new(root);
        let resolved = store
            .resolve("db", "main", &[("limit".to_string(), "99".to_string())])
            .unwrap();
        assert_eq!(resolved["params"]["limit"], "99");
    }

    #[test]
    fn closed_schema_rejects_unknown_params() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(
            &root.join(".jn/profiles/db/main.json"),
            r#"{"params_schema": {"limit": {"type": "integer"}}}"#,
        );
        let store = ProfileStore::new(root);
        let err = store
            .resolve("db", "main", &[("bogus".to_string(), "1".to_string())])
            .unwrap_err();
        assert!(matches!(err, ProfileError::UnknownParameter { .. }));
    }

    #[test]
    fn missing_profile_is_not_found() {
        let dir = tempdir().unwrap();
        let store = ProfileStore::new(dir.path());
        let err = store.resolve("nope", "nope", &[]).unwrap_err();
        assert!(matches!(err, ProfileError::NotFound { .. }));
    }
}
