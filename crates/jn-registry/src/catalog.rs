//! Bridges the plugin registry to `jn_profile::PluginCatalog` (§4.C tiers
//! 3 and 4), invoking a plugin's `profiles` mode over the CLI contract
//! (§6) rather than pulling `jn-profile` into the discovery layer itself.

use std::process::Command;

use jn_profile::PluginCatalog;
use serde_json::Value;

use crate::plugin::Mode;
use crate::registry::Registry;

impl PluginCatalog for Registry {
    fn bundled_profile(&self, namespace: &str, name: &str) -> Option<Value> {
        let plugin = self
            .plugins_with_mode(Mode::Profiles)
            .find(|p| p.profile_type.as_deref() == Some(namespace))?;
        let output = Command::new(&plugin.path)
            .args(["--mode=profiles", &format!("--info=@{namespace}/{name}")])
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        serde_json::from_slice(&output.stdout).ok()
    }

    fn discover(&self, namespace: &str, url: &str) -> Vec<Value> {
        let Some(plugin) = self
            .plugins_with_mode(Mode::Profiles)
            .find(|p| p.profile_type.as_deref() == Some(namespace))
        else {
            return Vec::new();
        };
        let output = match Command::new(&plugin.path)
            .args(["--mode=profiles", &format!("--discover={url}")])
            .output()
        {
            Ok(o) if o.status.success() => o,
            _ => return Vec::new(),
        };
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }
}
