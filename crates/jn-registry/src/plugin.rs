//! `PluginRecord` (§3) and its sub-types (§4.D, §6).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::pattern::Pattern;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Read,
    Write,
    Raw,
    Profiles,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Mode::Read => "read",
            Mode::Write => "write",
            Mode::Raw => "raw",
            Mode::Profiles => "profiles",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Mode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Mode::Read),
            "write" => Ok(Mode::Write),
            "raw" => Ok(Mode::Raw),
            "profiles" => Ok(Mode::Profiles),
            other => Err(format!("unknown mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginKind {
    Native,
    Scripted,
}

/// Directory tier a plugin was discovered under. Ordering matters:
/// `Project > User > System` in the pattern matcher's tie-break (§4.E).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    System,
    User,
    Project,
}

#[derive(Debug, Clone)]
pub struct PluginRecord {
    pub name: String,
    pub path: PathBuf,
    pub kind: PluginKind,
    pub patterns: Vec<Pattern>,
    pub modes: Vec<Mode>,
    pub profile_type: Option<String>,
    pub bundled_profiles: Vec<String>,
    pub tier: Tier,
    /// Role this plugin advertises (`format`, `protocol`, `compression`,
    /// `database`, ...); used by the planner to pick the right stage kind.
    pub role: String,
}

impl PluginRecord {
    pub fn supports(&self, mode: Mode) -> bool {
        self.modes.contains(&mode)
    }
}

/// What `--meta` prints, or what a scripted plugin's inline sentinel
/// block parses to (§6).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PluginMeta {
    pub name: String,
    #[serde(default)]
    pub version: String,
    pub patterns: Vec<String>,
    pub role: String,
    pub modes: Vec<Mode>,
    #[serde(default)]
    pub profile_type: Option<String>,
    #[serde(default)]
    pub bundled_profiles: Vec<String>,
}

impl PluginMeta {
    /// A metadata record is only accepted if the fields §4.D calls
    /// required actually parsed to something non-degenerate.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("empty plugin name".into());
        }
        if self.role.is_empty() {
            return Err("empty plugin role".into());
        }
        if self.modes.is_empty() {
            return Err("plugin declares no supported modes".into());
        }
        Ok(())
    }
}
