pub mod cache;
pub mod catalog;
pub mod discovery;
pub mod error;
pub mod matcher;
pub mod pattern;
pub mod plugin;
pub mod registry;

pub use error::RegistryError;
pub use matcher::best_match;
pub use pattern::{Pattern, PatternTag};
pub use plugin::{Mode, PluginKind, PluginMeta, PluginRecord, Tier};
pub use registry::Registry;
