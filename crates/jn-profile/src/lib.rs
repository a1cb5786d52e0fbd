pub mod error;
pub mod interpolate;
pub mod merge;
pub mod store;

pub use error::ProfileError;
pub use interpolate::{interpolate_document, EnvLookup, SystemEnv};
pub use merge::{deep_merge, deep_merged};
pub use store::{NoPlugins, PluginCatalog, ProfileStore};
