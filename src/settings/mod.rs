//! Settings inputs to the composition engine
//!
//! - [`HostConfig`]: the live host configuration
//! - [`SettingsModule`]: a contributed settings document
//! - [`ModuleLoader`]: name/path resolution for settings modules
//! - [`SettingsSchema`]: declared keys and expected shapes

mod host;
mod loader;
mod module;
mod schema;

pub use host::HostConfig;
pub use loader::{ModuleLoader, ROUTES_FILE, SETTINGS_FILE};
pub use module::{ModuleError, SettingsModule, ROUTES_KEY};
pub use schema::{is_setting_name, SchemaError, SettingsSchema};
