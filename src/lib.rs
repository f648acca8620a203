//! Integrator - compose application settings into a host configuration
//!
//! Independently authored applications contribute settings (lists, maps)
//! and route entries into one already-initialized host configuration. Host
//! values are never clobbered: sequences merge around shared anchors,
//! mappings merge key by key, and anything else is rejected. Every touched
//! setting can be restored to its value before integration.

pub mod compose;
pub mod config;
pub mod importer;
pub mod routes;
pub mod settings;

pub use compose::{
    has_failures, IntegrationError, Integrator, KeyFailure, Registration, RegistrationMode,
    INSTALLED_APPS,
};
pub use config::{ConfigError, IntegratorConfig};
pub use importer::{ImportError, Importer, Snapshot};
pub use integrator_merge::{merge, merge_list, ConfigValue, MergeError, Scalar, Shape};
pub use routes::{append_routes, RouteEntry, RouteTable};
pub use settings::{HostConfig, ModuleLoader, SettingsModule, SettingsSchema};
