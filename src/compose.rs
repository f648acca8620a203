//! Composition API
//!
//! [`Integrator`] ties the pieces together: it loads contributor settings
//! modules, checks them against the [`SettingsSchema`], merges them into the
//! host through the [`Importer`] and remembers each application's routes for
//! [`Integrator::add_url_patterns`].
//!
//! The host configuration is passed into every call rather than owned, so
//! the host decides when it is built and where it lives.

use chrono::{DateTime, Utc};
use integrator_merge::ConfigValue;
use serde::{Deserialize, Serialize};

use crate::importer::{ImportError, Importer};
use crate::routes::{append_routes, RouteTable};
use crate::settings::{
    HostConfig, ModuleError, ModuleLoader, SchemaError, SettingsModule, SettingsSchema,
};

/// Setting that lists integrated applications
pub const INSTALLED_APPS: &str = "INSTALLED_APPS";

/// How a registration handles a failing setting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationMode {
    /// Stop at the first failing setting
    #[default]
    Abort,
    /// Record failing settings and keep going
    Collect,
}

/// Composition errors
#[derive(Debug, thiserror::Error)]
pub enum IntegrationError {
    #[error(transparent)]
    Module(#[from] ModuleError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("Application '{0}' is already registered")]
    AlreadyRegistered(String),
}

/// A setting that could not be merged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFailure {
    pub key: String,
    pub reason: String,
}

/// Outcome of one `add_application` / `add_settings` call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    /// Module name
    pub name: String,

    /// SHA-256 digest of the module source
    pub digest: String,

    /// Settings merged into the host, in merge order
    pub merged_keys: Vec<String>,

    /// Settings that failed (Collect mode only)
    pub failures: Vec<KeyFailure>,

    /// Routes contributed for `add_url_patterns`
    pub routes: usize,

    pub registered_at: DateTime<Utc>,
}

impl Registration {
    fn new(module: &SettingsModule, routes: usize) -> Self {
        Self {
            name: module.name.clone(),
            digest: module.digest.clone(),
            merged_keys: Vec::new(),
            failures: Vec::new(),
            routes,
            registered_at: Utc::now(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// True when any registration recorded a failing setting
pub fn has_failures(registrations: &[Registration]) -> bool {
    registrations.iter().any(|r| !r.is_clean())
}

/// A registered application and its route table
#[derive(Debug, Clone)]
struct Contributor {
    name: String,
    routes: RouteTable,
}

/// Composes contributor settings and routes into a host configuration
#[derive(Debug, Clone)]
pub struct Integrator {
    importer: Importer,
    schema: SettingsSchema,
    loader: ModuleLoader,
    mode: RegistrationMode,
    contributors: Vec<Contributor>,
}

impl Integrator {
    pub fn new(loader: ModuleLoader, schema: SettingsSchema) -> Self {
        Self {
            importer: Importer::new(),
            schema,
            loader,
            mode: RegistrationMode::default(),
            contributors: Vec::new(),
        }
    }

    pub fn with_mode(mut self, mode: RegistrationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> RegistrationMode {
        self.mode
    }

    pub fn importer(&self) -> &Importer {
        &self.importer
    }

    pub fn schema(&self) -> &SettingsSchema {
        &self.schema
    }

    pub fn loader(&self) -> &ModuleLoader {
        &self.loader
    }

    /// Registered application names in registration order
    pub fn applications(&self) -> impl Iterator<Item = &str> {
        self.contributors.iter().map(|c| c.name.as_str())
    }

    /// Load application `name`, merge its settings into `host` and register
    /// its routes.
    pub fn add_application(
        &mut self,
        host: &mut HostConfig,
        name: &str,
    ) -> Result<Registration, IntegrationError> {
        let module = self.loader.load_application(name)?;
        self.register_application(host, module)
    }

    /// Merge an already loaded application module and register its routes
    pub fn register_application(
        &mut self,
        host: &mut HostConfig,
        module: SettingsModule,
    ) -> Result<Registration, IntegrationError> {
        if self.contributors.iter().any(|c| c.name == module.name) {
            return Err(IntegrationError::AlreadyRegistered(module.name));
        }

        let mut registration = Registration::new(&module, module.routes.len());
        self.merge_module(host, &module, &mut registration)?;

        let installed = ConfigValue::strings([module.name.as_str()]);
        self.checked_merge(host, INSTALLED_APPS, &installed, &mut registration)?;

        tracing::info!(
            application = %module.name,
            merged = registration.merged_keys.len(),
            failed = registration.failures.len(),
            routes = module.routes.len(),
            "registered application"
        );
        let routes = module
            .routes
            .into_iter()
            .map(|entry| entry.from_app(module.name.as_str()))
            .collect();
        self.contributors.push(Contributor {
            name: module.name,
            routes,
        });
        Ok(registration)
    }

    /// Load a settings module by path or dotted name and merge every
    /// setting it declares. Routes in the module are ignored.
    pub fn add_settings(
        &mut self,
        host: &mut HostConfig,
        module: &str,
    ) -> Result<Registration, IntegrationError> {
        let module = self.loader.load_settings(module)?;
        self.merge_settings(host, &module)
    }

    /// Merge an already loaded settings module
    pub fn merge_settings(
        &mut self,
        host: &mut HostConfig,
        module: &SettingsModule,
    ) -> Result<Registration, IntegrationError> {
        let mut registration = Registration::new(module, 0);
        self.merge_module(host, module, &mut registration)?;
        tracing::info!(
            module = %module.name,
            merged = registration.merged_keys.len(),
            failed = registration.failures.len(),
            "merged settings module"
        );
        Ok(registration)
    }

    /// Merge every registered application's routes into `routes`, in
    /// registration order. Returns the number of inserted entries.
    ///
    /// Routes bypass the importer, so nothing here can be restored.
    pub fn add_url_patterns(&self, routes: &mut RouteTable) -> usize {
        self.contributors
            .iter()
            .map(|contributor| {
                let inserted = append_routes(&contributor.routes, routes);
                tracing::debug!(application = %contributor.name, inserted, "appended routes");
                inserted
            })
            .sum()
    }

    /// Register `applications`, merge `settings` modules, then merge the
    /// registered routes into the host route table.
    pub fn compose(
        &mut self,
        host: &mut HostConfig,
        applications: &[String],
        settings: &[String],
    ) -> Result<Vec<Registration>, IntegrationError> {
        let mut registrations = Vec::new();
        for name in applications {
            registrations.push(self.add_application(host, name)?);
        }
        for module in settings {
            registrations.push(self.add_settings(host, module)?);
        }
        self.add_url_patterns(host.routes_mut());
        Ok(registrations)
    }

    /// Reset one setting to its value before any contributor touched it
    pub fn restore(&mut self, host: &mut HostConfig, key: &str) -> Result<(), IntegrationError> {
        self.importer.restore(host, key)?;
        Ok(())
    }

    /// Reset every touched setting
    pub fn restore_all(&mut self, host: &mut HostConfig) {
        self.importer.restore_all(host);
    }

    fn merge_module(
        &mut self,
        host: &mut HostConfig,
        module: &SettingsModule,
        registration: &mut Registration,
    ) -> Result<(), IntegrationError> {
        for (key, value) in &module.settings {
            self.checked_merge(host, key, value, registration)?;
        }
        Ok(())
    }

    /// Check `value` against the schema, then merge it
    fn checked_merge(
        &mut self,
        host: &mut HostConfig,
        key: &str,
        value: &ConfigValue,
        registration: &mut Registration,
    ) -> Result<(), IntegrationError> {
        if let Err(e) = self.schema.check(key, value) {
            return self.fail(registration, key, e.into());
        }
        self.merge_key(host, key, value, registration)
    }

    fn merge_key(
        &mut self,
        host: &mut HostConfig,
        key: &str,
        value: &ConfigValue,
        registration: &mut Registration,
    ) -> Result<(), IntegrationError> {
        match self.importer.merge_into(host, key, value) {
            Ok(()) => {
                registration.merged_keys.push(key.to_string());
                Ok(())
            }
            Err(e) => self.fail(registration, key, e.into()),
        }
    }

    fn fail(
        &self,
        registration: &mut Registration,
        key: &str,
        error: IntegrationError,
    ) -> Result<(), IntegrationError> {
        match self.mode {
            RegistrationMode::Abort => Err(error),
            RegistrationMode::Collect => {
                tracing::warn!(module = %registration.name, key, error = %error, "setting not merged");
                registration.failures.push(KeyFailure {
                    key: key.to_string(),
                    reason: error.to_string(),
                });
                Ok(())
            }
        }
    }
}
