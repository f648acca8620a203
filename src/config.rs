//! Integrator configuration (integrator.toml)
//!
//! Names the applications to integrate, extra settings modules, the
//! applications directory and the settings schema:
//!
//! ```toml
//! apps_dir = "apps"
//! strict = true
//! mode = "collect"
//! applications = ["blog", "shop"]
//! settings = ["blog.production"]
//!
//! [schema]
//! INSTALLED_APPS = "sequence"
//! DATABASES = "mapping"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::compose::{Integrator, RegistrationMode};
use crate::settings::{ModuleLoader, SchemaError, SettingsSchema};

/// Default applications directory, relative to the working directory
pub const DEFAULT_APPS_DIR: &str = "apps";

/// Error types for config operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

fn default_apps_dir() -> PathBuf {
    PathBuf::from(DEFAULT_APPS_DIR)
}

/// Integrator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegratorConfig {
    /// Directory holding one sub-directory per application
    #[serde(default = "default_apps_dir")]
    pub apps_dir: PathBuf,

    /// Reject settings not declared in `schema`
    #[serde(default)]
    pub strict: bool,

    /// Failure handling for a registration
    #[serde(default)]
    pub mode: RegistrationMode,

    /// Applications to integrate, in order
    #[serde(default)]
    pub applications: Vec<String>,

    /// Extra settings modules to merge after the applications
    #[serde(default)]
    pub settings: Vec<String>,

    /// Declared settings: KEY = "scalar" | "sequence" | "mapping"
    #[serde(default)]
    pub schema: BTreeMap<String, String>,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            apps_dir: default_apps_dir(),
            strict: false,
            mode: RegistrationMode::default(),
            applications: Vec::new(),
            settings: Vec::new(),
            schema: BTreeMap::new(),
        }
    }
}

impl IntegratorConfig {
    /// Load and parse config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let mut config = Self::from_str(&contents)?;
        // apps_dir is relative to the config file
        if config.apps_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.apps_dir = parent.join(&config.apps_dir);
            }
        }
        Ok(config)
    }

    /// Parse config from a TOML string
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        let config: IntegratorConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for name in &self.applications {
            if name.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "Application names cannot be empty".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "Application '{}' is listed more than once",
                    name
                )));
            }
        }

        for module in &self.settings {
            if module.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "Settings module names cannot be empty".to_string(),
                ));
            }
        }

        self.build_schema()?;
        Ok(())
    }

    /// Build the settings schema from the `[schema]` table
    pub fn build_schema(&self) -> Result<SettingsSchema, ConfigError> {
        Ok(SettingsSchema::from_table(&self.schema, self.strict)?)
    }

    /// Build an integrator for this configuration
    pub fn integrator(&self) -> Result<Integrator, ConfigError> {
        let schema = self.build_schema()?;
        Ok(Integrator::new(ModuleLoader::new(&self.apps_dir), schema).with_mode(self.mode))
    }
}
