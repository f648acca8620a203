//! Host configuration
//!
//! The live settings object the host process reads at runtime. The importer
//! writes merged values straight back into it.

use integrator_merge::ConfigValue;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::module::{parse_document, ModuleError};
use crate::routes::RouteTable;

/// Live host configuration: settings plus the host route table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostConfig {
    settings: BTreeMap<String, ConfigValue>,
    routes: RouteTable,
}

impl HostConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load host settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ModuleError> {
        let contents = fs::read_to_string(path).map_err(|source| ModuleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&contents)
    }

    /// Parse host settings from TOML text
    pub fn from_str(contents: &str) -> Result<Self, ModuleError> {
        let document = parse_document("host", contents)?;
        Ok(Self {
            settings: document.settings,
            routes: document.routes,
        })
    }

    /// Builder: set a setting
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.set(key, value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.settings.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: ConfigValue) {
        self.settings.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        self.settings.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.settings.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.settings.keys().map(String::as_str)
    }

    pub fn settings(&self) -> &BTreeMap<String, ConfigValue> {
        &self.settings
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn routes_mut(&mut self) -> &mut RouteTable {
        &mut self.routes
    }

    /// Settings and routes as one JSON object
    pub fn to_json(&self) -> serde_json::Value {
        let settings: serde_json::Map<String, serde_json::Value> = self
            .settings
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        serde_json::json!({
            "settings": settings,
            "urlpatterns": self.routes,
        })
    }
}
