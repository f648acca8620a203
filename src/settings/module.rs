//! Settings modules
//!
//! A settings module is a TOML document contributed by an application (or
//! named directly by the host). Its upper-case top-level keys are settings;
//! `urlpatterns` is its route table. Anything else is ignored.

use integrator_merge::ConfigValue;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::schema::is_setting_name;
use crate::routes::{RouteEntry, RouteTable};

/// Top-level key holding a module's route table
pub const ROUTES_KEY: &str = "urlpatterns";

/// Error types for loading settings modules
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("Failed to read settings module {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse settings module {name}: {reason}")]
    Parse { name: String, reason: String },

    #[error("Settings module not found: {0}")]
    NotFound(String),
}

/// Settings and routes split out of one TOML document
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Document {
    pub settings: BTreeMap<String, ConfigValue>,
    pub routes: RouteTable,
}

/// Parse TOML text into settings and routes
pub(crate) fn parse_document(name: &str, contents: &str) -> Result<Document, ModuleError> {
    let table: toml::Table = toml::from_str(contents).map_err(|e| ModuleError::Parse {
        name: name.to_string(),
        reason: format!("TOML parse error: {}", e),
    })?;

    let mut document = Document::default();
    for (key, value) in table {
        if key == ROUTES_KEY {
            document.routes = value.try_into::<Vec<RouteEntry>>().map_err(|e| {
                ModuleError::Parse {
                    name: name.to_string(),
                    reason: format!("invalid {}: {}", ROUTES_KEY, e),
                }
            })?;
        } else if is_setting_name(&key) {
            document.settings.insert(key, ConfigValue::from(value));
        } else {
            tracing::debug!(module = name, key = %key, "ignoring non-setting key");
        }
    }
    Ok(document)
}

/// A loaded settings module
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsModule {
    /// Module name (application name or import path)
    pub name: String,

    /// File the module was read from (None when parsed from text)
    pub path: Option<PathBuf>,

    /// SHA-256 digest of the raw bytes
    pub digest: String,

    /// Upper-case settings, ordered by key
    pub settings: BTreeMap<String, ConfigValue>,

    /// Contributed route entries in declaration order
    pub routes: RouteTable,
}

impl SettingsModule {
    /// Load a module from a TOML file
    pub fn load(name: impl Into<String>, path: &Path) -> Result<Self, ModuleError> {
        let name = name.into();
        let bytes = fs::read(path).map_err(|source| ModuleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let contents = String::from_utf8(bytes).map_err(|e| ModuleError::Parse {
            name: name.clone(),
            reason: format!("Invalid UTF-8: {}", e),
        })?;

        let mut module = Self::from_str(name, &contents)?;
        module.path = Some(path.to_path_buf());
        Ok(module)
    }

    /// Parse a module from TOML text
    pub fn from_str(name: impl Into<String>, contents: &str) -> Result<Self, ModuleError> {
        let name = name.into();
        let document = parse_document(&name, contents)?;
        Ok(Self {
            digest: digest(contents.as_bytes()),
            name,
            path: None,
            settings: document.settings,
            routes: document.routes,
        })
    }

    /// Replace the route table with routes read from a separate file
    pub fn load_routes(&mut self, path: &Path) -> Result<(), ModuleError> {
        let contents = fs::read_to_string(path).map_err(|source| ModuleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.routes = parse_document(&self.name, &contents)?.routes;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.settings.get(key)
    }
}

fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BLOG: &str = r#"
INSTALLED_APPS = ["blog", "taggit"]
verbose_name = "Blog"

[DATABASES.blog]
ENGINE = "sqlite3"

[[urlpatterns]]
pattern = "^blog/"
view = "blog.urls"
name = "blog"
"#;

    #[test]
    fn test_from_str_splits_settings_and_routes() {
        let module = SettingsModule::from_str("blog", BLOG).unwrap();

        assert_eq!(module.name, "blog");
        assert_eq!(
            module.get("INSTALLED_APPS"),
            Some(&ConfigValue::strings(["blog", "taggit"]))
        );
        assert!(module.get("DATABASES").is_some());
        assert!(module.get("verbose_name").is_none());
        assert_eq!(module.settings.len(), 2);
        assert_eq!(
            module.routes,
            vec![RouteEntry::new("^blog/", "blog.urls").named("blog")]
        );
    }

    #[test]
    fn test_leading_underscore_is_a_setting() {
        let module = SettingsModule::from_str("blog", "_SECRET = [\"a\"]\n_lower = 1\n").unwrap();
        assert_eq!(module.get("_SECRET"), Some(&ConfigValue::strings(["a"])));
        assert!(module.get("_lower").is_none());
    }

    #[test]
    fn test_digest_is_stable() {
        let a = SettingsModule::from_str("blog", BLOG).unwrap();
        let b = SettingsModule::from_str("other", BLOG).unwrap();
        assert_eq!(a.digest, b.digest);
        assert_eq!(a.digest.len(), 64);
    }

    #[test]
    fn test_parse_error() {
        let err = SettingsModule::from_str("bad", "INSTALLED_APPS = [").unwrap_err();
        assert!(matches!(err, ModuleError::Parse { .. }));
    }

    #[test]
    fn test_invalid_routes() {
        let err = SettingsModule::from_str("bad", "urlpatterns = [1, 2]").unwrap_err();
        assert!(err.to_string().contains("urlpatterns"));
    }

    #[test]
    fn test_load_file() {
        let mut temp = NamedTempFile::new().unwrap();
        write!(temp, "{}", BLOG).unwrap();

        let module = SettingsModule::load("blog", temp.path()).unwrap();
        assert_eq!(module.path.as_deref(), Some(temp.path()));
        assert_eq!(module.routes.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let err = SettingsModule::load("blog", Path::new("/nonexistent/settings.toml")).unwrap_err();
        assert!(matches!(err, ModuleError::Io { .. }));
    }
}
