//! Typed settings schema
//!
//! Declares which setting keys the host accepts and the shape each must
//! have. Contributed values are checked against it before they reach the
//! importer.

use integrator_merge::{ConfigValue, Shape};
use regex_lite::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Setting names: upper-case letters, digits and underscores, with at least
/// one letter. Leading underscores and digits are allowed.
const SETTING_NAME_PATTERN: &str = r"^[A-Z0-9_]*[A-Z][A-Z0-9_]*$";

fn setting_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(SETTING_NAME_PATTERN).expect("valid setting-name pattern"))
}

/// True when `name` follows the upper-case setting naming convention.
pub fn is_setting_name(name: &str) -> bool {
    setting_name_re().is_match(name)
}

/// Schema errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("Invalid setting name '{0}': expected upper-case letters, digits and underscores with at least one letter")]
    InvalidKey(String),

    #[error("Setting '{key}' must be a {expected}, got a {actual}")]
    ShapeMismatch {
        key: String,
        expected: Shape,
        actual: Shape,
    },

    #[error("Setting '{0}' is not declared in the schema")]
    Undeclared(String),

    #[error("Invalid schema entry for '{key}': {reason}")]
    InvalidEntry { key: String, reason: String },
}

/// Declared setting keys and their expected shapes
#[derive(Debug, Clone, Default)]
pub struct SettingsSchema {
    declared: BTreeMap<String, Shape>,
    strict: bool,
}

impl SettingsSchema {
    /// Schema that accepts undeclared keys of any shape
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Schema that rejects undeclared keys
    pub fn strict() -> Self {
        Self {
            declared: BTreeMap::new(),
            strict: true,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// Declare a key with its expected shape.
    ///
    /// Redeclaring a key replaces its shape.
    pub fn declare(&mut self, key: impl Into<String>, shape: Shape) -> Result<(), SchemaError> {
        let key = key.into();
        if !is_setting_name(&key) {
            return Err(SchemaError::InvalidKey(key));
        }
        self.declared.insert(key, shape);
        Ok(())
    }

    /// Builder form of [`declare`](Self::declare)
    pub fn with(mut self, key: impl Into<String>, shape: Shape) -> Result<Self, SchemaError> {
        self.declare(key, shape)?;
        Ok(self)
    }

    pub fn shape_of(&self, key: &str) -> Option<Shape> {
        self.declared.get(key).copied()
    }

    pub fn declared(&self) -> impl Iterator<Item = (&str, Shape)> {
        self.declared.iter().map(|(k, s)| (k.as_str(), *s))
    }

    /// Check a contributed value against the schema
    pub fn check(&self, key: &str, value: &ConfigValue) -> Result<(), SchemaError> {
        if !is_setting_name(key) {
            return Err(SchemaError::InvalidKey(key.to_string()));
        }
        match self.declared.get(key) {
            Some(expected) if *expected != value.shape() => Err(SchemaError::ShapeMismatch {
                key: key.to_string(),
                expected: *expected,
                actual: value.shape(),
            }),
            Some(_) => Ok(()),
            None if self.strict => Err(SchemaError::Undeclared(key.to_string())),
            None => Ok(()),
        }
    }

    /// Build a schema from a table of `KEY = "shape"` entries
    pub fn from_table(table: &BTreeMap<String, String>, strict: bool) -> Result<Self, SchemaError> {
        let mut schema = Self {
            declared: BTreeMap::new(),
            strict,
        };
        for (key, shape) in table {
            let shape = shape.parse::<Shape>().map_err(|e| SchemaError::InvalidEntry {
                key: key.clone(),
                reason: e.to_string(),
            })?;
            schema.declare(key.clone(), shape)?;
        }
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_setting_names() {
        assert!(is_setting_name("INSTALLED_APPS"));
        assert!(is_setting_name("DEBUG"));
        assert!(is_setting_name("X2"));
        assert!(!is_setting_name("installed_apps"));
        assert!(is_setting_name("_PRIVATE"));
        assert!(is_setting_name("2FA_ISSUER"));
        assert!(!is_setting_name("_"));
        assert!(!is_setting_name("__"));
        assert!(!is_setting_name("42"));
        assert!(!is_setting_name("Mixed"));
        assert!(!is_setting_name(""));
    }

    #[test]
    fn test_declare_rejects_bad_names() {
        let mut schema = SettingsSchema::permissive();
        assert_eq!(
            schema.declare("urlpatterns", Shape::Sequence),
            Err(SchemaError::InvalidKey("urlpatterns".to_string()))
        );
    }

    #[test]
    fn test_check_shape_mismatch() {
        let schema = SettingsSchema::permissive()
            .with("INSTALLED_APPS", Shape::Sequence)
            .unwrap();

        let err = schema
            .check("INSTALLED_APPS", &ConfigValue::from(json!({"a": 1})))
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::ShapeMismatch {
                key: "INSTALLED_APPS".to_string(),
                expected: Shape::Sequence,
                actual: Shape::Mapping,
            }
        );
        assert!(schema
            .check("INSTALLED_APPS", &ConfigValue::strings(["blog"]))
            .is_ok());
    }

    #[test]
    fn test_undeclared_keys() {
        let value = ConfigValue::strings(["x"]);
        assert!(SettingsSchema::permissive().check("EXTRA", &value).is_ok());
        assert_eq!(
            SettingsSchema::strict().check("EXTRA", &value),
            Err(SchemaError::Undeclared("EXTRA".to_string()))
        );
    }

    #[test]
    fn test_from_table() {
        let mut table = BTreeMap::new();
        table.insert("INSTALLED_APPS".to_string(), "sequence".to_string());
        table.insert("DATABASES".to_string(), "mapping".to_string());

        let schema = SettingsSchema::from_table(&table, true).unwrap();
        assert!(schema.is_strict());
        assert_eq!(schema.shape_of("DATABASES"), Some(Shape::Mapping));
        assert_eq!(schema.declared().count(), 2);

        table.insert("BROKEN".to_string(), "tuple".to_string());
        assert!(matches!(
            SettingsSchema::from_table(&table, false),
            Err(SchemaError::InvalidEntry { .. })
        ));
    }
}
