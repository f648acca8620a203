//! Configuration value model.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Key/value mapping. Ordered by key so rendered output is stable.
pub type Mapping = BTreeMap<String, ConfigValue>;

/// Opaque leaf value. Never merged.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

/// A configuration value as seen by the merge engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum ConfigValue {
    /// A leaf value
    Scalar(Scalar),
    /// An ordered sequence; order is significant
    Sequence(Vec<ConfigValue>),
    /// A keyed mapping; order is not significant
    Mapping(Mapping),
}

/// The three shapes the merger distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Scalar,
    Sequence,
    Mapping,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Scalar => "scalar",
            Shape::Sequence => "sequence",
            Shape::Mapping => "mapping",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a shape name is not one of `scalar`, `sequence`, `mapping`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown shape '{0}': expected scalar, sequence or mapping")]
pub struct ShapeParseError(pub String);

impl FromStr for Shape {
    type Err = ShapeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scalar" => Ok(Shape::Scalar),
            "sequence" | "list" => Ok(Shape::Sequence),
            "mapping" | "map" => Ok(Shape::Mapping),
            _ => Err(ShapeParseError(s.to_string())),
        }
    }
}

impl ConfigValue {
    /// Shape of this value
    pub fn shape(&self) -> Shape {
        match self {
            ConfigValue::Scalar(_) => Shape::Scalar,
            ConfigValue::Sequence(_) => Shape::Sequence,
            ConfigValue::Mapping(_) => Shape::Mapping,
        }
    }

    /// String scalar
    pub fn string(s: impl Into<String>) -> Self {
        ConfigValue::Scalar(Scalar::String(s.into()))
    }

    /// Sequence of string scalars
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ConfigValue::Sequence(items.into_iter().map(ConfigValue::string).collect())
    }

    pub fn as_sequence(&self) -> Option<&Vec<ConfigValue>> {
        match self {
            ConfigValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            ConfigValue::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Look up a nested value by dot-separated path
    pub fn get_path(&self, path: &str) -> Option<&ConfigValue> {
        let mut current = self;
        for part in path.split('.').filter(|p| !p.is_empty()) {
            current = current.as_mapping()?.get(part)?;
        }
        Some(current)
    }

    /// Convert to a JSON value
    pub fn to_json(&self) -> Value {
        Value::from(self.clone())
    }
}

impl From<Value> for ConfigValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ConfigValue::Scalar(Scalar::Null),
            Value::Bool(b) => ConfigValue::Scalar(Scalar::Bool(b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ConfigValue::Scalar(Scalar::Integer(i)),
                None => ConfigValue::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            Value::String(s) => ConfigValue::Scalar(Scalar::String(s)),
            Value::Array(items) => {
                ConfigValue::Sequence(items.into_iter().map(ConfigValue::from).collect())
            }
            Value::Object(map) => ConfigValue::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, ConfigValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<ConfigValue> for Value {
    fn from(value: ConfigValue) -> Self {
        match value {
            ConfigValue::Scalar(Scalar::Null) => Value::Null,
            ConfigValue::Scalar(Scalar::Bool(b)) => Value::Bool(b),
            ConfigValue::Scalar(Scalar::Integer(i)) => Value::Number(i.into()),
            ConfigValue::Scalar(Scalar::Float(f)) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ConfigValue::Scalar(Scalar::String(s)) => Value::String(s),
            ConfigValue::Sequence(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            ConfigValue::Mapping(map) => Value::Object(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

impl From<toml::Value> for ConfigValue {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => ConfigValue::Scalar(Scalar::String(s)),
            toml::Value::Integer(i) => ConfigValue::Scalar(Scalar::Integer(i)),
            toml::Value::Float(f) => ConfigValue::Scalar(Scalar::Float(f)),
            toml::Value::Boolean(b) => ConfigValue::Scalar(Scalar::Bool(b)),
            toml::Value::Datetime(dt) => ConfigValue::Scalar(Scalar::String(dt.to_string())),
            toml::Value::Array(items) => {
                ConfigValue::Sequence(items.into_iter().map(ConfigValue::from).collect())
            }
            toml::Value::Table(table) => ConfigValue::Mapping(
                table
                    .into_iter()
                    .map(|(k, v)| (k, ConfigValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Scalar> for ConfigValue {
    fn from(value: Scalar) -> Self {
        ConfigValue::Scalar(value)
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(items: Vec<ConfigValue>) -> Self {
        ConfigValue::Sequence(items)
    }
}

impl From<Mapping> for ConfigValue {
    fn from(map: Mapping) -> Self {
        ConfigValue::Mapping(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_shapes() {
        let value = ConfigValue::from(json!({
            "INSTALLED_APPS": ["admin", "auth"],
            "DEBUG": true,
            "DATABASES": {"default": {"ENGINE": "sqlite3"}}
        }));

        assert_eq!(value.shape(), Shape::Mapping);
        assert_eq!(value.get_path("INSTALLED_APPS").unwrap().shape(), Shape::Sequence);
        assert_eq!(value.get_path("DEBUG").unwrap().shape(), Shape::Scalar);
        assert_eq!(
            value.get_path("DATABASES.default.ENGINE").and_then(|v| v.as_str()),
            Some("sqlite3")
        );
    }

    #[test]
    fn test_json_conversion_preserves_content() {
        let original = json!({"a": [1, 2.5, "x", null], "b": {"c": false}});
        let value = ConfigValue::from(original.clone());
        assert_eq!(value.to_json(), original);
    }

    #[test]
    fn test_from_toml() {
        let table: toml::Value = toml::from_str(
            "APPS = [\"blog\"]\nPORT = 8000\n[DATABASES.default]\nNAME = \"db\"\n",
        )
        .unwrap();
        let value = ConfigValue::from(table);

        assert_eq!(value.get_path("APPS"), Some(&ConfigValue::strings(["blog"])));
        assert_eq!(
            value.get_path("PORT"),
            Some(&ConfigValue::Scalar(Scalar::Integer(8000)))
        );
        assert_eq!(
            value.get_path("DATABASES.default.NAME").and_then(|v| v.as_str()),
            Some("db")
        );
    }

    #[test]
    fn test_shape_parse() {
        assert_eq!("sequence".parse::<Shape>(), Ok(Shape::Sequence));
        assert_eq!("Mapping".parse::<Shape>(), Ok(Shape::Mapping));
        assert_eq!("scalar".parse::<Shape>(), Ok(Shape::Scalar));
        assert!("tuple".parse::<Shape>().is_err());
    }

    #[test]
    fn test_serde_roundtrip_through_json_text() {
        let value = ConfigValue::strings(["one", "two"]);
        let text = serde_json::to_string(&value).unwrap();
        assert_eq!(text, r#"["one","two"]"#);
        let back: ConfigValue = serde_json::from_str(&text).unwrap();
        assert_eq!(back, value);
    }
}
