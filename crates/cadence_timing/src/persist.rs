// SPDX-License-Identifier: MIT OR Apache-2.0
//! JSON persistence helpers shared by every saved object.
//!
//! Polymorphic objects save as a JSON object carrying a `"type"` tag next
//! to their configuration fields. Loading is lenient: missing fields keep
//! their defaults, and the public `load` entry points log a [`LoadError`]
//! and fall back to defaults instead of propagating it.

use crate::factory::FactoryError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Key holding the type tag of a saved polymorphic object
pub const TYPE_KEY: &str = "type";

/// Error while reading persisted configuration
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Value was not a JSON object
    #[error("Expected a JSON object")]
    NotAnObject,

    /// Object has no `type` tag
    #[error("Missing type tag")]
    MissingType,

    /// Type tag not registered
    #[error(transparent)]
    Factory(#[from] FactoryError),

    /// A field exists but has the wrong shape
    #[error("Invalid field `{field}`: {source}")]
    InvalidField {
        /// Field name
        field: String,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Any other JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read the type tag of a saved object
pub fn type_tag(value: &Value) -> Result<&str, LoadError> {
    let object = value.as_object().ok_or(LoadError::NotAnObject)?;
    object
        .get(TYPE_KEY)
        .and_then(Value::as_str)
        .ok_or(LoadError::MissingType)
}

/// Serialize a configuration struct and stamp it with a type tag
pub fn to_tagged<C: Serialize>(tag: &str, config: &C) -> Value {
    let mut object = match serde_json::to_value(config) {
        Ok(Value::Object(object)) => object,
        Ok(_) => Map::new(),
        Err(e) => {
            tracing::error!("Failed to serialize {tag} configuration: {e}");
            Map::new()
        }
    };
    object.insert(TYPE_KEY.to_string(), Value::String(tag.to_string()));
    Value::Object(object)
}

/// Serialize an untagged configuration struct
pub fn to_value<C: Serialize>(config: &C) -> Value {
    serde_json::to_value(config).unwrap_or_else(|e| {
        tracing::error!("Failed to serialize configuration: {e}");
        Value::Null
    })
}

/// Deserialize a configuration struct, ignoring the type tag
pub fn from_value<C: DeserializeOwned>(value: &Value) -> Result<C, LoadError> {
    if !value.is_object() {
        return Err(LoadError::NotAnObject);
    }
    Ok(C::deserialize(value)?)
}

/// Read an optional field, returning `None` when it is absent
pub fn field<T: DeserializeOwned>(value: &Value, name: &str) -> Result<Option<T>, LoadError> {
    let object = value.as_object().ok_or(LoadError::NotAnObject)?;
    match object.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => T::deserialize(v)
            .map(Some)
            .map_err(|source| LoadError::InvalidField {
                field: name.to_string(),
                source,
            }),
    }
}

/// Unwrap a load result, logging the error and falling back to a default
pub fn or_default<T>(what: &str, result: Result<T, LoadError>, default: impl FnOnce() -> T) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Failed to load {what}, using defaults: {e}");
            default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Sample {
        speed: f32,
        name: String,
    }

    #[test]
    fn test_tagged_round_trip() {
        let sample = Sample {
            speed: 2.0,
            name: "a".to_string(),
        };
        let value = to_tagged("sample", &sample);
        assert_eq!(type_tag(&value).unwrap(), "sample");
        let loaded: Sample = from_value(&value).unwrap();
        assert_eq!(loaded, sample);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let loaded: Sample = from_value(&json!({ "speed": 3.0 })).unwrap();
        assert_eq!(loaded.speed, 3.0);
        assert_eq!(loaded.name, "");
    }

    #[test]
    fn test_field_errors_name_the_field() {
        let value = json!({ "count": "many" });
        let err = field::<u32>(&value, "count").unwrap_err();
        assert!(err.to_string().contains("count"));
        assert_eq!(field::<u32>(&value, "absent").unwrap(), None);
    }

    #[test]
    fn test_missing_type() {
        assert!(matches!(type_tag(&json!({})), Err(LoadError::MissingType)));
        assert!(matches!(type_tag(&json!(3)), Err(LoadError::NotAnObject)));
    }

    #[test]
    fn test_or_default_falls_back() {
        let value = or_default("sample", Err(LoadError::MissingType), || 5);
        assert_eq!(value, 5);
    }
}
