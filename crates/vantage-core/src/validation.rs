//! validation of user-specified resources, run before any network call.

use serde_json::Value;
use thiserror::Error;

/// validation errors are fatal and never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field {resource}.{field}")]
    MissingField { resource: String, field: String },
    #[error("missing required parameter {0}")]
    MissingParameter(String),
    #[error("at most one of [{}] may be set", .fields.join(", "))]
    ConflictingFields { fields: Vec<String> },
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// require a value to be set.
pub fn required<T>(value: &Option<T>, resource: &str, field: &str) -> Result<(), ValidationError> {
    match value {
        Some(_) => Ok(()),
        None => Err(ValidationError::MissingField {
            resource: resource.to_string(),
            field: field.to_string(),
        }),
    }
}

/// require a non-empty string.
pub fn required_string(
    value: &Option<String>,
    resource: &str,
    field: &str,
) -> Result<(), ValidationError> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(()),
        _ => Err(ValidationError::MissingField {
            resource: resource.to_string(),
            field: field.to_string(),
        }),
    }
}

/// require a url parameter (parent container) to be set.
pub fn required_parameter(value: &Option<String>, name: &str) -> Result<(), ValidationError> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(()),
        _ => Err(ValidationError::MissingParameter(name.to_string())),
    }
}

/// reject json objects that set more than one member of a oneof group.
///
/// `pointer` addresses the object holding the group; a missing object passes.
pub fn exclusive(value: &Value, pointer: &str, keys: &[&str]) -> Result<(), ValidationError> {
    let Some(Value::Object(map)) = value.pointer(pointer) else {
        return Ok(());
    };
    let present: Vec<String> = keys
        .iter()
        .filter(|key| map.get(**key).is_some_and(|v| !v.is_null()))
        .map(|key| key.to_string())
        .collect();
    if present.len() > 1 {
        return Err(ValidationError::ConflictingFields { fields: present });
    }
    Ok(())
}
