use serde::{Deserialize, Deserializer};

use crate::data_types::phenotype::{ElementSubtype, ElementType};
use crate::data_types::profile::OrganismProfile;

/// Every way a canonical record can fail validation.
/// All variants carry the dotted path of the offending field, e.g. `element_type_result[1].result.genes[0].identity`.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum SchemaError {
    #[error("{path}: {reason}")]
    InvalidField { path: String, reason: String },
    #[error("{path}: value {value} is outside of the allowed range [{min}, {max}]")]
    OutOfRange { path: String, value: f64, min: f64, max: f64 },
    #[error("{path}: {subtype} is not a subtype of {element_type}")]
    SubtypeMismatch { path: String, element_type: ElementType, subtype: ElementSubtype },
    #[error("{path}: {name:?} is listed as both susceptible and resistant")]
    ConflictingPhenotype { path: String, name: String },
    #[error("{path}: element type {element_type} is not supported by the {profile} profile")]
    UnsupportedElementType { path: String, element_type: ElementType, profile: OrganismProfile },
    #[error("schema_version is missing or is not an integer")]
    MissingSchemaVersion,
    #[error("schema_version {found} is not supported by this version of prp (expected {expected})")]
    UnsupportedSchemaVersion { found: i64, expected: u32 }
}

/// Implemented by every record in the result graph.
pub trait Validate {
    /// Checks all invariants of this record and its children.
    /// # Arguments
    /// * `path` - the location of this record in the result graph, used for error reporting
    /// # Errors
    /// * the first violated invariant, depth first
    fn validate(&self, path: &str) -> Result<(), SchemaError>;
}

/// Joins a parent path and a child field name
pub fn join_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}.{child}")
    }
}

/// Validates each entry of a list, tagging errors with the entry index.
pub fn validate_all<T: Validate>(path: &str, items: &[T]) -> Result<(), SchemaError> {
    for (i, item) in items.iter().enumerate() {
        item.validate(&format!("{path}[{i}]"))?;
    }
    Ok(())
}

/// Checks that a float is finite and inside an inclusive range
pub fn check_range(path: &str, value: f64, min: f64, max: f64) -> Result<(), SchemaError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(SchemaError::OutOfRange { path: path.to_string(), value, min, max })
    }
}

/// Same as `check_range`, but a missing value is always valid
pub fn check_optional_range(path: &str, value: Option<f64>, min: f64, max: f64) -> Result<(), SchemaError> {
    match value {
        Some(v) => check_range(path, v, min, max),
        None => Ok(())
    }
}

pub fn check_not_empty(path: &str, value: &str) -> Result<(), SchemaError> {
    if value.trim().is_empty() {
        Err(SchemaError::InvalidField { path: path.to_string(), reason: "must not be empty".to_string() })
    } else {
        Ok(())
    }
}

/// Checks that an optional 1-based interval is well formed.
pub fn check_interval(path: &str, start: Option<u64>, end: Option<u64>) -> Result<(), SchemaError> {
    if start == Some(0) || end == Some(0) {
        return Err(SchemaError::InvalidField {
            path: path.to_string(),
            reason: "positions are 1-based and must be > 0".to_string()
        });
    }
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(SchemaError::InvalidField {
                path: path.to_string(),
                reason: format!("start ({s}) is after end ({e})")
            });
        }
    }
    Ok(())
}

/// Deserializes an `Option<T>` that must be present in the input, even if it is `null`.
/// Serde treats absent `Option` fields as `None`; this removes that default for fields where an
/// implicit value would be misleading (e.g., `passed_qc`).
pub fn required_option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>
{
    Option::<T>::deserialize(deserializer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "qc"), "qc");
        assert_eq!(join_path("qc[0]", "result"), "qc[0].result");
    }

    #[test]
    fn test_check_range() {
        assert!(check_range("x", 0.0, 0.0, 1.0).is_ok());
        assert!(check_range("x", 1.0, 0.0, 1.0).is_ok());
        assert!(check_range("x", 1.01, 0.0, 1.0).is_err());
        assert!(check_range("x", f64::NAN, 0.0, 1.0).is_err());
        assert!(check_optional_range("x", None, 0.0, 1.0).is_ok());
    }

    #[test]
    fn test_check_interval() {
        assert!(check_interval("x", Some(1), Some(1)).is_ok());
        assert!(check_interval("x", Some(10), None).is_ok());
        assert!(check_interval("x", Some(0), Some(5)).is_err());
        assert!(check_interval("x", Some(6), Some(5)).is_err());
    }
}
