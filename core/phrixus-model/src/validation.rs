//! Attribute validators and the per-attribute error set they produce.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// One failed check against one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Stable machine-readable code, e.g. `"required"`.
    pub code: String,
    pub message: String,
}

impl FieldError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A pure check on an attribute value. `None` means the attribute is absent.
pub type Validator = fn(Option<&Value>) -> Option<FieldError>;

/// Fails when the value is absent, null, or an empty string, array or object.
pub fn required(value: Option<&Value>) -> Option<FieldError> {
    let missing = match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(fields)) => fields.is_empty(),
        Some(_) => false,
    };
    missing.then(|| FieldError::new("required", "is required"))
}

/// Fails when a present value is not a string. Absent values pass.
pub fn string(value: Option<&Value>) -> Option<FieldError> {
    match value {
        None | Some(Value::Null) | Some(Value::String(_)) => None,
        Some(_) => Some(FieldError::new("string", "must be a string")),
    }
}

/// Fails when a present value is not a number greater than zero.
pub fn positive_number(value: Option<&Value>) -> Option<FieldError> {
    match value {
        None | Some(Value::Null) => None,
        Some(v) if v.as_f64().is_some_and(|n| n > 0.0) => None,
        Some(_) => Some(FieldError::new(
            "positive_number",
            "must be a number greater than zero",
        )),
    }
}

/// Validation outcome of one entity, keyed by attribute in the order the
/// attributes first failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    entries: Vec<(String, Vec<FieldError>)>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error for `attribute` after any already recorded for it.
    pub fn add(&mut self, attribute: &str, error: FieldError) {
        match self.entries.iter_mut().find(|(name, _)| name == attribute) {
            Some((_, errors)) => errors.push(error),
            None => self.entries.push((attribute.to_string(), vec![error])),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of attributes with at least one error.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Total number of errors across all attributes.
    pub fn error_count(&self) -> usize {
        self.entries.iter().map(|(_, errors)| errors.len()).sum()
    }

    /// Errors recorded for `attribute`, in validator order.
    pub fn get(&self, attribute: &str) -> &[FieldError] {
        self.entries
            .iter()
            .find(|(name, _)| name == attribute)
            .map(|(_, errors)| errors.as_slice())
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FieldError])> {
        self.entries
            .iter()
            .map(|(name, errors)| (name.as_str(), errors.as_slice()))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, errors) in self.iter() {
            for error in errors {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{name} {error}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, errors) in &self.entries {
            map.serialize_entry(name, errors)?;
        }
        map.end()
    }
}
