//! Named feature values attached to utterance items
//!
//! Every item in a relation owns a [`FeatureSet`]: a small map from feature
//! name to a tagged [`FeatureValue`]. The decision tree evaluator reads
//! features through the [`FeatureSource`] capability so it never needs to know
//! how an item is stored.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tagged feature value (string, integer or float)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Int(i64),
    Float(f32),
    Str(String),
}

impl FeatureValue {
    /// Type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
        }
    }

    /// Numeric view of the value; strings are parsed.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Int(i) => Some(*i as f32),
            Self::Float(f) => Some(*f),
            Self::Str(s) => s.trim().parse::<f32>().ok(),
        }
    }

    /// Borrow the string payload, if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the value is numeric (int or float)
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for FeatureValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for FeatureValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

/// Typed feature access failure
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    #[error("Feature '{0}' is not present")]
    Missing(String),

    #[error("Feature '{name}' has type {actual}, expected {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
}

/// Mutable map of named features owned by one item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    values: HashMap<String, FeatureValue>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FeatureValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FeatureValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn set_float(&mut self, name: impl Into<String>, value: f32) {
        self.values.insert(name.into(), FeatureValue::Float(value));
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<FeatureValue> {
        self.values.remove(name)
    }

    /// Get a string feature, failing on absence or type mismatch
    pub fn get_string(&self, name: &str) -> Result<&str, FeatureError> {
        match self.values.get(name) {
            Some(FeatureValue::Str(s)) => Ok(s),
            Some(other) => Err(FeatureError::TypeMismatch {
                name: name.to_string(),
                expected: "string",
                actual: other.type_name(),
            }),
            None => Err(FeatureError::Missing(name.to_string())),
        }
    }

    /// Get a float feature; integer values are widened
    pub fn get_float(&self, name: &str) -> Result<f32, FeatureError> {
        match self.values.get(name) {
            Some(FeatureValue::Float(f)) => Ok(*f),
            Some(FeatureValue::Int(i)) => Ok(*i as f32),
            Some(other) => Err(FeatureError::TypeMismatch {
                name: name.to_string(),
                expected: "float",
                actual: other.type_name(),
            }),
            None => Err(FeatureError::Missing(name.to_string())),
        }
    }

    pub fn get_int(&self, name: &str) -> Result<i64, FeatureError> {
        match self.values.get(name) {
            Some(FeatureValue::Int(i)) => Ok(*i),
            Some(other) => Err(FeatureError::TypeMismatch {
                name: name.to_string(),
                expected: "int",
                actual: other.type_name(),
            }),
            None => Err(FeatureError::Missing(name.to_string())),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FeatureValue)> {
        self.values.iter()
    }
}

/// Capability to look up a feature by (possibly path-qualified) name
///
/// Implemented by anything a decision tree can be evaluated against.
pub trait FeatureSource {
    fn find_feature(&self, name: &str) -> Option<FeatureValue>;
}

impl FeatureSource for FeatureSet {
    fn find_feature(&self, name: &str) -> Option<FeatureValue> {
        self.values.get(name).cloned()
    }
}

impl FeatureSource for HashMap<String, FeatureValue> {
    fn find_feature(&self, name: &str) -> Option<FeatureValue> {
        self.get(name).cloned()
    }
}
