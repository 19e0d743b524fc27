//! Core data types for form input, feature records, and estimates.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw form submission: field key to the string the user typed.
pub type FormFields = BTreeMap<String, String>;

/// How a form field is converted before it reaches the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Float,
    Int,
    Category,
}

impl FieldKind {
    /// Human-readable name used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            FieldKind::Float => "number",
            FieldKind::Int => "whole number",
            FieldKind::Category => "category",
        }
    }
}

/// A single coerced model input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Float(f64),
    Int(i64),
    Category(String),
}

impl FeatureValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FeatureValue::Float(_) => FieldKind::Float,
            FeatureValue::Int(_) => FieldKind::Int,
            FeatureValue::Category(_) => FieldKind::Category,
        }
    }

    /// Numeric view of the value, `None` for categories.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Float(v) => Some(*v),
            FeatureValue::Int(v) => Some(*v as f64),
            FeatureValue::Category(_) => None,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Float(v) => write!(f, "{v}"),
            FeatureValue::Int(v) => write!(f, "{v}"),
            FeatureValue::Category(v) => f.write_str(v),
        }
    }
}

/// One row of model input, always in the pinned column order.
///
/// Only [`crate::features::assemble`] builds records, so a record in hand
/// always holds exactly one value per entry of [`crate::schema::MODEL_COLUMNS`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRecord {
    pub(crate) entries: Vec<(&'static str, FeatureValue)>,
}

impl FeatureRecord {
    /// Column names in model order.
    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(column, _)| *column)
    }

    /// `(column, value)` pairs in model order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FeatureValue)> + '_ {
        self.entries.iter().map(|(column, value)| (*column, value))
    }

    /// Look up a value by model column name.
    pub fn get(&self, column: &str) -> Option<&FeatureValue> {
        self.entries
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A model output together with its display form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Estimate {
    pub price: f64,
    pub formatted: String,
}

/// Errors that can occur while assembling features or running the model.
#[derive(thiserror::Error, Debug)]
pub enum PriceError {
    #[error("Model not available: {0}")]
    ModelUnavailable(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {value:?} is not a valid {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: &'static str,
    },

    #[error("Inference error: {0}")]
    Inference(String),

}

/// Convenience result type.
pub type PriceResult<T> = Result<T, PriceError>;
