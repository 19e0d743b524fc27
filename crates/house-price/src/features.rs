//! Feature assembly: raw form strings to a typed, model-ordered record.

use crate::schema::{field_by_column, FieldSpec, MODEL_COLUMNS};
use crate::types::{FeatureRecord, FeatureValue, FieldKind, FormFields, PriceError, PriceResult};

/// Build a [`FeatureRecord`] from a complete form submission.
///
/// Reads exactly the 13 schema keys, coerces each per its kind and lays the
/// values out in [`MODEL_COLUMNS`] order. The order of keys in `form` does not
/// matter and unknown keys are ignored.
pub fn assemble(form: &FormFields) -> PriceResult<FeatureRecord> {
    let mut entries = Vec::with_capacity(MODEL_COLUMNS.len());

    for column in MODEL_COLUMNS {
        let field = field_by_column(column).ok_or_else(|| {
            PriceError::Inference(format!("No form field feeds model column '{column}'"))
        })?;
        let raw = form
            .get(field.key)
            .ok_or_else(|| PriceError::MissingField(field.key.to_string()))?;
        entries.push((column, coerce(field, raw)?));
    }

    Ok(FeatureRecord { entries })
}

/// Convert one raw form value according to its field kind.
pub fn coerce(field: &FieldSpec, raw: &str) -> PriceResult<FeatureValue> {
    let invalid = || PriceError::InvalidValue {
        field: field.key.to_string(),
        value: raw.to_string(),
        expected: field.kind.describe(),
    };

    match field.kind {
        FieldKind::Float => raw
            .trim()
            .parse::<f64>()
            .map(FeatureValue::Float)
            .map_err(|_| invalid()),
        FieldKind::Int => raw
            .trim()
            .parse::<i64>()
            .map(FeatureValue::Int)
            .map_err(|_| invalid()),
        FieldKind::Category => Ok(FeatureValue::Category(raw.to_string())),
    }
}

/// Check that every listed field is present, reporting the first gap.
pub fn require_fields<'a, I>(form: &FormFields, fields: I) -> PriceResult<()>
where
    I: IntoIterator<Item = &'a FieldSpec>,
{
    for field in fields {
        if !form.contains_key(field.key) {
            return Err(PriceError::MissingField(field.key.to_string()));
        }
    }
    Ok(())
}
