//! House price estimation: form schema, feature assembly, and model inference.

pub mod features;
pub mod format;
pub mod model;
pub mod predictor;
pub mod schema;
pub mod types;

pub use features::{assemble, coerce, require_fields};
pub use format::format_price;
pub use model::{OnnxPriceModel, PriceModel, DEFAULT_MODEL_FILENAME};
pub use predictor::Predictor;
pub use schema::{
    describe, example_form, field_by_column, field_by_key, FieldSpec, Page, FIELDS, MODEL_COLUMNS,
};
pub use types::*;
