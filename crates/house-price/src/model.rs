//! Price model abstraction and its ONNX Runtime backend.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array2;
use ort::session::{Session, SessionInputValue};
use ort::value::Tensor;

use crate::types::{FeatureRecord, FeatureValue, PriceError, PriceResult};

/// Default artifact filename, looked up relative to the working directory.
pub const DEFAULT_MODEL_FILENAME: &str = "houseprice_pred.onnx";

/// An opaque regression function over one [`FeatureRecord`].
///
/// Implementations must be deterministic and must not mutate observable
/// state: the same record always yields the same price.
pub trait PriceModel: Send + Sync {
    /// Predict a price for a single row.
    fn predict(&self, record: &FeatureRecord) -> PriceResult<f64>;

    /// Short backend name for logs and health output.
    fn name(&self) -> &str;
}

/// A trained pipeline exported to ONNX.
///
/// The graph takes one `[1, 1]` input per model column, named after the
/// column: `float` for numeric features, `int64` for whole-number features
/// and `string` for categories. This is the layout tabular pipelines get
/// when exported column by column.
pub struct OnnxPriceModel {
    session: Mutex<Session>,
}

impl OnnxPriceModel {
    /// Load the artifact at `path`.
    pub fn load(path: &Path) -> PriceResult<Self> {
        if !path.exists() {
            return Err(PriceError::ModelUnavailable(format!(
                "model file not found at {}",
                path.display()
            )));
        }

        tracing::info!("Loading price model from {}", path.display());

        let session = Session::builder()
            .and_then(|b| b.with_intra_threads(1))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| PriceError::ModelUnavailable(format!("Failed to load ONNX model: {e}")))?;

        tracing::info!("Price model loaded successfully");
        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl PriceModel for OnnxPriceModel {
    fn predict(&self, record: &FeatureRecord) -> PriceResult<f64> {
        let mut inputs: Vec<(&'static str, SessionInputValue<'static>)> =
            Vec::with_capacity(record.len());
        for (column, value) in record.iter() {
            inputs.push((column, input_tensor(column, value)?));
        }

        let mut session = self
            .session
            .lock()
            .map_err(|e| PriceError::Inference(format!("Model session lock poisoned: {e}")))?;

        let outputs = session
            .run(inputs)
            .map_err(|e| PriceError::Inference(format!("ONNX inference failed: {e}")))?;

        // Regressors export either float or double outputs; take the first value.
        let first = match outputs[0].try_extract_tensor::<f32>() {
            Ok((_shape, data)) => data.first().map(|v| *v as f64),
            Err(_) => {
                let (_shape, data) = outputs[0]
                    .try_extract_tensor::<f64>()
                    .map_err(|e| PriceError::Inference(format!("Failed to extract output: {e}")))?;
                data.first().copied()
            }
        };

        first.ok_or_else(|| PriceError::Inference("Model returned an empty output".to_string()))
    }

    fn name(&self) -> &str {
        "onnx"
    }
}

fn input_tensor(column: &str, value: &FeatureValue) -> PriceResult<SessionInputValue<'static>> {
    let tensor_err =
        |e: ort::Error| PriceError::Inference(format!("Failed to create input '{column}': {e}"));

    let input = match value {
        FeatureValue::Float(v) => Tensor::from_array(Array2::from_elem((1, 1), *v as f32))
            .map_err(tensor_err)?
            .into(),
        FeatureValue::Int(v) => Tensor::from_array(Array2::from_elem((1, 1), *v))
            .map_err(tensor_err)?
            .into(),
        FeatureValue::Category(v) => {
            Tensor::from_string_array(&Array2::from_elem((1, 1), v.clone()))
                .map_err(tensor_err)?
                .into()
        }
    };
    Ok(input)
}
