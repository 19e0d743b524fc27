//! The prediction entry point: form in, formatted price out.

use std::path::Path;
use std::sync::Arc;

use crate::features::assemble;
use crate::format::format_price;
use crate::model::{OnnxPriceModel, PriceModel};
use crate::types::{Estimate, FormFields, PriceError, PriceResult};

/// Shared, read-only handle to the loaded model.
///
/// Built once at startup and cloned into every consumer. A predictor without
/// a model still exists so the rest of the application can run; every
/// estimate then fails with [`PriceError::ModelUnavailable`].
#[derive(Clone)]
pub struct Predictor {
    model: Option<Arc<dyn PriceModel>>,
}

impl Predictor {
    /// Wrap an already-loaded model.
    pub fn new(model: Arc<dyn PriceModel>) -> Self {
        Self { model: Some(model) }
    }

    /// A predictor that rejects every estimate.
    pub fn unavailable() -> Self {
        Self { model: None }
    }

    /// Load the ONNX artifact at `path`.
    ///
    /// A missing or unreadable artifact is logged and yields an unavailable
    /// predictor instead of an error.
    pub fn load(path: &Path) -> Self {
        match OnnxPriceModel::load(path) {
            Ok(model) => Self::new(Arc::new(model)),
            Err(PriceError::ModelUnavailable(reason)) if !path.exists() => {
                tracing::warn!(
                    "Price model not found at {}. Predictions are disabled: {reason}",
                    path.display()
                );
                Self::unavailable()
            }
            Err(e) => {
                tracing::error!("Failed to load price model from {}: {e}", path.display());
                Self::unavailable()
            }
        }
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model.as_deref().map(|m| m.name())
    }

    /// Assemble features from a complete submission and run the model.
    pub fn estimate(&self, form: &FormFields) -> PriceResult<Estimate> {
        let model = self.model.as_deref().ok_or_else(|| {
            PriceError::ModelUnavailable("no model loaded".to_string())
        })?;

        let record = assemble(form)?;
        let price = model.predict(&record)?;

        if !price.is_finite() {
            return Err(PriceError::Inference(format!(
                "Model produced a non-finite price: {price}"
            )));
        }

        tracing::debug!("Estimated price {price} with model {}", model.name());

        Ok(Estimate {
            price,
            formatted: format_price(price),
        })
    }
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("model", &self.model_name())
            .finish()
    }
}
