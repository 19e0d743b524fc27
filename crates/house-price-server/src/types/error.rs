//! Error types and their HTTP status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use house_price::PriceError;

/// Body returned when predictions are requested without a loaded model.
pub const MODEL_UNAVAILABLE_MESSAGE: &str = "Model not loaded. Please check the server logs.";

/// All errors that can occur in the server.
#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    /// The model artifact failed to load at startup.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// A page transition arrived without one of its required fields.
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Coercion or inference failed for a complete submission.
    #[error("An error occurred: {0}")]
    PredictionFailed(String),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::ModelUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::MissingField(_) | ServerError::PredictionFailed(_) => {
                StatusCode::BAD_REQUEST
            }
            ServerError::Config(_)
            | ServerError::Transport(_)
            | ServerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text shown to the client. Internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ServerError::ModelUnavailable(_) => MODEL_UNAVAILABLE_MESSAGE.to_string(),
            ServerError::MissingField(_) | ServerError::PredictionFailed(_) => self.to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl From<PriceError> for ServerError {
    fn from(e: PriceError) -> Self {
        match e {
            PriceError::ModelUnavailable(reason) => ServerError::ModelUnavailable(reason),
            other => ServerError::PredictionFailed(other.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.status(), self.public_message()).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
