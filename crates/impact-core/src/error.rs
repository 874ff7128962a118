use thiserror::Error;

/// Failure reported by a [`crate::engine::RiskEngine`] implementation.
#[derive(Debug, Error)]
#[error("risk engine call `{request_id}` failed: {message}")]
pub struct EngineError {
    pub request_id: String,
    pub message: String,
}

impl EngineError {
    pub fn new(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while converting between GeoJSON and the engine protocol.
///
/// Every variant names the key, index or count that caused it. None of them is
/// recovered locally: a missing impact is never replaced by fabricated data.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// A required input key or property is absent.
    #[error("missing field `{0}`")]
    MissingField(String),

    /// The engine payload lacks an expected key or array index.
    #[error("malformed engine response: `{0}`")]
    MalformedEngineResponse(String),

    /// Two positionally aligned sequences disagree in length.
    #[error("size mismatch: expected {expected} entries, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
