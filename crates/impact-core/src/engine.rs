use serde_json::Value;

use crate::error::EngineError;

/// The external hazard computation service, seen as one request/response call.
///
/// Implementations are shared across batches, hence `Sync`. No retry happens
/// on this side: a failed call fails the pipeline.
pub trait RiskEngine: Sync {
    fn call(&self, request_id: &str, body: &Value) -> Result<Value, EngineError>;
}

impl<F> RiskEngine for F
where
    F: Fn(&str, &Value) -> Result<Value, EngineError> + Sync,
{
    fn call(&self, request_id: &str, body: &Value) -> Result<Value, EngineError> {
        self(request_id, body)
    }
}
