//! HTTP client for a risk engine exposing `POST {base_url}/api/{request_id}`.

use std::time::Duration;

use impact_core::{EngineError, RiskEngine};
use serde_json::Value;

pub struct HttpRiskEngine {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl HttpRiskEngine {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn endpoint(&self, request_id: &str) -> String {
        format!("{}/api/{}", self.base_url, request_id)
    }
}

impl RiskEngine for HttpRiskEngine {
    fn call(&self, request_id: &str, body: &Value) -> Result<Value, EngineError> {
        let url = self.endpoint(request_id);
        tracing::debug!(%url, "calling risk engine");

        let mut request = self.agent.post(&url);
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }
        let response = request.send_json(body).map_err(|e| match e {
            ureq::Error::Status(code, resp) => {
                let detail = resp.into_string().unwrap_or_default();
                EngineError::new(request_id, format!("HTTP {code}: {detail}"))
            }
            other => EngineError::new(request_id, other.to_string()),
        })?;

        response
            .into_json::<Value>()
            .map_err(|e| EngineError::new(request_id, format!("invalid JSON body: {e}")))
    }
}
