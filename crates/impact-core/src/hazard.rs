//! Point hazard-indicator queries (`get_hazard_data`).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::engine::RiskEngine;
use crate::error::{ConvertError, Result};
use crate::request::DEFAULT_GROUP_ID;

pub const HAZARD_DATA_REQUEST: &str = "get_hazard_data";

/// One hazard indicator lookup over a set of points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardDataQuery {
    pub request_item_id: String,
    pub event_type: String,
    pub longitudes: Vec<f64>,
    pub latitudes: Vec<f64>,
    pub indicator_id: String,
    pub scenario: String,
    pub year: i64,
}

impl Default for HazardDataQuery {
    fn default() -> Self {
        Self {
            request_item_id: "Test".into(),
            event_type: "ChronicHeat".into(),
            longitudes: vec![69.4787, 68.71, 20.1047],
            latitudes: vec![34.556, 35.9416, 39.9116],
            indicator_id: "mean_work_loss/high".into(),
            scenario: "ssp585".into(),
            year: 2050,
        }
    }
}

impl HazardDataQuery {
    /// Request body. Longitudes and latitudes pair up by index, so their
    /// lengths must agree.
    pub fn encode(&self) -> Result<Value> {
        if self.longitudes.len() != self.latitudes.len() {
            return Err(ConvertError::SizeMismatch {
                expected: self.longitudes.len(),
                actual: self.latitudes.len(),
            });
        }
        let item = serde_json::to_value(self)?;
        Ok(json!({
            "group_ids": [DEFAULT_GROUP_ID],
            "items": [item],
        }))
    }

    /// Encode and send. The response is returned as the engine produced it.
    pub fn send(&self, engine: &impl RiskEngine) -> Result<Value> {
        let body = self.encode()?;
        tracing::debug!(
            request_item_id = %self.request_item_id,
            points = self.longitudes.len(),
            "sending hazard data query"
        );
        Ok(engine.call(HAZARD_DATA_REQUEST, &body)?)
    }
}
