//! Engine response payload as received from the risk engine.
//!
//! Arrays are positionally aligned to the request's asset order:
//! `asset_impacts[i]` and `measures_0[i]` / `scores[i]` all describe asset `i`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConvertError, Result};

/// Composite index shared by impact and measure records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImpactKey {
    pub hazard_type: String,
    pub scenario_id: String,
    pub year: i64,
}

impl ImpactKey {
    pub fn new(hazard_type: impl Into<String>, scenario_id: impl Into<String>, year: i64) -> Self {
        Self {
            hazard_type: hazard_type.into(),
            scenario_id: scenario_id.into(),
            year,
        }
    }
}

/// One impact record. Everything except `key` (distribution, exceedance,
/// mean, std deviation, type, optional calc details) is carried verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactRecord {
    pub key: ImpactKey,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetImpacts {
    pub impacts: Vec<ImpactRecord>,
}

/// Measures for one key across all assets, indexed by asset position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureGroup {
    pub key: ImpactKey,
    pub measures_0: Vec<Value>,
    pub scores: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMeasures {
    pub measures_for_assets: Vec<MeasureGroup>,
    /// Opaque metadata, copied into every decoded response.
    #[serde(default)]
    pub score_based_measure_set_defn: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineResponse {
    pub asset_impacts: Vec<AssetImpacts>,
    pub risk_measures: RiskMeasures,
}

impl EngineResponse {
    /// Parse a raw engine payload. Structural problems are reported as
    /// [`ConvertError::MalformedEngineResponse`] naming the missing key.
    pub fn from_value(value: Value) -> Result<Self> {
        let response: Self = serde_json::from_value(value)
            .map_err(|e| ConvertError::MalformedEngineResponse(e.to_string()))?;
        response.check_measure_arrays()?;
        Ok(response)
    }

    pub fn asset_count(&self) -> usize {
        self.asset_impacts.len()
    }

    /// Every measure group must carry exactly one value and one score per
    /// asset. A short array names the first missing index; a long one names
    /// the array and its length.
    pub fn check_measure_arrays(&self) -> Result<()> {
        let n = self.asset_count();
        for (g, group) in self.risk_measures.measures_for_assets.iter().enumerate() {
            for (name, len) in [("measures_0", group.measures_0.len()), ("scores", group.scores.len())] {
                let path = format!("risk_measures.measures_for_assets[{g}].{name}");
                if len < n {
                    return Err(ConvertError::MalformedEngineResponse(format!("{path}[{len}]")));
                }
                if len > n {
                    return Err(ConvertError::MalformedEngineResponse(format!(
                        "{path}: {len} entries for {n} assets"
                    )));
                }
            }
        }
        Ok(())
    }
}
