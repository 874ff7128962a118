//! Minimal GeoJSON model for asset collections.
//!
//! Geometry and properties are kept as raw JSON so features round-trip
//! untouched through encode/decode; typed access happens at the edges.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{ConvertError, Result};

pub const FEATURE_COLLECTION: &str = "FeatureCollection";
pub const FEATURE: &str = "Feature";

/// An ordered sequence of asset features plus collection-level properties.
/// Feature position is asset identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "feature_collection_type")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
}

/// One GeoJSON feature representing a physical asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,
    #[serde(default)]
    pub geometry: Value,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

fn feature_collection_type() -> String {
    FEATURE_COLLECTION.to_string()
}

fn feature_type() -> String {
    FEATURE.to_string()
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>, properties: Map<String, Value>) -> Self {
        Self {
            kind: feature_collection_type(),
            features,
            properties,
        }
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Same collection-level properties, different features.
    pub fn with_features(&self, features: Vec<Feature>) -> Self {
        Self {
            kind: self.kind.clone(),
            features,
            properties: self.properties.clone(),
        }
    }

    pub fn options(&self) -> RequestOptions {
        RequestOptions::from_properties(&self.properties)
    }
}

impl Feature {
    pub fn new(geometry: Value, properties: Map<String, Value>) -> Self {
        Self {
            kind: feature_type(),
            geometry,
            properties,
        }
    }

    /// Required string property, e.g. `asset_class`.
    pub fn string_property(&self, key: &str) -> Result<&str> {
        self.properties
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| ConvertError::MissingField(format!("properties.{key}")))
    }

    /// `(longitude, latitude)` from `geometry.coordinates`, in that order.
    pub fn lon_lat(&self) -> Result<(f64, f64)> {
        let coords = self
            .geometry
            .get("coordinates")
            .and_then(Value::as_array)
            .ok_or_else(|| ConvertError::MissingField("geometry.coordinates".into()))?;
        let axis = |idx: usize| {
            coords
                .get(idx)
                .and_then(Value::as_f64)
                .ok_or_else(|| ConvertError::MissingField(format!("geometry.coordinates[{idx}]")))
        };
        Ok((axis(0)?, axis(1)?))
    }
}

/// Collection-level request options, copied verbatim from the caller's
/// properties. Absent keys stay `None` and are sent as `null`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequestOptions {
    pub include_asset_level: Option<Value>,
    pub include_calc_details: Option<Value>,
    pub include_measures: Option<Value>,
    pub years: Option<Value>,
    pub scenarios: Option<Value>,
}

impl RequestOptions {
    /// Fixed policy used when a deployment forces defaults.
    pub fn fixed_defaults() -> Self {
        Self {
            include_asset_level: Some(Value::Bool(true)),
            include_calc_details: Some(Value::Bool(true)),
            include_measures: Some(Value::Bool(true)),
            years: Some(json!([2030, 2040, 2050])),
            scenarios: Some(json!(["ssp126", "ssp245", "ssp585"])),
        }
    }

    /// Read options from collection properties without reinterpreting them;
    /// type checking is left to the engine.
    pub fn from_properties(props: &Map<String, Value>) -> Self {
        let copy = |key: &str| props.get(key).cloned();
        Self {
            include_asset_level: copy("include_asset_level"),
            include_calc_details: copy("include_calc_details"),
            include_measures: copy("include_measures"),
            years: copy("years"),
            scenarios: copy("scenarios"),
        }
    }
}
