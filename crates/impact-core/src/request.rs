//! GeoJSON asset collection → engine request.

use serde::{Deserialize, Serialize};

use crate::config::OptionsPolicy;
use crate::error::Result;
use crate::geojson::{Feature, FeatureCollection, RequestOptions};

/// Request id of the asset impact call.
pub const ASSET_IMPACT_REQUEST: &str = "get_asset_impact";
/// Engine group every request is scoped to.
pub const DEFAULT_GROUP_ID: &str = "osc";

/// One asset as the engine expects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetItem {
    pub asset_class: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetItems {
    pub items: Vec<AssetItem>,
}

/// Flat request body for [`ASSET_IMPACT_REQUEST`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineRequest {
    pub assets: AssetItems,
    #[serde(flatten)]
    pub options: RequestOptions,
    pub group_ids: Vec<String>,
}

impl EngineRequest {
    pub fn asset_count(&self) -> usize {
        self.assets.items.len()
    }
}

impl AssetItem {
    pub fn from_feature(feature: &Feature) -> Result<Self> {
        let (longitude, latitude) = feature.lon_lat()?;
        Ok(Self {
            asset_class: feature.string_property("asset_class")?.to_string(),
            asset_type: feature.string_property("type")?.to_string(),
            location: feature.string_property("location")?.to_string(),
            latitude,
            longitude,
        })
    }
}

/// Encode every feature in order. The first feature with a missing property
/// or coordinate fails the whole request.
pub fn encode(collection: &FeatureCollection, policy: OptionsPolicy) -> Result<EngineRequest> {
    let items = collection
        .features
        .iter()
        .map(AssetItem::from_feature)
        .collect::<Result<Vec<_>>>()?;

    let options = match policy {
        OptionsPolicy::PassThrough => collection.options(),
        OptionsPolicy::ForceDefaults => RequestOptions::fixed_defaults(),
    };

    Ok(EngineRequest {
        assets: AssetItems { items },
        options,
        group_ids: vec![DEFAULT_GROUP_ID.to_string()],
    })
}
