use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::labels::ScoreRendering;

/// Where request options come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionsPolicy {
    /// Copy the caller's collection-level options verbatim.
    #[default]
    PassThrough,
    /// Ignore the caller and send [`crate::geojson::RequestOptions::fixed_defaults`].
    ForceDefaults,
}

/// Layout of per-asset results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// `hazard_type -> scenario_id -> year -> record`.
    #[default]
    Nested,
    /// `"{year}_{scenario_id}_{hazard_type}" -> record`.
    Flat,
}

impl Shape {
    pub fn as_str(self) -> &'static str {
        match self {
            Shape::Nested => "nested",
            Shape::Flat => "flat",
        }
    }
}

/// Output-format configuration for the response decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputFormat {
    pub shape: Shape,
    pub score_rendering: ScoreRendering,
    /// Replace `-9999` leaves and `score: -1` with `null`.
    pub strip_sentinels: bool,
    /// Use display names (`"Chronic Heat"`, `"SSP1-2.6"`) in result keys.
    pub display_keys: bool,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self {
            shape: Shape::Nested,
            score_rendering: ScoreRendering::LabelOrAbsent,
            strip_sentinels: true,
            display_keys: true,
        }
    }
}

pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Full converter configuration. Every field has a default, so a partial JSON
/// document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    pub options: OptionsPolicy,
    pub output: OutputFormat,
    /// Maximum features per engine call. `None` sends the whole collection.
    pub batch_size: Option<NonZeroUsize>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            options: OptionsPolicy::PassThrough,
            output: OutputFormat::default(),
            batch_size: NonZeroUsize::new(DEFAULT_BATCH_SIZE),
        }
    }
}

impl ConverterConfig {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
