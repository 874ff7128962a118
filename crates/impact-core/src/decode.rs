//! Engine response → per-asset results merged onto GeoJSON features.
//!
//! For each asset index `i`, impact records from `asset_impacts[i]` and the
//! `i`-th entry of every measure group are merged by [`ImpactKey`]. Either side
//! may be missing for a key; the merged entry then simply lacks those fields.

use std::collections::{BTreeMap, HashMap};

use serde_json::{json, Map, Value};

use crate::config::{OutputFormat, Shape};
use crate::error::{ConvertError, Result};
use crate::geojson::{Feature, FeatureCollection};
use crate::labels::{format_hazard_type, format_scenario_id, is_malformed_ssp, score_to_label, ScoreRendering};
use crate::response::{EngineResponse, ImpactKey};
use crate::sentinel::{normalize_in_place, SCORE_KEY};

pub const ASSET_IMPACTS: &str = "asset_impacts";
pub const RISK_MEASURES: &str = "risk_measures";
pub const MEASURE_SET_DEFN: &str = "score_based_measure_set_defn";
pub const RESPONSE_FORMAT: &str = "response_format";
pub const RESPONSE_FORMAT_VERSION: &str = "1.0";
/// Output field for the engine's `measures_0` value; kept as `measures`
/// rather than `measure_value` so existing consumers keep reading it.
pub const MEASURE_KEY: &str = "measures";

// ── Accumulator ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct Entry<'a> {
    impact: Option<&'a Map<String, Value>>,
    measure: Option<(&'a Value, &'a Value)>,
}

type Accumulator<'a> = BTreeMap<&'a ImpactKey, Entry<'a>>;

fn accumulate(response: &EngineResponse, asset: usize) -> Accumulator<'_> {
    let mut acc = Accumulator::new();
    for record in &response.asset_impacts[asset].impacts {
        let entry = acc.entry(&record.key).or_default();
        if entry.impact.is_some() {
            tracing::warn!(asset, key = ?record.key, "duplicate impact record, keeping the last one");
        }
        entry.impact = Some(&record.fields);
    }
    for group in &response.risk_measures.measures_for_assets {
        // Array lengths are checked by EngineResponse::check_measure_arrays.
        if let (Some(value), Some(score)) = (group.measures_0.get(asset), group.scores.get(asset)) {
            let entry = acc.entry(&group.key).or_default();
            if entry.measure.is_some() {
                tracing::warn!(asset, key = ?group.key, "duplicate measure group, keeping the last one");
            }
            entry.measure = Some((value, score));
        }
    }
    acc
}

// ── Key labels ────────────────────────────────────────────────────────────────

/// Display strings for each distinct key, computed once per decode.
struct KeyLabels<'a> {
    display: bool,
    cache: HashMap<&'a ImpactKey, (String, String)>,
}

impl<'a> KeyLabels<'a> {
    fn new(response: &'a EngineResponse, display: bool) -> Self {
        let keys = response
            .asset_impacts
            .iter()
            .flat_map(|a| a.impacts.iter().map(|r| &r.key))
            .chain(response.risk_measures.measures_for_assets.iter().map(|g| &g.key));

        let mut cache = HashMap::new();
        for key in keys {
            cache.entry(key).or_insert_with(|| {
                if display && is_malformed_ssp(&key.scenario_id) {
                    tracing::warn!(scenario_id = %key.scenario_id, "non-compact ssp scenario id left unformatted");
                }
                label_pair(key, display)
            });
        }
        Self { display, cache }
    }

    fn get(&self, key: &ImpactKey) -> (String, String) {
        self.cache
            .get(key)
            .cloned()
            .unwrap_or_else(|| label_pair(key, self.display))
    }
}

fn label_pair(key: &ImpactKey, display: bool) -> (String, String) {
    if display {
        (format_hazard_type(&key.hazard_type), format_scenario_id(&key.scenario_id))
    } else {
        (key.hazard_type.clone(), key.scenario_id.clone())
    }
}

// ── Record rendering ──────────────────────────────────────────────────────────

fn render_score(raw: &Value, rendering: ScoreRendering) -> Value {
    match rendering {
        ScoreRendering::Raw => raw.clone(),
        _ => raw
            .as_i64()
            .and_then(|s| score_to_label(s, rendering))
            .map_or(Value::Null, Value::from),
    }
}

/// Sentinel clean-up runs before score rendering so that a raw `-1` is
/// cleared rather than looked up as a label.
fn finish(mut record: Value, format: &OutputFormat) -> Value {
    if format.strip_sentinels {
        normalize_in_place(&mut record);
    }
    if let Some(score) = record.get_mut(SCORE_KEY) {
        *score = render_score(score, format.score_rendering);
    }
    record
}

fn measure_record(measure: (&Value, &Value)) -> Map<String, Value> {
    let mut m = Map::new();
    m.insert(MEASURE_KEY.into(), measure.0.clone());
    m.insert(SCORE_KEY.into(), measure.1.clone());
    m
}

fn merged_record(entry: &Entry<'_>) -> Map<String, Value> {
    let mut record = entry.impact.cloned().unwrap_or_default();
    if let Some(measure) = entry.measure {
        record.extend(measure_record(measure));
    }
    record
}

// ── Shapes ────────────────────────────────────────────────────────────────────

type Nested = BTreeMap<String, BTreeMap<String, BTreeMap<i64, Value>>>;

fn materialize_nested(acc: &Accumulator<'_>, labels: &KeyLabels<'_>, format: &OutputFormat) -> Result<Value> {
    let mut nested = Nested::new();
    for (key, entry) in acc {
        let (hazard, scenario) = labels.get(key);
        let record = finish(Value::Object(merged_record(entry)), format);
        nested
            .entry(hazard)
            .or_default()
            .entry(scenario)
            .or_default()
            .insert(key.year, record);
    }
    Ok(serde_json::to_value(nested)?)
}

fn flat_key(key: &ImpactKey, labels: &KeyLabels<'_>) -> String {
    let (hazard, scenario) = labels.get(key);
    format!("{}_{}_{}", key.year, scenario, hazard)
}

fn materialize_flat(acc: &Accumulator<'_>, labels: &KeyLabels<'_>, format: &OutputFormat) -> (Value, Value) {
    let mut impacts = Map::new();
    let mut measures = Map::new();
    for (key, entry) in acc {
        let k = flat_key(key, labels);
        if let Some(impact) = entry.impact {
            impacts.insert(k.clone(), finish(Value::Object(impact.clone()), format));
        }
        if let Some(measure) = entry.measure {
            measures.insert(k, finish(Value::Object(measure_record(measure)), format));
        }
    }
    (Value::Object(impacts), Value::Object(measures))
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Decode `response` onto `target`'s features, or onto bare features when no
/// target is given. The response is never modified; `target` is cloned.
///
/// Fails with [`ConvertError::SizeMismatch`] when the response describes a
/// different number of assets than `target` holds.
pub fn decode(
    response: &EngineResponse,
    target: Option<&FeatureCollection>,
    format: &OutputFormat,
) -> Result<FeatureCollection> {
    response.check_measure_arrays()?;
    let n = response.asset_count();

    let mut out = match target {
        Some(t) if t.features.len() != n => {
            return Err(ConvertError::SizeMismatch {
                expected: t.features.len(),
                actual: n,
            })
        }
        Some(t) => t.clone(),
        None => FeatureCollection::new(
            (0..n).map(|_| Feature::new(Value::Null, Map::new())).collect(),
            Map::new(),
        ),
    };

    let labels = KeyLabels::new(response, format.display_keys);
    for (i, feature) in out.features.iter_mut().enumerate() {
        let acc = accumulate(response, i);
        match format.shape {
            Shape::Nested => {
                let nested = materialize_nested(&acc, &labels, format)?;
                feature.properties.insert(ASSET_IMPACTS.into(), nested);
            }
            Shape::Flat => {
                let (impacts, measures) = materialize_flat(&acc, &labels, format);
                feature.properties.insert(ASSET_IMPACTS.into(), impacts);
                feature.properties.insert(RISK_MEASURES.into(), measures);
            }
        }
    }

    out.properties.insert(
        MEASURE_SET_DEFN.into(),
        response.risk_measures.score_based_measure_set_defn.clone(),
    );
    out.properties.insert(
        RESPONSE_FORMAT.into(),
        json!({"shape": format.shape.as_str(), "version": RESPONSE_FORMAT_VERSION}),
    );
    tracing::debug!(assets = n, shape = format.shape.as_str(), "decoded engine response");
    Ok(out)
}
