use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};

use impact_core::{
    ConvertError, ConverterConfig, EngineError, FeatureCollection, OutputFormat, Pipeline, RiskEngine,
    ScoreRendering, Shape,
};
use serde_json::{json, Value};

fn collection(n: usize) -> FeatureCollection {
    let features: Vec<Value> = (0..n)
        .map(|i| {
            json!({
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [i as f64 + 0.25, -(i as f64) - 0.5]},
                "properties": {
                    "asset_class": "IndustrialActivity",
                    "type": "Construction",
                    "location": format!("site-{i}")
                }
            })
        })
        .collect();
    FeatureCollection::from_value(json!({
        "type": "FeatureCollection",
        "properties": {
            "include_asset_level": true,
            "include_calc_details": false,
            "include_measures": true,
            "years": [2030, 2050],
            "scenarios": ["ssp126", "ssp585"]
        },
        "features": features
    }))
    .unwrap()
}

/// Deterministic stand-in for the engine: every result is derived from the
/// asset's own request item, so batching cannot change it.
struct FakeEngine {
    calls: AtomicUsize,
}

impl FakeEngine {
    fn new() -> Self {
        Self { calls: AtomicUsize::new(0) }
    }
}

impl RiskEngine for FakeEngine {
    fn call(&self, _request_id: &str, body: &Value) -> Result<Value, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let items = body["assets"]["items"].as_array().cloned().unwrap_or_default();
        let years: Vec<i64> = body["years"].as_array().unwrap().iter().filter_map(Value::as_i64).collect();
        let scenarios: Vec<String> = body["scenarios"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|s| s.as_str().map(str::to_string))
            .collect();

        let mut asset_impacts = Vec::new();
        for item in &items {
            if item["location"] == json!("unreachable") {
                return Err(EngineError::new("get_asset_impact", "no hazard data for location"));
            }
            let lon = item["longitude"].as_f64().unwrap();
            let mut impacts = Vec::new();
            for s in &scenarios {
                for y in &years {
                    impacts.push(json!({
                        "key": {"hazard_type": "RiverineInundation", "scenario_id": s, "year": y},
                        "impact_distribution": {"bin_edges": [0.0, 1.0], "probabilities": [1.0]},
                        "impact_exceedance": {"exceed_probabilities": [1.0], "values": [0.0]},
                        "impact_mean": lon / 10.0 + *y as f64 / 1e4,
                        "impact_std_deviation": -9999,
                        "impact_type": "damage"
                    }));
                }
            }
            asset_impacts.push(json!({"impacts": impacts}));
        }

        let mut groups = Vec::new();
        for s in &scenarios {
            for y in &years {
                let measures: Vec<Value> = items.iter().map(|it| it["latitude"].clone()).collect();
                let scores: Vec<Value> = items.iter().map(score_for).collect();
                groups.push(json!({
                    "key": {"hazard_type": "RiverineInundation", "scenario_id": s, "year": y},
                    "measures_0": measures,
                    "scores": scores
                }));
            }
        }

        Ok(json!({
            "asset_impacts": asset_impacts,
            "risk_measures": {
                "measures_for_assets": groups,
                "score_based_measure_set_defn": {"measure_set_id": "measure_set_0", "asset_measure_ids_for_hazard": {}}
            }
        }))
    }
}

/// Scores cycle -1, 0, 1, 2, 3 with the asset's global position, which the
/// fixture encodes in the integer part of the longitude.
fn score_for(item: &Value) -> Value {
    let position = item["longitude"].as_f64().unwrap().floor() as i64;
    json!(position % 5 - 1)
}

fn config(batch_size: Option<usize>) -> ConverterConfig {
    ConverterConfig {
        batch_size: batch_size.and_then(NonZeroUsize::new),
        ..ConverterConfig::default()
    }
}

#[test]
fn end_to_end_single_asset() {
    let input = FeatureCollection::from_value(json!({
        "type": "FeatureCollection",
        "properties": {"years": [2030], "scenarios": ["ssp126"], "include_measures": true},
        "features": [{
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [65.119, 32.322]},
            "properties": {"asset_class": "IndustrialActivity", "type": "Construction", "location": "Asia"}
        }]
    }))
    .unwrap();

    let engine = |_: &str, body: &Value| -> Result<Value, EngineError> {
        assert_eq!(body["assets"]["items"][0]["longitude"], json!(65.119));
        assert_eq!(body["assets"]["items"][0]["latitude"], json!(32.322));
        assert_eq!(body["group_ids"], json!(["osc"]));
        Ok(json!({
            "asset_impacts": [{"impacts": [{
                "key": {"hazard_type": "ChronicHeat", "scenario_id": "ssp126", "year": 2030},
                "impact_distribution": {"bin_edges": [0.0, 1.0], "probabilities": [1.0]},
                "impact_exceedance": {"exceed_probabilities": [1.0], "values": [0.5]},
                "impact_mean": 0.5,
                "impact_std_deviation": 0.0,
                "impact_type": "disruption"
            }]}],
            "risk_measures": {
                "measures_for_assets": [{
                    "key": {"hazard_type": "ChronicHeat", "scenario_id": "ssp126", "year": 2030},
                    "measures_0": [-9999],
                    "scores": [2]
                }],
                "score_based_measure_set_defn": {"measure_set_id": "measure_set_0"}
            }
        }))
    };

    let out = Pipeline::new(engine, config(None)).run(&input).unwrap();
    let rec = &out.features[0].properties["asset_impacts"]["Chronic Heat"]["SSP1-2.6"]["2030"];
    assert_eq!(rec["impact_mean"], json!(0.5));
    assert_eq!(rec["measures"], Value::Null);
    assert_eq!(rec["score"], json!("Medium"));
    assert_eq!(out.features[0].geometry, input.features[0].geometry);
    assert_eq!(out.properties["score_based_measure_set_defn"]["measure_set_id"], json!("measure_set_0"));
}

#[test]
fn batching_matches_single_call() {
    let input = collection(11);
    let whole = Pipeline::new(FakeEngine::new(), config(None)).run(&input).unwrap();
    for size in [1, 2, 3, 4, 10, 11, 50] {
        let batched_engine = FakeEngine::new();
        let pipeline = Pipeline::new(batched_engine, config(Some(size)));
        let batched = pipeline.run(&input).unwrap();
        assert_eq!(batched, whole, "batch size {size}");
        assert_eq!(pipeline.engine().calls.load(Ordering::SeqCst), input.features.len().div_ceil(size));
    }
}

#[test]
fn batching_matches_single_call_flat() {
    let input = collection(7);
    let whole = Pipeline::new(FakeEngine::new(), config(None)).run_flat(&input).unwrap();
    let batched = Pipeline::new(FakeEngine::new(), config(Some(3))).run_flat(&input).unwrap();
    assert_eq!(batched, whole);
    assert!(whole.features[0].properties["risk_measures"]
        .as_object()
        .unwrap()
        .contains_key("2050_SSP5-8.5_Riverine Inundation"));
}

#[test]
fn order_and_coordinates_preserved() {
    let input = collection(9);
    let out = Pipeline::new(FakeEngine::new(), config(Some(2))).run(&input).unwrap();
    assert_eq!(out.features.len(), input.features.len());
    for (a, b) in out.features.iter().zip(&input.features) {
        assert_eq!(a.lon_lat().unwrap(), b.lon_lat().unwrap());
        assert_eq!(a.properties["location"], b.properties["location"]);
    }
}

#[test]
fn sentinels_and_scores_normalized() {
    let input = collection(5);
    let out = Pipeline::new(FakeEngine::new(), config(Some(2))).run(&input).unwrap();
    let rec = |i: usize| out.features[i].properties["asset_impacts"]["Riverine Inundation"]["SSP5-8.5"]["2030"].clone();
    assert_eq!(rec(0)["impact_std_deviation"], Value::Null);
    assert_eq!(rec(0)["score"], Value::Null);
    assert_eq!(rec(1)["score"], Value::Null);
    assert_eq!(rec(2)["score"], json!("Low"));
    assert_eq!(rec(3)["score"], json!("Medium"));
    assert_eq!(rec(4)["score"], json!("High"));
    assert_eq!(rec(4)["measures"], json!(-4.5));
}

#[test]
fn score_rendering_policies() {
    let input = collection(4);
    let mut cfg = config(None);
    cfg.output = OutputFormat { score_rendering: ScoreRendering::LabelWithNoData, ..OutputFormat::default() };
    let out = Pipeline::new(FakeEngine::new(), cfg.clone()).run(&input).unwrap();
    let score = |i: usize| out.features[i].properties["asset_impacts"]["Riverine Inundation"]["SSP1-2.6"]["2050"]["score"].clone();
    assert_eq!(score(0), Value::Null);
    assert_eq!(score(1), json!("No data"));
    assert_eq!(score(2), json!("Low"));
    assert_eq!(score(3), json!("Medium"));

    cfg.output = OutputFormat { score_rendering: ScoreRendering::Raw, shape: Shape::Nested, ..OutputFormat::default() };
    let out = Pipeline::new(FakeEngine::new(), cfg).run(&input).unwrap();
    let score = |i: usize| out.features[i].properties["asset_impacts"]["Riverine Inundation"]["SSP1-2.6"]["2050"]["score"].clone();
    assert_eq!(score(0), Value::Null);
    assert_eq!(score(3), json!(2));
}

#[test]
fn failing_batch_aborts_whole_run() {
    let mut input = collection(6);
    input.features[4]
        .properties
        .insert("location".into(), json!("unreachable"));
    let result = Pipeline::new(FakeEngine::new(), config(Some(2))).run(&input);
    assert!(matches!(result, Err(ConvertError::Engine(_))));
}

#[test]
fn invalid_feature_aborts_before_engine_call() {
    let mut input = collection(3);
    input.features[1].properties.remove("asset_class");
    let pipeline = Pipeline::new(FakeEngine::new(), config(None));
    match pipeline.run(&input) {
        Err(ConvertError::MissingField(key)) => assert_eq!(key, "properties.asset_class"),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(pipeline.engine().calls.load(Ordering::SeqCst), 0);
}

#[test]
fn malformed_engine_payload_reported() {
    let engine = |_: &str, _: &Value| -> Result<Value, EngineError> { Ok(json!({"asset_impacts": []})) };
    let result = Pipeline::new(engine, config(None)).run(&collection(1));
    assert!(matches!(result, Err(ConvertError::MalformedEngineResponse(msg)) if msg.contains("risk_measures")));
}
