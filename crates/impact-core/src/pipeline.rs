//! Batched round trip: GeoJSON → engine request → engine → decoded GeoJSON.

use crate::batch::{merge, split};
use crate::config::{ConverterConfig, OutputFormat, Shape};
use crate::decode::decode;
use crate::engine::RiskEngine;
use crate::error::{ConvertError, Result};
use crate::geojson::FeatureCollection;
use crate::request::{encode, ASSET_IMPACT_REQUEST};
use crate::response::EngineResponse;

/// Runs asset collections through a [`RiskEngine`].
///
/// Each batch is encoded, sent and decoded on its own; asset indices inside an
/// engine response are batch-local. Any failing batch fails the whole run, so
/// no collection is ever returned with assets silently missing.
pub struct Pipeline<E> {
    engine: E,
    config: ConverterConfig,
}

impl<E: RiskEngine> Pipeline<E> {
    pub fn new(engine: E, config: ConverterConfig) -> Self {
        Self { engine, config }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Decode with the configured output format.
    pub fn run(&self, collection: &FeatureCollection) -> Result<FeatureCollection> {
        self.run_with(collection, &self.config.output)
    }

    /// Decode with the flat shape regardless of the configured one.
    pub fn run_flat(&self, collection: &FeatureCollection) -> Result<FeatureCollection> {
        let format = OutputFormat {
            shape: Shape::Flat,
            ..self.config.output
        };
        self.run_with(collection, &format)
    }

    fn run_with(&self, collection: &FeatureCollection, format: &OutputFormat) -> Result<FeatureCollection> {
        let batches = match self.config.batch_size {
            Some(size) => split(collection, size),
            None => vec![collection.clone()],
        };
        tracing::info!(
            features = collection.features.len(),
            batches = batches.len(),
            shape = format.shape.as_str(),
            "running asset impact request"
        );
        let decoded = self.process_all(&batches, format)?;
        Ok(merge(decoded))
    }

    #[cfg(feature = "threading")]
    fn process_all(&self, batches: &[FeatureCollection], format: &OutputFormat) -> Result<Vec<FeatureCollection>> {
        use rayon::prelude::*;
        batches
            .par_iter()
            .enumerate()
            .map(|(i, batch)| self.process_batch(i, batch, format))
            .collect()
    }

    #[cfg(not(feature = "threading"))]
    fn process_all(&self, batches: &[FeatureCollection], format: &OutputFormat) -> Result<Vec<FeatureCollection>> {
        batches
            .iter()
            .enumerate()
            .map(|(i, batch)| self.process_batch(i, batch, format))
            .collect()
    }

    fn process_batch(&self, index: usize, batch: &FeatureCollection, format: &OutputFormat) -> Result<FeatureCollection> {
        let _span = tracing::debug_span!("batch", index, features = batch.features.len()).entered();
        let result = self.round_trip(batch, format);
        if let Err(e) = &result {
            tracing::warn!(batch = index, error = %e, "batch failed");
        }
        result
    }

    fn round_trip(&self, batch: &FeatureCollection, format: &OutputFormat) -> Result<FeatureCollection> {
        let request = encode(batch, self.config.options)?;
        let body = serde_json::to_value(&request)?;
        let raw = self.engine.call(ASSET_IMPACT_REQUEST, &body)?;
        let response = EngineResponse::from_value(raw)?;

        if response.asset_count() != request.asset_count() {
            return Err(ConvertError::SizeMismatch {
                expected: request.asset_count(),
                actual: response.asset_count(),
            });
        }
        decode(&response, Some(batch), format)
    }
}
