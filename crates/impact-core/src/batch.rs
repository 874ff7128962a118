//! Splitting collections into bounded engine calls and reassembling them.

use std::num::NonZeroUsize;

use crate::geojson::FeatureCollection;

/// Split into contiguous, order-preserving batches of at most `batch_size`
/// features. Each batch keeps the collection-level properties. An empty
/// collection yields a single empty batch so its properties survive `merge`.
pub fn split(collection: &FeatureCollection, batch_size: NonZeroUsize) -> Vec<FeatureCollection> {
    if collection.features.is_empty() {
        return vec![collection.clone()];
    }
    collection
        .features
        .chunks(batch_size.get())
        .map(|chunk| collection.with_features(chunk.to_vec()))
        .collect()
}

/// Concatenate batches in order. Collection-level properties come from the
/// first batch; every decoded batch carries the same ones.
pub fn merge(batches: Vec<FeatureCollection>) -> FeatureCollection {
    let mut batches = batches.into_iter();
    let Some(mut merged) = batches.next() else {
        return FeatureCollection::new(Vec::new(), Default::default());
    };
    for batch in batches {
        merged.features.extend(batch.features);
    }
    merged
}
