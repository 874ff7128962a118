//! Conversion and batching layer between GeoJSON asset collections and the
//! flat, key-indexed protocol of a physical climate risk engine.
//!
//! Flow:
//!   GeoJSON → [`batch::split`] → [`request::encode`] → [`engine::RiskEngine`] →
//!   [`decode::decode`] (with [`sentinel`] and [`labels`]) → [`batch::merge`] → GeoJSON.
//!
//! [`pipeline::Pipeline`] wires these together. The crate emits `tracing`
//! events and never installs a subscriber itself.

pub mod batch;
pub mod config;
pub mod decode;
pub mod engine;
pub mod error;
pub mod geojson;
pub mod hazard;
pub mod labels;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod sentinel;

pub use config::{ConverterConfig, OptionsPolicy, OutputFormat, Shape};
pub use engine::RiskEngine;
pub use error::{ConvertError, EngineError, Result};
pub use geojson::{Feature, FeatureCollection, RequestOptions};
pub use labels::ScoreRendering;
pub use pipeline::Pipeline;
