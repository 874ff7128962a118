//! `asset-impact`: send a GeoJSON asset collection to a risk engine and write
//! the per-asset impacts and risk measures back as GeoJSON.

mod engine;
mod source;

use std::fs;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use impact_core::hazard::HazardDataQuery;
use impact_core::{ConverterConfig, FeatureCollection, OptionsPolicy, Pipeline, ScoreRendering, Shape};
use tracing_subscriber::EnvFilter;

use crate::engine::HttpRiskEngine;
use crate::source::{load_json, write_json};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "asset-impact", about = "Climate hazard impacts and risk scores for GeoJSON assets")]
struct Cli {
    #[command(flatten)]
    engine: EngineArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct EngineArgs {
    /// Base URL of the risk engine API.
    #[arg(long, env = "RISK_ENGINE_URL", default_value = "http://localhost:8080", global = true)]
    engine_url: String,

    /// Bearer token sent to the risk engine.
    #[arg(long, env = "RISK_ENGINE_TOKEN", hide_env_values = true, global = true)]
    engine_token: Option<String>,

    /// Per-call timeout in seconds.
    #[arg(long, default_value = "300", global = true)]
    timeout_secs: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Asset impact request for a GeoJSON FeatureCollection.
    Impact(ImpactArgs),
    /// Point hazard indicator query.
    HazardData(HazardArgs),
}

#[derive(Args, Debug)]
struct ImpactArgs {
    /// GeoJSON FeatureCollection: local path or http(s) URL.
    #[arg(short, long)]
    input: String,

    /// Output path (stdout when omitted).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Converter configuration JSON; flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum assets per engine call.
    #[arg(long)]
    batch_size: Option<NonZeroUsize>,

    /// Send the whole collection in one engine call.
    #[arg(long, conflicts_with = "batch_size")]
    no_batching: bool,

    /// Flat `{year}_{scenario}_{hazard}` keys instead of nested maps.
    #[arg(long)]
    flat: bool,

    /// Ignore the collection's options and request the fixed default set.
    #[arg(long)]
    force_defaults: bool,

    #[arg(long, value_enum)]
    score_rendering: Option<ScoreArg>,

    /// Keep -9999 and score -1 markers instead of replacing them with null.
    #[arg(long)]
    keep_sentinels: bool,

    /// Use engine identifiers (ChronicHeat, ssp126) as result keys.
    #[arg(long)]
    raw_keys: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ScoreArg {
    Raw,
    LabelWithNoData,
    LabelOrAbsent,
}

impl From<ScoreArg> for ScoreRendering {
    fn from(arg: ScoreArg) -> Self {
        match arg {
            ScoreArg::Raw => ScoreRendering::Raw,
            ScoreArg::LabelWithNoData => ScoreRendering::LabelWithNoData,
            ScoreArg::LabelOrAbsent => ScoreRendering::LabelOrAbsent,
        }
    }
}

#[derive(Args, Debug)]
struct HazardArgs {
    #[arg(long, default_value = "Test")]
    request_item_id: String,

    #[arg(long, default_value = "2050")]
    year: i64,

    #[arg(long, default_value = "ssp585")]
    scenario: String,

    #[arg(long, default_value = "mean_work_loss/high")]
    indicator_id: String,

    #[arg(long, default_value = "ChronicHeat")]
    event_type: String,

    #[arg(long, num_args = 1.., default_values_t = HazardDataQuery::default().longitudes)]
    longitudes: Vec<f64>,

    #[arg(long, num_args = 1.., default_values_t = HazardDataQuery::default().latitudes)]
    latitudes: Vec<f64>,

    /// Output path (stdout when omitted).
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl From<HazardArgs> for HazardDataQuery {
    fn from(a: HazardArgs) -> Self {
        Self {
            request_item_id: a.request_item_id,
            event_type: a.event_type,
            longitudes: a.longitudes,
            latitudes: a.latitudes,
            indicator_id: a.indicator_id,
            scenario: a.scenario,
            year: a.year,
        }
    }
}

// ── Configuration ─────────────────────────────────────────────────────────────

fn resolve_config(args: &ImpactArgs) -> Result<ConverterConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            ConverterConfig::from_json(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => ConverterConfig::default(),
    };

    if args.no_batching {
        config.batch_size = None;
    } else if let Some(size) = args.batch_size {
        config.batch_size = Some(size);
    }
    if args.flat {
        config.output.shape = Shape::Flat;
    }
    if args.force_defaults {
        config.options = OptionsPolicy::ForceDefaults;
    }
    if let Some(score) = args.score_rendering {
        config.output.score_rendering = score.into();
    }
    if args.keep_sentinels {
        config.output.strip_sentinels = false;
    }
    if args.raw_keys {
        config.output.display_keys = false;
    }
    Ok(config)
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn run_impact(engine: HttpRiskEngine, args: ImpactArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    let input = load_json(&args.input)?;
    let collection = FeatureCollection::from_value(input)
        .with_context(|| format!("{} is not a GeoJSON FeatureCollection", args.input))?;

    let pipeline = Pipeline::new(engine, config);
    let result = pipeline.run(&collection).context("asset impact request failed")?;
    write_json(&result, args.output.as_deref())
}

fn run_hazard_data(engine: HttpRiskEngine, args: HazardArgs) -> Result<()> {
    let output = args.output.clone();
    let query = HazardDataQuery::from(args);
    let response = query.send(&engine).context("hazard data request failed")?;
    write_json(&response, output.as_deref())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("impact_core=info,asset_impact=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging();
    let cli = Cli::parse();

    let engine = HttpRiskEngine::new(
        &cli.engine.engine_url,
        cli.engine.engine_token.clone(),
        Duration::from_secs(cli.engine.timeout_secs),
    );

    match cli.command {
        Command::Impact(args) => run_impact(engine, args),
        Command::HazardData(args) => run_hazard_data(engine, args),
    }
}
