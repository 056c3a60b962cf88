//! Fetch skate parks / pump tracks or drinking water from the Overpass API
//! and save them as GeoJSON points.
//!
//! Usage:
//!   fetch_pois --kind skate-parks
//!   fetch_pois --kind drinking-water -o water.geojson

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use route_heatmap::export::write_geojson_file;
use route_heatmap::overpass::{DEFAULT_BBOX, OverpassClient, OverpassConfig, load_bbox};
use route_heatmap::PoiKind;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    SkateParks,
    DrinkingWater,
}

impl From<Kind> for PoiKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::SkateParks => PoiKind::SkateParks,
            Kind::DrinkingWater => PoiKind::DrinkingWater,
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Fetch points of interest from Overpass and save as GeoJSON")]
struct Args {
    /// Which layer to fetch
    #[arg(long, value_enum)]
    kind: Kind,

    /// File holding a south,west,north,east bounding box
    #[arg(long, default_value = "queries/bbox.overpassql")]
    bbox_file: PathBuf,

    /// Output file (defaults to the layer's file under data/)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let kind = PoiKind::from(args.kind);
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(kind.default_output()));

    let bbox = load_bbox(&args.bbox_file).unwrap_or_else(|| DEFAULT_BBOX.to_string());
    println!("Fetching {} (bbox: {})...", kind.label(), bbox);

    let client = OverpassClient::new(&OverpassConfig {
        timeout: Duration::from_secs(180),
        ..OverpassConfig::default()
    })?;
    let data = client.fetch(&kind.query(&bbox)).await?;

    let collection = kind.to_geojson(&data.elements);
    write_geojson_file(&output, &collection, true)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!("Saved {} features to {}", collection.features.len(), output.display());
    Ok(())
}
