//! Fetch ways from the Overpass API and store them in SQLite with GeoJSON geometry.
//!
//! Usage:
//!   overpass_to_db --query "way[surface=asphalt](41.35,2.10,41.42,2.20);" --type smooth_asphalt
//!   overpass_to_db --query-file my_query.txt --type bike_lanes

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use route_heatmap::overpass::{
    OverpassClient, OverpassConfig, build_way_query, load_bbox, sanitize_query,
};
use route_heatmap::WayStore;

#[derive(Parser, Debug)]
#[command(about = "Import Overpass ways to SQLite")]
#[command(group(ArgGroup::new("source").required(true).args(["query", "query_file"])))]
struct Args {
    /// Overpass query string
    #[arg(long)]
    query: Option<String>,

    /// File containing an Overpass query
    #[arg(long)]
    query_file: Option<PathBuf>,

    /// Way type label
    #[arg(long = "type")]
    way_type: String,

    /// SQLite database path
    #[arg(long, default_value = "data/skating_routes.db")]
    db: PathBuf,

    /// File holding a south,west,north,east bounding box
    #[arg(long, default_value = "queries/bbox.overpassql")]
    bbox_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let raw_query = match (&args.query, &args.query_file) {
        (Some(query), _) => query.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
            .trim()
            .to_string(),
        (None, None) => anyhow::bail!("either --query or --query-file is required"),
    };
    let bbox = load_bbox(&args.bbox_file);
    let query = build_way_query(&sanitize_query(&raw_query), bbox.as_deref());

    println!("Fetching from Overpass API...");
    let client = OverpassClient::new(&OverpassConfig::default())?;
    let data = client.fetch(&query).await?;

    let mut store = WayStore::open(&args.db)?;
    let count = store.store_ways(&data.elements, &args.way_type)?;

    println!(
        "Stored {} ways with type '{}' in {}",
        count,
        args.way_type,
        args.db.display()
    );
    Ok(())
}
