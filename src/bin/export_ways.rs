//! Export ways from SQLite to a GeoJSON file for the Leaflet map.
//!
//! Usage:
//!   export_ways                          # Export all ways
//!   export_ways --type smooth_asphalt    # Export one type
//!   export_ways --list-types             # List available types

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use route_heatmap::export::write_geojson_file;
use route_heatmap::WayStore;

#[derive(Parser, Debug)]
#[command(about = "Export ways to GeoJSON")]
struct Args {
    /// Filter by way type
    #[arg(long = "type")]
    way_type: Option<String>,

    /// List available types
    #[arg(long)]
    list_types: bool,

    /// SQLite database path
    #[arg(long, default_value = "data/skating_routes.db")]
    db: PathBuf,

    /// Output file
    #[arg(short, long, default_value = "data/routes.geojson")]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if !args.db.exists() {
        println!("Database not found: {}", args.db.display());
        return Ok(());
    }

    let store = WayStore::open(&args.db)?;

    if args.list_types {
        println!("Available way types:");
        for way_type in store.list_types()? {
            println!("  - {}", way_type);
        }
        return Ok(());
    }

    let collection = store.export(args.way_type.as_deref())?;
    write_geojson_file(&args.output, &collection, true)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    println!(
        "Exported {} features to {}",
        collection.features.len(),
        args.output.display()
    );
    Ok(())
}
