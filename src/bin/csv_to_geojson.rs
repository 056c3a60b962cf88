//! Convert an H3 cell counts CSV to a GeoJSON heatmap of cell polygons.
//!
//! Usage:
//!   csv_to_geojson h3_counts.csv -o heatmap.geojson --min-count 5
//!   csv_to_geojson h3_counts.csv -o heatmap.geojson --activity-type generic running

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use route_heatmap::export::write_geojson_file;
use route_heatmap::{ActivityFilter, Diagnostics, ExportConfig, export_polygons, read_table_file};

#[derive(Parser, Debug)]
#[command(about = "Convert H3 CSV to GeoJSON")]
struct Args {
    /// Input CSV file
    csv_file: PathBuf,

    /// Output GeoJSON file
    #[arg(short, long, default_value = "heatmap.geojson")]
    output: PathBuf,

    /// Minimum count threshold
    #[arg(long, default_value_t = 5)]
    min_count: u32,

    /// Filter by activity type(s), e.g. --activity-type generic running
    #[arg(short = 'a', long = "activity-type", num_args = 1..)]
    activity_types: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = ExportConfig {
        min_count: args.min_count,
        activity_filter: ActivityFilter::from_types(args.activity_types),
    };

    let filter_msg = if config.activity_filter.is_active() {
        format!(", activity types: {}", config.activity_filter.labels().join(", "))
    } else {
        String::new()
    };
    println!(
        "Converting {} to GeoJSON (min count: {}{})...",
        args.csv_file.display(),
        config.min_count,
        filter_msg
    );

    let table = read_table_file(&args.csv_file)?;
    let mut diagnostics = Diagnostics::new();
    let collection = export_polygons(&table, &config, &mut diagnostics);

    write_geojson_file(&args.output, &collection, false)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    println!(
        "Wrote {} features to {}",
        collection.features.len(),
        args.output.display()
    );
    Ok(())
}
