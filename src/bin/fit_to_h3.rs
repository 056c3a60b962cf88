//! Extract GPS points from .fit files and count H3 cell visits per activity.
//!
//! Each .fit file counts as one visit: passing through a cell in 10 different
//! activities gives a count of 10, not the number of GPS points.
//!
//! Usage:
//!   fit_to_h3 /path/to/fit/files -o output.csv
//!   fit_to_h3 /path/to/fit/files --resolution 12 -o output.csv
//!   fit_to_h3 /path/to/fit/files --activity-type generic running -o output.csv

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use route_heatmap::{ActivityFilter, AggregateConfig, CellResolution, aggregate_folder, write_table_file};

#[derive(Parser, Debug)]
#[command(about = "Extract GPS from .fit files and count H3 cells")]
struct Args {
    /// Folder containing .fit files
    folder: PathBuf,

    /// Output CSV file
    #[arg(short, long, default_value = "h3_counts.csv")]
    output: PathBuf,

    /// H3 resolution (0-15)
    #[arg(short, long, default_value_t = CellResolution::DEFAULT_LEVEL)]
    resolution: u8,

    /// Filter by activity type(s), e.g. --activity-type generic running
    #[arg(short = 'a', long = "activity-type", num_args = 1..)]
    activity_types: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if !args.folder.is_dir() {
        anyhow::bail!("{} is not a directory", args.folder.display());
    }

    let filter = ActivityFilter::from_types(args.activity_types);
    let config = AggregateConfig::new(args.resolution, filter)?;

    let filter_msg = if config.activity_filter.is_active() {
        format!(" (filtering: {})", config.activity_filter.labels().join(", "))
    } else {
        String::new()
    };
    println!(
        "Processing .fit files in {} with H3 resolution {}{}",
        args.folder.display(),
        config.resolution.level(),
        filter_msg
    );

    let result = aggregate_folder(&args.folder, &config)?;

    if !result.diagnostics.is_empty() {
        println!("{} items skipped, see warnings above", result.diagnostics.len());
    }

    if result.counts.is_empty() {
        println!("No GPS data found");
        return Ok(());
    }

    write_table_file(&args.output, &result.counts)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    println!(
        "\nWrote {} unique (H3 cell, activity_type) pairs to {}",
        result.counts.len(),
        args.output.display()
    );

    Ok(())
}
