//! Run the heatmap pipeline in memory: samples -> visit counts -> CSV -> GeoJSON.
//!
//! Run with: cargo run --example heatmap_pipeline

use route_heatmap::{
    AggregateConfig, Diagnostics, ExportConfig, Sample, VisitCounts, export_polygons,
    read_table, visits_from_samples, write_table,
};

fn main() {
    let config = AggregateConfig::default();
    let mut diagnostics = Diagnostics::new();

    // Three "files" along the Barcelona seafront; the first two share a stretch
    let rides: Vec<Vec<Sample>> = vec![
        (0..20).map(|i| Sample::new(41.3780 + i as f64 * 0.0002, 2.1900, "generic")).collect(),
        (0..20).map(|i| Sample::new(41.3780 + i as f64 * 0.0002, 2.1900, "generic")).collect(),
        (0..20).map(|i| Sample::new(41.3850, 2.1950 + i as f64 * 0.0002, "running")).collect(),
    ];

    let counts = rides
        .iter()
        .map(|samples| visits_from_samples(samples, &config, &mut diagnostics))
        .fold(VisitCounts::new(), VisitCounts::merge);

    println!("Heatmap Pipeline\n");
    println!("Resolution {}: {} (cell, activity) pairs", config.resolution.level(), counts.len());
    for record in counts.most_common().iter().take(3) {
        println!("  {} {:<8} {}", record.cell, record.activity_type, record.count);
    }

    let mut csv = Vec::new();
    write_table(&mut csv, &counts).expect("in-memory write");
    let table = read_table(csv.as_slice()).expect("table was just written");

    let export = ExportConfig { min_count: 2, ..ExportConfig::default() };
    let collection = export_polygons(&table, &export, &mut diagnostics);

    println!("\nCells visited at least {} times: {}", export.min_count, collection.features.len());
    println!("Skipped items: {}", diagnostics.len());
}
