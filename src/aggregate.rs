//! Visit counting over H3 cells.
//!
//! Each track file counts as one visit to every (cell, activity) pair it
//! touches, however many GPS fixes land in that cell. Passing through a cell
//! in 10 different activities gives a count of 10, not the number of points.
//!
//! Every file produces its own [`AggregateResult`]; results are combined with
//! [`AggregateResult::merge`], which is associative, so the fold can run
//! sequentially or as a parallel reduce with identical output.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::info;

use crate::cells::{CellResolution, index_samples};
use crate::track::{find_track_files, read_track};
use crate::{ActivityFilter, Diagnostics, Error, Result, Sample};

/// Configuration for visit aggregation
#[derive(Debug, Clone, Default)]
pub struct AggregateConfig {
    /// H3 resolution (default: 13)
    pub resolution: CellResolution,
    /// Activity labels to keep; applied before per-file deduplication
    pub activity_filter: ActivityFilter,
}

impl AggregateConfig {
    /// Create a config, validating the resolution level.
    pub fn new(resolution: u8, activity_filter: ActivityFilter) -> Result<Self> {
        Ok(Self {
            resolution: CellResolution::new(resolution)?,
            activity_filter,
        })
    }
}

/// Number of files that visited a (cell, activity) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitRecord {
    pub cell: String,
    pub activity_type: String,
    pub count: u32,
}

/// Insertion-ordered visit counter keyed by (cell, activity).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitCounts {
    records: Vec<VisitRecord>,
    index: HashMap<(String, String), usize>,
}

impl VisitCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` visits to a pair, appending it if unseen.
    pub fn add(&mut self, cell: &str, activity_type: &str, count: u32) {
        let key = (cell.to_string(), activity_type.to_string());
        match self.index.get(&key) {
            Some(&i) => self.records[i].count += count,
            None => {
                self.index.insert(key, self.records.len());
                self.records.push(VisitRecord {
                    cell: cell.to_string(),
                    activity_type: activity_type.to_string(),
                    count,
                });
            }
        }
    }

    pub fn get(&self, cell: &str, activity_type: &str) -> Option<u32> {
        self.index
            .get(&(cell.to_string(), activity_type.to_string()))
            .map(|&i| self.records[i].count)
    }

    /// Sum another counter into this one. Pairs new to `self` keep the order
    /// they had in `other`.
    pub fn merge(mut self, other: VisitCounts) -> Self {
        for record in other.records {
            self.add(&record.cell, &record.activity_type, record.count);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &VisitRecord> {
        self.records.iter()
    }

    /// Records sorted by descending count; ties keep first-seen order.
    pub fn most_common(&self) -> Vec<VisitRecord> {
        let mut sorted = self.records.clone();
        sorted.sort_by(|a, b| b.count.cmp(&a.count));
        sorted
    }
}

impl FromIterator<VisitRecord> for VisitCounts {
    fn from_iter<T: IntoIterator<Item = VisitRecord>>(iter: T) -> Self {
        let mut counts = VisitCounts::new();
        for record in iter {
            counts.add(&record.cell, &record.activity_type, record.count);
        }
        counts
    }
}

/// Per-file processing stats
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSummary {
    pub path: PathBuf,
    /// GPS samples kept after the activity filter
    pub sample_count: usize,
    /// Distinct (cell, activity) pairs in this file
    pub unique_cells: usize,
}

/// Output of aggregating one or more track files
#[derive(Debug, Clone, Default)]
pub struct AggregateResult {
    pub counts: VisitCounts,
    pub tracks: Vec<TrackSummary>,
    pub diagnostics: Diagnostics,
}

impl AggregateResult {
    /// Combine two results, `self` first.
    pub fn merge(mut self, other: AggregateResult) -> Self {
        self.counts = self.counts.merge(other.counts);
        self.tracks.extend(other.tracks);
        self.diagnostics.extend(other.diagnostics);
        self
    }
}

/// Distinct (cell, activity) pairs of a single file, each counted once.
pub fn visits_from_samples(
    samples: &[Sample],
    config: &AggregateConfig,
    diagnostics: &mut Diagnostics,
) -> VisitCounts {
    let kept: Vec<Sample> = samples
        .iter()
        .filter(|s| config.activity_filter.allows(&s.activity_type))
        .cloned()
        .collect();

    let mut visits = VisitCounts::new();
    for (cell, activity_type) in index_samples(&kept, config.resolution, diagnostics) {
        if visits.get(&cell, &activity_type).is_none() {
            visits.add(&cell, &activity_type, 1);
        }
    }
    visits
}

/// Read and count a single track file.
pub fn process_track(path: &Path, config: &AggregateConfig) -> AggregateResult {
    let mut diagnostics = Diagnostics::new();
    let samples = read_track(path, &mut diagnostics);
    let sample_count = samples
        .iter()
        .filter(|s| config.activity_filter.allows(&s.activity_type))
        .count();
    let counts = visits_from_samples(&samples, config, &mut diagnostics);

    info!(
        "Processing {}: {} GPS points -> {} unique H3 cells",
        path.file_name().map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned()),
        sample_count,
        counts.len()
    );

    AggregateResult {
        tracks: vec![TrackSummary {
            path: path.to_path_buf(),
            sample_count,
            unique_cells: counts.len(),
        }],
        counts,
        diagnostics,
    }
}

/// Count visits over many files, one after another.
pub fn aggregate_tracks(paths: &[PathBuf], config: &AggregateConfig) -> AggregateResult {
    paths
        .iter()
        .map(|path| process_track(path, config))
        .fold(AggregateResult::default(), AggregateResult::merge)
}

/// Count visits over many files using rayon.
///
/// Produces the same result as [`aggregate_tracks`], including record order.
#[cfg(feature = "parallel")]
pub fn aggregate_tracks_parallel(paths: &[PathBuf], config: &AggregateConfig) -> AggregateResult {
    use rayon::prelude::*;

    paths
        .par_iter()
        .map(|path| process_track(path, config))
        .reduce(AggregateResult::default, AggregateResult::merge)
}

/// Count visits over every track file in a folder.
///
/// Fails with [`Error::NotADirectory`] before touching any file if `folder`
/// is not a directory.
pub fn aggregate_folder(folder: &Path, config: &AggregateConfig) -> Result<AggregateResult> {
    if !folder.is_dir() {
        return Err(Error::NotADirectory(folder.to_path_buf()));
    }

    let files = find_track_files(folder)?;
    if files.is_empty() {
        info!("No .fit files found in {}", folder.display());
    }

    #[cfg(feature = "parallel")]
    let result = aggregate_tracks_parallel(&files, config);
    #[cfg(not(feature = "parallel"))]
    let result = aggregate_tracks(&files, config);

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Diagnostic;

    fn config_with(filter: &[&str]) -> AggregateConfig {
        AggregateConfig::new(13, ActivityFilter::from_types(filter.iter().copied())).unwrap()
    }

    #[test]
    fn test_config_rejects_bad_resolution() {
        assert!(matches!(
            AggregateConfig::new(16, ActivityFilter::any()),
            Err(Error::InvalidResolution(16))
        ));
    }

    #[test]
    fn test_same_location_counts_once_per_file() {
        let samples = vec![
            Sample::new(41.3874, 2.1686, "generic"),
            Sample::new(41.3874, 2.1686, "generic"),
        ];
        let mut diagnostics = Diagnostics::new();
        let visits = visits_from_samples(&samples, &config_with(&[]), &mut diagnostics);

        assert_eq!(visits.len(), 1);
        let record = visits.iter().next().unwrap();
        assert_eq!(record.activity_type, "generic");
        assert_eq!(record.count, 1);
    }

    #[test]
    fn test_dense_track_counts_once() {
        let samples: Vec<Sample> = (0..500).map(|_| Sample::new(41.3874, 2.1686, "running")).collect();
        let mut diagnostics = Diagnostics::new();
        let visits = visits_from_samples(&samples, &config_with(&[]), &mut diagnostics);
        assert_eq!(visits.most_common()[0].count, 1);
    }

    #[test]
    fn test_same_cell_different_activities_are_separate() {
        let samples = vec![
            Sample::new(41.3874, 2.1686, "generic"),
            Sample::new(41.3874, 2.1686, "running"),
        ];
        let mut diagnostics = Diagnostics::new();
        let visits = visits_from_samples(&samples, &config_with(&[]), &mut diagnostics);
        assert_eq!(visits.len(), 2);
    }

    #[test]
    fn test_filter_applies_before_dedup() {
        let samples = vec![
            Sample::new(41.3874, 2.1686, "generic"),
            Sample::new(41.3900, 2.1700, "generic"),
        ];
        let mut diagnostics = Diagnostics::new();
        let visits = visits_from_samples(&samples, &config_with(&["running"]), &mut diagnostics);
        assert!(visits.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_bad_sample_is_skipped_not_fatal() {
        let samples = vec![
            Sample::new(f64::NAN, 2.1686, "generic"),
            Sample::new(41.3874, 2.1686, "generic"),
        ];
        let mut diagnostics = Diagnostics::new();
        let visits = visits_from_samples(&samples, &config_with(&[]), &mut diagnostics);
        assert_eq!(visits.len(), 1);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_merge_sums_across_files() {
        let config = config_with(&[]);
        let mut diagnostics = Diagnostics::new();
        let ride = vec![
            Sample::new(41.3874, 2.1686, "generic"),
            Sample::new(41.4000, 2.1800, "generic"),
        ];
        let file_a = visits_from_samples(&ride, &config, &mut diagnostics);
        let file_b = visits_from_samples(&ride[..1], &config, &mut diagnostics);

        let total = file_a.merge(file_b);
        let top = total.most_common();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].count, 2);
        assert_eq!(top[1].count, 1);
    }

    #[test]
    fn test_most_common_ties_keep_insertion_order() {
        let counts: VisitCounts = vec![
            VisitRecord { cell: "a".into(), activity_type: "x".into(), count: 1 },
            VisitRecord { cell: "b".into(), activity_type: "x".into(), count: 3 },
            VisitRecord { cell: "c".into(), activity_type: "x".into(), count: 1 },
            VisitRecord { cell: "d".into(), activity_type: "x".into(), count: 3 },
        ]
        .into_iter()
        .collect();

        let cells: Vec<String> = counts.most_common().into_iter().map(|r| r.cell).collect();
        assert_eq!(cells, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_empty_folder_gives_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        let result = aggregate_folder(dir.path(), &AggregateConfig::default()).unwrap();
        assert!(result.counts.is_empty());
        assert!(result.tracks.is_empty());
    }

    #[test]
    fn test_missing_folder_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            aggregate_folder(&missing, &AggregateConfig::default()),
            Err(Error::NotADirectory(_))
        ));
    }

    #[test]
    fn test_broken_file_does_not_stop_the_run() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.fit"), b"garbage").unwrap();
        std::fs::write(dir.path().join("b.fit"), b"more garbage").unwrap();

        let result = aggregate_folder(dir.path(), &AggregateConfig::default()).unwrap();
        assert_eq!(result.tracks.len(), 2);
        assert!(result.counts.is_empty());
        assert_eq!(result.diagnostics.len(), 2);
        assert!(result
            .diagnostics
            .iter()
            .all(|d| matches!(d, Diagnostic::UnreadableTrack { .. })));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<PathBuf> = (0..8)
            .map(|i| {
                let path = dir.path().join(format!("{}.fit", i));
                std::fs::write(&path, b"not fit").unwrap();
                path
            })
            .collect();
        let config = AggregateConfig::default();

        let sequential = aggregate_tracks(&paths, &config);
        let parallel = aggregate_tracks_parallel(&paths, &config);

        assert_eq!(sequential.counts, parallel.counts);
        assert_eq!(sequential.tracks, parallel.tracks);
        assert_eq!(sequential.diagnostics, parallel.diagnostics);
    }
}
