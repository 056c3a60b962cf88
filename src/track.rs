//! FIT track decoding.
//!
//! Only `record` messages are read, and from those only the position and the
//! activity label. Positions are stored as semicircles and converted to
//! degrees here.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use fitparser::profile::MesgNum;
use fitparser::{FitDataRecord, Value};
use log::debug;

use crate::{Diagnostic, Diagnostics, Result, Sample, UNKNOWN_ACTIVITY};

const FIELD_LAT: &str = "position_lat";
const FIELD_LON: &str = "position_long";
const FIELD_ACTIVITY: &str = "activity_type";

/// Degrees per semicircle (180 / 2^31).
pub const SEMICIRCLE_TO_DEGREES: f64 = 180.0 / 2_147_483_648.0;

/// Convert a semicircle value to degrees.
pub fn semicircles_to_degrees(semicircles: f64) -> f64 {
    semicircles * SEMICIRCLE_TO_DEGREES
}

/// Read all GPS samples from a FIT file.
///
/// A file that cannot be opened or decoded yields no samples and an
/// [`Diagnostic::UnreadableTrack`] entry; it never fails the caller.
pub fn read_track(path: &Path, diagnostics: &mut Diagnostics) -> Vec<Sample> {
    match decode(path) {
        Ok(records) => {
            let samples = samples_from_records(&records);
            debug!(
                "{}: {} records, {} samples",
                path.display(),
                records.len(),
                samples.len()
            );
            samples
        }
        Err(reason) => {
            diagnostics.push(Diagnostic::UnreadableTrack {
                path: path.to_path_buf(),
                reason,
            });
            Vec::new()
        }
    }
}

fn decode(path: &Path) -> std::result::Result<Vec<FitDataRecord>, String> {
    let mut file = File::open(path).map_err(|e| e.to_string())?;
    fitparser::from_reader(&mut file).map_err(|e| e.to_string())
}

/// Extract samples from decoded FIT messages.
pub fn samples_from_records(records: &[FitDataRecord]) -> Vec<Sample> {
    records
        .iter()
        .filter(|record| matches!(record.kind(), MesgNum::Record))
        .filter_map(|record| {
            sample_from_fields(record.fields().iter().map(|field| (field.name(), field.value())))
        })
        .collect()
}

/// Build a sample from the (name, value) fields of one `record` message.
///
/// Returns `None` unless both latitude and longitude are present.
pub fn sample_from_fields<'a, I>(fields: I) -> Option<Sample>
where
    I: IntoIterator<Item = (&'a str, &'a Value)>,
{
    let mut lat = None;
    let mut lon = None;
    let mut activity_type = None;

    for (name, value) in fields {
        match name {
            FIELD_LAT => lat = value_as_f64(value).map(semicircles_to_degrees),
            FIELD_LON => lon = value_as_f64(value).map(semicircles_to_degrees),
            FIELD_ACTIVITY => activity_type = Some(activity_label(value)),
            _ => {}
        }
    }

    Some(Sample::new(
        lat?,
        lon?,
        activity_type.unwrap_or_else(|| UNKNOWN_ACTIVITY.to_string()),
    ))
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::SInt32(v) => Some(*v as f64),
        Value::UInt32(v) => Some(*v as f64),
        Value::SInt64(v) => Some(*v as f64),
        Value::Float32(v) => Some(*v as f64),
        Value::Float64(v) => Some(*v),
        _ => None,
    }
}

// Enum fields with a known profile name decode to strings; raw values keep their number
fn activity_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Enum(v) | Value::UInt8(v) => v.to_string(),
        other => value_as_f64(other).map_or_else(|| format!("{:?}", other), |v| v.to_string()),
    }
}

/// List the `.fit` / `.FIT` files directly inside a folder, sorted by path.
pub fn find_track_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(folder)? {
        let path = entry?.path();
        let is_track = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("fit") | Some("FIT")
        );
        if is_track && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
