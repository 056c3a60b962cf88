//! CSV persistence of visit counts.
//!
//! Layout: a mandatory `h3_cell,activity_type,count` header, then one row per
//! (cell, activity) pair, most visited first. When reading, `activity_type`
//! may be absent; that is detected once from the header and reported through
//! [`LoadedTable::has_activity_type`].

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use serde::Deserialize;

use crate::aggregate::{VisitCounts, VisitRecord};
use crate::{Error, Result};

pub const COLUMN_CELL: &str = "h3_cell";
pub const COLUMN_ACTIVITY: &str = "activity_type";
pub const COLUMN_COUNT: &str = "count";

/// One CSV row.
///
/// `activity_type` is empty when the table has no such column; whether the
/// column exists is recorded on [`LoadedTable`], so an empty label read from
/// the file stays an empty label.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableRow {
    pub h3_cell: String,
    #[serde(default)]
    pub activity_type: String,
    pub count: u32,
}

impl From<VisitRecord> for TableRow {
    fn from(record: VisitRecord) -> Self {
        Self {
            h3_cell: record.cell,
            activity_type: record.activity_type,
            count: record.count,
        }
    }
}

/// Rows of a table plus what the header told us about them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedTable {
    pub rows: Vec<TableRow>,
    /// Header had an `activity_type` column, so filtering by activity is possible
    pub has_activity_type: bool,
}

/// Write visit counts as CSV, most common first.
pub fn write_table<W: Write>(writer: W, counts: &VisitCounts) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([COLUMN_CELL, COLUMN_ACTIVITY, COLUMN_COUNT])?;
    for record in counts.most_common() {
        csv_writer.write_record([
            record.cell.as_str(),
            record.activity_type.as_str(),
            record.count.to_string().as_str(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write visit counts to a CSV file.
pub fn write_table_file(path: &Path, counts: &VisitCounts) -> Result<()> {
    let file = File::create(path)?;
    write_table(io::BufWriter::new(file), counts)
}

/// Read a visit table.
///
/// Fails with [`Error::MissingColumn`] if `h3_cell` or `count` is absent.
pub fn read_table<R: Read>(reader: R) -> Result<LoadedTable> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let has_column = |name: &str| headers.iter().any(|h| h == name);
    for required in [COLUMN_CELL, COLUMN_COUNT] {
        if !has_column(required) {
            return Err(Error::MissingColumn(required));
        }
    }
    let has_activity_type = has_column(COLUMN_ACTIVITY);

    let rows = csv_reader
        .deserialize::<TableRow>()
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(LoadedTable { rows, has_activity_type })
}

/// Read a visit table from disk.
pub fn read_table_file(path: &Path) -> Result<LoadedTable> {
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }
    read_table(io::BufReader::new(File::open(path)?))
}
