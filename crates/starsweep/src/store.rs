//! CSV record store.
//!
//! The store is a single CSV file with a header row. It is the only state
//! carried between runs, so writes go through a temp file in the same
//! directory and are renamed into place.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::record::StarRecord;

/// Column order written by [`write_records`].
pub const COLUMNS: [&str; 8] = [
    "full_name",
    "description",
    "url",
    "stars",
    "language",
    "created_at",
    "updated_at",
    "disposition",
];

/// Older stores used an `unstar` column in place of `disposition`.
const DISPOSITION_ALIASES: [&str; 2] = ["disposition", "unstar"];

#[derive(Debug, Error)]
pub enum StoreError {
    /// The file parsed as CSV but does not describe a valid store.
    #[error("Invalid record store: {0}")]
    Schema(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Write `records` as CSV, header first, in the given order.
pub fn write_records<W: Write>(records: &[StarRecord], writer: W) -> Result<(), StoreError> {
    let mut csv = csv::Writer::from_writer(writer);
    if records.is_empty() {
        csv.write_record(COLUMNS)?;
    }
    for record in records {
        csv.serialize(record)?;
    }
    csv.flush()?;
    Ok(())
}

/// Read records from CSV, preserving file order.
///
/// Unknown columns are ignored. `full_name` and `disposition` are required,
/// and `full_name` must be unique.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<StarRecord>, StoreError> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    validate_headers(csv.headers()?)?;

    let mut records = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    for (index, row) in csv.deserialize::<StarRecord>().enumerate() {
        let record = row?;
        if let Some(first) = seen.insert(record.full_name.clone(), index) {
            return Err(StoreError::Schema(format!(
                "duplicate full_name {:?} in rows {} and {}",
                record.full_name,
                first + 1,
                index + 1
            )));
        }
        records.push(record);
    }
    Ok(records)
}

fn validate_headers(headers: &csv::StringRecord) -> Result<(), StoreError> {
    let present: HashSet<&str> = headers.iter().collect();

    let mut missing = Vec::new();
    if !present.contains("full_name") {
        missing.push("full_name");
    }
    if !DISPOSITION_ALIASES.iter().any(|h| present.contains(h)) {
        missing.push("disposition");
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(StoreError::Schema(format!(
            "missing required columns: {}",
            missing.join(", ")
        )))
    }
}

/// Merge a fresh harvest into an existing store.
///
/// Existing rows keep their position and disposition; their metadata is
/// refreshed from `fresh` when the repository shows up again. Repositories
/// only in `fresh` are appended in harvest order.
pub fn merge_records(existing: Vec<StarRecord>, fresh: Vec<StarRecord>) -> Vec<StarRecord> {
    let mut merged = existing;
    let positions: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .map(|(i, r)| (r.full_name.clone(), i))
        .collect();

    let mut appended = 0usize;
    let mut refreshed = 0usize;
    for record in fresh {
        match positions.get(&record.full_name) {
            Some(&i) => {
                let disposition = merged[i].disposition;
                merged[i] = StarRecord {
                    disposition,
                    ..record
                };
                refreshed += 1;
            }
            None => {
                merged.push(record);
                appended += 1;
            }
        }
    }

    tracing::debug!(appended, refreshed, total = merged.len(), "merged records");
    merged
}

/// A record store backed by one CSV file.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn load(&self) -> Result<Vec<StarRecord>, StoreError> {
        let file = File::open(&self.path)?;
        let records = read_records(BufReader::new(file))?;
        tracing::debug!(path = %self.path.display(), count = records.len(), "loaded record store");
        Ok(records)
    }

    /// Replace the store's contents with `records`.
    ///
    /// The previous file stays intact until the new one is fully written.
    pub fn save(&self, records: &[StarRecord]) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        write_records(records, tmp.as_file_mut())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;

        tracing::debug!(path = %self.path.display(), count = records.len(), "saved record store");
        Ok(())
    }
}
