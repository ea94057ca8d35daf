use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::LoadError;
use crate::models::{RequestRecord, Table, UNKNOWN_LABEL};

/// Calendar years a request date may fall in.
const VALID_YEARS: std::ops::RangeInclusive<i32> = 1900..=2100;

#[derive(Deserialize)]
struct RawRecord {
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(rename = "type")]
    request_type: Option<String>,
    department: Option<String>,
    date: Option<String>,
    status: Option<String>,
    community: Option<String>,
}

/// Ingestion output wraps the records next to precomputed stats; only
/// the records are read.
#[derive(Deserialize)]
struct Envelope {
    data: Vec<RawRecord>,
}

/// Reads a JSON dataset into a table.
pub fn load(path: impl AsRef<Path>) -> Result<Table, LoadError> {
    let path = path.as_ref();
    let started = Instant::now();
    info!(path = %path.display(), "loading dataset");

    let bytes = std::fs::read(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => LoadError::SourceNotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let table = from_json_slice(&bytes, path)?;
    info!(
        path = %path.display(),
        rows = table.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "dataset loaded"
    );
    Ok(table)
}

/// Parses dataset bytes; `origin` is only used in error messages.
pub fn from_json_slice(bytes: &[u8], origin: &Path) -> Result<Table, LoadError> {
    let first = bytes.iter().find(|b| !b.is_ascii_whitespace());
    let raw = match first {
        Some(b'[') => serde_json::from_slice::<Vec<RawRecord>>(bytes),
        Some(b'{') => serde_json::from_slice::<Envelope>(bytes).map(|envelope| envelope.data),
        Some(_) => {
            return Err(LoadError::malformed(
                origin,
                "expected a JSON array of records or an object with a `data` array",
            ))
        }
        None => return Err(LoadError::malformed(origin, "file is empty")),
    }
    .map_err(|err| LoadError::malformed(origin, err.to_string()))?;

    let records = raw
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            convert(index, record).map_err(|detail| LoadError::malformed(origin, detail))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Table::new(records))
}

fn convert(index: usize, raw: RawRecord) -> Result<RequestRecord, String> {
    let lat = raw
        .lat
        .ok_or_else(|| format!("record {index}: field `lat` is missing or null"))?;
    let lon = raw
        .lon
        .ok_or_else(|| format!("record {index}: field `lon` is missing or null"))?;
    let date_text = raw
        .date
        .ok_or_else(|| format!("record {index}: field `date` is missing or null"))?;
    let date = parse_date(&date_text).ok_or_else(|| {
        format!("record {index}: field `date` has unparseable value {date_text:?}")
    })?;
    if !VALID_YEARS.contains(&date.year()) {
        return Err(format!(
            "record {index}: field `date` value {date_text:?} is outside years {}..={}",
            VALID_YEARS.start(),
            VALID_YEARS.end()
        ));
    }

    Ok(RequestRecord {
        lat,
        lon,
        request_type: label_or_unknown(raw.request_type),
        department: label_or_unknown(raw.department),
        date,
        status: label_or_unknown(raw.status),
        community: label_or_unknown(raw.community),
    })
}

fn label_or_unknown(value: Option<String>) -> String {
    value.unwrap_or_else(|| UNKNOWN_LABEL.to_string())
}

/// Accepts plain ISO dates, ISO date-times (with or without offset) and
/// the source system's `MM/DD/YYYY [HH:MM:SS AM]` form. Time of day is
/// dropped.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamp.date_naive());
    }
    const DATE_TIME_FORMATS: [&str; 3] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%m/%d/%Y %I:%M:%S %p",
    ];
    if let Some(stamp) = DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    {
        return Some(stamp.date());
    }
    NaiveDate::parse_from_str(raw, "%m/%d/%Y").ok()
}

/// Process-lifetime memo of loaded datasets, keyed by source path.
///
/// Owned by whoever drives the pipeline; entries only change through
/// `reload`, `invalidate` or `clear`.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<PathBuf, Table>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(&mut self, path: impl AsRef<Path>) -> Result<Table, LoadError> {
        let key = cache_key(path.as_ref());
        if let Some(table) = self.entries.get(&key) {
            debug!(path = %key.display(), "dataset cache hit");
            return Ok(table.clone());
        }
        debug!(path = %key.display(), "dataset cache miss");
        let table = load(&key)?;
        self.entries.insert(key, table.clone());
        Ok(table)
    }

    /// Re-reads the source. On failure the previous entry is kept.
    pub fn reload(&mut self, path: impl AsRef<Path>) -> Result<Table, LoadError> {
        let key = cache_key(path.as_ref());
        let table = load(&key)?;
        self.entries.insert(key, table.clone());
        Ok(table)
    }

    pub fn invalidate(&mut self, path: impl AsRef<Path>) -> bool {
        self.entries.remove(&cache_key(path.as_ref())).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn cache_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
