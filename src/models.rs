use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

/// Label given to missing categorical values at load time.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Position of a record in the loaded dataset.
pub type RowId = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct RequestRecord {
    pub lat: f64,
    pub lon: f64,
    pub request_type: String,
    pub department: String,
    pub date: NaiveDate,
    pub status: String,
    pub community: String,
}

/// Read-only view over a loaded dataset.
///
/// The records live in shared storage that is never mutated after load;
/// a table only carries the ordered ids of the rows it exposes. Filtering
/// produces a new table over the same storage, so a filtered table is by
/// construction a subset of the loaded rows.
#[derive(Debug, Clone)]
pub struct Table {
    records: Arc<[RequestRecord]>,
    rows: Arc<[RowId]>,
}

impl Table {
    pub fn new(records: Vec<RequestRecord>) -> Self {
        let rows: Arc<[RowId]> = (0..records.len()).collect();
        Self {
            records: records.into(),
            rows,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Same storage, different row selection. Ids must come from `self`.
    pub(crate) fn select(&self, rows: Vec<RowId>) -> Self {
        Self {
            records: Arc::clone(&self.records),
            rows: rows.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_ids(&self) -> &[RowId] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&RequestRecord> {
        self.rows.get(index).map(|&id| &self.records[id])
    }

    pub fn iter(&self) -> impl Iterator<Item = &RequestRecord> + '_ {
        self.rows.iter().map(move |&id| &self.records[id])
    }

    pub(crate) fn iter_with_ids(&self) -> impl Iterator<Item = (RowId, &RequestRecord)> + '_ {
        self.rows.iter().map(move |&id| (id, &self.records[id]))
    }

    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.iter().fold(None, |span, record| match span {
            None => Some((record.date, record.date)),
            Some((min, max)) => Some((min.min(record.date), max.max(record.date))),
        })
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total: usize,
    pub closed_count: usize,
    pub closed_pct: f64,
    pub open_count: usize,
    pub open_pct: f64,
    pub distinct_types: usize,
    pub distinct_departments: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeBucket {
    pub start: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelShare {
    pub label: String,
    pub count: usize,
    pub pct: f64,
}
