use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{Kpis, LabelCount, LabelShare, RequestRecord, Table, TimeBucket};

pub const DEFAULT_CLOSED_LABEL: &str = "Closed";
pub const DEFAULT_TOP_DEPARTMENTS: usize = 10;
pub const DEFAULT_TOP_TYPES: usize = 15;
pub const DEFAULT_TOP_COMMUNITIES: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    #[default]
    Weekly,
    Monthly,
}

impl Granularity {
    /// Start of the bucket containing `date`. Weeks start on Monday; a
    /// week reaching before the earliest representable date starts there.
    pub fn bucket_start(self, date: NaiveDate) -> NaiveDate {
        let offset = match self {
            Self::Daily => 0,
            Self::Weekly => date.weekday().num_days_from_monday(),
            Self::Monthly => date.day0(),
        };
        date.checked_sub_signed(Duration::days(i64::from(offset)))
            .unwrap_or(NaiveDate::MIN)
    }

    fn next_bucket(self, start: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Daily => start.succ_opt(),
            Self::Weekly => start.checked_add_signed(Duration::weeks(1)),
            Self::Monthly => start.checked_add_months(Months::new(1)),
        }
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(Self::Daily),
            "weekly" | "week" => Ok(Self::Weekly),
            "monthly" | "month" => Ok(Self::Monthly),
            other => Err(format!(
                "unknown granularity `{other}` (expected daily, weekly or monthly)"
            )),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        })
    }
}

pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Scalar summary of a table. Closed means an exact match on `closed_label`.
pub fn kpis(table: &Table, closed_label: &str) -> Kpis {
    let total = table.len();
    let closed_count = table.iter().filter(|r| r.status == closed_label).count();
    let open_count = total - closed_count;
    let distinct_types = table
        .iter()
        .map(|r| r.request_type.as_str())
        .collect::<HashSet<_>>()
        .len();
    let distinct_departments = table
        .iter()
        .map(|r| r.department.as_str())
        .collect::<HashSet<_>>()
        .len();

    Kpis {
        total,
        closed_count,
        closed_pct: percentage(closed_count, total),
        open_count,
        open_pct: percentage(open_count, total),
        distinct_types,
        distinct_departments,
    }
}

/// Request counts per bucket, ascending. Buckets with no requests between
/// the first and last observed bucket are emitted with a zero count so the
/// series is continuous.
pub fn time_series(table: &Table, granularity: Granularity) -> Vec<TimeBucket> {
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for record in table.iter() {
        *counts.entry(granularity.bucket_start(record.date)).or_insert(0) += 1;
    }

    let (Some(&first), Some(&last)) = (counts.keys().next(), counts.keys().next_back()) else {
        return Vec::new();
    };

    let mut series = Vec::new();
    let mut cursor = Some(first);
    while let Some(start) = cursor.filter(|start| *start <= last) {
        series.push(TimeBucket {
            start,
            count: counts.get(&start).copied().unwrap_or(0),
        });
        cursor = granularity.next_bucket(start);
    }
    series
}

/// Counts per label, descending by count; equal counts keep the order in
/// which labels were first seen.
fn count_by<'a, F>(table: &'a Table, key: F) -> Vec<LabelCount>
where
    F: Fn(&'a RequestRecord) -> &'a str,
{
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for record in table.iter() {
        let label = key(record);
        match positions.get(label) {
            Some(&index) => counts[index].1 += 1,
            None => {
                positions.insert(label, counts.len());
                counts.push((label, 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .map(|(label, count)| LabelCount {
            label: label.to_string(),
            count,
        })
        .collect()
}

fn top(table: &Table, n: usize, key: fn(&RequestRecord) -> &str) -> Vec<LabelCount> {
    let mut counts = count_by(table, key);
    counts.truncate(n);
    counts
}

pub fn top_departments(table: &Table, n: usize) -> Vec<LabelCount> {
    top(table, n, |r| &r.department)
}

pub fn top_types(table: &Table, n: usize) -> Vec<LabelCount> {
    top(table, n, |r| &r.request_type)
}

pub fn top_communities(table: &Table, n: usize) -> Vec<LabelCount> {
    top(table, n, |r| &r.community)
}

/// Every community with its request count, for the choropleth color scale.
pub fn community_counts(table: &Table) -> Vec<LabelCount> {
    count_by(table, |r| &r.community)
}

fn with_shares(counts: Vec<LabelCount>, total: usize) -> Vec<LabelShare> {
    counts
        .into_iter()
        .map(|LabelCount { label, count }| LabelShare {
            pct: percentage(count, total),
            label,
            count,
        })
        .collect()
}

/// Every status with its count and share of the table. Counts sum to the
/// table length.
pub fn status_breakdown(table: &Table) -> Vec<LabelShare> {
    with_shares(count_by(table, |r| &r.status), table.len())
}

/// Top departments with their share of the whole table.
pub fn department_shares(table: &Table, n: usize) -> Vec<LabelShare> {
    with_shares(top_departments(table, n), table.len())
}
