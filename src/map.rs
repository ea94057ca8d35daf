//! Inputs for the two map views: the point heatmap and the community
//! choropleth.

use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregate::{community_counts, top_departments, top_types};
use crate::models::{LabelCount, RequestRecord, Table};

const TOP_MAP_TYPES: usize = 10;
const TOP_MAP_DEPARTMENTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(rename = "type")]
    pub request_type: String,
    pub department: String,
    #[serde(serialize_with = "iso_date")]
    pub date: NaiveDate,
    pub status: String,
    pub community: String,
}

impl From<&RequestRecord> for MapPoint {
    fn from(record: &RequestRecord) -> Self {
        Self {
            lat: record.lat,
            lon: record.lon,
            request_type: record.request_type.clone(),
            department: record.department.clone(),
            date: record.date,
            status: record.status.clone(),
            community: record.community.clone(),
        }
    }
}

fn iso_date<S: serde::Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&date.format("%Y-%m-%d"))
}

/// Writes counts as a `{label: count}` object, keeping descending order.
fn label_map<S: serde::Serializer>(
    counts: &[LabelCount],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeMap;

    let mut map = serializer.serialize_map(Some(counts.len()))?;
    for entry in counts {
        map.serialize_entry(&entry.label, &entry.count)?;
    }
    map.end()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Bounds {
    pub fn of(table: &Table) -> Option<Self> {
        let mut records = table.iter();
        let first = records.next()?;
        let init = Self {
            min_lat: first.lat,
            max_lat: first.lat,
            min_lon: first.lon,
            max_lon: first.lon,
        };
        Some(records.fold(init, |b, r| Self {
            min_lat: b.min_lat.min(r.lat),
            max_lat: b.max_lat.max(r.lat),
            min_lon: b.min_lon.min(r.lon),
            max_lon: b.max_lon.max(r.lon),
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapStats {
    pub total_records: usize,
    pub date_range: Option<DateRange>,
    #[serde(serialize_with = "label_map")]
    pub top_request_types: Vec<LabelCount>,
    #[serde(serialize_with = "label_map")]
    pub top_departments: Vec<LabelCount>,
    pub bounds: Option<Bounds>,
}

/// Filtered records plus summary stats, shaped for the heatmap view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPayload {
    pub data: Vec<MapPoint>,
    pub stats: MapStats,
}

impl MapPayload {
    pub fn build(table: &Table) -> Self {
        let stats = MapStats {
            total_records: table.len(),
            date_range: table.date_span().map(|(start, end)| DateRange { start, end }),
            top_request_types: top_types(table, TOP_MAP_TYPES),
            top_departments: top_departments(table, TOP_MAP_DEPARTMENTS),
            bounds: Bounds::of(table),
        };
        Self {
            data: table.iter().map(MapPoint::from).collect(),
            stats,
        }
    }
}

/// Community → request count for every community present, descending.
/// This is the choropleth color-scale input.
pub fn choropleth(table: &Table) -> Vec<LabelCount> {
    community_counts(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(community: &str, lat: f64, lon: f64, day: u32) -> RequestRecord {
        RequestRecord {
            lat,
            lon,
            request_type: "Illegal Dumping".to_string(),
            department: "SPU".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            status: "Closed".to_string(),
            community: community.to_string(),
        }
    }

    fn table() -> Table {
        Table::new(vec![
            record("BALLARD", 47.68, -122.38, 14),
            record("BALLARD", 47.66, -122.40, 2),
            record("BEACON HILL", 47.56, -122.30, 9),
        ])
    }

    #[test]
    fn payload_carries_points_and_stats() {
        let payload = MapPayload::build(&table());
        assert_eq!(payload.data.len(), 3);
        assert_eq!(payload.stats.total_records, 3);
        assert_eq!(
            payload.stats.date_range,
            Some(DateRange {
                start: NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(),
                end: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            })
        );
        let bounds = payload.stats.bounds.unwrap();
        assert_eq!(bounds.min_lat, 47.56);
        assert_eq!(bounds.max_lon, -122.30);
        assert_eq!(payload.stats.top_request_types[0].count, 3);
    }

    #[test]
    fn points_serialise_with_source_keys() {
        let payload = MapPayload::build(&table());
        let json = serde_json::to_value(&payload).unwrap();
        let point = &json["data"][0];
        assert_eq!(point["type"], "Illegal Dumping");
        assert_eq!(point["date"], "2025-03-14");
        assert_eq!(json["stats"]["total_records"], 3);
        assert_eq!(json["stats"]["top_departments"]["SPU"], 3);
    }

    #[test]
    fn empty_payload_has_null_ranges() {
        let payload = MapPayload::build(&Table::empty());
        assert!(payload.data.is_empty());
        assert_eq!(payload.stats.date_range, None);
        assert_eq!(payload.stats.bounds, None);
    }

    #[test]
    fn choropleth_counts_every_community() {
        let counts = choropleth(&table());
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0], LabelCount { label: "BALLARD".to_string(), count: 2 });
        assert_eq!(counts[1].label, "BEACON HILL");
        assert_eq!(counts.iter().map(|c| c.count).sum::<usize>(), 3);
    }
}
