use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{RequestRecord, Table, UNKNOWN_LABEL};

/// Values a presentation layer can offer as filter choices.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    pub departments: Vec<String>,
    pub statuses: Vec<String>,
    pub types: Vec<String>,
    /// Excludes the `Unknown` placeholder.
    pub communities: Vec<String>,
}

impl FilterOptions {
    pub fn from_table(table: &Table) -> Self {
        let (min_date, max_date) = table.date_span().unzip();
        let mut communities = distinct_sorted(table, |r| &r.community);
        communities.retain(|c| c != UNKNOWN_LABEL);

        Self {
            min_date,
            max_date,
            departments: distinct_sorted(table, |r| &r.department),
            statuses: distinct_sorted(table, |r| &r.status),
            types: distinct_sorted(table, |r| &r.request_type),
            communities,
        }
    }
}

fn distinct_sorted(table: &Table, key: fn(&RequestRecord) -> &str) -> Vec<String> {
    table
        .iter()
        .map(key)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
