use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::debug;

use crate::models::{RequestRecord, Table};

/// Multi-select restriction on one categorical dimension.
///
/// A selection built from an empty list means "no restriction", the way
/// the dashboard sidebar treats a cleared multi-select. `Only` with an empty
/// set only comes out of intersecting disjoint selections and matches
/// nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Selection {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl Selection {
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = labels.into_iter().map(Into::into).collect();
        if set.is_empty() {
            Self::All
        } else {
            Self::Only(set)
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(set) => set.contains(value),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn intersect(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::All, other) => other.clone(),
            (this, Self::All) => this.clone(),
            (Self::Only(a), Self::Only(b)) => Self::Only(a.intersection(b).cloned().collect()),
        }
    }
}

/// Combined filter selections. `Default` lets every record through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Criteria {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub departments: Selection,
    pub statuses: Selection,
    pub types: Selection,
    pub communities: Selection,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_from(mut self, date: NaiveDate) -> Self {
        self.date_from = Some(date);
        self
    }

    pub fn with_date_to(mut self, date: NaiveDate) -> Self {
        self.date_to = Some(date);
        self
    }

    pub fn with_departments<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.departments = Selection::from_labels(labels);
        self
    }

    pub fn with_statuses<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.statuses = Selection::from_labels(labels);
        self
    }

    pub fn with_types<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = Selection::from_labels(labels);
        self
    }

    pub fn with_communities<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.communities = Selection::from_labels(labels);
        self
    }

    pub fn is_unrestricted(&self) -> bool {
        self.date_from.is_none()
            && self.date_to.is_none()
            && self.departments.is_all()
            && self.statuses.is_all()
            && self.types.is_all()
            && self.communities.is_all()
    }

    /// Criteria matching exactly the records both `self` and `other` match.
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            date_from: tighter(self.date_from, other.date_from, std::cmp::max),
            date_to: tighter(self.date_to, other.date_to, std::cmp::min),
            departments: self.departments.intersect(&other.departments),
            statuses: self.statuses.intersect(&other.statuses),
            types: self.types.intersect(&other.types),
            communities: self.communities.intersect(&other.communities),
        }
    }

    pub fn matches(&self, record: &RequestRecord) -> bool {
        self.date_from.map_or(true, |from| record.date >= from)
            && self.date_to.map_or(true, |to| record.date <= to)
            && self.departments.matches(&record.department)
            && self.statuses.matches(&record.status)
            && self.types.matches(&record.request_type)
            && self.communities.matches(&record.community)
    }
}

fn tighter(
    a: Option<NaiveDate>,
    b: Option<NaiveDate>,
    pick: fn(NaiveDate, NaiveDate) -> NaiveDate,
) -> Option<NaiveDate> {
    match (a, b) {
        (Some(a), Some(b)) => Some(pick(a, b)),
        (a, b) => a.or(b),
    }
}

/// Rows of `table` satisfying every dimension of `criteria`, in their
/// original order.
pub fn filter(table: &Table, criteria: &Criteria) -> Table {
    if criteria.is_unrestricted() {
        return table.clone();
    }
    let rows: Vec<_> = table
        .iter_with_ids()
        .filter(|(_, record)| criteria.matches(record))
        .map(|(id, _)| id)
        .collect();
    debug!(input = table.len(), output = rows.len(), "applied filter");
    table.select(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(
        department: &str,
        status: &str,
        request_type: &str,
        community: &str,
        day: u32,
    ) -> RequestRecord {
        RequestRecord {
            lat: 47.6,
            lon: -122.3,
            request_type: request_type.to_string(),
            department: department.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            status: status.to_string(),
            community: community.to_string(),
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn departments_table() -> Table {
        Table::new(vec![
            record("SPD", "Closed", "Abandoned Vehicle", "BALLARD", 1),
            record("SDOT", "Reported", "Pothole", "FREMONT", 2),
            record("SPD", "Reported", "Parking", "BALLARD", 3),
            record("SPU", "Closed", "Graffiti", "RAINIER BEACH", 4),
        ])
    }

    #[test]
    fn filters_by_department_preserving_order() {
        let table = departments_table();
        let filtered = filter(&table, &Criteria::new().with_departments(["SPD"]));
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.row_ids(), &[0, 2]);
        assert!(filtered.iter().all(|r| r.department == "SPD"));
        assert_eq!(filtered.get(1).unwrap().request_type, "Parking");
    }

    #[test]
    fn empty_selection_means_no_restriction() {
        let table = departments_table();
        let criteria = Criteria::new().with_departments(Vec::<String>::new());
        assert!(criteria.departments.is_all());
        assert_eq!(filter(&table, &criteria), table);
    }

    #[test]
    fn unrestricted_criteria_is_identity() {
        let table = departments_table();
        assert_eq!(filter(&table, &Criteria::default()), table);
    }

    #[test]
    fn values_within_a_dimension_are_ored() {
        let table = departments_table();
        let filtered = filter(&table, &Criteria::new().with_departments(["SPU", "SDOT"]));
        assert_eq!(filtered.row_ids(), &[1, 3]);
    }

    #[test]
    fn dimensions_are_anded() {
        let table = departments_table();
        let criteria = Criteria::new()
            .with_departments(["SPD"])
            .with_statuses(["Reported"]);
        assert_eq!(filter(&table, &criteria).row_ids(), &[2]);
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let table = departments_table();
        let criteria = Criteria::new().with_date_from(date(2)).with_date_to(date(3));
        assert_eq!(filter(&table, &criteria).row_ids(), &[1, 2]);
    }

    #[test]
    fn inverted_date_range_is_empty_not_an_error() {
        let table = departments_table();
        let criteria = Criteria::new().with_date_from(date(4)).with_date_to(date(1));
        assert!(filter(&table, &criteria).is_empty());
    }

    #[test]
    fn disjoint_selections_intersect_to_nothing() {
        let table = departments_table();
        let a = Criteria::new().with_departments(["SPD"]);
        let b = Criteria::new().with_departments(["SPU"]);
        let both = a.intersect(&b);
        assert_eq!(both.departments, Selection::Only(BTreeSet::new()));
        assert!(filter(&table, &both).is_empty());
    }

    #[test]
    fn filtering_an_empty_table_is_empty() {
        let criteria = Criteria::new().with_types(["Pothole"]);
        assert!(filter(&Table::empty(), &criteria).is_empty());
    }

    const DEPARTMENTS: [&str; 3] = ["SPD", "SDOT", "SPU"];
    const STATUSES: [&str; 3] = ["Closed", "Reported", "Transferred"];
    const TYPES: [&str; 3] = ["Pothole", "Graffiti", "Parking"];
    const COMMUNITIES: [&str; 3] = ["BALLARD", "FREMONT", "Unknown"];

    fn arb_table() -> impl Strategy<Value = Table> {
        let row = (0..3usize, 0..3usize, 0..3usize, 0..3usize, 1..29u32);
        prop::collection::vec(row, 0..40).prop_map(|rows| {
            Table::new(
                rows.into_iter()
                    .map(|(d, s, t, c, day)| {
                        record(DEPARTMENTS[d], STATUSES[s], TYPES[t], COMMUNITIES[c], day)
                    })
                    .collect(),
            )
        })
    }

    fn arb_selection(labels: &'static [&'static str]) -> impl Strategy<Value = Selection> {
        prop::sample::subsequence(labels.to_vec(), 0..=labels.len())
            .prop_map(Selection::from_labels)
    }

    fn arb_criteria() -> impl Strategy<Value = Criteria> {
        (
            prop::option::of(1..29u32),
            prop::option::of(1..29u32),
            arb_selection(&DEPARTMENTS),
            arb_selection(&STATUSES),
            arb_selection(&TYPES),
            arb_selection(&COMMUNITIES),
        )
            .prop_map(|(from, to, departments, statuses, types, communities)| Criteria {
                date_from: from.map(date),
                date_to: to.map(date),
                departments,
                statuses,
                types,
                communities,
            })
    }

    proptest! {
        #[test]
        fn filter_never_grows(table in arb_table(), criteria in arb_criteria()) {
            prop_assert!(filter(&table, &criteria).len() <= table.len());
        }

        #[test]
        fn filtered_rows_satisfy_criteria(table in arb_table(), criteria in arb_criteria()) {
            let filtered = filter(&table, &criteria);
            prop_assert!(filtered.iter().all(|r| criteria.matches(r)));
            prop_assert!(filtered.row_ids().windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn successive_filters_equal_intersection(
            table in arb_table(),
            a in arb_criteria(),
            b in arb_criteria(),
        ) {
            let chained = filter(&filter(&table, &a), &b);
            prop_assert_eq!(&chained, &filter(&table, &a.intersect(&b)));
            prop_assert_eq!(&chained, &filter(&filter(&table, &b), &a));
        }
    }
}
