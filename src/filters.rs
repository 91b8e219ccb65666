use std::collections::{BTreeSet, HashSet};

use chrono::NaiveDate;

use crate::models::{Dataset, Record};

// ---------------------------------------------------------------------------
// Date range
// ---------------------------------------------------------------------------

/// Inclusive on both ends. `start > end` is allowed and matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

pub fn filter_by_date(dataset: &Dataset, range: DateRange) -> Vec<&Record> {
    dataset
        .records()
        .iter()
        .filter(|r| range.contains(r.order_date))
        .collect()
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// An empty selection places no restriction on its dimension.
fn admits(selection: &BTreeSet<String>, value: &str) -> bool {
    selection.is_empty() || selection.contains(value)
}

/// Narrow a date-filtered view by region, state and city selections.
///
/// Each non-empty selection contributes one membership predicate and the
/// predicates are AND-ed, all evaluated against `records` directly. With every
/// selection empty this is the identity.
pub fn filter_by_location<'a>(
    records: &[&'a Record],
    regions: &BTreeSet<String>,
    states: &BTreeSet<String>,
    cities: &BTreeSet<String>,
) -> Vec<&'a Record> {
    records
        .iter()
        .copied()
        .filter(|r| {
            admits(regions, &r.region) && admits(states, &r.state) && admits(cities, &r.city)
        })
        .collect()
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

/// Values offered by the region, state and city pickers, in order of first
/// appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationChoices {
    pub regions: Vec<String>,
    pub states: Vec<String>,
    pub cities: Vec<String>,
}

impl LocationChoices {
    /// States are narrowed by the selected regions; cities by the selected
    /// regions and states.
    pub fn narrow(
        records: &[&Record],
        regions: &BTreeSet<String>,
        states: &BTreeSet<String>,
    ) -> Self {
        let by_region: Vec<&Record> = records
            .iter()
            .copied()
            .filter(|r| admits(regions, &r.region))
            .collect();
        let by_state = by_region.iter().filter(|r| admits(states, &r.state));

        Self {
            regions: distinct(records.iter().map(|r| r.region.as_str())),
            states: distinct(by_region.iter().map(|r| r.state.as_str())),
            cities: distinct(by_state.map(|r| r.city.as_str())),
        }
    }
}

// ---------------------------------------------------------------------------
// Filter request
// ---------------------------------------------------------------------------

/// Everything one recomputation pass filters by. Built fresh for each pass.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterRequest {
    pub range: DateRange,
    pub regions: BTreeSet<String>,
    pub states: BTreeSet<String>,
    pub cities: BTreeSet<String>,
}

impl FilterRequest {
    /// Whole date span of the dataset, no location restriction. An empty
    /// dataset gets a single-day range at the epoch, which matches nothing.
    pub fn for_dataset(dataset: &Dataset) -> Self {
        let (start, end) = dataset.date_span().unwrap_or_default();
        Self {
            range: DateRange::new(start, end),
            regions: BTreeSet::new(),
            states: BTreeSet::new(),
            cities: BTreeSet::new(),
        }
    }

    pub fn with_start(mut self, start: Option<NaiveDate>) -> Self {
        if let Some(s) = start {
            self.range.start = s;
        }
        self
    }

    pub fn with_end(mut self, end: Option<NaiveDate>) -> Self {
        if let Some(e) = end {
            self.range.end = e;
        }
        self
    }

    pub fn with_locations<I, J, K>(mut self, regions: I, states: J, cities: K) -> Self
    where
        I: IntoIterator<Item = String>,
        J: IntoIterator<Item = String>,
        K: IntoIterator<Item = String>,
    {
        self.regions = regions.into_iter().collect();
        self.states = states.into_iter().collect();
        self.cities = cities.into_iter().collect();
        self
    }

    /// Date filter, then location filter.
    pub fn apply<'a>(&self, dataset: &'a Dataset) -> Vec<&'a Record> {
        let dated = filter_by_date(dataset, self.range);
        let view = filter_by_location(&dated, &self.regions, &self.states, &self.cities);
        tracing::debug!(
            dated = dated.len(),
            matched = view.len(),
            "filter pass"
        );
        view
    }

    /// Picker contents for this request's date range and upstream selections.
    pub fn choices(&self, dataset: &Dataset) -> LocationChoices {
        let dated = filter_by_date(dataset, self.range);
        LocationChoices::narrow(&dated, &self.regions, &self.states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample() -> Dataset {
        Dataset::new(
            "test",
            vec![
                record("2016-01-05", "East", "New York", "New York City", "1", "C1", 100.0, 20.0),
                record("2016-02-10", "East", "New York", "Buffalo", "2", "C2", 50.0, 5.0),
                record("2016-03-15", "East", "Ohio", "Columbus", "3", "C3", 75.0, -5.0),
                record("2016-04-20", "West", "California", "Los Angeles", "4", "C1", 200.0, 40.0),
                record("2016-05-25", "West", "Washington", "Seattle", "5", "C4", 30.0, 3.0),
                record("2017-01-01", "Central", "Texas", "Houston", "6", "C5", 60.0, 6.0),
            ],
        )
    }

    fn cities(view: &[&Record]) -> Vec<String> {
        view.iter().map(|r| r.city.clone()).collect()
    }

    #[test]
    fn test_filter_by_date_inclusive() {
        let ds = sample();
        let view = filter_by_date(&ds, DateRange::new(date("2016-02-10"), date("2016-04-20")));
        assert_eq!(cities(&view), vec!["Buffalo", "Columbus", "Los Angeles"]);
    }

    #[test]
    fn test_filter_by_date_single_day() {
        let ds = sample();
        let view = filter_by_date(&ds, DateRange::new(date("2017-01-01"), date("2017-01-01")));
        assert_eq!(cities(&view), vec!["Houston"]);
    }

    #[test]
    fn test_filter_by_date_inverted_range_is_empty() {
        let ds = sample();
        let view = filter_by_date(&ds, DateRange::new(date("2016-12-31"), date("2016-01-01")));
        assert!(view.is_empty());
    }

    #[test]
    fn test_location_all_empty_is_identity() {
        let ds = sample();
        let all: Vec<&Record> = ds.records().iter().collect();
        let view = filter_by_location(&all, &set(&[]), &set(&[]), &set(&[]));
        assert_eq!(view, all);
    }

    #[test]
    fn test_location_region_only() {
        let ds = sample();
        let all: Vec<&Record> = ds.records().iter().collect();
        let view = filter_by_location(&all, &set(&["West"]), &set(&[]), &set(&[]));
        assert_eq!(cities(&view), vec!["Los Angeles", "Seattle"]);
    }

    #[test]
    fn test_location_state_only() {
        let ds = sample();
        let all: Vec<&Record> = ds.records().iter().collect();
        let view = filter_by_location(&all, &set(&[]), &set(&["New York", "Texas"]), &set(&[]));
        assert_eq!(cities(&view), vec!["New York City", "Buffalo", "Houston"]);
    }

    #[test]
    fn test_location_city_only() {
        let ds = sample();
        let all: Vec<&Record> = ds.records().iter().collect();
        let view = filter_by_location(&all, &set(&[]), &set(&[]), &set(&["Seattle"]));
        assert_eq!(cities(&view), vec!["Seattle"]);
    }

    #[test]
    fn test_location_region_and_city() {
        let ds = sample();
        let all: Vec<&Record> = ds.records().iter().collect();
        let view = filter_by_location(
            &all,
            &set(&["East"]),
            &set(&[]),
            &set(&["Buffalo", "Seattle"]),
        );
        assert_eq!(cities(&view), vec!["Buffalo"]);
    }

    #[test]
    fn test_location_state_and_city() {
        let ds = sample();
        let all: Vec<&Record> = ds.records().iter().collect();
        let view = filter_by_location(
            &all,
            &set(&[]),
            &set(&["New York"]),
            &set(&["Buffalo", "Columbus"]),
        );
        assert_eq!(cities(&view), vec!["Buffalo"]);
    }

    #[test]
    fn test_location_region_and_state() {
        let ds = sample();
        let all: Vec<&Record> = ds.records().iter().collect();
        let view = filter_by_location(
            &all,
            &set(&["East", "West"]),
            &set(&["Ohio", "Washington", "Texas"]),
            &set(&[]),
        );
        assert_eq!(cities(&view), vec!["Columbus", "Seattle"]);
    }

    #[test]
    fn test_location_all_three() {
        let ds = sample();
        let all: Vec<&Record> = ds.records().iter().collect();
        let view = filter_by_location(
            &all,
            &set(&["East"]),
            &set(&["New York"]),
            &set(&["New York City", "Los Angeles"]),
        );
        assert_eq!(cities(&view), vec!["New York City"]);
    }

    #[test]
    fn test_stale_selection_matches_nothing() {
        // A city left over from a deselected region is not an error.
        let ds = sample();
        let all: Vec<&Record> = ds.records().iter().collect();
        let view = filter_by_location(&all, &set(&["Central"]), &set(&[]), &set(&["Seattle"]));
        assert!(view.is_empty());
    }

    #[test]
    fn test_choices_narrow_by_region_then_state() {
        let ds = sample();
        let all: Vec<&Record> = ds.records().iter().collect();

        let open = LocationChoices::narrow(&all, &set(&[]), &set(&[]));
        assert_eq!(open.regions, vec!["East", "West", "Central"]);
        assert_eq!(open.states.len(), 5);
        assert_eq!(open.cities.len(), 6);

        let east = LocationChoices::narrow(&all, &set(&["East"]), &set(&[]));
        assert_eq!(east.regions, vec!["East", "West", "Central"]);
        assert_eq!(east.states, vec!["New York", "Ohio"]);
        assert_eq!(east.cities, vec!["New York City", "Buffalo", "Columbus"]);

        let ny = LocationChoices::narrow(&all, &set(&["East"]), &set(&["New York"]));
        assert_eq!(ny.cities, vec!["New York City", "Buffalo"]);
    }

    #[test]
    fn test_choices_state_without_region() {
        let ds = sample();
        let all: Vec<&Record> = ds.records().iter().collect();
        let c = LocationChoices::narrow(&all, &set(&[]), &set(&["California"]));
        assert_eq!(c.states.len(), 5);
        assert_eq!(c.cities, vec!["Los Angeles"]);
    }

    #[test]
    fn test_request_defaults_to_full_span() {
        let ds = sample();
        let req = FilterRequest::for_dataset(&ds);
        assert_eq!(req.range, DateRange::new(date("2016-01-05"), date("2017-01-01")));
        assert_eq!(req.apply(&ds).len(), ds.len());
    }

    #[test]
    fn test_request_applies_date_then_location() {
        let ds = sample();
        let req = FilterRequest::for_dataset(&ds)
            .with_end(Some(date("2016-12-31")))
            .with_locations(vec!["East".to_string()], vec![], vec![]);
        let view = req.apply(&ds);
        assert_eq!(cities(&view), vec!["New York City", "Buffalo", "Columbus"]);

        let req = req.with_start(Some(date("2016-02-01")));
        assert_eq!(cities(&req.apply(&ds)), vec!["Buffalo", "Columbus"]);
    }

    #[test]
    fn test_choices_follow_date_range() {
        let ds = sample();
        let req = FilterRequest::for_dataset(&ds).with_start(Some(date("2016-04-01")));
        let c = req.choices(&ds);
        assert_eq!(c.regions, vec!["West", "Central"]);
    }

    #[test]
    fn test_empty_dataset() {
        let ds = Dataset::new("empty", vec![]);
        let req = FilterRequest::for_dataset(&ds)
            .with_locations(vec!["East".to_string()], vec![], vec!["Nowhere".to_string()]);
        assert!(req.apply(&ds).is_empty());
        assert_eq!(req.choices(&ds), LocationChoices::default());
    }
}
