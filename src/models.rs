use chrono::NaiveDate;
use serde::Serialize;

/// One sales transaction line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub order_date: NaiveDate,
    pub region: String,
    pub state: String,
    pub city: String,
    pub category: String,
    pub segment: String,
    pub customer_id: String,
    pub customer_name: String,
    pub order_id: String,
    pub sales: f64,
    pub profit: f64,
}

/// The full, immutable collection of records plus where it came from.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    source: String,
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(source: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            source: source.into(),
            records,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest order date, or None for an empty dataset.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.order_date).min()?;
        let max = self.records.iter().map(|r| r.order_date).max()?;
        Some((min, max))
    }
}

#[cfg(test)]
#[allow(clippy::too_many_arguments)]
pub(crate) fn record(
    date: &str,
    region: &str,
    state: &str,
    city: &str,
    order_id: &str,
    customer_id: &str,
    sales: f64,
    profit: f64,
) -> Record {
    Record {
        order_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        region: region.to_string(),
        state: state.to_string(),
        city: city.to_string(),
        category: "Technology".to_string(),
        segment: "Consumer".to_string(),
        customer_id: customer_id.to_string(),
        customer_name: format!("Customer {customer_id}"),
        order_id: order_id.to_string(),
        sales,
        profit,
    }
}
