use std::collections::{BTreeMap, HashSet};

use chrono::Datelike;
use serde::Serialize;

use crate::models::Record;

const MONTH_ABBR: &[&str] = &[
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub const DEFAULT_TOP_CUSTOMERS: usize = 5;

// ---------------------------------------------------------------------------
// Category sales
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySales {
    pub category: String,
    pub total_sales: f64,
}

pub fn category_sales(records: &[&Record]) -> Vec<CategorySales> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for r in records {
        *totals.entry(&r.category).or_default() += r.sales;
    }
    totals
        .into_iter()
        .map(|(category, total_sales)| CategorySales {
            category: category.to_string(),
            total_sales,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Region sales mix
// ---------------------------------------------------------------------------

/// One record's sales attributed to its region. Not pre-aggregated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSale {
    pub region: String,
    pub sales: f64,
}

pub fn region_sales(records: &[&Record]) -> Vec<RegionSale> {
    records
        .iter()
        .map(|r| RegionSale {
            region: r.region.clone(),
            sales: r.sales,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionShare {
    pub region: String,
    pub sales: f64,
    pub share: f64,
}

/// Sum the raw pairs per region and express each as a fraction of the total,
/// largest first. A zero total gives every region a zero share.
pub fn region_shares(sales: &[RegionSale]) -> Vec<RegionShare> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for s in sales {
        *totals.entry(&s.region).or_default() += s.sales;
    }
    let grand: f64 = totals.values().sum();
    let mut shares: Vec<RegionShare> = totals
        .into_iter()
        .map(|(region, sales)| RegionShare {
            region: region.to_string(),
            sales,
            share: if grand != 0.0 { sales / grand } else { 0.0 },
        })
        .collect();
    shares.sort_by(|a, b| b.sales.total_cmp(&a.sales));
    shares
}

// ---------------------------------------------------------------------------
// Monthly trend
// ---------------------------------------------------------------------------

/// Calendar month. Orders by (year, month), not by label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(record: &Record) -> Self {
        Self {
            year: record.order_date.year(),
            month: record.order_date.month(),
        }
    }

    /// `2016 : Nov`
    pub fn label(&self) -> String {
        format!("{} : {}", self.year, self.short_label())
    }

    pub fn short_label(&self) -> &'static str {
        MONTH_ABBR
            .get(self.month.saturating_sub(1) as usize)
            .copied()
            .unwrap_or("???")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySales {
    pub period: MonthKey,
    pub label: String,
    pub total_sales: f64,
}

pub fn monthly_sales(records: &[&Record]) -> Vec<MonthlySales> {
    let mut totals: BTreeMap<MonthKey, f64> = BTreeMap::new();
    for r in records {
        *totals.entry(MonthKey::of(r)).or_default() += r.sales;
    }
    totals
        .into_iter()
        .map(|(period, total_sales)| MonthlySales {
            period,
            label: period.label(),
            total_sales,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Segment financials
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Metric {
    Sales,
    Cost,
    Profit,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Sales, Metric::Cost, Metric::Profit];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Sales => "Sales",
            Metric::Cost => "Cost",
            Metric::Profit => "Profit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentMetric {
    pub segment: String,
    pub metric: Metric,
    pub amount: f64,
}

/// Long-format breakdown: every Sales row, then every Cost row, then every
/// Profit row, segments ascending within each metric. Cost = Sales - Profit.
pub fn segment_financials(records: &[&Record]) -> Vec<SegmentMetric> {
    let mut totals: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for r in records {
        let entry = totals.entry(&r.segment).or_default();
        entry.0 += r.sales;
        entry.1 += r.profit;
    }
    let mut rows = Vec::with_capacity(totals.len() * Metric::ALL.len());
    for metric in Metric::ALL {
        for (segment, (sales, profit)) in &totals {
            let amount = match metric {
                Metric::Sales => *sales,
                Metric::Cost => sales - profit,
                Metric::Profit => *profit,
            };
            rows.push(SegmentMetric {
                segment: segment.to_string(),
                metric,
                amount,
            });
        }
    }
    rows
}

// ---------------------------------------------------------------------------
// Average ticket by segment and region
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentRegionTicket {
    pub segment: String,
    pub region: String,
    pub total_sales: f64,
    pub order_count: usize,
    pub average_ticket: f64,
}

#[derive(Default)]
struct OrderTally<'a> {
    total_sales: f64,
    orders: HashSet<&'a str>,
}

impl<'a> OrderTally<'a> {
    fn add(&mut self, record: &'a Record) {
        self.total_sales += record.sales;
        self.orders.insert(&record.order_id);
    }

    /// Every group holds at least one record and so at least one order.
    fn average(&self) -> f64 {
        self.total_sales / self.orders.len() as f64
    }
}

pub fn region_segment_ticket(records: &[&Record]) -> Vec<SegmentRegionTicket> {
    let mut groups: BTreeMap<(&str, &str), OrderTally> = BTreeMap::new();
    for r in records {
        groups
            .entry((r.segment.as_str(), r.region.as_str()))
            .or_default()
            .add(r);
    }
    groups
        .into_iter()
        .map(|((segment, region), tally)| SegmentRegionTicket {
            segment: segment.to_string(),
            region: region.to_string(),
            total_sales: tally.total_sales,
            order_count: tally.orders.len(),
            average_ticket: tally.average(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Customers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerFrequency {
    pub customer_id: String,
    pub customer_name: String,
    pub purchase_frequency: usize,
    pub total_sales: f64,
    pub average_ticket: f64,
}

pub fn purchase_frequency(records: &[&Record]) -> Vec<CustomerFrequency> {
    let mut groups: BTreeMap<(&str, &str), OrderTally> = BTreeMap::new();
    for r in records {
        groups
            .entry((r.customer_id.as_str(), r.customer_name.as_str()))
            .or_default()
            .add(r);
    }
    groups
        .into_iter()
        .map(|((customer_id, customer_name), tally)| CustomerFrequency {
            customer_id: customer_id.to_string(),
            customer_name: customer_name.to_string(),
            purchase_frequency: tally.orders.len(),
            total_sales: tally.total_sales,
            average_ticket: tally.average(),
        })
        .collect()
}

/// Highest average ticket first; ties keep their input order.
pub fn top_customers(customers: &[CustomerFrequency], n: usize) -> Vec<CustomerFrequency> {
    let mut ranked = customers.to_vec();
    ranked.sort_by(|a, b| b.average_ticket.total_cmp(&a.average_ticket));
    ranked.truncate(n);
    ranked
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyBin {
    pub purchase_frequency: usize,
    pub customers: usize,
}

/// How many customers placed each distinct number of orders, ascending.
pub fn frequency_histogram(customers: &[CustomerFrequency]) -> Vec<FrequencyBin> {
    let mut bins: BTreeMap<usize, usize> = BTreeMap::new();
    for c in customers {
        *bins.entry(c.purchase_frequency).or_default() += 1;
    }
    bins.into_iter()
        .map(|(purchase_frequency, customers)| FrequencyBin {
            purchase_frequency,
            customers,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// All tables for one pass
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardTables {
    pub category_sales: Vec<CategorySales>,
    pub region_sales: Vec<RegionSale>,
    pub monthly_sales: Vec<MonthlySales>,
    pub segment_financials: Vec<SegmentMetric>,
    pub region_segment_ticket: Vec<SegmentRegionTicket>,
    pub purchase_frequency: Vec<CustomerFrequency>,
    pub top_customers: Vec<CustomerFrequency>,
}

impl DashboardTables {
    pub fn compute(records: &[&Record], top_n: usize) -> Self {
        let purchase_frequency = purchase_frequency(records);
        let top_customers = top_customers(&purchase_frequency, top_n);
        let tables = Self {
            category_sales: category_sales(records),
            region_sales: region_sales(records),
            monthly_sales: monthly_sales(records),
            segment_financials: segment_financials(records),
            region_segment_ticket: region_segment_ticket(records),
            purchase_frequency,
            top_customers,
        };
        tracing::debug!(
            records = records.len(),
            customers = tables.purchase_frequency.len(),
            months = tables.monthly_sales.len(),
            "aggregation pass"
        );
        tables
    }

    pub fn is_empty(&self) -> bool {
        self.region_sales.is_empty()
    }
}
