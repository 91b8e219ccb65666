use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::aggregates::{
    frequency_histogram, region_shares, CategorySales, CustomerFrequency, DashboardTables,
    MonthlySales, RegionSale, SegmentMetric, SegmentRegionTicket,
};
use crate::cli::{FilterArgs, OutputFormat, SourceArgs, TableKind};
use crate::error::{Result, SalescopeError};
use crate::filters::FilterRequest;
use crate::fmt::{money, number, percent};
use crate::settings::load_settings;

pub fn run(
    source: &SourceArgs,
    table: TableKind,
    filters: &FilterArgs,
    format: OutputFormat,
    top: Option<usize>,
) -> Result<()> {
    let settings = load_settings();
    let dataset = source.open(&settings)?;
    let request = filters.request(dataset)?;
    let view = request.apply(dataset);
    let tables = DashboardTables::compute(&view, top.unwrap_or(settings.top_customers));

    let out = match format {
        OutputFormat::Text => format_text(table, &tables, &request, view.len()),
        OutputFormat::Json => format_json(table, &tables)?,
    };
    println!("{out}");
    Ok(())
}

/// One-line description of a request: date range and location selections.
pub(crate) fn filter_summary(request: &FilterRequest) -> String {
    let list = |set: &std::collections::BTreeSet<String>| {
        if set.is_empty() {
            "all".to_string()
        } else {
            set.iter().cloned().collect::<Vec<_>>().join(", ")
        }
    };
    format!(
        "{} to {} | Region: {} | State: {} | City: {}",
        request.range.start.format("%Y-%m-%d"),
        request.range.end.format("%Y-%m-%d"),
        list(&request.regions),
        list(&request.states),
        list(&request.cities),
    )
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

pub fn format_json(table: TableKind, tables: &DashboardTables) -> Result<String> {
    let value = match table {
        TableKind::Category => serde_json::to_value(&tables.category_sales),
        TableKind::Region => serde_json::to_value(&tables.region_sales),
        TableKind::Monthly => serde_json::to_value(&tables.monthly_sales),
        TableKind::Segment => serde_json::to_value(&tables.segment_financials),
        TableKind::Ticket => serde_json::to_value(&tables.region_segment_ticket),
        TableKind::Frequency => serde_json::to_value(&tables.purchase_frequency),
        TableKind::Top => serde_json::to_value(&tables.top_customers),
        TableKind::All => serde_json::to_value(tables),
    }
    .map_err(|e| SalescopeError::Other(format!("JSON encoding failed: {e}")))?;
    serde_json::to_string_pretty(&value)
        .map_err(|e| SalescopeError::Other(format!("JSON encoding failed: {e}")))
}

// ---------------------------------------------------------------------------
// Text (pure formatting: tables → String)
// ---------------------------------------------------------------------------

pub fn format_text(
    table: TableKind,
    tables: &DashboardTables,
    request: &FilterRequest,
    matched: usize,
) -> String {
    let header = format!(
        "{}\n{} order lines matched\n",
        filter_summary(request),
        number(matched)
    );
    let body = match table {
        TableKind::Category => format_category(&tables.category_sales),
        TableKind::Region => format_region(&tables.region_sales),
        TableKind::Monthly => format_monthly(&tables.monthly_sales),
        TableKind::Segment => format_segment(&tables.segment_financials),
        TableKind::Ticket => format_ticket(&tables.region_segment_ticket),
        TableKind::Frequency => format_frequency(&tables.purchase_frequency),
        TableKind::Top => format_top(&tables.top_customers),
        TableKind::All => [
            format_category(&tables.category_sales),
            format_region(&tables.region_sales),
            format_monthly(&tables.monthly_sales),
            format_segment(&tables.segment_financials),
            format_ticket(&tables.region_segment_ticket),
            format_frequency(&tables.purchase_frequency),
            format_top(&tables.top_customers),
        ]
        .join("\n\n"),
    };
    format!("{header}\n{body}")
}

fn titled(title: &str, table: Table) -> String {
    format!("{}\n{table}", title.bold())
}

fn money_cell(amount: f64) -> Cell {
    Cell::new(money(amount)).set_alignment(CellAlignment::Right)
}

pub fn format_category(rows: &[CategorySales]) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Category", "Sales"]);
    for row in rows {
        table.add_row(vec![Cell::new(&row.category), money_cell(row.total_sales)]);
    }
    titled("Category wise Sales", table)
}

pub fn format_region(pairs: &[RegionSale]) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Region", "Sales", "Share"]);
    for share in region_shares(pairs) {
        table.add_row(vec![
            Cell::new(&share.region),
            money_cell(share.sales),
            Cell::new(percent(share.share)).set_alignment(CellAlignment::Right),
        ]);
    }
    titled("Region wise Sales", table)
}

pub fn format_monthly(rows: &[MonthlySales]) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Year : Month", "Sales"]);
    for row in rows {
        table.add_row(vec![Cell::new(&row.label), money_cell(row.total_sales)]);
    }
    titled("Year-month Sales", table)
}

pub fn format_segment(rows: &[SegmentMetric]) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Segment", "Metric", "Amount"]);
    for row in rows {
        let amount = if row.amount < 0.0 {
            Cell::new(money(row.amount).red())
        } else {
            Cell::new(money(row.amount))
        };
        table.add_row(vec![
            Cell::new(&row.segment),
            Cell::new(row.metric.name()),
            amount.set_alignment(CellAlignment::Right),
        ]);
    }
    titled("Financial situation by Segment", table)
}

pub fn format_ticket(rows: &[SegmentRegionTicket]) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Segment", "Region", "Sales", "Orders", "Average Ticket"]);
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.segment),
            Cell::new(&row.region),
            money_cell(row.total_sales),
            Cell::new(number(row.order_count)).set_alignment(CellAlignment::Right),
            money_cell(row.average_ticket),
        ]);
    }
    titled("Average Ticket by Region and Segment", table)
}

pub fn format_frequency(customers: &[CustomerFrequency]) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Purchase Frequency", "Number of Clients"]);
    for bin in frequency_histogram(customers) {
        table.add_row(vec![
            Cell::new(bin.purchase_frequency).set_alignment(CellAlignment::Right),
            Cell::new(number(bin.customers)).set_alignment(CellAlignment::Right),
        ]);
    }
    titled("Frequency of Customer Purchases", table)
}

pub fn format_top(customers: &[CustomerFrequency]) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Customer", "ID", "Orders", "Sales", "Average Ticket"]);
    for c in customers {
        table.add_row(vec![
            Cell::new(&c.customer_name),
            Cell::new(&c.customer_id),
            Cell::new(c.purchase_frequency).set_alignment(CellAlignment::Right),
            money_cell(c.total_sales),
            money_cell(c.average_ticket),
        ]);
    }
    titled("Top Clients", table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{record, Dataset};

    fn sample() -> Dataset {
        Dataset::new(
            "test",
            vec![
                record("2016-01-05", "East", "New York", "Buffalo", "O1", "C1", 100.0, 20.0),
                record("2016-01-05", "East", "New York", "Buffalo", "O1", "C1", 50.0, 10.0),
                record("2016-02-10", "West", "Oregon", "Portland", "O2", "C2", 1250.0, -80.0),
            ],
        )
    }

    fn tables_for(ds: &Dataset) -> (FilterRequest, DashboardTables) {
        let request = FilterRequest::for_dataset(ds);
        let view = request.apply(ds);
        let tables = DashboardTables::compute(&view, 5);
        (request, tables)
    }

    #[test]
    fn test_filter_summary() {
        let ds = sample();
        let request = FilterRequest::for_dataset(&ds)
            .with_locations(vec!["West".into(), "East".into()], vec![], vec![]);
        assert_eq!(
            filter_summary(&request),
            "2016-01-05 to 2016-02-10 | Region: East, West | State: all | City: all"
        );
    }

    #[test]
    fn test_format_category() {
        let ds = sample();
        let (_, tables) = tables_for(&ds);
        let s = format_category(&tables.category_sales);
        assert!(s.contains("Technology"));
        assert!(s.contains("$1,400.00"));
    }

    #[test]
    fn test_format_region_shows_shares() {
        let ds = sample();
        let (_, tables) = tables_for(&ds);
        let s = format_region(&tables.region_sales);
        assert!(s.contains("West"));
        assert!(s.contains("$1,250.00"));
        assert!(s.contains("89.3%"));
    }

    #[test]
    fn test_format_monthly_labels() {
        let ds = sample();
        let (_, tables) = tables_for(&ds);
        let s = format_monthly(&tables.monthly_sales);
        let jan = s.find("2016 : Jan").unwrap();
        let feb = s.find("2016 : Feb").unwrap();
        assert!(jan < feb);
    }

    #[test]
    fn test_format_segment_has_cost() {
        let ds = sample();
        let (_, tables) = tables_for(&ds);
        let s = format_segment(&tables.segment_financials);
        // Cost = 1400 - (-50)
        assert!(s.contains("$1,450.00"));
        assert!(s.contains("Profit"));
    }

    #[test]
    fn test_format_ticket_and_top() {
        let ds = sample();
        let (_, tables) = tables_for(&ds);
        let s = format_ticket(&tables.region_segment_ticket);
        assert!(s.contains("$150.00"));
        let s = format_top(&tables.top_customers);
        let c2 = s.find("Customer C2").unwrap();
        let c1 = s.find("Customer C1").unwrap();
        assert!(c2 < c1);
    }

    #[test]
    fn test_format_frequency_distribution() {
        let ds = sample();
        let (_, tables) = tables_for(&ds);
        let s = format_frequency(&tables.purchase_frequency);
        assert!(s.contains("Number of Clients"));
    }

    #[test]
    fn test_format_text_empty_selection() {
        let ds = sample();
        let request = FilterRequest::for_dataset(&ds)
            .with_locations(vec![], vec![], vec!["Atlantis".into()]);
        let view = request.apply(&ds);
        let tables = DashboardTables::compute(&view, 5);
        let s = format_text(TableKind::All, &tables, &request, view.len());
        assert!(s.contains("0 order lines matched"));
        assert!(s.contains("Top Clients"));
    }

    #[test]
    fn test_format_json_tables() {
        let ds = sample();
        let (_, tables) = tables_for(&ds);
        let json = format_json(TableKind::Top, &tables).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v.as_array().unwrap().len(), 2);
        assert_eq!(v[0]["customer_id"], "C2");

        let json = format_json(TableKind::Segment, &tables).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v[0]["metric"], "Sales");

        let json = format_json(TableKind::All, &tables).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["monthly_sales"][0]["label"], "2016 : Jan");
        assert_eq!(v["region_sales"].as_array().unwrap().len(), 3);
    }
}
