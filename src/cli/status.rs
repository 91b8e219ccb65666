use std::collections::HashSet;

use crate::cli::SourceArgs;
use crate::error::Result;
use crate::fmt::{money, number};
use crate::models::Dataset;
use crate::settings::load_settings;

pub fn run(source: &SourceArgs) -> Result<()> {
    let settings = load_settings();
    println!(
        "Configured: {}",
        settings.dataset_path.as_deref().unwrap_or("(not set)")
    );
    let dataset = source.open(&settings)?;
    println!("{}", format_status(dataset));
    Ok(())
}

pub fn format_status(dataset: &Dataset) -> String {
    let records = dataset.records();
    let distinct = |f: fn(&crate::models::Record) -> &str| {
        records.iter().map(f).collect::<HashSet<_>>().len()
    };
    let span = match dataset.date_span() {
        Some((min, max)) => format!("{} to {}", min.format("%Y-%m-%d"), max.format("%Y-%m-%d")),
        None => "(no orders)".to_string(),
    };
    let sales: f64 = records.iter().map(|r| r.sales).sum();
    let profit: f64 = records.iter().map(|r| r.profit).sum();

    let lines = [
        format!("Source:        {}", dataset.source()),
        format!("Order lines:   {}", number(dataset.len())),
        format!("Orders:        {}", number(distinct(|r| r.order_id.as_str()))),
        format!("Customers:     {}", number(distinct(|r| r.customer_id.as_str()))),
        format!("Date span:     {span}"),
        format!("Regions:       {}", number(distinct(|r| r.region.as_str()))),
        format!("States:        {}", number(distinct(|r| r.state.as_str()))),
        format!("Cities:        {}", number(distinct(|r| r.city.as_str()))),
        format!("Sales:         {}", money(sales)),
        format!("Profit:        {}", money(profit)),
    ];
    lines.join("\n")
}
