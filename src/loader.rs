use std::path::Path;

use chrono::{Days, NaiveDate};

use crate::error::{Result, SalescopeError};
use crate::models::{Dataset, Record};
use crate::settings::ColumnMap;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw.replace(',', "").replace('"', "").replace('$', "");
    let s = s.trim();
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return inner
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| -v);
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD` and US `M/D/YYYY`, with or without a
/// trailing time component.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.split(['T', ' ']).next().unwrap_or(raw);
    ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"]
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(date_part, f).ok())
}

/// Serial of 9999-12-31, the last date Excel can show.
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !(0.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_days(Days::new(serial.floor() as u64))
}

// ---------------------------------------------------------------------------
// Cells and column resolution
// ---------------------------------------------------------------------------

/// A source cell, normalised across CSV and spreadsheet readers.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    fn text(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }

    fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

struct ColumnIndex {
    order_date: usize,
    region: usize,
    state: usize,
    city: usize,
    category: usize,
    segment: usize,
    customer_id: usize,
    customer_name: usize,
    order_id: usize,
    sales: usize,
    profit: usize,
}

impl ColumnIndex {
    fn resolve(headers: &[String], columns: &ColumnMap) -> Result<Self> {
        let find = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
                .ok_or_else(|| SalescopeError::MissingColumn(name.to_string()))
        };
        Ok(Self {
            order_date: find(&columns.order_date)?,
            region: find(&columns.region)?,
            state: find(&columns.state)?,
            city: find(&columns.city)?,
            category: find(&columns.category)?,
            segment: find(&columns.segment)?,
            customer_id: find(&columns.customer_id)?,
            customer_name: find(&columns.customer_name)?,
            order_id: find(&columns.order_id)?,
            sales: find(&columns.sales)?,
            profit: find(&columns.profit)?,
        })
    }
}

fn cell_at(cells: &[Cell], idx: usize) -> &Cell {
    cells.get(idx).unwrap_or(&Cell::Empty)
}

fn date_cell(cells: &[Cell], idx: usize, row: usize) -> Result<NaiveDate> {
    let cell = cell_at(cells, idx);
    let parsed = match cell {
        Cell::Date(d) => Some(*d),
        Cell::Number(serial) => excel_serial_to_date(*serial),
        Cell::Text(s) => parse_date(s),
        Cell::Empty => None,
    };
    parsed.ok_or_else(|| SalescopeError::InvalidDate {
        row,
        value: cell.as_text(),
    })
}

fn amount_cell(cells: &[Cell], idx: usize, row: usize, column: &str) -> Result<f64> {
    let cell = cell_at(cells, idx);
    let parsed = match cell {
        Cell::Number(n) => Some(*n).filter(|v| v.is_finite()),
        Cell::Text(s) => parse_amount(s),
        Cell::Empty | Cell::Date(_) => None,
    };
    parsed.ok_or_else(|| SalescopeError::InvalidNumber {
        row,
        column: column.to_string(),
        value: cell.as_text(),
    })
}

fn build_record(
    cells: &[Cell],
    idx: &ColumnIndex,
    columns: &ColumnMap,
    row: usize,
) -> Result<Record> {
    let text = |i: usize| cell_at(cells, i).as_text();
    Ok(Record {
        order_date: date_cell(cells, idx.order_date, row)?,
        region: text(idx.region),
        state: text(idx.state),
        city: text(idx.city),
        category: text(idx.category),
        segment: text(idx.segment),
        customer_id: text(idx.customer_id),
        customer_name: text(idx.customer_name),
        order_id: text(idx.order_id),
        sales: amount_cell(cells, idx.sales, row, &columns.sales)?,
        profit: amount_cell(cells, idx.profit, row, &columns.profit)?,
    })
}

/// Turn a header row plus data rows into records. Row numbers in errors are
/// 1-based with the header as row 1, matching what a spreadsheet shows.
fn records_from_rows<I>(headers: &[String], rows: I, columns: &ColumnMap) -> Result<Vec<Record>>
where
    I: IntoIterator<Item = Vec<Cell>>,
{
    let idx = ColumnIndex::resolve(headers, columns)?;
    let mut records = Vec::new();
    for (i, cells) in rows.into_iter().enumerate() {
        if cells.iter().all(|c| *c == Cell::Empty) {
            continue;
        }
        records.push(build_record(&cells, &idx, columns, i + 2)?);
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Readers
// ---------------------------------------------------------------------------

const SPREADSHEET_EXTENSIONS: &[&str] = &["xls", "xlsx", "xlsm", "xlsb", "ods"];

/// Load a dataset from a CSV or spreadsheet file.
pub fn load_file(path: &Path, sheet: Option<&str>, columns: &ColumnMap) -> Result<Dataset> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let records = if ext == "csv" {
        load_csv(path, columns)?
    } else if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
        load_workbook(path, sheet, columns)?
    } else {
        return Err(SalescopeError::Other(format!(
            "Unsupported file type: {} (expected .csv, .xls, .xlsx, .xlsm, .xlsb or .ods)",
            path.display()
        )));
    };

    tracing::info!(path = %path.display(), records = records.len(), "dataset loaded");
    Ok(Dataset::new(path.display().to_string(), records))
}

fn load_csv(path: &Path, columns: &ColumnMap) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(Cell::text).collect::<Vec<_>>());
    }
    records_from_rows(&headers, rows, columns)
}

#[cfg(feature = "spreadsheet")]
fn load_workbook(path: &Path, sheet: Option<&str>, columns: &ColumnMap) -> Result<Vec<Record>> {
    use calamine::{Data, Reader};

    let mut workbook = calamine::open_workbook_auto(path)?;
    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| {
                SalescopeError::Spreadsheet(format!("{} has no sheets", path.display()))
            })?,
    };
    let range = workbook.worksheet_range(&sheet_name)?;

    let to_cell = |data: &Data| match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::text(s),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(Cell::Date)
            .unwrap_or(Cell::Empty),
        Data::DateTimeIso(s) => Cell::text(s),
        _ => Cell::Empty,
    };

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|d| to_cell(d).as_text()).collect(),
        None => return Err(SalescopeError::MissingColumn(columns.order_date.clone())),
    };
    let data_rows: Vec<Vec<Cell>> = rows.map(|r| r.iter().map(to_cell).collect()).collect();
    records_from_rows(&headers, data_rows, columns)
}

#[cfg(not(feature = "spreadsheet"))]
fn load_workbook(path: &Path, _sheet: Option<&str>, _columns: &ColumnMap) -> Result<Vec<Record>> {
    Err(SalescopeError::Other(format!(
        "Reading {} requires the 'spreadsheet' feature",
        path.display()
    )))
}
