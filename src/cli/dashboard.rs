use std::collections::BTreeSet;
use std::io::IsTerminal;

use chrono::{Duration, Months, NaiveDate};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset as Series, GraphType,
        Paragraph,
    },
    Frame,
};

use crate::aggregates::{frequency_histogram, region_shares, DashboardTables, Metric};
use crate::cli::report::filter_summary;
use crate::cli::{FilterArgs, SourceArgs};
use crate::error::{Result, SalescopeError};
use crate::filters::{DateRange, FilterRequest, LocationChoices};
use crate::fmt::{format_k, money, number, percent};
use crate::models::Dataset;
use crate::settings::load_settings;
use crate::tui::{
    money_span, palette, run_screen, wrap_text, Screen, ScreenAction, FOOTER_STYLE,
    HEADER_STYLE, SELECTED_STYLE, TITLE_STYLE,
};

const SIDEBAR_WIDTH: u16 = 32;
const NAME_WIDTH: usize = 18;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Focus {
    Start,
    End,
    Region,
    State,
    City,
}

const FOCUS_ORDER: [Focus; 5] = [
    Focus::Start,
    Focus::End,
    Focus::Region,
    Focus::State,
    Focus::City,
];

const PICKERS: [Focus; 3] = [Focus::Region, Focus::State, Focus::City];

impl Focus {
    fn position(self) -> usize {
        FOCUS_ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        FOCUS_ORDER[(self.position() + 1) % FOCUS_ORDER.len()]
    }

    fn prev(self) -> Self {
        FOCUS_ORDER[(self.position() + FOCUS_ORDER.len() - 1) % FOCUS_ORDER.len()]
    }

    /// Index into the picker arrays, or None for the date fields.
    fn picker(self) -> Option<usize> {
        PICKERS.iter().position(|f| *f == self)
    }

    fn title(self) -> &'static str {
        match self {
            Focus::Start => "Start Date",
            Focus::End => "End Date",
            Focus::Region => "Region",
            Focus::State => "State",
            Focus::City => "City",
        }
    }
}

pub(crate) struct Dashboard<'a> {
    dataset: &'a Dataset,
    top_n: usize,
    span: (NaiveDate, NaiveDate),
    start: NaiveDate,
    end: NaiveDate,
    selections: [BTreeSet<String>; 3],
    focus: Focus,
    cursors: [usize; 3],
    // Derived on every pass
    choices: LocationChoices,
    tables: DashboardTables,
    matched: usize,
}

impl<'a> Dashboard<'a> {
    pub(crate) fn new(dataset: &'a Dataset, initial: FilterRequest, top_n: usize) -> Self {
        let span = dataset
            .date_span()
            .unwrap_or((initial.range.start, initial.range.end));
        let mut dashboard = Self {
            dataset,
            top_n,
            span,
            start: initial.range.start,
            end: initial.range.end,
            selections: [initial.regions, initial.states, initial.cities],
            focus: Focus::Start,
            cursors: [0; 3],
            choices: LocationChoices::default(),
            tables: DashboardTables::default(),
            matched: 0,
        };
        dashboard.recompute();
        dashboard
    }

    fn request(&self) -> FilterRequest {
        FilterRequest {
            range: DateRange::new(self.start, self.end),
            regions: self.selections[0].clone(),
            states: self.selections[1].clone(),
            cities: self.selections[2].clone(),
        }
    }

    fn options(&self, picker: usize) -> &[String] {
        match picker {
            0 => &self.choices.regions,
            1 => &self.choices.states,
            _ => &self.choices.cities,
        }
    }

    /// One full pass: refresh picker choices, drop selections the pickers no
    /// longer offer, then filter and aggregate from scratch.
    fn recompute(&mut self) {
        for picker in 0..PICKERS.len() {
            self.choices = self.request().choices(self.dataset);
            let offered: BTreeSet<String> = self.options(picker).iter().cloned().collect();
            self.selections[picker].retain(|v| offered.contains(v));
        }
        for picker in 0..PICKERS.len() {
            let len = self.options(picker).len();
            self.cursors[picker] = self.cursors[picker].min(len.saturating_sub(1));
        }

        let request = self.request();
        let view = request.apply(self.dataset);
        self.matched = view.len();
        self.tables = DashboardTables::compute(&view, self.top_n);
    }

    fn reset(&mut self) {
        self.start = self.span.0;
        self.end = self.span.1;
        for selection in &mut self.selections {
            selection.clear();
        }
        self.cursors = [0; 3];
    }

    // -----------------------------------------------------------------------
    // Key handling
    // -----------------------------------------------------------------------

    /// Returns true when the request changed and a new pass is needed.
    fn handle_date_key(&mut self, code: KeyCode) -> bool {
        let is_start = self.focus == Focus::Start;
        let current = if is_start { self.start } else { self.end };
        let moved = match code {
            KeyCode::Left => current.checked_sub_signed(Duration::days(1)),
            KeyCode::Right => current.checked_add_signed(Duration::days(1)),
            KeyCode::Down => current.checked_sub_months(Months::new(1)),
            KeyCode::Up => current.checked_add_months(Months::new(1)),
            KeyCode::PageDown => current.checked_sub_months(Months::new(12)),
            KeyCode::PageUp => current.checked_add_months(Months::new(12)),
            KeyCode::Char('r') => Some(if is_start { self.span.0 } else { self.span.1 }),
            _ => None,
        };
        match moved {
            Some(date) if date != current => {
                if is_start {
                    self.start = date;
                } else {
                    self.end = date;
                }
                true
            }
            _ => false,
        }
    }

    fn handle_picker_key(&mut self, picker: usize, code: KeyCode) -> bool {
        let len = self.options(picker).len();
        match code {
            KeyCode::Up => {
                self.cursors[picker] = self.cursors[picker].saturating_sub(1);
                false
            }
            KeyCode::Down => {
                self.cursors[picker] = (self.cursors[picker] + 1).min(len.saturating_sub(1));
                false
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                let Some(value) = self.options(picker).get(self.cursors[picker]).cloned() else {
                    return false;
                };
                let selection = &mut self.selections[picker];
                if !selection.remove(&value) {
                    selection.insert(value);
                }
                true
            }
            KeyCode::Char('c') => {
                let changed = !self.selections[picker].is_empty();
                self.selections[picker].clear();
                changed
            }
            _ => false,
        }
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    fn draw_dashboard(&self, frame: &mut Frame) {
        let area = frame.area();
        let border_style = Style::default().fg(Color::DarkGray);

        let summary = format!(
            " {}  ({} order lines)",
            filter_summary(&self.request()),
            number(self.matched)
        );
        let (summary, summary_lines) = wrap_text(&summary, area.width.saturating_sub(1) as usize);

        let [header_area, sep1, stats_area, body_area, sep2, summary_area, hints_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Fill(1),
                Constraint::Length(1),
                Constraint::Length(summary_lines),
                Constraint::Length(1),
            ])
            .areas(area);

        frame.render_widget(
            Paragraph::new(format!(" Store Sales Dashboard | {}", self.dataset.source()))
                .style(HEADER_STYLE),
            header_area,
        );

        let sep_line = "━".repeat(area.width as usize);
        let sep_widget = Paragraph::new(sep_line.as_str()).style(border_style);
        frame.render_widget(sep_widget.clone(), sep1);
        frame.render_widget(sep_widget, sep2);

        self.draw_stats(frame, stats_area);

        let [sidebar, charts] =
            Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Fill(1)])
                .areas(body_area);
        self.draw_sidebar(frame, sidebar);

        let [row1, row2, row3, row4] = Layout::vertical([
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
        ])
        .areas(charts);
        let halves = |row: Rect| -> [Rect; 2] {
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(row)
        };

        let [category_area, region_area] = halves(row1);
        self.draw_category(frame, category_area);
        self.draw_region_mix(frame, region_area);

        self.draw_monthly(frame, row2);

        let [segment_area, ticket_area] = halves(row3);
        self.draw_segments(frame, segment_area);
        self.draw_ticket(frame, ticket_area);

        let [frequency_area, top_area] = halves(row4);
        self.draw_frequency(frame, frequency_area);
        self.draw_top_clients(frame, top_area);

        frame.render_widget(Paragraph::new(summary).style(FOOTER_STYLE), summary_area);
        frame.render_widget(Paragraph::new(self.hints()).style(FOOTER_STYLE), hints_area);
    }

    fn hints(&self) -> &'static str {
        match self.focus {
            Focus::Start | Focus::End => {
                " Tab=next filter  Left/Right=day  Up/Down=month  PgUp/PgDn=year  r=reset date  R=reset all  q=quit"
            }
            _ => " Tab=next filter  Up/Down=move  Space=toggle  c=clear  R=reset all  q=quit",
        }
    }

    fn draw_stats(&self, frame: &mut Frame, area: Rect) {
        let sales: f64 = self.tables.region_sales.iter().map(|r| r.sales).sum();
        let profit: f64 = self
            .tables
            .segment_financials
            .iter()
            .filter(|r| r.metric == Metric::Profit)
            .map(|r| r.amount)
            .sum();
        let line = Line::from(vec![
            Span::raw(" Sales "),
            money_span(sales),
            Span::raw("   Profit "),
            money_span(profit),
            Span::raw(format!(
                "   Customers {}   Months {}",
                number(self.tables.purchase_frequency.len()),
                number(self.tables.monthly_sales.len())
            )),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_sidebar(&self, frame: &mut Frame, area: Rect) {
        let [title_area, dates_area, pickers_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Fill(1),
        ])
        .areas(area);

        frame.render_widget(
            Paragraph::new(Span::styled(" Filters:", TITLE_STYLE)),
            title_area,
        );

        let date_line = |focus: Focus, date: NaiveDate| {
            let style = if self.focus == focus {
                SELECTED_STYLE
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::raw(format!(" {:<11}", focus.title())),
                Span::styled(date.format("%Y-%m-%d").to_string(), style),
            ])
        };
        frame.render_widget(
            Paragraph::new(vec![
                date_line(Focus::Start, self.start),
                date_line(Focus::End, self.end),
            ]),
            dates_area,
        );

        let areas: [Rect; 3] = Layout::vertical([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .areas(pickers_area);
        for (picker, focus) in PICKERS.iter().enumerate() {
            self.draw_picker(frame, areas[picker], picker, *focus);
        }
    }

    fn draw_picker(&self, frame: &mut Frame, area: Rect, picker: usize, focus: Focus) {
        let options = self.options(picker);
        let selection = &self.selections[picker];
        let focused = self.focus == focus;
        let border_style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(format!(
                " Choose the {} ({}/{}) ",
                focus.title().to_lowercase(),
                selection.len(),
                options.len()
            ));
        let visible = block.inner(area).height as usize;
        let cursor = self.cursors[picker];
        let offset = if visible == 0 {
            0
        } else {
            cursor.saturating_sub(visible - 1)
        };

        let lines: Vec<Line> = options
            .iter()
            .enumerate()
            .skip(offset)
            .take(visible)
            .map(|(i, option)| {
                let mark = if selection.contains(option) { "[x]" } else { "[ ]" };
                let pointer = if focused && i == cursor { ">" } else { " " };
                let style = if focused && i == cursor {
                    SELECTED_STYLE
                } else if selection.contains(option) {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                Line::from(Span::styled(format!("{pointer}{mark} {option}"), style))
            })
            .collect();
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_category(&self, frame: &mut Frame, area: Rect) {
        let block = chart_block(Line::from("Category wise Sales"));
        let rows = &self.tables.category_sales;
        if rows.is_empty() {
            return draw_empty(frame, area, block);
        }
        let width = block.inner(area).width;
        let bars: Vec<Bar> = rows
            .iter()
            .enumerate()
            .map(|(i, r)| {
                Bar::default()
                    .value(bar_value(r.total_sales))
                    .label(Line::from(r.category.clone()))
                    .text_value(format_k(r.total_sales))
                    .style(Style::default().fg(palette(i)))
            })
            .collect();
        let chart = BarChart::default()
            .block(block)
            .bar_width(fit_bar_width(width, bars.len(), 2))
            .bar_gap(2)
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(chart, area);
    }

    fn draw_region_mix(&self, frame: &mut Frame, area: Rect) {
        let block = chart_block(Line::from("Region wise Sales"));
        let shares = region_shares(&self.tables.region_sales);
        if shares.is_empty() {
            return draw_empty(frame, area, block);
        }
        let bars: Vec<Bar> = shares
            .iter()
            .enumerate()
            .map(|(i, s)| {
                Bar::default()
                    .value((s.share * 1000.0).round() as u64)
                    .label(Line::from(s.region.clone()))
                    .text_value(format!("{} {}", percent(s.share), format_k(s.sales)))
                    .style(Style::default().fg(palette(i)))
            })
            .collect();
        let chart = BarChart::default()
            .block(block)
            .direction(Direction::Horizontal)
            .bar_width(1)
            .bar_gap(1)
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(chart, area);
    }

    fn draw_monthly(&self, frame: &mut Frame, area: Rect) {
        let block = chart_block(Line::from("Year-month Sales"));
        let rows = &self.tables.monthly_sales;
        if rows.is_empty() {
            return draw_empty(frame, area, block);
        }
        let points: Vec<(f64, f64)> = rows
            .iter()
            .enumerate()
            .map(|(i, m)| (i as f64, m.total_sales))
            .collect();
        let max = rows.iter().map(|m| m.total_sales).fold(0.0, f64::max);
        let min = rows.iter().map(|m| m.total_sales).fold(0.0, f64::min);
        let top = axis_ceiling(max);
        let x_max = rows.len().saturating_sub(1).max(1) as f64;

        let mut x_labels = vec![Span::raw(rows[0].label.clone())];
        if rows.len() > 2 {
            x_labels.push(Span::raw(rows[rows.len() / 2].label.clone()));
        }
        if rows.len() > 1 {
            x_labels.push(Span::raw(rows[rows.len() - 1].label.clone()));
        }

        let series = Series::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(palette(0)))
            .data(&points);
        let chart = Chart::new(vec![series])
            .block(block)
            .x_axis(
                Axis::default()
                    .style(FOOTER_STYLE)
                    .bounds([0.0, x_max])
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .style(FOOTER_STYLE)
                    .bounds([min, top])
                    .labels(vec![
                        Span::raw(format_k(min)),
                        Span::raw(format_k(top / 2.0)),
                        Span::raw(format_k(top)),
                    ]),
            );
        frame.render_widget(chart, area);
    }

    fn draw_segments(&self, frame: &mut Frame, area: Rect) {
        let mut title = vec![Span::styled("Financial situation by segment  ", TITLE_STYLE)];
        for (i, metric) in Metric::ALL.iter().enumerate() {
            title.push(Span::styled(
                format!("■ {} ", metric.name()),
                Style::default().fg(palette(i)),
            ));
        }
        let block = chart_block(Line::from(title));
        let rows = &self.tables.segment_financials;
        if rows.is_empty() {
            return draw_empty(frame, area, block);
        }

        let segments: Vec<&str> = rows
            .iter()
            .filter(|r| r.metric == Metric::Sales)
            .map(|r| r.segment.as_str())
            .collect();
        let width = block.inner(area).width;
        let bar_width = fit_bar_width(width, segments.len() * Metric::ALL.len(), 1);

        let mut chart = BarChart::default()
            .block(block)
            .bar_width(bar_width)
            .bar_gap(0)
            .group_gap(2);
        for segment in segments {
            let bars: Vec<Bar> = Metric::ALL
                .iter()
                .enumerate()
                .map(|(i, metric)| {
                    let amount = rows
                        .iter()
                        .find(|r| r.segment == segment && r.metric == *metric)
                        .map(|r| r.amount)
                        .unwrap_or(0.0);
                    Bar::default()
                        .value(bar_value(amount))
                        .text_value(format_k(amount))
                        .style(Style::default().fg(palette(i)))
                })
                .collect();
            chart = chart.data(
                BarGroup::default()
                    .label(Line::from(segment.to_string()))
                    .bars(&bars),
            );
        }
        frame.render_widget(chart, area);
    }

    fn draw_ticket(&self, frame: &mut Frame, area: Rect) {
        let rows = &self.tables.region_segment_ticket;
        let segments: BTreeSet<&str> = rows.iter().map(|r| r.segment.as_str()).collect();
        let regions: BTreeSet<&str> = rows.iter().map(|r| r.region.as_str()).collect();

        let mut title = vec![Span::styled("Average sales  ", TITLE_STYLE)];
        for (i, segment) in segments.iter().enumerate() {
            title.push(Span::styled(format!("■ {segment} "), Style::default().fg(palette(i))));
        }
        let block = chart_block(Line::from(title));
        if rows.is_empty() {
            return draw_empty(frame, area, block);
        }

        let width = block.inner(area).width;
        let bar_width = fit_bar_width(width, regions.len() * segments.len(), 1);
        let mut chart = BarChart::default()
            .block(block)
            .bar_width(bar_width)
            .bar_gap(0)
            .group_gap(2);
        for region in &regions {
            let bars: Vec<Bar> = segments
                .iter()
                .enumerate()
                .map(|(i, segment)| {
                    let ticket = rows
                        .iter()
                        .find(|r| r.region == *region && r.segment == *segment)
                        .map(|r| r.average_ticket);
                    Bar::default()
                        .value(ticket.map(bar_value).unwrap_or(0))
                        .text_value(ticket.map(format_k).unwrap_or_default())
                        .style(Style::default().fg(palette(i)))
                })
                .collect();
            chart = chart.data(
                BarGroup::default()
                    .label(Line::from(region.to_string()))
                    .bars(&bars),
            );
        }
        frame.render_widget(chart, area);
    }

    fn draw_frequency(&self, frame: &mut Frame, area: Rect) {
        let block = chart_block(Line::from("Frequency of customer purchases"));
        let bins = frequency_histogram(&self.tables.purchase_frequency);
        if bins.is_empty() {
            return draw_empty(frame, area, block);
        }
        let width = block.inner(area).width;
        let bars: Vec<Bar> = bins
            .iter()
            .map(|b| {
                Bar::default()
                    .value(b.customers as u64)
                    .label(Line::from(b.purchase_frequency.to_string()))
                    .style(Style::default().fg(palette(0)))
            })
            .collect();
        let chart = BarChart::default()
            .block(block)
            .bar_width(fit_bar_width(width, bars.len(), 1))
            .bar_gap(1)
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(chart, area);
    }

    fn draw_top_clients(&self, frame: &mut Frame, area: Rect) {
        let block = chart_block(Line::from("Top clients"));
        let top = &self.tables.top_customers;
        if top.is_empty() {
            return draw_empty(frame, area, block);
        }
        let bars: Vec<Bar> = top
            .iter()
            .enumerate()
            .map(|(i, c)| {
                Bar::default()
                    .value(bar_value(c.average_ticket))
                    .label(Line::from(truncate(&c.customer_name, NAME_WIDTH)))
                    .text_value(money(c.average_ticket))
                    .style(Style::default().fg(palette(i)))
            })
            .collect();
        let chart = BarChart::default()
            .block(block)
            .direction(Direction::Horizontal)
            .bar_width(1)
            .bar_gap(0)
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(chart, area);
    }
}

impl Screen for Dashboard<'_> {
    fn draw(&mut self, frame: &mut Frame) {
        self.draw_dashboard(frame);
    }

    fn handle_key(&mut self, code: KeyCode) -> ScreenAction {
        let changed = match code {
            KeyCode::Char('q') | KeyCode::Esc => return ScreenAction::Close,
            KeyCode::Tab => {
                self.focus = self.focus.next();
                false
            }
            KeyCode::BackTab => {
                self.focus = self.focus.prev();
                false
            }
            KeyCode::Char('R') => {
                self.reset();
                true
            }
            _ => match self.focus.picker() {
                Some(picker) => self.handle_picker_key(picker, code),
                None => self.handle_date_key(code),
            },
        };
        if changed {
            self.recompute();
        }
        ScreenAction::Continue
    }
}

// ---------------------------------------------------------------------------
// Chart helpers
// ---------------------------------------------------------------------------

fn chart_block(title: Line<'static>) -> Block<'static> {
    Block::default()
        .title(title)
        .title_style(TITLE_STYLE)
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray))
}

fn draw_empty(frame: &mut Frame, area: Rect, block: Block) {
    frame.render_widget(
        Paragraph::new(" No data for this selection").style(FOOTER_STYLE).block(block),
        area,
    );
}

/// Bars cannot go below zero; negative amounts draw as empty bars and keep
/// their value in the caption.
fn bar_value(amount: f64) -> u64 {
    amount.max(0.0).round() as u64
}

/// Widest bar that fits `bars` bars separated by `gap` columns, capped at 12.
fn fit_bar_width(width: u16, bars: usize, gap: u16) -> u16 {
    if bars == 0 {
        return 1;
    }
    let bars = bars.min(u16::MAX as usize) as u16;
    let available = width.saturating_sub(gap.saturating_mul(bars - 1));
    (available / bars).clamp(1, 12)
}

/// Round axis maximum: 1k, 2.5k, 5k, 10k, 25k, ...
fn axis_ceiling(max_val: f64) -> f64 {
    let steps = [
        1000.0, 2500.0, 5000.0, 10000.0, 25000.0, 50000.0, 100000.0, 250000.0, 500000.0,
        1000000.0, 2500000.0, 5000000.0, 10000000.0,
    ];
    steps
        .iter()
        .copied()
        .find(|&s| s >= max_val)
        .unwrap_or(max_val)
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let cut: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{cut}\u{2026}")
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

pub fn run(source: &SourceArgs, filters: &FilterArgs) -> Result<()> {
    if !std::io::stdout().is_terminal() {
        return Err(SalescopeError::Other(
            "The dashboard needs a terminal. Use `salescope report` for plain output.".into(),
        ));
    }
    let settings = load_settings();
    let dataset = source.open(&settings)?;
    let request = filters.request(dataset)?;
    tracing::info!(records = dataset.len(), "opening dashboard");
    let mut dashboard = Dashboard::new(dataset, request, settings.top_customers);
    run_screen(&mut dashboard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::demo_dataset;
    use ratatui::{backend::TestBackend, Terminal};

    fn dashboard(ds: &Dataset) -> Dashboard<'_> {
        Dashboard::new(ds, FilterRequest::for_dataset(ds), 5)
    }

    fn render(dash: &mut Dashboard) -> String {
        let mut terminal = Terminal::new(TestBackend::new(160, 60)).unwrap();
        terminal.draw(|frame| dash.draw(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn press(dash: &mut Dashboard, keys: &[KeyCode]) {
        for key in keys {
            dash.handle_key(*key);
        }
    }

    #[test]
    fn test_initial_pass_covers_everything() {
        let ds = demo_dataset();
        let dash = dashboard(&ds);
        assert_eq!(dash.matched, ds.len());
        assert_eq!(dash.choices.regions.len(), 4);
        assert_eq!(dash.tables.top_customers.len(), 5);
    }

    #[test]
    fn test_focus_cycles() {
        assert_eq!(Focus::City.next(), Focus::Start);
        assert_eq!(Focus::Start.prev(), Focus::City);
        assert_eq!(Focus::Region.picker(), Some(0));
        assert_eq!(Focus::End.picker(), None);
    }

    #[test]
    fn test_toggle_region_narrows_view_and_states() {
        let ds = demo_dataset();
        let mut dash = dashboard(&ds);
        let all_states = dash.choices.states.len();
        press(&mut dash, &[KeyCode::Tab, KeyCode::Tab, KeyCode::Char(' ')]);

        let region = dash.choices.regions[0].clone();
        assert!(dash.selections[0].contains(&region));
        assert!(dash.matched < ds.len());
        assert!(dash.choices.states.len() < all_states);
        let expected = ds.records().iter().filter(|r| r.region == region).count();
        assert_eq!(dash.matched, expected);

        // Toggling again clears the selection.
        press(&mut dash, &[KeyCode::Char(' ')]);
        assert!(dash.selections[0].is_empty());
        assert_eq!(dash.matched, ds.len());
    }

    #[test]
    fn test_stale_city_is_dropped_when_region_changes() {
        let ds = demo_dataset();
        let mut dash = dashboard(&ds);
        // Select first region, then first city offered under it.
        press(&mut dash, &[KeyCode::Tab, KeyCode::Tab, KeyCode::Char(' ')]);
        press(&mut dash, &[KeyCode::Tab, KeyCode::Tab, KeyCode::Char(' ')]);
        assert_eq!(dash.selections[2].len(), 1);
        let city = dash.selections[2].iter().next().cloned().unwrap();

        // Swap the region selection for the second region.
        press(&mut dash, &[KeyCode::BackTab, KeyCode::BackTab, KeyCode::Char(' ')]);
        press(&mut dash, &[KeyCode::Down, KeyCode::Char(' ')]);
        assert_eq!(dash.selections[0].len(), 1);
        assert!(!dash.choices.cities.contains(&city));
        assert!(dash.selections[2].is_empty());
        assert!(dash.matched > 0);
    }

    #[test]
    fn test_clear_picker() {
        let ds = demo_dataset();
        let mut dash = dashboard(&ds);
        press(
            &mut dash,
            &[
                KeyCode::Tab,
                KeyCode::Tab,
                KeyCode::Char(' '),
                KeyCode::Down,
                KeyCode::Char(' '),
            ],
        );
        assert_eq!(dash.selections[0].len(), 2);
        press(&mut dash, &[KeyCode::Char('c')]);
        assert!(dash.selections[0].is_empty());
        assert_eq!(dash.matched, ds.len());
    }

    #[test]
    fn test_date_keys() {
        let ds = demo_dataset();
        let mut dash = dashboard(&ds);
        let (first, last) = ds.date_span().unwrap();

        press(&mut dash, &[KeyCode::Right]);
        assert_eq!(dash.start, first + Duration::days(1));
        press(&mut dash, &[KeyCode::PageUp]);
        let expected = (first + Duration::days(1)).checked_add_months(Months::new(12));
        assert_eq!(Some(dash.start), expected);
        assert!(dash.matched < ds.len());
        press(&mut dash, &[KeyCode::Char('r')]);
        assert_eq!(dash.start, first);

        press(&mut dash, &[KeyCode::Tab, KeyCode::Down]);
        assert_eq!(dash.end, last.checked_sub_months(Months::new(1)).unwrap());
    }

    #[test]
    fn test_inverted_range_is_empty_not_an_error() {
        let ds = demo_dataset();
        let mut request = FilterRequest::for_dataset(&ds);
        std::mem::swap(&mut request.range.start, &mut request.range.end);
        let mut dash = Dashboard::new(&ds, request, 5);
        assert_eq!(dash.matched, 0);
        assert!(dash.tables.is_empty());
        let screen = render(&mut dash);
        assert!(screen.contains("No data for this selection"));
    }

    #[test]
    fn test_reset_all() {
        let ds = demo_dataset();
        let mut dash = dashboard(&ds);
        press(&mut dash, &[KeyCode::Right, KeyCode::Tab, KeyCode::Tab, KeyCode::Char(' ')]);
        press(&mut dash, &[KeyCode::Char('R')]);
        assert_eq!(dash.matched, ds.len());
        assert!(dash.selections.iter().all(|s| s.is_empty()));
    }

    #[test]
    fn test_quit_keys_close() {
        let ds = demo_dataset();
        let mut dash = dashboard(&ds);
        assert!(matches!(dash.handle_key(KeyCode::Char('q')), ScreenAction::Close));
        assert!(matches!(dash.handle_key(KeyCode::Esc), ScreenAction::Close));
    }

    #[test]
    fn test_render_shows_every_chart() {
        let ds = demo_dataset();
        let mut dash = dashboard(&ds);
        let screen = render(&mut dash);
        for title in [
            "Category wise Sales",
            "Region wise Sales",
            "Year-month Sales",
            "Financial situation by segment",
            "Average sales",
            "Frequency of customer purchases",
            "Top clients",
            "Filters:",
        ] {
            assert!(screen.contains(title), "missing {title}");
        }
    }

    #[test]
    fn test_fit_bar_width() {
        assert_eq!(fit_bar_width(40, 0, 1), 1);
        assert_eq!(fit_bar_width(40, 3, 2), 12);
        assert_eq!(fit_bar_width(20, 4, 1), 4);
        assert_eq!(fit_bar_width(3, 10, 1), 1);
    }

    #[test]
    fn test_axis_ceiling() {
        assert_eq!(axis_ceiling(800.0), 1000.0);
        assert_eq!(axis_ceiling(12_000.0), 25000.0);
        assert_eq!(axis_ceiling(2e8), 2e8);
    }

    #[test]
    fn test_bar_value_clamps_negative() {
        assert_eq!(bar_value(-40.0), 0);
        assert_eq!(bar_value(99.6), 100);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Sean Miller", 18), "Sean Miller");
        assert_eq!(truncate("Tamara Chand-Wilkinson", 10), "Tamara Ch\u{2026}");
    }
}
