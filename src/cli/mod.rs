pub mod choices;
pub mod config;
pub mod dashboard;
pub mod report;
pub mod status;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::dataset::{self, DataSource};
use crate::error::{Result, SalescopeError};
use crate::filters::FilterRequest;
use crate::models::Dataset;
use crate::settings::Settings;

#[derive(Parser)]
#[command(
    name = "salescope",
    version,
    about = "Sales analytics dashboard: filter orders by date and location, chart the aggregates."
)]
pub struct Cli {
    /// CSV or spreadsheet file to analyse (overrides the configured dataset)
    #[arg(long, global = true)]
    pub dataset: Option<String>,
    /// Worksheet to read from a spreadsheet (default: first sheet)
    #[arg(long, global = true)]
    pub sheet: Option<String>,
    /// Use the built-in demo dataset
    #[arg(long, global = true)]
    pub demo: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive dashboard.
    Dashboard {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Print one aggregate table (or all of them).
    Report {
        /// Which table to print
        #[arg(value_enum, default_value = "all")]
        table: TableKind,
        #[command(flatten)]
        filters: FilterArgs,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
        /// Number of top customers (default from settings)
        #[arg(long)]
        top: Option<usize>,
    },
    /// List the regions, states and cities available for a selection.
    Choices {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Show the dataset source, size and date span.
    Status,
    /// View or change settings.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Print shell completions.
    Completions {
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print current settings.
    Show,
    /// Remember a dataset file for future runs.
    SetDataset {
        /// Path to a CSV or spreadsheet file
        path: String,
    },
    /// Remember which worksheet to read.
    SetSheet {
        name: String,
    },
    /// Set how many customers the top-customers table shows.
    SetTop {
        count: usize,
    },
}

#[derive(Args, Clone, Debug, Default)]
pub struct FilterArgs {
    /// Start date: YYYY-MM-DD (default: earliest order)
    #[arg(long = "from")]
    pub from_date: Option<String>,
    /// End date: YYYY-MM-DD (default: latest order)
    #[arg(long = "to")]
    pub to_date: Option<String>,
    /// Region to include (repeatable)
    #[arg(long = "region")]
    pub regions: Vec<String>,
    /// State to include (repeatable)
    #[arg(long = "state")]
    pub states: Vec<String>,
    /// City to include (repeatable)
    #[arg(long = "city")]
    pub cities: Vec<String>,
}

fn parse_date_arg(flag: &str, raw: Option<&str>) -> Result<Option<NaiveDate>> {
    raw.map(|s| {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            SalescopeError::Other(format!("{flag} expects a date as YYYY-MM-DD, got {s:?}"))
        })
    })
    .transpose()
}

impl FilterArgs {
    /// Build the request for one pass, defaulting the range to the dataset's
    /// date span.
    pub fn request(&self, dataset: &Dataset) -> Result<FilterRequest> {
        let start = parse_date_arg("--from", self.from_date.as_deref())?;
        let end = parse_date_arg("--to", self.to_date.as_deref())?;
        Ok(FilterRequest::for_dataset(dataset)
            .with_start(start)
            .with_end(end)
            .with_locations(
                self.regions.iter().cloned(),
                self.states.iter().cloned(),
                self.cities.iter().cloned(),
            ))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TableKind {
    Category,
    Region,
    Monthly,
    Segment,
    Ticket,
    Frequency,
    Top,
    All,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Global dataset flags from the command line.
pub struct SourceArgs {
    pub dataset: Option<String>,
    pub sheet: Option<String>,
    pub demo: bool,
}

impl SourceArgs {
    pub fn open(&self, settings: &Settings) -> Result<&'static Dataset> {
        let source = DataSource::resolve(
            self.demo,
            self.dataset.as_deref(),
            self.sheet.as_deref(),
            settings,
        )?;
        dataset::shared(&source, settings)
    }
}

pub fn completions(shell: clap_complete::Shell) -> Result<()> {
    use clap::CommandFactory;
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "salescope", &mut std::io::stdout());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record;

    fn ds() -> Dataset {
        Dataset::new(
            "test",
            vec![
                record("2016-01-05", "East", "New York", "Buffalo", "1", "C1", 10.0, 1.0),
                record("2017-03-01", "West", "Oregon", "Portland", "2", "C2", 20.0, 2.0),
            ],
        )
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_filter_args_defaults_to_span() {
        let req = FilterArgs::default().request(&ds()).unwrap();
        assert_eq!(req.range.start, NaiveDate::from_ymd_opt(2016, 1, 5).unwrap());
        assert_eq!(req.range.end, NaiveDate::from_ymd_opt(2017, 3, 1).unwrap());
        assert!(req.regions.is_empty());
    }

    #[test]
    fn test_filter_args_overrides() {
        let args = FilterArgs {
            from_date: Some("2016-06-01".into()),
            to_date: None,
            regions: vec!["West".into()],
            states: vec![],
            cities: vec!["Portland".into(), "Portland".into()],
        };
        let req = args.request(&ds()).unwrap();
        assert_eq!(req.range.start, NaiveDate::from_ymd_opt(2016, 6, 1).unwrap());
        assert_eq!(req.cities.len(), 1);
        assert_eq!(req.apply(&ds()).len(), 1);
    }

    #[test]
    fn test_filter_args_rejects_bad_date() {
        let args = FilterArgs {
            to_date: Some("03/01/2017".into()),
            ..FilterArgs::default()
        };
        let err = args.request(&ds()).unwrap_err();
        assert!(err.to_string().contains("--to"));
    }

    #[test]
    fn test_parse_report_command() {
        let cli = Cli::try_parse_from([
            "salescope", "--demo", "report", "ticket", "--region", "East", "--region", "West",
            "--format", "json",
        ])
        .unwrap();
        assert!(cli.demo);
        match cli.command {
            Some(Commands::Report { table, filters, format, top }) => {
                assert_eq!(table, TableKind::Ticket);
                assert_eq!(filters.regions, vec!["East", "West"]);
                assert_eq!(format, OutputFormat::Json);
                assert!(top.is_none());
            }
            _ => panic!("expected report command"),
        }
    }
}
