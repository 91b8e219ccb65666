mod aggregates;
mod cli;
mod dataset;
mod demo;
mod error;
mod filters;
mod fmt;
mod loader;
mod logging;
mod models;
mod settings;
mod tui;

use std::io::IsTerminal;

use clap::Parser;

use cli::{Cli, Commands, FilterArgs, OutputFormat, SourceArgs, TableKind};

fn main() {
    let cli = Cli::parse();

    let interactive = match &cli.command {
        Some(Commands::Dashboard { .. }) => true,
        None => std::io::stdout().is_terminal(),
        Some(_) => false,
    };
    logging::init(!interactive);

    let source = SourceArgs {
        dataset: cli.dataset,
        sheet: cli.sheet,
        demo: cli.demo,
    };

    let result = match cli.command {
        Some(Commands::Dashboard { filters }) => cli::dashboard::run(&source, &filters),
        Some(Commands::Report {
            table,
            filters,
            format,
            top,
        }) => cli::report::run(&source, table, &filters, format, top),
        Some(Commands::Choices { filters }) => cli::choices::run(&source, &filters),
        Some(Commands::Status) => cli::status::run(&source),
        Some(Commands::Config { command }) => cli::config::run(command),
        Some(Commands::Completions { shell }) => cli::completions(shell),
        None if interactive => cli::dashboard::run(&source, &FilterArgs::default()),
        None => cli::report::run(
            &source,
            TableKind::All,
            &FilterArgs::default(),
            OutputFormat::Text,
            None,
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
