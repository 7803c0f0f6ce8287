//! Expense tracker command-line entry point.
//!
//! # Responsibility
//! - Select a storage backend from a config file and flags.
//! - Run one service operation and print its result.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use expense_core::{
    default_log_level, init_logging, open_repository, BackendKind, BoxedExpenseRepository,
    Expense, ExpenseId, ExpenseService, StoreConfig,
};
use log::info;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "expense_cli", version, about = "Track expenses on a pluggable storage backend")]
struct Cli {
    /// JSON store config, e.g. `{ "backend": "csv", "path": "expenses.csv" }`.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Storage backend: text, csv, json, sqlite or document.
    #[arg(long, value_name = "KIND")]
    backend: Option<BackendKind>,

    /// Data file for the selected backend.
    #[arg(long, value_name = "PATH")]
    path: Option<PathBuf>,

    /// Skip seeding demo expenses into an empty store.
    #[arg(long)]
    no_seed: bool,

    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Enables file logging into this directory.
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print every expense (default).
    List,
    /// Print the total of all expense values.
    Sum,
    /// Print one expense.
    Get { id: ExpenseId },
    /// Record a new expense dated today.
    Add {
        id: ExpenseId,
        value: f64,
        merchant: String,
    },
    /// Replace the value and merchant of an existing expense.
    Update {
        id: ExpenseId,
        value: f64,
        merchant: String,
    },
    /// Remove an expense.
    Delete { id: ExpenseId },
    /// Print expenses for one merchant.
    Search { merchant: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).map_err(anyhow::Error::msg)?;
    }

    let config = store_config(&cli)?;
    let repo = open_repository(&config)
        .with_context(|| format!("failed to open {} store", config.backend))?;
    info!("event=app_start module=cli status=ok backend={}", config.backend);

    let service = if cli.no_seed {
        ExpenseService::without_seed(repo)
    } else {
        ExpenseService::new(repo).context("failed to seed expense store")?
    };

    run(&service, cli.command.unwrap_or(Command::List))
}

fn store_config(cli: &Cli) -> Result<StoreConfig> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("failed to load config `{}`", path.display()))?,
        None => StoreConfig::default(),
    };
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(path) = &cli.path {
        config.path = Some(path.clone());
    }
    Ok(config)
}

fn run(service: &ExpenseService<BoxedExpenseRepository>, command: Command) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        Command::List => {
            let count = service.print_expenses(&mut out)?;
            writeln!(out, "{count} expense(s)")?;
        }
        Command::Sum => {
            writeln!(out, "{:.2}", service.sum_expenses()?)?;
        }
        Command::Get { id } => match service.get_expense(id)? {
            Some(expense) => writeln!(out, "{expense}")?,
            None => writeln!(out, "expense {id} not found")?,
        },
        Command::Add {
            id,
            value,
            merchant,
        } => match service.create_new_expense(id, value, merchant)? {
            Some(expense) => writeln!(out, "created {expense}")?,
            None => writeln!(out, "expense {id} already exists")?,
        },
        Command::Update {
            id,
            value,
            merchant,
        } => {
            let Some(existing) = service.get_expense(id)? else {
                writeln!(out, "expense {id} not found")?;
                return Ok(());
            };
            let expense = Expense::new(id, existing.date, value, merchant);
            if service.update_expense(&expense)? {
                writeln!(out, "updated {expense}")?;
            } else {
                writeln!(out, "expense {id} not found")?;
            }
        }
        Command::Delete { id } => {
            if service.delete_expense(id)? {
                writeln!(out, "deleted expense {id}")?;
            } else {
                writeln!(out, "expense {id} not found")?;
            }
        }
        Command::Search { merchant } => {
            for expense in service.search_by_merchant(&merchant)? {
                writeln!(out, "{expense}")?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{store_config, Cli, Command};
    use clap::Parser;
    use expense_core::BackendKind;
    use std::path::PathBuf;

    #[test]
    fn flags_override_default_config() {
        let cli = Cli::parse_from(["expense_cli", "--backend", "csv", "--path", "x.csv", "sum"]);
        let config = store_config(&cli).unwrap();
        assert_eq!(config.backend, BackendKind::Csv);
        assert_eq!(config.path, Some(PathBuf::from("x.csv")));
        assert!(matches!(cli.command, Some(Command::Sum)));
    }

    #[test]
    fn add_parses_positional_arguments() {
        let cli = Cli::parse_from(["expense_cli", "add", "5", "12.5", "HEB"]);
        match cli.command {
            Some(Command::Add {
                id,
                value,
                merchant,
            }) => {
                assert_eq!(id, 5);
                assert_eq!(value, 12.5);
                assert_eq!(merchant, "HEB");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn unknown_backend_is_rejected() {
        assert!(Cli::try_parse_from(["expense_cli", "--backend", "yaml"]).is_err());
    }
}
