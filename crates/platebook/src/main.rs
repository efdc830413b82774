//! `platebook` - CLI and server for the plate record book.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::debug;

use platebook::cli::{render, Cli, Command, ConfigCommand, OutputFormat};
use platebook::client::{ClientError, HttpClient, LocalClient, RecordApi, RecordTable};
use platebook::storage::{Connector, Storage};
use platebook::{init_logging, Config, RecordService};

/// A record command, independent of where it is sent.
#[derive(Debug)]
enum Action {
    List {
        search: Option<String>,
        format: OutputFormat,
    },
    Add {
        plate: String,
        details: String,
    },
    Edit {
        plate: String,
        details: String,
    },
    Remove {
        plate: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    // Config commands inspect files that may not load, so they run first.
    let config_file = cli.config_file();
    let (action, local) = match cli.command {
        Command::Config(cmd) => return handle_config(cli.config, config_file, cmd),
        Command::Serve(cmd) => {
            let mut config = load_config(cli.config)?;
            if let Some(bind) = cmd.bind {
                config.server.bind = bind;
                config.validate()?;
            }
            platebook::http::serve(&config).await?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Status(cmd) => {
            handle_status(&load_config(cli.config)?, cmd.json).await?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::List(cmd) => (
            Action::List {
                search: cmd.search,
                format: cmd.format,
            },
            cmd.target.local,
        ),
        Command::Add(cmd) => (
            Action::Add {
                plate: cmd.plate,
                details: cmd.details,
            },
            cmd.target.local,
        ),
        Command::Edit(cmd) => (
            Action::Edit {
                plate: cmd.plate,
                details: cmd.details,
            },
            cmd.target.local,
        ),
        Command::Remove(cmd) => (Action::Remove { plate: cmd.plate }, cmd.target.local),
    };

    let config = load_config(cli.config)?;
    if local {
        let connector = Connector::open(&config).await?;
        let service = RecordService::new(connector.clone(), config.records.plate_policy);
        let outcome = run_action(RecordTable::new(LocalClient::new(service)), action).await;
        connector.shutdown().await?;
        outcome
    } else {
        let api = HttpClient::from_config(&config)?;
        debug!("Using record API at {}", api.base_url());
        run_action(RecordTable::new(api), action).await
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    Config::load_from(path).context("loading configuration")
}

/// Load the table, run one action through it and print the outcome.
async fn run_action<A: RecordApi>(
    mut table: RecordTable<A>,
    action: Action,
) -> anyhow::Result<ExitCode> {
    if table.load().await.is_err() {
        return Ok(report(&table));
    }

    let sent = match action {
        Action::List { search, format } => {
            if let Some(search) = search {
                table.set_search(&search);
            }
            print!("{}", render::records(&table.filtered(), format)?);
            if format != OutputFormat::Json && table.shows_register_prompt() {
                println!(
                    "{} is not registered. Use `platebook add {} <DETAILS>` to register it.",
                    table.search().trim(),
                    table.search().trim()
                );
            }
            return Ok(ExitCode::SUCCESS);
        }
        Action::Add { plate, details } => {
            table.set_search(&plate);
            table.set_draft(details);
            table.add().await
        }
        Action::Edit { plate, details } => {
            table.open_edit(&plate);
            table.set_edit_details(details);
            table.save_edit().await
        }
        Action::Remove { plate } => table.remove(&plate).await,
    };

    if let Err(ClientError::Refused(reason)) = sent {
        eprintln!("error: {reason}");
        return Ok(ExitCode::FAILURE);
    }
    Ok(report(&table))
}

/// Print the table's banner and map it to an exit code.
fn report<A: RecordApi>(table: &RecordTable<A>) -> ExitCode {
    match table.feedback() {
        Some(feedback) if feedback.is_error() => {
            eprintln!("{}", render::feedback(feedback));
            ExitCode::FAILURE
        }
        Some(feedback) => {
            println!("{}", render::feedback(feedback));
            ExitCode::SUCCESS
        }
        None => ExitCode::SUCCESS,
    }
}

async fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let connector = Connector::open(config).await?;
    let stats = connector.run(Storage::stats).await;
    connector.shutdown().await?;
    let stats = stats?;

    let database = config.database_path();
    if json {
        let status = serde_json::json!({
            "database_path": database,
            "plate_policy": config.records.plate_policy,
            "total_records": stats.total_records,
            "oldest_record": stats.oldest_record,
            "last_update": stats.last_update,
            "db_size_bytes": stats.db_size_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print!("{}", render::stats(&stats, &database.display().to_string()));
        println!("Plate policy:  {}", config.records.plate_policy);
    }
    Ok(())
}

fn handle_config(
    path: Option<PathBuf>,
    file: PathBuf,
    cmd: ConfigCommand,
) -> anyhow::Result<ExitCode> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = load_config(path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Bind:               {}", config.server.bind);
                println!(
                    "  Shutdown timeout:   {}s",
                    config.server.shutdown_timeout_secs
                );
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Busy timeout:       {}ms", config.storage.busy_timeout_ms);
                println!();
                println!("[Records]");
                println!("  Plate policy:       {}", config.records.plate_policy);
                println!();
                println!("[Client]");
                println!("  Base URL:           {}", config.base_url());
                println!("  Timeout:            {}s", config.client.timeout_secs);
            }
        }
        ConfigCommand::Path => {
            println!("{}", file.display());
        }
        ConfigCommand::Validate { .. } => {
            println!("Validating configuration: {}", file.display());
            match Config::load_from(Some(file)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => {
                    eprintln!("Configuration error: {e}");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
