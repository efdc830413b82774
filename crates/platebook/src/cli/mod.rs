//! Command-line interface for platebook.
//!
//! This module provides the CLI structure and output rendering for the
//! `platebook` binary.

mod commands;
pub mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, ConfigCommand, EditCommand, ListCommand, OutputFormat, RemoveCommand,
    ServeCommand, StatusCommand, Target,
};

/// platebook - Register and look up license plates
///
/// Serves the record API and drives it from the command line.
#[derive(Debug, Parser)]
#[command(name = "platebook")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the record API server
    Serve(ServeCommand),

    /// List registered plates
    List(ListCommand),

    /// Register a new plate
    Add(AddCommand),

    /// Replace a plate's details
    Edit(EditCommand),

    /// Remove a plate
    Remove(RemoveCommand),

    /// Show database statistics
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.verbose, self.quiet)
    }

    /// Configuration file this invocation refers to.
    ///
    /// `config validate --file` wins, then `--config`, then the default
    /// location.
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        match &self.command {
            Command::Config(ConfigCommand::Validate { file: Some(file) }) => file.clone(),
            _ => self
                .config
                .clone()
                .unwrap_or_else(crate::Config::default_config_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Verbosity;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "platebook");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(parse(&["platebook", "status"]).verbosity(), Verbosity::Normal);
        assert_eq!(
            parse(&["platebook", "-v", "status"]).verbosity(),
            Verbosity::Verbose
        );
        assert_eq!(
            parse(&["platebook", "-vv", "status"]).verbosity(),
            Verbosity::Trace
        );
        assert_eq!(
            parse(&["platebook", "-q", "status"]).verbosity(),
            Verbosity::Quiet
        );
    }

    #[test]
    fn test_parse_serve_with_bind() {
        let cli = parse(&["platebook", "serve", "--bind", "0.0.0.0:8080"]);
        let Command::Serve(cmd) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(cmd.bind.as_deref(), Some("0.0.0.0:8080"));
    }

    #[test]
    fn test_parse_list_defaults() {
        let cli = parse(&["platebook", "list"]);
        let Command::List(cmd) = cli.command else {
            panic!("expected list");
        };
        assert!(cmd.search.is_none());
        assert_eq!(cmd.format, OutputFormat::Table);
        assert!(!cmd.target.local);
    }

    #[test]
    fn test_parse_list_with_options() {
        let cli = parse(&["platebook", "list", "-s", "abc", "-f", "json", "--local"]);
        let Command::List(cmd) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(cmd.search.as_deref(), Some("abc"));
        assert_eq!(cmd.format, OutputFormat::Json);
        assert!(cmd.target.local);
    }

    #[test]
    fn test_parse_add() {
        let cli = parse(&["platebook", "add", "ABC1234", "Red sedan"]);
        let Command::Add(cmd) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(cmd.plate, "ABC1234");
        assert_eq!(cmd.details, "Red sedan");
    }

    #[test]
    fn test_parse_edit_and_remove() {
        let cli = parse(&["platebook", "edit", "ABC1234", "Blue sedan", "-l"]);
        assert!(matches!(cli.command, Command::Edit(ref c) if c.target.local));

        let cli = parse(&["platebook", "remove", "ABC1234"]);
        assert!(matches!(cli.command, Command::Remove(ref c) if c.plate == "ABC1234"));
    }

    #[test]
    fn test_add_requires_details() {
        assert!(Cli::try_parse_from(["platebook", "add", "ABC1234"]).is_err());
    }

    #[test]
    fn test_parse_config_validate() {
        let cli = parse(&["platebook", "config", "validate", "--file", "/tmp/c.toml"]);
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Validate { file: Some(_) })
        ));
    }

    #[test]
    fn test_parse_with_config() {
        let cli = parse(&["platebook", "-c", "/custom/config.toml", "status"]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_config_file_prefers_validate_file() {
        let cli = parse(&[
            "platebook",
            "-c",
            "/custom/config.toml",
            "config",
            "validate",
            "--file",
            "/tmp/c.toml",
        ]);
        assert_eq!(cli.config_file(), PathBuf::from("/tmp/c.toml"));
    }

    #[test]
    fn test_config_file_falls_back_to_global_flag() {
        let cli = parse(&["platebook", "-c", "/custom/config.toml", "config", "validate"]);
        assert_eq!(cli.config_file(), PathBuf::from("/custom/config.toml"));

        let cli = parse(&["platebook", "config", "path"]);
        assert_eq!(cli.config_file(), crate::Config::default_config_path());
    }
}
