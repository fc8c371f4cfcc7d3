//! Command-line interface for taxi.
//!
//! This module provides the CLI structure for the `taxi` binary. Every fleet
//! operation is a subcommand; `--user` and `--password` supply the principal.

mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    car_update, driver_update, license_update, list_query, manufacturer_update, CarCommand,
    ConfigCommand, DriverCommand, ManufacturerCommand, NewDriverArgs, OutputFormat, PageArgs,
};
pub use output::PlainText;

use crate::logging::Verbosity;

/// taxi - Manage a taxi fleet's manufacturers, drivers and cars
///
/// Records live in a local `SQLite` database. Every command except
/// `driver register` and `config` requires signing in as a driver.
#[derive(Parser)]
#[command(name = "taxi")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Username to sign in as
    #[arg(short, long, global = true, env = "TAXI_USER")]
    pub user: Option<String>,

    /// Password for --user
    #[arg(long, global = true, env = "TAXI_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "plain")]
    pub format: OutputFormat,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

impl std::fmt::Debug for Cli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cli")
            .field("config", &self.config)
            .field("verbose", &self.verbose)
            .field("quiet", &self.quiet)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<hidden>"))
            .field("format", &self.format)
            .field("command", &self.command)
            .finish()
    }
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show how many drivers, cars and manufacturers exist
    Home,

    /// Manage manufacturers
    #[command(subcommand)]
    Manufacturer(ManufacturerCommand),

    /// Manage drivers
    #[command(subcommand)]
    Driver(DriverCommand),

    /// Manage cars
    #[command(subcommand)]
    Car(CarCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }

    /// The username and password to sign in with, if a username was given.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, Option<&str>)> {
        self.user
            .as_deref()
            .map(|user| (user, self.password.as_deref()))
    }
}
