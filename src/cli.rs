//! Command-line interface for the DBML compiler.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use dbml::driver::OutputFormat;

#[derive(Parser)]
#[command(name = "dbmlc")]
#[command(about = "DBML database modeling language compiler", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Report diagnostics for a DBML file
    Check {
        file: PathBuf,
        #[arg(long, value_enum, default_value = "human")]
        format: Format,
        /// Skip checking `Records` rows against keys and relationships
        #[arg(long)]
        no_records: bool,
    },
    /// Print the interpreted model as JSON
    Model { file: PathBuf },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Human,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Human => OutputFormat::Human,
            Format::Json => OutputFormat::Json,
        }
    }
}
