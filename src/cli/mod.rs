//! CLI definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::storage::Table;

pub mod commands;

/// Agentic CRM storage admin
#[derive(Parser, Debug)]
#[command(name = "crm", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory (default: ~/.agentic-crm)
    #[arg(long, global = true, env = "CRM_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database and run the default migrations
    Init {
        /// Replace an existing database
        #[arg(long)]
        force: bool,
    },

    /// Show size, schema version and row counts
    Stats,

    /// Print the plain-text debug report
    Report,

    /// Print stored table and index DDL
    Schema,

    /// Print the first rows of a table
    Sample {
        /// Table to read
        #[arg(value_enum)]
        table: TableArg,

        /// Maximum rows to print
        #[arg(short, long, default_value = "5")]
        limit: u32,
    },

    /// Report foreign key violations
    Check,

    /// Rebuild the database file to reclaim space
    Vacuum,

    /// Migration ledger management
    Migrate {
        #[command(subcommand)]
        command: MigrateCommands,
    },

    /// Write the native SQLite image to a file
    Export {
        /// Output file (default: ./agentic-crm-db.sqlite)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace the database with a SQLite image
    Import {
        /// SQLite file to load
        file: PathBuf,
    },

    /// Delete all data and start from an empty schema
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum MigrateCommands {
    /// List declared migrations and whether they are applied
    Status,

    /// Apply pending migrations
    Run,

    /// Undo one applied migration
    Rollback {
        /// Migration version
        version: i64,
    },
}

/// Tables accepted by `crm sample`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableArg {
    Contacts,
    Companies,
    Deals,
    Tasks,
    Notes,
    Categories,
    ConnectionStrengths,
    EmployeeRanges,
    EstimatedArrs,
}

impl From<TableArg> for Table {
    fn from(arg: TableArg) -> Self {
        match arg {
            TableArg::Contacts => Self::Contacts,
            TableArg::Companies => Self::Companies,
            TableArg::Deals => Self::Deals,
            TableArg::Tasks => Self::Tasks,
            TableArg::Notes => Self::Notes,
            TableArg::Categories => Self::Categories,
            TableArg::ConnectionStrengths => Self::ConnectionStrengths,
            TableArg::EmployeeRanges => Self::EmployeeRanges,
            TableArg::EstimatedArrs => Self::EstimatedArrs,
        }
    }
}
