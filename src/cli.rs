//! Command-line interface definitions using clap

use clap::{Parser, Subcommand, ValueEnum};

use crate::services::JobKind;

/// dealtracker - affiliate click tracking and deal sync service
#[derive(Parser)]
#[command(name = "dealtracker")]
#[command(version)]
#[command(about = "Affiliate click tracking and scheduled deal sync service", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(long, short = 'c', global = true, default_value = "config.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Run one sync job and print its summary as JSON
    Run {
        #[arg(value_enum)]
        job: JobArg,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum JobArg {
    PriceSync,
    CampaignImport,
    Notifications,
    All,
}

impl From<JobArg> for JobKind {
    fn from(arg: JobArg) -> Self {
        match arg {
            JobArg::PriceSync => JobKind::SyncPrices,
            JobArg::CampaignImport => JobKind::Cuelinks,
            JobArg::Notifications => JobKind::Notifications,
            JobArg::All => JobKind::Full,
        }
    }
}

/// Configuration management commands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
