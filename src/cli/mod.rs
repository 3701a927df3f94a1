pub mod commands;

use clap::{Parser, Subcommand};
use crate::config::Config;
use crate::error::Result;
use crate::storage::RefreshOutcome;
use std::path::PathBuf;

/// Exit status telling a scheduler to retry later (EX_TEMPFAIL).
pub const EXIT_RETRY: i32 = 75;

#[derive(Parser)]
#[command(name = "help-articles")]
#[command(about = "Offline-first help article viewer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "HELP_ARTICLES_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// List articles, newest first
    List {
        /// Skip the cache and fetch from the server
        #[arg(short, long)]
        refresh: bool,
    },

    /// Show one article
    Show {
        /// Article id
        id: String,

        /// Skip the cache and fetch from the server
        #[arg(short, long)]
        refresh: bool,
    },

    /// Refresh the article list now (for schedulers; exits 75 on retryable failure)
    Refresh,

    /// Show cache status
    Status,

    /// Remove all cached articles
    Clear,
}

impl Cli {
    /// Run the command and return the process exit status.
    pub async fn run(self) -> Result<i32> {
        let config_file = match self.config {
            Some(path) => path,
            None => Config::default_config_file()?,
        };

        if let Commands::Init { force } = self.command {
            commands::init_logging(self.debug, self.verbose, &Config::default().logging)?;
            commands::init(&config_file, force)?;
            return Ok(0);
        }

        let config = Config::load_or_default(&config_file)?;
        let _log_guard = commands::init_logging(self.debug, self.verbose, &config.logging)?;

        match self.command {
            Commands::Init { .. } => Ok(0),
            Commands::List { refresh } => {
                commands::list(&config, refresh).await?;
                Ok(0)
            }
            Commands::Show { id, refresh } => {
                commands::show(&config, &id, refresh).await?;
                Ok(0)
            }
            Commands::Refresh => match commands::refresh(&config).await? {
                RefreshOutcome::Success => Ok(0),
                RefreshOutcome::Retry => Ok(EXIT_RETRY),
            },
            Commands::Status => {
                commands::status(&config, &config_file).await?;
                Ok(0)
            }
            Commands::Clear => {
                commands::clear(&config).await?;
                Ok(0)
            }
        }
    }
}
