pub mod commands;

use clap::{Parser, Subcommand};
use crate::error::Result;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "page-prune")]
#[command(about = "Hide page elements per site with persisted CSS selector paths")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
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
    /// Initialize page-prune configuration
    Init,

    /// Show the saved selectors for a page's origin and apply them to it
    Show {
        /// Page URL (stands in for the active tab)
        url: String,

        /// Write the pruned markup to a file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Save a selector list for a page's origin and apply it immediately
    Set {
        /// Page URL (stands in for the active tab)
        url: String,

        /// Comma-separated CSS selector paths, e.g. "div.ad, #banner"
        selectors: String,

        /// Write the pruned markup to a file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete the saved selectors for a page's origin
    Clear {
        /// Page URL (stands in for the active tab)
        url: String,
    },

    /// Apply the saved selectors for a page's origin, as on a fresh visit
    Apply {
        /// Page URL; also determines the origin looked up in storage
        url: String,

        /// Read markup from a local file instead of fetching the URL
        #[arg(long)]
        file: Option<PathBuf>,

        /// Write the pruned markup to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List all origins with saved selectors
    List,

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        // Initialize logging
        commands::init_logging(self.debug, self.verbose)?;

        match self.command {
            Commands::Init => {
                commands::init(self.config).await
            }
            Commands::Show { url, output } => {
                commands::show(url, output, self.config).await
            }
            Commands::Set { url, selectors, output } => {
                commands::set(url, selectors, output, self.config).await
            }
            Commands::Clear { url } => {
                commands::clear(url, self.config).await
            }
            Commands::Apply { url, file, output } => {
                commands::apply(url, file, output, self.config).await
            }
            Commands::List => {
                commands::list(self.config).await
            }
            Commands::Completions { shell } => {
                commands::generate_completions(shell);
                Ok(())
            }
        }
    }
}
