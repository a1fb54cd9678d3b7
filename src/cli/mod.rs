pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "vaultcrawl")]
#[command(about = "Crawls a retro-game vault site into a local database", long_about = None)]
pub struct Cli {
    /// Path to the SQLite database (overrides the config file)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Crawl the whole vault: consoles, handhelds, and every game page
    Crawl,
    /// Fetch one game detail page, persist it, and print the record
    Game {
        /// URL of the game detail page
        url: String,
    },
    /// List persisted consoles or games
    List {
        /// Show games instead of consoles
        #[arg(long)]
        games: bool,
    },
    /// Download every downloadable game stored for one console
    Download {
        /// Console name, as stored by the crawl
        console: String,

        /// Drive a headless browser instead of direct HTTP
        #[arg(long)]
        browser: bool,

        /// Override the configured download directory
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}
