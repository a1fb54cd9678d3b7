//! # vaultcrawl
//!
//! A scraper for a retro-game archive site: it walks the vault index, every
//! console's alphabetical game listings, and each game's detail page, turning
//! semi-structured HTML into typed records in SQLite. Eligible games can then
//! be downloaded from the site's media host.
//!
//! ## Architecture
//!
//! ```text
//! Fetcher → Extractors → Store
//!                          ↓
//!                    DownloadChecker → DownloadStrategy
//! ```
//!
//! - [`fetcher`]: HTTP client with bounded retry
//! - [`extract`]: listing, detail, and field-table extraction
//! - [`store`]: SQLite persistence with upsert-by-natural-key
//! - [`crawler`]: sequential crawl over the whole site
//! - [`downloader`]: per-console download sweep
//!
//! ## Quick Start
//!
//! ```bash
//! # Crawl the whole vault
//! vaultcrawl crawl
//!
//! # Inspect one game page
//! vaultcrawl game https://vimm.net/vault/15704
//!
//! # List what was found
//! vaultcrawl list --games
//!
//! # Fetch everything downloadable for one console
//! vaultcrawl download "Atari 2600"
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the store and
/// fetcher collaborators.
pub mod app;

/// Configuration management.
///
/// Loads from `~/.config/vaultcrawl/config.toml`: database and download
/// locations, site origins, fetch and downloader tuning.
pub mod config;

/// Command-line interface using clap.
///
/// - `crawl` - Walk the whole vault and persist everything
/// - `game <url>` - Extract and persist a single detail page
/// - `list [--games]` - Show persisted consoles or games
/// - `download <console>` - Download eligible games for a console
pub mod cli;

/// Core domain models.
///
/// - [`ConsoleEntry`](domain::ConsoleEntry): an index-page system entry
/// - [`GameRecord`](domain::GameRecord): everything a detail page yields
pub mod domain;

/// Sequential crawl orchestration: index → listings → detail pages.
pub mod crawler;

/// Download sweep over persisted records.
///
/// - [`DownloadChecker`](downloader::DownloadChecker): decides what to fetch
/// - [`HttpStrategy`](downloader::HttpStrategy): direct streamed GET
/// - [`BrowserStrategy`](downloader::BrowserStrategy): headless-Chrome form
///   submission for when direct HTTP stops working
pub mod downloader;

/// HTML extraction: field tables, detail pages, index and listing pages.
pub mod extract;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): async trait the crawler depends on
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based
///   implementation with bounded retry
pub mod fetcher;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
