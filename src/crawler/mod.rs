use std::sync::Arc;

use scraper::Html;

use crate::app::Result;
use crate::domain::{ConsoleEntry, GameRecord};
use crate::extract::{extract_game, extract_game_links, extract_index};
use crate::fetcher::Fetcher;
use crate::store::{Store, Upsert};

/// Counters reported at the end of a crawl.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrawlSummary {
    pub consoles: usize,
    pub pages: usize,
    pub games: usize,
    pub errors: usize,
}

/// Drives the full crawl: index page, per-system listing pages (root plus the
/// A-Z sub-pages), and every discovered game detail page. Fetches are strictly
/// sequential. A dead page is logged and skipped; its siblings keep going.
pub struct Crawler<S> {
    store: Arc<S>,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    origin: String,
}

impl<S: Store> Crawler<S> {
    pub fn new(store: Arc<S>, fetcher: Arc<dyn Fetcher + Send + Sync>, origin: String) -> Self {
        Self {
            store,
            fetcher,
            origin,
        }
    }

    /// Crawl everything reachable from the vault index.
    ///
    /// Only an unreachable or malformed index page aborts the run; the index
    /// is the one page nothing can proceed without.
    pub async fn run(&self) -> Result<CrawlSummary> {
        let mut summary = CrawlSummary::default();

        let index_url = format!("{}/vault", self.origin);
        tracing::info!("Fetching vault index: {}", index_url);
        let body = self.fetcher.fetch(&index_url).await?;

        let (consoles, handhelds) = {
            let doc = parse_document(&body);
            extract_index(&doc, &self.origin)?
        };

        for entry in consoles.iter().chain(handhelds.iter()) {
            self.store.upsert_console(entry)?;
            summary.consoles += 1;
        }
        tracing::info!(
            "Indexed {} consoles and {} handhelds",
            consoles.len(),
            handhelds.len()
        );

        for entry in consoles.iter().chain(handhelds.iter()) {
            self.crawl_system(entry, &mut summary).await;
        }

        tracing::info!(
            "Crawl finished: {} pages, {} games, {} errors",
            summary.pages,
            summary.games,
            summary.errors
        );
        Ok(summary)
    }

    /// Sweep one system: its root listing page, then the 26 per-letter pages.
    /// The source site exposes both and they are not known to be redundant.
    async fn crawl_system(&self, entry: &ConsoleEntry, summary: &mut CrawlSummary) {
        tracing::info!("Processing games for {}: {}", entry.name, entry.url);

        self.visit_listing(&entry.url, summary).await;
        for letter in 'A'..='Z' {
            let url = format!("{}/{}", entry.url, letter);
            self.visit_listing(&url, summary).await;
        }
    }

    async fn visit_listing(&self, url: &str, summary: &mut CrawlSummary) {
        match self.process_listing(url, summary).await {
            Ok(count) => {
                if count > 0 {
                    tracing::info!("{}: {} games", url, count);
                }
            }
            Err(e) => {
                tracing::warn!("Skipping listing page {}: {}", url, e);
                summary.errors += 1;
            }
        }
    }

    /// Fetch one listing page and process every game it links to.
    async fn process_listing(&self, url: &str, summary: &mut CrawlSummary) -> Result<usize> {
        let body = self.fetcher.fetch(url).await?;
        let links = {
            let doc = parse_document(&body);
            extract_game_links(&doc, &self.origin)
        };
        summary.pages += 1;

        let mut processed = 0;
        for link in links {
            match self.process_game(&link.url).await {
                Ok((record, outcome)) => {
                    summary.games += 1;
                    processed += 1;
                    match outcome {
                        Upsert::Inserted => {
                            tracing::info!("Saved game: {}", record.display_name())
                        }
                        Upsert::Updated => {
                            tracing::info!("Updated game: {}", record.display_name())
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Skipping game page {}: {}", link.url, e);
                    summary.errors += 1;
                }
            }
        }

        Ok(processed)
    }

    /// Fetch a single detail page, extract its record, and persist it.
    pub async fn process_game(&self, url: &str) -> Result<(GameRecord, Upsert)> {
        let body = self.fetcher.fetch(url).await?;
        let record = {
            let doc = parse_document(&body);
            extract_game(&doc)
        };
        let outcome = self.store.upsert_game(&record)?;
        Ok((record, outcome))
    }
}

fn parse_document(body: &[u8]) -> Html {
    Html::parse_document(&String::from_utf8_lossy(body))
}
