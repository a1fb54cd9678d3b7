use std::path::PathBuf;

use crate::app::{AppContext, Result};
use crate::crawler::Crawler;
use crate::downloader::{BrowserStrategy, DownloadChecker, DownloadStrategy, HttpStrategy};
use crate::store::{Store, Upsert};

pub async fn crawl(ctx: &AppContext) -> Result<()> {
    let crawler = Crawler::new(
        ctx.store.clone(),
        ctx.fetcher.clone(),
        ctx.config.site.origin.clone(),
    );

    let summary = crawler.run().await?;
    println!(
        "Crawl complete: {} systems, {} listing pages, {} games, {} errors",
        summary.consoles, summary.pages, summary.games, summary.errors
    );
    Ok(())
}

pub async fn show_game(ctx: &AppContext, url: &str) -> Result<()> {
    url::Url::parse(url)?;

    let crawler = Crawler::new(
        ctx.store.clone(),
        ctx.fetcher.clone(),
        ctx.config.site.origin.clone(),
    );

    let (record, outcome) = crawler.process_game(url).await?;
    match outcome {
        Upsert::Inserted => println!("Saved: {}", record.display_name()),
        Upsert::Updated => println!("Updated: {}", record.display_name()),
    }
    println!("{:#?}", record);
    Ok(())
}

pub fn list_consoles(ctx: &AppContext) -> Result<()> {
    let consoles = ctx.store.get_consoles()?;

    if consoles.is_empty() {
        println!("No consoles; run a crawl first");
        return Ok(());
    }

    for console in consoles {
        println!(
            "[{}] {} ({})\n  {}",
            console.category.as_str(),
            console.name,
            console.year.as_deref().unwrap_or("?"),
            console.url
        );
    }

    Ok(())
}

pub fn list_games(ctx: &AppContext) -> Result<()> {
    let games = ctx.store.get_all_games()?;

    if games.is_empty() {
        println!("No games; run a crawl first");
        return Ok(());
    }

    for game in games {
        let marker = if game.is_downloadable() { "\u{25cf}" } else { " " };
        println!(
            "{} {:24} {}",
            marker,
            game.console.as_deref().unwrap_or("(unknown)"),
            game.display_name()
        );
    }

    Ok(())
}

pub async fn download(
    ctx: &AppContext,
    console: &str,
    browser: bool,
    dir: Option<PathBuf>,
) -> Result<()> {
    let download_dir = dir.unwrap_or_else(|| ctx.config.download_dir.clone());

    let strategy: Box<dyn DownloadStrategy> = if browser {
        Box::new(BrowserStrategy::new(
            ctx.config.downloader.headless,
            ctx.config.downloader.form_timeout(),
            ctx.config.downloader.transfer_timeout(),
        ))
    } else {
        Box::new(HttpStrategy::new(
            ctx.config.site.media_origin.clone(),
            ctx.config.site.origin.clone(),
            &ctx.config.downloader.user_agent,
        ))
    };

    let checker = DownloadChecker::new(ctx.store.clone(), strategy, download_dir);
    let summary = checker.run(console).await?;

    println!(
        "Download sweep complete: {} downloaded, {} already present, {} not downloadable, {} failed",
        summary.downloaded, summary.skipped_existing, summary.not_downloadable, summary.errors
    );
    Ok(())
}
