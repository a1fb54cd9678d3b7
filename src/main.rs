use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vaultcrawl::app::AppContext;
use vaultcrawl::cli::{commands, Cli, Commands};
use vaultcrawl::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let ctx = AppContext::new(config, cli.db)?;

    match cli.command {
        Commands::Crawl => {
            commands::crawl(&ctx).await?;
        }
        Commands::Game { url } => {
            commands::show_game(&ctx, &url).await?;
        }
        Commands::List { games } => {
            if games {
                commands::list_games(&ctx)?;
            } else {
                commands::list_consoles(&ctx)?;
            }
        }
        Commands::Download {
            console,
            browser,
            dir,
        } => {
            commands::download(&ctx, &console, browser, dir).await?;
        }
    }

    Ok(())
}
