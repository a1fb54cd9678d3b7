use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{Result, VaultError};
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::Fetcher;
use crate::store::sqlite::SqliteStore;

/// Wires the storage and fetch collaborators together for the process
/// lifetime. Constructed once at startup and passed down explicitly.
pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
}

impl AppContext {
    pub fn new(config: Config, db_path: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_path.or_else(|| config.db_path.clone()) {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let store = Arc::new(SqliteStore::new(&db_path)?);
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::with_config(
            config.fetch.timeout(),
            config.fetch.retries,
            &config.fetch.user_agent,
        ));

        Ok(Self {
            config,
            store,
            fetcher,
        })
    }

    pub fn in_memory() -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new());

        Ok(Self {
            config: Config::default(),
            store,
            fetcher,
        })
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| VaultError::Config("Could not find data directory".into()))?;
        let app_dir = data_dir.join("vaultcrawl");
        std::fs::create_dir_all(&app_dir)?;
        Ok(app_dir.join("vaultcrawl.db"))
    }
}
