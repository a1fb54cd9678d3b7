pub mod browser;
pub mod http;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::app::{Result, VaultError};
use crate::domain::GameRecord;
use crate::store::Store;

pub use browser::BrowserStrategy;
pub use http::HttpStrategy;

/// Where a finished transfer landed. `bytes` is unknown for strategies that
/// delegate the write to an external process.
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub path: PathBuf,
    pub bytes: Option<u64>,
}

/// How files get from the media host onto disk. The checker decides *what* to
/// download; a strategy only knows how to transfer one game.
#[async_trait]
pub trait DownloadStrategy: Send + Sync {
    async fn fetch_and_save(&self, game: &GameRecord, dest: &Path) -> Result<DownloadOutcome>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SweepSummary {
    pub downloaded: usize,
    pub skipped_existing: usize,
    pub not_downloadable: usize,
    pub errors: usize,
}

/// Sweeps the persisted records of one console and downloads every eligible
/// game that is not already on disk. A failed transfer is reported and the
/// sweep moves on.
pub struct DownloadChecker<S> {
    store: Arc<S>,
    strategy: Box<dyn DownloadStrategy>,
    download_dir: PathBuf,
}

impl<S: Store> DownloadChecker<S> {
    pub fn new(store: Arc<S>, strategy: Box<dyn DownloadStrategy>, download_dir: PathBuf) -> Self {
        Self {
            store,
            strategy,
            download_dir,
        }
    }

    pub async fn run(&self, console_name: &str) -> Result<SweepSummary> {
        let console = self
            .store
            .get_console_by_name(console_name)?
            .ok_or_else(|| VaultError::ConsoleNotFound(console_name.to_string()))?;

        let games = self.store.get_games_by_console(&console.name)?;
        tracing::info!(
            "Checking downloadable games for {}: {} records",
            console.name,
            games.len()
        );

        let dir = self.download_dir.join(sanitize(&console.name));
        let mut summary = SweepSummary::default();

        for game in games {
            if !game.is_downloadable() {
                tracing::debug!("{} is not downloadable", game.display_name());
                summary.not_downloadable += 1;
                continue;
            }

            let dest = dir.join(format!("{}.zip", sanitize(game.display_name())));
            if dest.exists() {
                tracing::info!("{} already exists, skipping", dest.display());
                summary.skipped_existing += 1;
                continue;
            }

            std::fs::create_dir_all(&dir)?;

            tracing::info!("Downloading {}", game.display_name());
            match self.strategy.fetch_and_save(&game, &dest).await {
                Ok(outcome) => {
                    summary.downloaded += 1;
                    match outcome.bytes {
                        Some(bytes) => {
                            tracing::info!("Saved {} ({} bytes)", outcome.path.display(), bytes)
                        }
                        None => tracing::info!("Saved into {}", outcome.path.display()),
                    }
                }
                Err(e) => {
                    tracing::warn!("Download failed for {}: {}", game.display_name(), e);
                    summary.errors += 1;
                }
            }
        }

        Ok(summary)
    }
}

/// Strip path separators and other filesystem-hostile characters from a title
/// before it becomes a file or directory name.
pub fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = cleaned.trim().trim_end_matches('.').to_string();
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use crate::domain::{Category, ConsoleEntry};
    use crate::store::SqliteStore;

    /// Records every transfer it is asked to make without touching the network.
    struct RecordingStrategy {
        requests: Mutex<Vec<PathBuf>>,
        write_file: bool,
    }

    #[async_trait]
    impl DownloadStrategy for RecordingStrategy {
        async fn fetch_and_save(&self, _game: &GameRecord, dest: &Path) -> Result<DownloadOutcome> {
            self.requests.lock().unwrap().push(dest.to_path_buf());
            if self.write_file {
                std::fs::write(dest, b"zip")?;
            }
            Ok(DownloadOutcome {
                path: dest.to_path_buf(),
                bytes: Some(3),
            })
        }
    }

    fn seeded_store() -> Arc<SqliteStore> {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        store
            .upsert_console(&ConsoleEntry::new(
                "NES".into(),
                "https://vimm.net/vault/NES".into(),
                Some("1983".into()),
                Category::Console,
            ))
            .unwrap();

        let mut downloadable = GameRecord {
            console: Some("NES".into()),
            game_name: Some("Metroid".into()),
            can_be_downloaded: true,
            ..Default::default()
        };
        downloadable
            .download_params
            .insert("mediaId".into(), "9".into());
        store.upsert_game(&downloadable).unwrap();

        let not_downloadable = GameRecord {
            console: Some("NES".into()),
            game_name: Some("Kiosk Demo".into()),
            ..Default::default()
        };
        store.upsert_game(&not_downloadable).unwrap();

        store
    }

    #[tokio::test]
    async fn test_only_eligible_games_are_fetched() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = Box::new(RecordingStrategy {
            requests: Mutex::new(Vec::new()),
            write_file: true,
        });
        let checker = DownloadChecker::new(seeded_store(), strategy, dir.path().to_path_buf());

        let summary = checker.run("NES").await.unwrap();
        assert_eq!(summary.downloaded, 1);
        assert_eq!(summary.not_downloadable, 1);
        assert_eq!(summary.errors, 0);

        assert!(dir.path().join("NES").join("Metroid.zip").exists());
    }

    #[tokio::test]
    async fn test_existing_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let console_dir = dir.path().join("NES");
        std::fs::create_dir_all(&console_dir).unwrap();
        std::fs::write(console_dir.join("Metroid.zip"), b"already here").unwrap();

        let strategy = Box::new(RecordingStrategy {
            requests: Mutex::new(Vec::new()),
            write_file: false,
        });
        let checker = DownloadChecker::new(seeded_store(), strategy, dir.path().to_path_buf());

        let summary = checker.run("NES").await.unwrap();
        assert_eq!(summary.downloaded, 0);
        assert_eq!(summary.skipped_existing, 1);
    }

    #[tokio::test]
    async fn test_unknown_console_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = Box::new(RecordingStrategy {
            requests: Mutex::new(Vec::new()),
            write_file: false,
        });
        let checker = DownloadChecker::new(seeded_store(), strategy, dir.path().to_path_buf());

        assert!(matches!(
            checker.run("Dreamcast").await,
            Err(VaultError::ConsoleNotFound(_))
        ));
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("Mario/Duck Hunt"), "Mario_Duck Hunt");
        assert_eq!(sanitize("What?: A Game"), "What__ A Game");
        assert_eq!(sanitize("Dr. Mario"), "Dr. Mario");
        assert_eq!(sanitize("trailing dots..."), "trailing dots");
        assert_eq!(sanitize(""), "_");
    }
}
