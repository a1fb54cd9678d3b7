use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::{ACCEPT, REFERER};
use reqwest::Client;
use tokio::io::AsyncWriteExt;

use crate::app::{Result, VaultError};
use crate::domain::GameRecord;
use crate::downloader::{DownloadOutcome, DownloadStrategy};

const ACCEPT_HEADER: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// Direct HTTP transfer: GET the media host with the stored `mediaId` as a
/// query parameter and stream the body to disk.
///
/// The media host rejects default client identifications, so the User-Agent
/// and Referer are always sent.
pub struct HttpStrategy {
    client: Client,
    media_origin: String,
    site_origin: String,
}

impl HttpStrategy {
    pub fn new(media_origin: String, site_origin: String, user_agent: &str) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .user_agent(user_agent)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            media_origin,
            site_origin,
        }
    }

    fn request_url(&self, media_id: &str) -> String {
        format!(
            "{}/?mediaId={}",
            self.media_origin.trim_end_matches('/'),
            media_id
        )
    }

    fn referer(&self, game: &GameRecord) -> String {
        format!(
            "{}/vault/{}",
            self.site_origin.trim_end_matches('/'),
            game.console.as_deref().unwrap_or("")
        )
    }
}

#[async_trait]
impl DownloadStrategy for HttpStrategy {
    async fn fetch_and_save(&self, game: &GameRecord, dest: &Path) -> Result<DownloadOutcome> {
        let media_id = game.media_id().ok_or_else(|| VaultError::Download {
            name: game.display_name().to_string(),
            reason: "missing mediaId".to_string(),
        })?;

        let mut response = self
            .client
            .get(self.request_url(media_id))
            .header(REFERER, self.referer(game))
            .header(ACCEPT, ACCEPT_HEADER)
            .send()
            .await?;
        response.error_for_status_ref()?;

        let progress = progress_bar(response.content_length(), game.display_name());

        // Stream into a scratch path; the real name only appears once the
        // transfer completed, so an interrupted run never leaves a truncated
        // file that a re-run would then skip.
        let tmp = scratch_path(dest);
        let mut file = tokio::fs::File::create(&tmp).await?;
        let mut written: u64 = 0;

        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
            progress.set_position(written);
        }

        file.flush().await?;
        drop(file);
        tokio::fs::rename(&tmp, dest).await?;
        progress.finish_and_clear();

        Ok(DownloadOutcome {
            path: dest.to_path_buf(),
            bytes: Some(written),
        })
    }
}

fn scratch_path(dest: &Path) -> std::path::PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(".part");
    std::path::PathBuf::from(name)
}

fn progress_bar(total: Option<u64>, name: &str) -> ProgressBar {
    let pb = match total {
        Some(total) => {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  {prefix:.bold} [{bar:40.cyan/dim}] {bytes}/{total_bytes} ({eta})")
                    .unwrap()
                    .progress_chars("=>-"),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("  {prefix:.bold} {spinner} {bytes}")
                    .unwrap(),
            );
            pb
        }
    };
    pb.set_prefix(name.to_string());
    pb
}
