use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use futures::StreamExt;

use crate::app::{Result, VaultError};
use crate::domain::GameRecord;
use crate::downloader::{DownloadOutcome, DownloadStrategy};
use crate::extract::ensure_scheme;

const FORM_SELECTOR: &str = "form#dl_form";
const SUBMIT_SELECTORS: [&str; 2] = [
    r#"form#dl_form button[type="submit"]"#,
    r#"form#dl_form input[type="submit"]"#,
];

/// Browser-driven transfer: navigate a headless Chrome to the game's page and
/// submit the download form, letting the browser write the file. Useful when
/// the media host starts demanding things a bare HTTP client cannot provide.
///
/// The browser picks the file name itself, so the checker's destination path
/// only determines the directory.
pub struct BrowserStrategy {
    headless: bool,
    form_timeout: Duration,
    transfer_timeout: Duration,
}

impl BrowserStrategy {
    pub fn new(headless: bool, form_timeout: Duration, transfer_timeout: Duration) -> Self {
        Self {
            headless,
            form_timeout,
            transfer_timeout,
        }
    }

    async fn launch(&self) -> Result<Browser> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage");

        if !self.headless {
            builder = builder.with_head();
        }

        let config = builder
            .build()
            .map_err(|e| VaultError::Browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            VaultError::Browser(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        tokio::spawn(async move {
            while let Some(_event) = handler.next().await {
                // Drain browser events
            }
        });

        Ok(browser)
    }
}

#[async_trait]
impl DownloadStrategy for BrowserStrategy {
    async fn fetch_and_save(&self, game: &GameRecord, dest: &Path) -> Result<DownloadOutcome> {
        let url = game
            .download_url
            .as_deref()
            .map(ensure_scheme)
            .ok_or_else(|| VaultError::Download {
                name: game.display_name().to_string(),
                reason: "missing download URL".to_string(),
            })?;

        let dir = dest.parent().ok_or_else(|| {
            VaultError::Download {
                name: game.display_name().to_string(),
                reason: "destination has no parent directory".to_string(),
            }
        })?;

        let mut browser = self.launch().await?;
        let result = self.drive_download(&browser, &url, dir).await;
        let _ = browser.close().await;

        result.map(|_| DownloadOutcome {
            path: dir.to_path_buf(),
            bytes: None,
        })
    }
}

impl BrowserStrategy {
    async fn drive_download(&self, browser: &Browser, url: &str, dir: &Path) -> Result<()> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| VaultError::Browser(format!("Failed to create page: {}", e)))?;

        let behavior = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::Allow)
            .download_path(dir.to_string_lossy().to_string())
            .build()
            .map_err(VaultError::Browser)?;
        page.execute(behavior)
            .await
            .map_err(|e| VaultError::Browser(format!("Failed to set download path: {}", e)))?;

        let baseline = snapshot(dir);

        page.goto(url)
            .await
            .map_err(|e| VaultError::Browser(format!("Navigation failed: {}", e)))?;

        self.wait_for_form(&page).await?;

        let mut clicked = false;
        for selector in SUBMIT_SELECTORS {
            if let Ok(element) = page.find_element(selector).await {
                element
                    .click()
                    .await
                    .map_err(|e| VaultError::Browser(format!("Submit click failed: {}", e)))?;
                clicked = true;
                break;
            }
        }
        if !clicked {
            return Err(VaultError::Browser(
                "download form has no submit control".to_string(),
            ));
        }

        self.wait_for_transfer(dir, &baseline).await
    }

    async fn wait_for_form(&self, page: &chromiumoxide::Page) -> Result<()> {
        let deadline = tokio::time::Instant::now() + self.form_timeout;
        loop {
            if page.find_element(FORM_SELECTOR).await.is_ok() {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(VaultError::Browser(
                    "download form never appeared".to_string(),
                ));
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    }

    /// Chrome writes to `<name>.crdownload` until the transfer completes.
    /// Wait for the in-progress marker to show up, then for it to go away.
    async fn wait_for_transfer(&self, dir: &Path, baseline: &HashSet<String>) -> Result<()> {
        let deadline = tokio::time::Instant::now() + self.transfer_timeout;
        let mut started = false;

        loop {
            let entries = snapshot(dir);
            let in_progress = entries.iter().any(|name| name.ends_with(".crdownload"));
            let finished_file = entries
                .iter()
                .any(|name| !baseline.contains(name) && !name.ends_with(".crdownload"));

            if in_progress {
                started = true;
            } else if started || finished_file {
                return Ok(());
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(VaultError::Browser(format!(
                    "transfer did not finish within {:?}",
                    self.transfer_timeout
                )));
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }
}

fn snapshot(dir: &Path) -> HashSet<String> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_of_missing_dir_is_empty() {
        assert!(snapshot(Path::new("/definitely/not/a/real/dir")).is_empty());
    }

    #[test]
    fn test_snapshot_lists_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.zip"), b"x").unwrap();
        std::fs::write(dir.path().join("b.crdownload"), b"x").unwrap();

        let names = snapshot(dir.path());
        assert!(names.contains("a.zip"));
        assert!(names.contains("b.crdownload"));
    }
}
