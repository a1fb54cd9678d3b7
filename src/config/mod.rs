//! Configuration management for vaultcrawl.
//!
//! Configuration is read from `~/.config/vaultcrawl/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Main configuration struct.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database location. Defaults to the platform data directory.
    pub db_path: Option<PathBuf>,
    /// Base directory game files are downloaded into.
    pub download_dir: PathBuf,
    pub site: SiteConfig,
    pub fetch: FetchConfig,
    pub downloader: DownloaderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            download_dir: PathBuf::from("roms"),
            site: SiteConfig::default(),
            fetch: FetchConfig::default(),
            downloader: DownloaderConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Origin of the vault site; relative links are resolved against it.
    pub origin: String,
    /// Origin of the media host files are fetched from.
    pub media_origin: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            origin: "https://vimm.net".to_string(),
            media_origin: "https://download2.vimm.net".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Additional attempts after a failed fetch.
    pub retries: u32,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            retries: 2,
            user_agent: concat!("vaultcrawl/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloaderConfig {
    /// Browser-like User-Agent; the media host rejects obvious bots.
    pub user_agent: String,
    /// Run the browser strategy headless.
    pub headless: bool,
    /// How long to wait for the download form to appear (seconds).
    pub form_timeout_secs: u64,
    /// How long a browser-driven transfer may take (seconds).
    pub transfer_timeout_secs: u64,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36"
                .to_string(),
            headless: true,
            form_timeout_secs: 10,
            transfer_timeout_secs: 1800,
        }
    }
}

impl DownloaderConfig {
    pub fn form_timeout(&self) -> Duration {
        Duration::from_secs(self.form_timeout_secs)
    }

    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_secs(self.transfer_timeout_secs)
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path,
            source: e,
        })?;

        Ok(config)
    }

    /// Get the default config file path: `~/.config/vaultcrawl/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("vaultcrawl").join("config.toml"))
    }

    fn create_default_config(path: &PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let default_config = Self::default_config_content();

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        file.write_all(default_config.as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# vaultcrawl configuration

# SQLite database location. Uncomment to override the platform default.
#db_path = "/path/to/vaultcrawl.db"

# Base directory downloaded game files land in, one subdirectory per console.
download_dir = "roms"

[site]
# Origin of the vault site; relative links are resolved against it.
origin = "https://vimm.net"
# Origin of the media host game files are fetched from.
media_origin = "https://download2.vimm.net"

[fetch]
# Per-request timeout in seconds
timeout_secs = 10
# Additional attempts after a failed fetch
retries = 2

[downloader]
# Run the browser download strategy without a visible window
headless = true
# Seconds to wait for the download form to appear
form_timeout_secs = 10
# Seconds a browser-driven transfer may take before giving up
transfer_timeout_secs = 1800
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        assert_eq!(config.site.origin, "https://vimm.net");
        assert_eq!(config.download_dir, PathBuf::from("roms"));
        assert!(config.downloader.headless);
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[site]
origin = "https://mirror.example"
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        // Custom value
        assert_eq!(config.site.origin, "https://mirror.example");
        // Default values
        assert_eq!(config.site.media_origin, "https://download2.vimm.net");
        assert_eq!(config.fetch.retries, 2);
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");

        assert_eq!(config.fetch.timeout(), Duration::from_secs(10));
        assert_eq!(
            config.downloader.transfer_timeout(),
            Duration::from_secs(1800)
        );
    }
}
