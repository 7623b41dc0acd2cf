//! Configuration file support for starsweep.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (`STARSWEEP_` prefix, `__` between section and
//!    key, e.g. `STARSWEEP_HARVEST__PER_PAGE`), plus `STARSWEEP_GITHUB_TOKEN`
//!    and `GITHUB_TOKEN` for the credential
//! 3. Config file (./starsweep.toml, then ~/.config/starsweep/config.toml)
//! 4. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [github]
//! token = "ghp_..."  # or use STARSWEEP_GITHUB_TOKEN
//! api_url = "https://api.github.com"
//!
//! [harvest]
//! per_page = 100
//! detail = "description"  # summary | description | readme
//! read_interval_ms = 500
//! quota_floor = 100
//!
//! [revoke]
//! write_interval_ms = 1000
//!
//! [store]
//! path = "stars.csv"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::{Config as ConfigBuilder, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;
use starsweep::forge::{DEFAULT_API_URL, MAX_PER_PAGE};
use starsweep::rate_limit::rate_limits;
use starsweep::retry::MAX_PAGE_RETRIES;
use starsweep::{DetailSource, PacingConfig, RetryConfig};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github: GitHubConfig,
    pub harvest: HarvestConfig,
    pub revoke: RevokeConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub token: Option<String>,
    /// API root; point at a GitHub Enterprise host if needed.
    pub api_url: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub per_page: u32,
    pub start_page: u32,
    pub detail: DetailSource,
    pub read_interval_ms: u64,
    pub quota_floor: usize,
    pub reset_margin_secs: u64,
    pub page_retries: usize,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            per_page: MAX_PER_PAGE,
            start_page: 1,
            detail: DetailSource::default(),
            read_interval_ms: rate_limits::READ_INTERVAL_MS,
            quota_floor: rate_limits::QUOTA_FLOOR,
            reset_margin_secs: rate_limits::RESET_MARGIN_SECS,
            page_retries: MAX_PAGE_RETRIES,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RevokeConfig {
    pub write_interval_ms: u64,
    pub resume_from: usize,
}

impl Default for RevokeConfig {
    fn default() -> Self {
        Self {
            write_interval_ms: rate_limits::WRITE_INTERVAL_MS,
            resume_from: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("stars.csv"),
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/starsweep/config.toml)
    /// 3. Local config file (./starsweep.toml)
    /// 4. `STARSWEEP_` environment variables
    /// 5. Token shorthands (`STARSWEEP_GITHUB_TOKEN`, `GITHUB_TOKEN`)
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from("starsweep.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./starsweep.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // STARSWEEP_HARVEST__PER_PAGE -> harvest.per_page
        builder = builder.add_source(
            Environment::with_prefix("STARSWEEP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let token = std::env::var("STARSWEEP_GITHUB_TOKEN")
            .or_else(|_| std::env::var("GITHUB_TOKEN"))
            .ok()
            .filter(|t| !t.trim().is_empty());
        builder = builder.set_override_option("github.token", token)?;

        builder.build()?.try_deserialize()
    }

    /// The configured token, if it is present and not blank.
    pub fn github_token(&self) -> Option<&str> {
        self.github
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn pacing(&self) -> PacingConfig {
        PacingConfig {
            read_interval: Duration::from_millis(self.harvest.read_interval_ms),
            write_interval: Duration::from_millis(self.revoke.write_interval_ms),
            quota_floor: self.harvest.quota_floor,
            reset_margin: Duration::from_secs(self.harvest.reset_margin_secs),
        }
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.harvest.page_retries,
            ..RetryConfig::default()
        }
    }

    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "starsweep").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(content: &str) -> Config {
        ConfigBuilder::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn defaults_match_library_constants() {
        let config = Config::default();
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert!(config.github.token.is_none());
        assert_eq!(config.harvest.per_page, 100);
        assert_eq!(config.harvest.start_page, 1);
        assert_eq!(config.harvest.detail, DetailSource::Description);
        assert_eq!(config.revoke.resume_from, 0);
        assert_eq!(config.store.path, PathBuf::from("stars.csv"));
        assert_eq!(config.pacing(), PacingConfig::default());
        assert_eq!(config.retry().max_retries, MAX_PAGE_RETRIES);
    }

    #[test]
    fn partial_file_overrides_only_given_keys() {
        let config = from_toml(
            r#"
            [github]
            token = "ghp_test123"

            [harvest]
            detail = "readme"
            read_interval_ms = 250

            [store]
            path = "/tmp/mine.csv"
            "#,
        );

        assert_eq!(config.github_token(), Some("ghp_test123"));
        assert_eq!(config.harvest.detail, DetailSource::Readme);
        assert_eq!(config.pacing().read_interval, Duration::from_millis(250));
        assert_eq!(config.pacing().write_interval, Duration::from_millis(1000));
        assert_eq!(config.harvest.per_page, 100);
        assert_eq!(config.store.path, PathBuf::from("/tmp/mine.csv"));
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let config = from_toml(
            r#"
            [github]
            token = "   "
            "#,
        );
        assert_eq!(config.github_token(), None);
    }

    #[test]
    fn later_sources_win() {
        let config: Config = ConfigBuilder::builder()
            .add_source(File::from_str(
                "[revoke]\nwrite_interval_ms = 2000\nresume_from = 4\n",
                FileFormat::Toml,
            ))
            .add_source(File::from_str("[revoke]\nresume_from = 9\n", FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.revoke.resume_from, 9);
        assert_eq!(config.revoke.write_interval_ms, 2000);
    }

    #[test]
    fn unknown_detail_source_is_an_error() {
        let result = ConfigBuilder::builder()
            .add_source(File::from_str("[harvest]\ndetail = \"wiki\"\n", FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize::<Config>();
        assert!(result.is_err());
    }

    #[test]
    fn token_override_applies_over_file() {
        let config: Config = ConfigBuilder::builder()
            .add_source(File::from_str("[github]\ntoken = \"from_file\"\n", FileFormat::Toml))
            .set_override_option("github.token", Some("from_env"))
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.github_token(), Some("from_env"));
    }

    #[test]
    fn default_config_path_mentions_app_name() {
        if let Some(path) = Config::default_config_path() {
            assert!(path.to_string_lossy().contains("starsweep"));
        }
    }
}
