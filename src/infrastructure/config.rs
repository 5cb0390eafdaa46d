//! Configuration infrastructure
//!
//! Contains configuration loading and management for the capture pipeline.
//!
//! Configuration is layered, lowest precedence first:
//! 1. Built-in defaults (the `defaults` module below)
//! 2. JSON config file
//! 3. Environment (`CONCURRENCY`, `TIMEOUT_MS`, `RETRIES`, `MAX_HEIGHT`,
//!    `INCLUDE_SLUGS`, `MAX_SITES`)
//! 4. Command-line flags, applied by the caller through [`CaptureOverrides`]

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, bail};
use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where inputs, artifacts and reports live
    pub paths: PathsConfig,

    /// Capture run tunables
    pub capture: CaptureConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Filesystem layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Source table (CSV with header)
    pub catalog_csv: PathBuf,

    /// Hero artifacts; fallbacks live in its `fallbacks/` sub-directory
    pub hero_dir: PathBuf,

    /// Full-page artifacts
    pub full_dir: PathBuf,

    /// Report written by a hero run
    pub hero_report: PathBuf,

    /// Report written by a full-page run
    pub full_report: PathBuf,
}

/// Capture run tunables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Batch size; jobs in a batch run concurrently
    pub concurrency: usize,

    /// Hard deadline for one navigation attempt
    pub timeout_ms: u64,

    /// Extra attempts after the first
    pub retries: u32,

    /// Full-page captures taller than this are cropped from the top
    pub max_height: u32,

    /// Pause after overlay removal before capturing
    pub settle_delay_ms: u64,

    /// Linear backoff unit between attempts
    pub backoff_base_ms: u64,

    /// Artifacts smaller than this are degenerate
    pub min_artifact_bytes: u64,

    /// When non-empty, only these slugs are captured
    pub include_slugs: Vec<String>,

    /// Cap on the number of jobs in a run
    pub max_sites: Option<usize>,

    /// Hosts that are never contacted; their entries always get a fallback
    pub excluded_hosts: Vec<String>,

    /// Run the browser without a window
    pub headless: bool,

    /// Explicit Chrome/Chromium binary; autodetected when unset
    pub chrome_executable: Option<PathBuf>,
}

/// Logging configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Log directory; defaults to `logs/` beside the executable
    pub log_dir: Option<PathBuf>,

    /// Number of log files to keep (older files will be deleted)
    pub max_files: u32,

    /// Enable automatic log cleanup on startup
    pub auto_cleanup_logs: bool,

    /// Module-specific log level filters (e.g., "chromiumoxide": "warn")
    pub module_filters: HashMap<String, String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            catalog_csv: PathBuf::from(defaults::CATALOG_CSV),
            hero_dir: PathBuf::from(defaults::HERO_DIR),
            full_dir: PathBuf::from(defaults::FULL_DIR),
            hero_report: PathBuf::from(defaults::HERO_REPORT),
            full_report: PathBuf::from(defaults::FULL_REPORT),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            concurrency: defaults::CONCURRENCY,
            timeout_ms: defaults::TIMEOUT_MS,
            retries: defaults::RETRIES,
            max_height: defaults::MAX_HEIGHT,
            settle_delay_ms: defaults::SETTLE_DELAY_MS,
            backoff_base_ms: defaults::BACKOFF_BASE_MS,
            min_artifact_bytes: defaults::MIN_ARTIFACT_BYTES,
            include_slugs: Vec::new(),
            max_sites: None,
            excluded_hosts: defaults::EXCLUDED_HOSTS.iter().map(|s| s.to_string()).collect(),
            headless: true,
            chrome_executable: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            log_dir: None,
            max_files: defaults::LOG_MAX_FILES,
            auto_cleanup_logs: defaults::LOG_AUTO_CLEANUP,
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("chromiumoxide".to_string(), "warn".to_string());
                filters.insert("tungstenite".to_string(), "warn".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("site_showcase".to_string(), "info".to_string());
                filters
            },
        }
    }
}

impl CaptureConfig {
    /// Fold lenient values into their canonical form: a concurrency below 1
    /// runs one job at a time and `max_sites = 0` means no cap.
    pub fn normalize(&mut self) {
        self.concurrency = self.concurrency.max(1);
        if self.max_sites == Some(0) {
            self.max_sites = None;
        }
    }
}

impl AppConfig {
    /// Validate all configuration fields.
    ///
    /// Collects every problem and reports them together.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.capture.timeout_ms == 0 {
            errors.push("capture.timeout_ms must be positive".to_string());
        }
        if self.capture.max_height == 0 {
            errors.push("capture.max_height must be positive".to_string());
        }
        if !self.logging.file_output && !self.logging.console_output {
            errors.push("logging needs at least one of file_output or console_output".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            bail!("Invalid configuration:\n  - {}", errors.join("\n  - "))
        }
    }
}

/// Per-run overrides from the command line; `None` keeps the loaded value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureOverrides {
    pub concurrency: Option<usize>,
    pub timeout_ms: Option<u64>,
    pub retries: Option<u32>,
    pub max_height: Option<u32>,
    pub include_slugs: Option<Vec<String>>,
    pub max_sites: Option<usize>,
}

impl CaptureOverrides {
    pub fn apply(self, capture: &mut CaptureConfig) {
        if let Some(v) = self.concurrency {
            capture.concurrency = v;
        }
        if let Some(v) = self.timeout_ms {
            capture.timeout_ms = v;
        }
        if let Some(v) = self.retries {
            capture.retries = v;
        }
        if let Some(v) = self.max_height {
            capture.max_height = v;
        }
        if let Some(v) = self.include_slugs {
            capture.include_slugs = v;
        }
        if let Some(v) = self.max_sites {
            capture.max_sites = Some(v);
        }
        capture.normalize();
    }
}

/// Split a comma-separated slug list, dropping blanks
pub fn parse_slug_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(defaults::APP_DIR_NAME);

        Ok(config_dir)
    }

    /// Locate the config file: `./site-showcase.json` if present, else the
    /// per-user config directory
    pub fn new() -> Result<Self> {
        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            return Ok(Self { config_path: local });
        }

        let config_path = Self::get_config_dir()?.join(defaults::CONFIG_FILE_NAME);
        Ok(Self { config_path })
    }

    /// Use an explicit config file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
        }
    }

    /// Write the default configuration unless a file already exists
    pub async fn initialize_on_first_run(&self) -> Result<AppConfig> {
        if self.config_path.exists() {
            info!("Configuration already present: {:?}", self.config_path);
            return self.load_config().await;
        }

        info!("🎉 First run detected - initializing default configuration");
        let default_config = AppConfig::default();
        self.save_config(&default_config).await?;
        info!("✅ Initial configuration setup completed");
        Ok(default_config)
    }

    /// Load configuration using the process environment
    pub async fn load_config(&self) -> Result<AppConfig> {
        self.load_config_with_env(|key| std::env::var(key).ok()).await
    }

    /// Load configuration, reading environment overrides through `env`.
    ///
    /// A missing file is not an error; defaults apply.
    pub async fn load_config_with_env<F>(&self, env: F) -> Result<AppConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::try_from(&AppConfig::default())
            .context("Failed to serialize default configuration")?;
        let mut builder = Config::builder().add_source(defaults);

        if self.config_path.exists() {
            let content = fs::read_to_string(&self.config_path).await.with_context(|| {
                format!("Failed to read configuration file {:?}", self.config_path)
            })?;
            builder = builder.add_source(File::from_str(&content, FileFormat::Json));
            info!("Loaded configuration from: {:?}", self.config_path);
        } else {
            info!("Configuration file not found, using defaults: {:?}", self.config_path);
        }

        builder = builder
            .set_override_option("capture.concurrency", env_int(&env, "CONCURRENCY"))?
            .set_override_option("capture.timeout_ms", env_int(&env, "TIMEOUT_MS"))?
            .set_override_option("capture.retries", env_int(&env, "RETRIES"))?
            .set_override_option("capture.max_height", env_int(&env, "MAX_HEIGHT"))?
            .set_override_option("capture.max_sites", env_int(&env, "MAX_SITES"))?
            .set_override_option(
                "capture.include_slugs",
                env("INCLUDE_SLUGS").map(|raw| parse_slug_list(&raw)),
            )?;

        let mut config: AppConfig = builder
            .build()
            .context("Failed to assemble configuration")?
            .try_deserialize()
            .with_context(|| format!("Invalid configuration in {:?}", self.config_path))?;

        config.capture.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.context("Failed to create config directory")?;
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

/// Non-negative integer from the environment. Unparseable values are ignored.
fn env_int<F>(env: &F, key: &str) -> Option<i64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = env(key)?;
    match raw.trim().parse::<i64>() {
        Ok(v) if v >= 0 => Some(v),
        _ => {
            warn!("⚠️  Ignoring {}={:?}: expected a non-negative integer", key, raw);
            None
        }
    }
}

/// Default configuration values
pub mod defaults {
    use crate::domain::constants::artifact;

    /// Directory name under the user config dir
    pub const APP_DIR_NAME: &str = "site-showcase";

    /// Config file name under [`APP_DIR_NAME`]
    pub const CONFIG_FILE_NAME: &str = "config.json";

    /// Config file picked up from the working directory
    pub const LOCAL_CONFIG_FILE: &str = "site-showcase.json";

    // Path defaults
    pub const CATALOG_CSV: &str = "data/websites.csv";
    pub const HERO_DIR: &str = "public/screenshots";
    pub const FULL_DIR: &str = "public/fullshots";
    pub const HERO_REPORT: &str = "scripts/output/hero-report.json";
    pub const FULL_REPORT: &str = "scripts/output/fullpage-report.json";

    // Capture defaults
    /// Default batch size
    pub const CONCURRENCY: usize = 5;

    /// Default navigation deadline in milliseconds
    pub const TIMEOUT_MS: u64 = 15_000;

    /// Default extra attempts
    pub const RETRIES: u32 = 2;

    /// Default full-page height cap in pixels
    pub const MAX_HEIGHT: u32 = 12_000;

    /// Default pause after overlay removal
    pub const SETTLE_DELAY_MS: u64 = 1000;

    /// Default linear backoff unit
    pub const BACKOFF_BASE_MS: u64 = 1000;

    /// Default byte floor
    pub const MIN_ARTIFACT_BYTES: u64 = artifact::MIN_ARTIFACT_BYTES;

    /// Hosts that only serve placeholder content
    pub const EXCLUDED_HOSTS: &[&str] = &["impossiblefoods.com"];

    // Log configuration defaults
    /// Default log level
    pub const LOG_LEVEL: &str = "info";

    /// Default JSON format setting
    pub const LOG_JSON_FORMAT: bool = false;

    /// Default console output setting
    pub const LOG_CONSOLE_OUTPUT: bool = true;

    /// Default file output setting
    pub const LOG_FILE_OUTPUT: bool = true;

    /// Default maximum log files to keep
    pub const LOG_MAX_FILES: u32 = 5;

    /// Default auto cleanup logs setting
    pub const LOG_AUTO_CLEANUP: bool = true;
}
