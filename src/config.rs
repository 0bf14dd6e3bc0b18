use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the configured API base URL
pub const API_URL_ENV: &str = "HOOPCHAT_API_URL";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the query service
    pub api_base_url: String,

    /// Path of the natural-language chat endpoint
    pub chat_path: String,

    /// Path of the bulk query-processing endpoint
    pub process_path: String,

    /// Per-request timeout; bulk processing can take minutes
    pub request_timeout_secs: u64,

    /// Feature toggles
    pub features: FeatureFlags,

    /// UI preferences
    pub ui: UiConfig,

    /// Hoopchat home directory
    #[serde(skip)]
    pub hoopchat_home: PathBuf,
}

/// Switches for optional parts of the interface
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Allow the bulk "process queries" action
    pub show_process_queries_button: bool,

    /// Allow the history panel; keyboard recall works either way
    pub enable_chat_history_panel: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            show_process_queries_button: false,
            enable_chat_history_panel: true,
        }
    }
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Maximum number of remembered queries
    pub history_limit: usize,

    /// Where exported charts are written when no path is given
    pub export_dir: Option<PathBuf>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            history_limit: 100,
            export_dir: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));

        Config {
            api_base_url: "http://localhost:8000".to_string(),
            chat_path: "/api/chat".to_string(),
            process_path: "/api/queries/process".to_string(),
            request_timeout_secs: 120,
            features: FeatureFlags::default(),
            ui: UiConfig::default(),
            hoopchat_home: home.join(".hoopchat"),
        }
    }
}

impl Config {
    /// Load configuration from ~/.hoopchat, applying the environment override
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        let mut config = Self::load_from(&home.join(".hoopchat"))?;
        config.apply_api_url_override(std::env::var(API_URL_ENV).ok());
        Ok(config)
    }

    /// Load configuration from a specific home directory, writing defaults when missing
    pub fn load_from(hoopchat_home: &Path) -> Result<Self> {
        let config_path = hoopchat_home.join("config.toml");

        fs::create_dir_all(hoopchat_home).context("Failed to create .hoopchat directory")?;

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            let config = Config {
                hoopchat_home: hoopchat_home.to_path_buf(),
                ..Config::default()
            };
            config.save()?;
            tracing::info!(path = %config_path.display(), "Wrote default configuration");
            config
        };

        config.hoopchat_home = hoopchat_home.to_path_buf();
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = self.config_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content).context("Failed to write config file")?;
        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.hoopchat_home.join("config.toml")
    }

    /// Replace the base URL when an override is present and non-empty
    pub fn apply_api_url_override(&mut self, url: Option<String>) {
        if let Some(url) = url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) {
            self.api_base_url = url;
        }
    }

    pub fn chat_url(&self) -> String {
        join_url(&self.api_base_url, &self.chat_path)
    }

    pub fn process_url(&self) -> String {
        join_url(&self.api_base_url, &self.process_path)
    }

    /// Directory for exported charts
    pub fn export_dir(&self) -> PathBuf {
        self.ui
            .export_dir
            .clone()
            .unwrap_or_else(|| self.hoopchat_home.join("exports"))
    }

    /// Log file used while the terminal UI owns the screen
    pub fn log_path(&self) -> PathBuf {
        self.hoopchat_home.join("hoopchat.log")
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
