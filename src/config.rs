use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};

use crate::ai::{self, ApiKeyManager, Vendor, VendorProfile};
use crate::pomodoro::PomodoroConfig;

const APP_NAME: &str = "echo";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorSettings {
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EchoConfig {
    /// Database file. Defaults to `echo.db` in the platform data directory.
    pub database_path: Option<PathBuf>,
    /// Vendor used when a command does not name one.
    pub vendor: Vendor,
    pub claude: VendorSettings,
    pub gemini: VendorSettings,
    pub anthropic_version: String,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
    pub user_name: Option<String>,
    pub pomodoro: PomodoroConfig,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            vendor: Vendor::Claude,
            claude: VendorSettings {
                base_url: ai::CLAUDE_BASE_URL.to_string(),
                model: ai::CLAUDE_MODEL.to_string(),
            },
            gemini: VendorSettings {
                base_url: ai::GEMINI_BASE_URL.to_string(),
                model: ai::GEMINI_MODEL.to_string(),
            },
            anthropic_version: ai::ANTHROPIC_VERSION.to_string(),
            max_tokens: 1024,
            request_timeout_secs: 60,
            user_name: None,
            pomodoro: PomodoroConfig::default(),
        }
    }
}

impl EchoConfig {
    /// Load configuration from the user's config directory, then apply
    /// environment overrides. Falls back to defaults if the file is missing
    /// or fails to parse.
    pub fn load() -> Self {
        let mut config = match get_config_path().and_then(|path| Self::load_from(&path)) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        };
        config.apply_env();
        config
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config = serde_json::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// `ECHO_DB_PATH` overrides the database location.
    pub fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("ECHO_DB_PATH") {
            if !path.trim().is_empty() {
                self.database_path = Some(PathBuf::from(path));
            }
        }
    }

    /// The vendor descriptor for `vendor` with this configuration's endpoints applied.
    pub fn profile(&self, vendor: Vendor) -> VendorProfile {
        let settings = match vendor {
            Vendor::Claude => &self.claude,
            Vendor::Gemini => &self.gemini,
        };
        let mut profile = VendorProfile::for_vendor(vendor)
            .with_base_url(settings.base_url.clone())
            .with_model(settings.model.clone());
        profile.max_tokens = self.max_tokens;
        if vendor == Vendor::Claude {
            profile.extra_headers = vec![(
                "anthropic-version".to_string(),
                self.anthropic_version.clone(),
            )];
        }
        profile
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}

/// Environment variable holding the API key for `vendor`.
pub fn api_key_env_var(vendor: Vendor) -> &'static str {
    match vendor {
        Vendor::Claude => "ECHO_CLAUDE_API_KEY",
        Vendor::Gemini => "ECHO_GEMINI_API_KEY",
    }
}

/// Save any API keys found in the environment into `keys`. Blank values are ignored.
pub fn load_env_api_keys(keys: &ApiKeyManager) {
    for vendor in [Vendor::Claude, Vendor::Gemini] {
        if let Ok(key) = std::env::var(api_key_env_var(vendor)) {
            if keys.save_api_key(vendor, &key) {
                tracing::debug!("Loaded {} API key from {}", vendor, api_key_env_var(vendor));
            }
        }
    }
}
