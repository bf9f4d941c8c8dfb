use crate::global;
use crate::meeting::{RecordingOptions, RetryPolicy, DEFAULT_DISPLAY_NAME};
use crate::platform::VideoResolution;
use crate::sdk::SdkConfig;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sdk: SdkSection,
    pub bot: BotSection,
    pub capture: CaptureSection,
    pub api: ApiSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkSection {
    pub key: String,
    pub secret: String,
    pub web_domain: String,
    /// Explicit proxy; leave unset to let the platform auto-detect.
    pub proxy: Option<String>,
    pub auth_timeout_seconds: u64,
    pub jwt_ttl_hours: i64,
}

impl Default for SdkSection {
    fn default() -> Self {
        Self {
            key: String::new(),
            secret: String::new(),
            web_domain: "https://zoom.us".to_string(),
            proxy: None,
            auth_timeout_seconds: 10,
            jwt_ttl_hours: 24,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotSection {
    pub display_name: String,
}

impl Default for BotSection {
    fn default() -> Self {
        Self {
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSection {
    /// Attempts at subscribing to raw audio while the audio transport joins.
    pub audio_subscribe_attempts: u32,
    pub audio_subscribe_interval_ms: u64,
    pub video_resolution: VideoResolution,
}

impl Default for CaptureSection {
    fn default() -> Self {
        Self {
            audio_subscribe_attempts: 10,
            audio_subscribe_interval_ms: 500,
            video_resolution: VideoResolution::R720p,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    /// Listen address of `meetbot serve`.
    pub address: String,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8080".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Reads the file at `path`, writing defaults there first if it is missing.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        global::config_file()
    }

    /// `ZOOM_SDK_KEY`, `ZOOM_SDK_SECRET`, `HTTP_PROXY` and `HTTP_ADDR` win
    /// over the file.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |name: &str| lookup(name).filter(|value| !value.is_empty());
        if let Some(key) = lookup("ZOOM_SDK_KEY") {
            debug!("SDK key taken from ZOOM_SDK_KEY");
            self.sdk.key = key;
        }
        if let Some(secret) = lookup("ZOOM_SDK_SECRET") {
            debug!("SDK secret taken from ZOOM_SDK_SECRET");
            self.sdk.secret = secret;
        }
        if let Some(proxy) = lookup("HTTP_PROXY") {
            debug!("proxy taken from HTTP_PROXY");
            self.sdk.proxy = Some(proxy);
        }
        if let Some(address) = lookup("HTTP_ADDR") {
            debug!("API address taken from HTTP_ADDR");
            self.api.address = address;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sdk.key.is_empty() || self.sdk.secret.is_empty() {
            bail!("SDK key and secret must be set in the config file or via ZOOM_SDK_KEY/ZOOM_SDK_SECRET");
        }
        if self.capture.audio_subscribe_attempts == 0 {
            bail!("capture.audio_subscribe_attempts must be at least 1");
        }
        Ok(())
    }

    pub fn sdk_config(&self) -> SdkConfig {
        let mut config = SdkConfig::new(self.sdk.key.clone(), self.sdk.secret.clone());
        config.web_domain = self.sdk.web_domain.clone();
        config.proxy = self.sdk.proxy.clone().filter(|p| !p.is_empty());
        config.auth_timeout = Duration::from_secs(self.sdk.auth_timeout_seconds);
        config.jwt_ttl = chrono::Duration::hours(self.sdk.jwt_ttl_hours);
        config
    }

    pub fn recording_options(&self) -> RecordingOptions {
        RecordingOptions {
            audio_retry: RetryPolicy {
                attempts: self.capture.audio_subscribe_attempts,
                interval: Duration::from_millis(self.capture.audio_subscribe_interval_ms),
            },
            video_resolution: self.capture.video_resolution,
        }
    }
}
