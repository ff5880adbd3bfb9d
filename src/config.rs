use crate::analysis::DEFAULT_ENDPOINT_URL;
use crate::audio::DEFAULT_CAPTURE_DEADLINE;
use crate::session::{ControllerConfig, DEFAULT_PALETTE, DEFAULT_THEME_INTERVAL};
use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub capture: CaptureConfig,
    pub theme: ThemeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Inference endpoint receiving the multipart audio upload
    pub endpoint_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Recording deadline in seconds
    pub deadline_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Home background rotation period in seconds
    pub interval_secs: u64,
    /// Home background palette
    pub palette: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            deadline_secs: DEFAULT_CAPTURE_DEADLINE.as_secs(),
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_THEME_INTERVAL.as_secs(),
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            capture: CaptureConfig::default(),
            theme: ThemeConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Controller tunables derived from this configuration
    pub fn controller(&self) -> ControllerConfig {
        ControllerConfig {
            capture_deadline: Duration::from_secs(self.capture.deadline_secs),
            theme_interval: Duration::from_secs(self.theme.interval_secs),
            palette: self.theme.palette.clone(),
        }
    }
}
