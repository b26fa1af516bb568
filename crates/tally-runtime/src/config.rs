use crate::{Error, Result};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tally_engine::AggregatorConfig;
use tally_types::StreamId;

/// Resolve the data directory path based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. TALLY_PATH environment variable (with tilde expansion)
/// 3. XDG data directory (recommended default)
/// 4. ~/.tally (fallback for systems without XDG)
pub fn resolve_data_path(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var("TALLY_PATH") {
        return Ok(expand_tilde(&env_path));
    }

    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join("tally"));
    }

    if let Some(home) = std::env::var_os("HOME") {
        return Ok(PathBuf::from(home).join(".tally"));
    }

    Err(Error::Config(
        "Could not determine data path: no HOME directory or XDG data directory found"
            .to_string(),
    ))
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

/// Aggregator windows in whole seconds, as written in config.toml.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorSettings {
    pub reduction_confirm_secs: u64,
    pub silence_confirm_secs: u64,
    pub min_detection_secs: u64,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            reduction_confirm_secs: AggregatorConfig::DEFAULT_REDUCTION_CONFIRM_SECS as u64,
            silence_confirm_secs: AggregatorConfig::DEFAULT_SILENCE_CONFIRM_SECS as u64,
            min_detection_secs: AggregatorConfig::DEFAULT_MIN_DETECTION_SECS as u64,
        }
    }
}

impl AggregatorSettings {
    pub fn to_config(&self) -> Result<AggregatorConfig> {
        Ok(AggregatorConfig {
            reduction_confirm_window: seconds(
                "reduction_confirm_secs",
                self.reduction_confirm_secs,
            )?,
            silence_confirm_window: seconds("silence_confirm_secs", self.silence_confirm_secs)?,
            min_detection_duration: seconds("min_detection_secs", self.min_detection_secs)?,
        })
    }
}

fn seconds(name: &str, secs: u64) -> Result<TimeDelta> {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .ok_or_else(|| Error::Config(format!("{} is out of range: {}", name, secs)))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Tag stored with every record from this stream.
    pub stream_id: String,
    /// Samples buffered between the sampler and the processing loop.
    pub channel_capacity: usize,
    /// Consecutive source failures tolerated before the monitor stops.
    pub max_source_errors: u32,
    /// Close and log the open session when the monitor stops.
    pub flush_on_stop: bool,
    /// Pause between probes for clock-stamped sources.
    pub sample_interval_ms: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            stream_id: StreamId::default().to_string(),
            channel_capacity: 64,
            max_source_errors: 5,
            flush_on_stop: false,
            sample_interval_ms: 1000,
        }
    }
}

impl MonitorSettings {
    pub fn stream_id(&self) -> StreamId {
        StreamId::new(self.stream_id.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub aggregator: AggregatorSettings,
    #[serde(default)]
    pub monitor: MonitorSettings,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::default_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(resolve_data_path(None)?.join("config.toml"))
    }
}
