use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::state::{MAX_CORES, WINDOW_SECONDS};

/// Classifier configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub detector: DetectorConfig,
    pub verdict: VerdictConfig,
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Sustained SYN rate per core that counts as a flood. The window
    /// threshold is this value times the window length (8 seconds).
    pub syn_per_second: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdictConfig {
    /// SYNs admitted at the start of each shedding cycle
    pub pass_ticks: u64,
    /// SYNs dropped after the admitted ones
    pub drop_ticks: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Number of receive cores (one state slot each)
    pub cores: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            syn_per_second: 6000,
        }
    }
}

impl DetectorConfig {
    /// SYNs per full window that switch a core into the flood state
    pub fn window_threshold(&self) -> u64 {
        self.syn_per_second.saturating_mul(WINDOW_SECONDS as u64)
    }
}

impl Default for VerdictConfig {
    fn default() -> Self {
        Self {
            pass_ticks: 10,
            drop_ticks: 20,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cores: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
                .min(MAX_CORES),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(&self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.detector.syn_per_second == 0 {
            return Err(ConfigError::ZeroSynRate);
        }

        if self.verdict.pass_ticks == 0 {
            return Err(ConfigError::ZeroPassTicks);
        }

        if self.verdict.drop_ticks == 0 {
            return Err(ConfigError::ZeroDropTicks);
        }

        if self.runtime.cores == 0 || self.runtime.cores > MAX_CORES {
            return Err(ConfigError::InvalidCores {
                value: self.runtime.cores,
                max: MAX_CORES,
            });
        }

        Ok(())
    }
}
