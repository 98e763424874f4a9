use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Which [`crate::dispatch`] driver a [`crate::Workflow`] should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    #[default]
    Cooperative,
    Parallel,
}

/// Runtime configuration: dispatch mode, worker pool size for
/// [`DispatchMode::Parallel`], and how often a running dispatch loop
/// checks for cancellation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dispatch_mode: DispatchMode,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default = "default_cancellation_check_interval_ms")]
    pub cancellation_check_interval_ms: u64,
}

fn default_worker_count() -> usize {
    4
}

fn default_cancellation_check_interval_ms() -> u64 {
    50
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dispatch_mode: DispatchMode::default(),
            worker_count: default_worker_count(),
            cancellation_check_interval_ms: default_cancellation_check_interval_ms(),
        }
    }
}

impl Config {
    pub fn cancellation_check_interval(&self) -> Duration {
        Duration::from_millis(self.cancellation_check_interval_ms)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
