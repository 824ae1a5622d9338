//! Orchestrator configuration.
//!
//! ```toml
//! [orchestrator]
//! stall_warning_ms = 5000
//! label = "build-graph"
//! ```
//!
//! Every setting is optional and the defaults change nothing about how a run
//! behaves; they only add diagnostics.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {source}")]
    Parse {
        path: Option<PathBuf>,
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Read { path, .. } => Some(path),
            ConfigError::Parse { path, .. } => path.as_deref(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    orchestrator: Option<OrchestratorConfig>,
}

/// Settings applied to every run launched by an orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OrchestratorConfig {
    /// Log a warning naming the still-pending tasks if a run has not finished
    /// after this many milliseconds. Absent or zero disables the warning.
    #[serde(default)]
    pub stall_warning_ms: Option<u64>,
    /// Recorded on the run's tracing span.
    #[serde(default)]
    pub label: Option<String>,
}

impl OrchestratorConfig {
    /// Parse the `[orchestrator]` table of a TOML document. A missing table
    /// yields the defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, None)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };
        Self::parse(&content, Some(path))
    }

    fn parse(content: &str, path: Option<&Path>) -> Result<Self, ConfigError> {
        match toml::from_str::<ConfigFile>(content) {
            Ok(file) => Ok(file.orchestrator.unwrap_or_default()),
            Err(err) => {
                tracing::warn!("Failed to parse config: {}", err);
                Err(ConfigError::Parse {
                    path: path.map(Path::to_path_buf),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn with_stall_warning(mut self, after: Duration) -> Self {
        self.stall_warning_ms = Some(u64::try_from(after.as_millis()).unwrap_or(u64::MAX));
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn stall_warning(&self) -> Option<Duration> {
        self.stall_warning_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}
