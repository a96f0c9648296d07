//! JSON file configuration adapter.
//!
//! Implements [`ConfigPort`] over a single JSON document on disk.  A
//! missing file yields defaults; a present but unreadable or invalid file
//! is an error, so misconfiguration surfaces at startup rather than at
//! ingest time.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::AgentConfig;

pub struct JsonConfigAdapter {
    path: PathBuf,
}

impl JsonConfigAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigPort for JsonConfigAdapter {
    fn load(&self) -> Result<AgentConfig, ConfigError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No config at {}, using defaults", self.path.display());
                return Ok(AgentConfig::default());
            }
            Err(e) => {
                warn!("Config read failed ({}): {}", self.path.display(), e);
                return Err(ConfigError::IoError);
            }
        };

        let config: AgentConfig = serde_json::from_slice(&bytes).map_err(|e| {
            warn!("Config at {} is corrupted: {}", self.path.display(), e);
            ConfigError::Corrupted
        })?;
        config.validate()?;
        info!("Loaded config from {}", self.path.display());
        Ok(config)
    }

    fn save(&self, config: &AgentConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let json = serde_json::to_vec_pretty(config).map_err(|_| ConfigError::Corrupted)?;
        fs::write(&self.path, json).map_err(|e| {
            warn!("Config write failed ({}): {}", self.path.display(), e);
            ConfigError::IoError
        })?;
        info!("Saved config to {}", self.path.display());
        Ok(())
    }
}
