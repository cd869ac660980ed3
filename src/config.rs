//! Configuration Management
//!
//! Handles persistent configuration storage for clusterq.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Default inventory snapshot path
    #[serde(default)]
    pub inventory: Option<PathBuf>,
    /// Preferred output format
    #[serde(default)]
    pub output: Option<String>,
    /// Last queried resource type
    #[serde(default)]
    pub last_resource: Option<String>,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("clusterq").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Get effective output format (CLI > config > default)
    pub fn effective_output(&self) -> String {
        self.output.clone().unwrap_or_else(|| "text".to_string())
    }

    /// Set default inventory and save
    pub fn set_inventory(&mut self, path: PathBuf) -> Result<()> {
        self.inventory = Some(path);
        self.save()
    }

    /// Remember the last queried resource type and save
    pub fn set_last_resource(&mut self, resource: &str) -> Result<()> {
        self.last_resource = Some(resource.to_string());
        self.save()
    }
}
