//! Batch driver configuration
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. The embedded defaults (`slotlist.toml`)
//! 2. An optional user TOML file (`--config`), which only needs the keys
//!    it changes
//! 3. Command-line flags

use clap::ValueEnum;
use serde::Deserialize;
use std::path::Path;

/// Embedded default configuration
pub static DEFAULT_CONFIG: &str = include_str!("slotlist.toml");

/// Largest arena the driver will build
pub const MAX_CAPACITY: usize = 1 << 20;

/// Recovery strategy when an insert finds the arena full
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Report the failure and stop
    #[default]
    None,
    /// Drop the target list's first element, then retry once
    Front,
    /// Drop the target list's last element, then retry once
    Back,
}

/// Output format of the final report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Human,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SlotlistConfig {
    /// Number of slots in the shared arena
    pub capacity: usize,
    pub eviction: EvictionPolicy,
    pub report: ReportFormat,
}

impl Default for SlotlistConfig {
    fn default() -> Self {
        SlotlistConfig {
            capacity: 10,
            eviction: EvictionPolicy::None,
            report: ReportFormat::Human,
        }
    }
}

impl SlotlistConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        let config: SlotlistConfig =
            toml::from_str(toml_str).map_err(|e| format!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the embedded default configuration
    pub fn default_config() -> Result<Self, String> {
        Self::from_toml(DEFAULT_CONFIG)
    }

    /// Load a user configuration file
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
        Self::from_toml(&content)
    }

    /// Apply command-line overrides
    pub fn with_overrides(
        mut self,
        capacity: Option<usize>,
        eviction: Option<EvictionPolicy>,
        report: Option<ReportFormat>,
    ) -> Result<Self, String> {
        if let Some(capacity) = capacity {
            self.capacity = capacity;
        }
        if let Some(eviction) = eviction {
            self.eviction = eviction;
        }
        if let Some(report) = report {
            self.report = report;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("capacity must be at least 1".to_string());
        }
        if self.capacity > MAX_CAPACITY {
            return Err(format!(
                "capacity {} exceeds the maximum of {}",
                self.capacity, MAX_CAPACITY
            ));
        }
        Ok(())
    }
}
