//! Configuration loading and validation

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub assembly: AssemblyConfig,
    #[serde(default)]
    pub stepper: StepperConfig,
    #[serde(default, rename = "trigger")]
    pub triggers: Vec<TriggerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyConfig {
    /// Path to the assembly manifest (TOML or JSON)
    #[serde(default = "default_assembly_path")]
    pub path: String,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            path: default_assembly_path(),
        }
    }
}

fn default_assembly_path() -> String {
    "./assembly.toml".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepperConfig {
    /// Pause between units while going to a step, in milliseconds
    #[serde(default = "default_step_speed")]
    pub step_speed_ms: u64,
    /// Step the `x` command goes to
    #[serde(default = "default_go_to_step")]
    pub go_to_step: String,
}

impl Default for StepperConfig {
    fn default() -> Self {
        Self {
            step_speed_ms: default_step_speed(),
            go_to_step: default_go_to_step(),
        }
    }
}

impl StepperConfig {
    pub fn step_speed(&self) -> Duration {
        Duration::from_millis(self.step_speed_ms)
    }
}

fn default_step_speed() -> u64 {
    200
}

fn default_go_to_step() -> String {
    "2.67".to_string()
}

/// Maps an external trigger (e.g. a tracked instruction page) to a step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Trigger identifier reported by the host
    pub id: String,
    /// Step to go to when the trigger fires
    pub step: String,
}

impl Config {
    /// Trigger table keyed by trigger id
    pub fn trigger_table(&self) -> HashMap<String, String> {
        self.triggers
            .iter()
            .map(|t| (t.id.clone(), t.step.clone()))
            .collect()
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), triggers = config.triggers.len(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}
