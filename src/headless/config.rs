//! JSON configuration parsing for headless mode
//!
//! A scenario names the data files to load, the abilities to slot and a script
//! of console commands to run at given times.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One scripted console line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Scenario time at which the command is submitted
    pub at_secs: f32,
    pub command: String,
}

/// Headless scenario configuration loaded from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Behaviour tree template (RON), relative to the config file
    #[serde(default)]
    pub tree: Option<String>,
    /// Ability library (RON), relative to the config file
    #[serde(default)]
    pub abilities: Option<String>,
    /// Ability name per slot; `null` leaves a slot empty
    #[serde(default)]
    pub slots: Vec<Option<String>>,
    /// Console commands, run in `at_secs` order
    #[serde(default)]
    pub script: Vec<ScriptStep>,
    /// Maximum scenario duration in seconds (default: 30)
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f32,
    /// Simulated frames per second (default: 60)
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
    /// Custom output path for the activity log (optional)
    #[serde(default)]
    pub output_path: Option<String>,
    /// End early once the script is done, the tree has settled and nothing is being cast
    #[serde(default)]
    pub stop_when_idle: bool,
    /// Directory relative data paths are resolved against
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

fn default_max_duration() -> f32 {
    30.0
}

fn default_tick_rate() -> u32 {
    60
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            tree: None,
            abilities: None,
            slots: Vec::new(),
            script: Vec::new(),
            max_duration_secs: default_max_duration(),
            tick_rate: default_tick_rate(),
            output_path: None,
            stop_when_idle: false,
            base_dir: None,
        }
    }
}

impl ScenarioConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let mut config = Self::from_json_str(&contents)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, String> {
        let config: ScenarioConfig = serde_json::from_str(contents)
            .map_err(|e| format!("Failed to parse JSON: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_duration_secs <= 0.0 {
            return Err("max_duration_secs must be positive".to_string());
        }
        if self.tick_rate == 0 {
            return Err("tick_rate must be positive".to_string());
        }

        let named_slots = self.slots.iter().flatten().count();
        if named_slots > 0 && self.abilities.is_none() {
            return Err("slots name abilities but no abilities file is given".to_string());
        }
        if self.slots.iter().flatten().any(|name| name.trim().is_empty()) {
            return Err("slot ability names must not be empty".to_string());
        }

        for step in &self.script {
            if step.at_secs < 0.0 {
                return Err(format!(
                    "script step '{}' has negative at_secs {}",
                    step.command, step.at_secs
                ));
            }
            if step.command.trim().is_empty() {
                return Err("script commands must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Resolve a data path against the config file's directory
    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Script steps sorted by time, keeping file order for ties
    pub fn sorted_script(&self) -> Vec<ScriptStep> {
        let mut script = self.script.clone();
        script.sort_by(|a, b| a.at_secs.total_cmp(&b.at_secs));
        script
    }
}
