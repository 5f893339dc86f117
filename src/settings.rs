//! Core settings
//!
//! Tunables for the console, ability controllers and behaviour trees, stored as
//! RON next to the executable.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::abilities::CooldownUpdateType;
use crate::behaviour_tree::EmptyCompositePolicy;

/// Settings shared by every system in [`crate::plugin::GameplayCorePlugin`]
#[derive(Resource, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreSettings {
    pub console: ConsoleSettings,
    pub abilities: AbilitySettings,
    pub behaviour_trees: BehaviourTreeSettings,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleSettings {
    /// Entries kept before the oldest is dropped
    pub log_buffer_size: usize,
    /// Log submitted lines as `UserInput` entries
    pub echo_input: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            log_buffer_size: 256,
            echo_input: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilitySettings {
    /// Upper bound on total cooldown reduction, as a fraction
    pub max_cdr: f32,
    pub cooldown_update: CooldownUpdateType,
}

impl Default for AbilitySettings {
    fn default() -> Self {
        Self {
            max_cdr: 0.9,
            cooldown_update: CooldownUpdateType::Auto,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviourTreeSettings {
    /// What a sequence or selector with no children returns
    pub empty_composite: EmptyCompositePolicy,
}

impl CoreSettings {
    /// Default settings file location
    pub fn settings_path() -> PathBuf {
        PathBuf::from("settings.ron")
    }

    /// Load from the default location, or fall back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::settings_path())
    }

    /// Load settings from `path`, or return defaults if it is missing or broken
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(contents) => match ron::from_str(&contents) {
                    Ok(settings) => {
                        info!("Loaded settings from {:?}", path);
                        settings
                    }
                    Err(e) => {
                        warn!("Failed to parse settings file: {}", e);
                        Self::default()
                    }
                },
                Err(e) => {
                    warn!("Failed to read settings file: {}", e);
                    Self::default()
                }
            }
        } else {
            info!("No settings file found, using defaults");
            Self::default()
        }
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to(&Self::settings_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, contents)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}
