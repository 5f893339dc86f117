//! Data-driven ability definitions
//!
//! Abilities whose behaviour is just "run the timeline" can be declared in a RON
//! file instead of code:
//!
//! ```ron
//! (
//!     abilities: [
//!         (
//!             name: "Fireball",
//!             cooldown: 5.0,
//!             timeline: (cast_time: 1.0, unleash_at: 1.0),
//!             start_cooldown: AfterCasting,
//!         ),
//!     ],
//! )
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::ability::{Ability, AbilityBehaviour, EffectStatus};
use super::casting::{CastingState, DiscardPolicy, StartCooldownPolicy};
use super::timeline::{TimelineData, TimelineEvent};
use crate::error::ConfigError;

fn default_charges() -> u32 {
    1
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AbilityDefinition {
    pub name: String,
    /// Base cooldown in seconds.
    #[serde(default)]
    pub cooldown: f32,
    #[serde(default)]
    pub category: u32,
    #[serde(default = "default_charges")]
    pub charges: u32,
    #[serde(default)]
    pub timeline: TimelineData,
    #[serde(default)]
    pub start_cooldown: StartCooldownPolicy,
    #[serde(default)]
    pub discard: DiscardPolicy,
    /// Seconds the effect lingers after the timeline ends. Only used with `Manual` discard.
    #[serde(default)]
    pub linger: f32,
}

impl AbilityDefinition {
    pub fn new(name: impl Into<String>, cooldown: f32, timeline: TimelineData) -> Self {
        Self {
            name: name.into(),
            cooldown,
            category: 0,
            charges: 1,
            timeline,
            start_cooldown: StartCooldownPolicy::default(),
            discard: DiscardPolicy::default(),
            linger: 0.0,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidAbility {
            name: self.name.clone(),
            reason: reason.to_string(),
        };
        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        let valid_seconds = |value: f32| value.is_finite() && value >= 0.0;
        if !valid_seconds(self.cooldown) {
            return Err(invalid("cooldown must be a non-negative number"));
        }
        if self.charges == 0 {
            return Err(invalid("charges must be at least 1"));
        }
        let t = &self.timeline;
        if ![
            t.channeling_time,
            t.overchanneling_time,
            t.cast_time,
            t.recovery_time,
            t.unleash_at,
        ]
        .into_iter()
        .all(valid_seconds)
        {
            return Err(invalid("timeline durations must be non-negative numbers"));
        }
        if !valid_seconds(self.linger) {
            return Err(invalid("linger must be a non-negative number"));
        }
        Ok(())
    }
}

impl Ability for AbilityDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn cooldown(&self) -> f32 {
        self.cooldown
    }

    fn category(&self) -> u32 {
        self.category
    }

    fn charges(&self) -> u32 {
        self.charges
    }

    fn timeline(&self) -> TimelineData {
        self.timeline
    }

    fn start_cooldown_policy(&self) -> StartCooldownPolicy {
        self.start_cooldown
    }

    fn discard_policy(&self) -> DiscardPolicy {
        self.discard
    }

    fn cast(&self, _slot: usize) -> Box<dyn AbilityBehaviour> {
        Box::new(DefinedEffect {
            name: self.name.clone(),
            linger: self.linger,
            lingered: 0.0,
        })
    }
}

/// Effect of a data-defined ability: logs its timeline and lingers for a fixed time.
struct DefinedEffect {
    name: String,
    linger: f32,
    lingered: f32,
}

impl AbilityBehaviour for DefinedEffect {
    fn on_timeline_event(&mut self, event: TimelineEvent) {
        debug!("{}: {:?}", self.name, event);
        if event == TimelineEvent::Unleashed {
            info!("{} unleashed", self.name);
        }
    }

    fn on_update(&mut self, delta_time: f32, state: CastingState) -> EffectStatus {
        if state.is_casting() {
            return EffectStatus::Active;
        }
        self.lingered += delta_time;
        if self.lingered >= self.linger {
            EffectStatus::Discard
        } else {
            EffectStatus::Active
        }
    }

    fn on_recast_requested(&mut self, times_cast: u32) {
        self.lingered = 0.0;
        info!("{} recast ({} times)", self.name, times_cast);
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AbilitiesFile {
    abilities: Vec<AbilityDefinition>,
}

/// Named ability definitions, shared by every controller that slots them.
#[derive(Resource, Debug, Default, Clone)]
pub struct AbilityLibrary {
    definitions: HashMap<String, Arc<AbilityDefinition>>,
    order: Vec<String>,
}

impl AbilityLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, definition: AbilityDefinition) -> Result<(), ConfigError> {
        definition.validate()?;
        if self.definitions.contains_key(&definition.name) {
            return Err(ConfigError::DuplicateAbility(definition.name));
        }
        self.order.push(definition.name.clone());
        self.definitions
            .insert(definition.name.clone(), Arc::new(definition));
        Ok(())
    }

    pub fn from_ron_str(contents: &str, source: &str) -> Result<Self, ConfigError> {
        let file: AbilitiesFile = ron::from_str(contents).map_err(|e| ConfigError::Parse {
            path: source.to_string(),
            message: e.to_string(),
        })?;
        let mut library = Self::new();
        for definition in file.abilities {
            library.insert(definition)?;
        }
        Ok(library)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: source.clone(),
            message: e.to_string(),
        })?;
        let library = Self::from_ron_str(&contents, &source)?;
        info!("Loaded {} ability definitions from {}", library.len(), source);
        Ok(library)
    }

    /// Shared handle. Repeated lookups return the same ability instance.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Ability>> {
        self.definitions
            .get(name)
            .map(|definition| definition.clone() as Arc<dyn Ability>)
    }

    pub fn definition(&self, name: &str) -> Option<&AbilityDefinition> {
        self.definitions.get(name).map(Arc::as_ref)
    }

    /// Names in file order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
