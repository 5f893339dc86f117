//! Ability and effect traits.

use bevy::prelude::Event;
use serde::{Deserialize, Serialize};

use super::casting::{CastingState, DiscardPolicy, StartCooldownPolicy};
use super::cooldown::CooldownSpec;
use super::timeline::{TimelineData, TimelineEvent};

/// A castable ability. Implementations are shared between slots and controllers.
pub trait Ability: Send + Sync {
    fn name(&self) -> &str;

    /// Base cooldown in seconds, before CDR.
    fn cooldown(&self) -> f32;

    /// Grouping key for category CDR.
    fn category(&self) -> u32 {
        0
    }

    fn charges(&self) -> u32 {
        1
    }

    fn timeline(&self) -> TimelineData;

    fn start_cooldown_policy(&self) -> StartCooldownPolicy {
        StartCooldownPolicy::AfterCasting
    }

    fn discard_policy(&self) -> DiscardPolicy {
        DiscardPolicy::AfterRecovery
    }

    /// Host-side veto, e.g. not enough resources.
    fn can_cast(&self) -> bool {
        true
    }

    /// Create the effect object for a new cast from `slot`.
    fn cast(&self, slot: usize) -> Box<dyn AbilityBehaviour>;

    fn cooldown_spec(&self) -> CooldownSpec {
        CooldownSpec {
            cooldown: self.cooldown(),
            category: self.category(),
            charges: self.charges(),
        }
    }
}

/// Returned from [`AbilityBehaviour::on_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EffectStatus {
    #[default]
    Active,
    /// Request a discard. Honoured for every discard policy.
    Discard,
}

/// The live effect of one cast.
pub trait AbilityBehaviour: Send + Sync {
    /// Every timeline event of the cast, including `Unleashed`.
    fn on_timeline_event(&mut self, _event: TimelineEvent) {}

    fn on_update(&mut self, _delta_time: f32, _state: CastingState) -> EffectStatus {
        EffectStatus::Active
    }

    /// The same ability was cast again while this effect lingered.
    fn on_recast_requested(&mut self, _times_cast: u32) {}

    fn on_cancel_requested(&mut self, _state: CastingState) {}

    fn on_forced_interrupt(&mut self) {}

    fn on_discard(&mut self) {}
}

/// An effect with no behaviour of its own.
#[derive(Debug, Default)]
pub struct NoEffect;

impl AbilityBehaviour for NoEffect {}

/// Identifies one cast for as long as its effect lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CastId(pub u64);

impl std::fmt::Display for CastId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityEventKind {
    Started,
    Recast,
    Timeline(TimelineEvent),
    CooldownStarted,
    /// The cast left the controller's current slot (recovery finished).
    Finished,
    Cancelled,
    Interrupted,
    Discarded,
}

/// Something a controller did, for logs and game reactions.
#[derive(Event, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityEvent {
    pub cast: CastId,
    pub slot: usize,
    pub ability: String,
    pub kind: AbilityEventKind,
}
