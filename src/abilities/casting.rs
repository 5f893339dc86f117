//! Casting phases and the policies that hang off them.

use serde::{Deserialize, Serialize};

/// What an ability user is doing right now.
///
/// The non-idle variants are also the phases of a cast, in timeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CastingState {
    #[default]
    Idle,
    Channeling,
    OverChanneling,
    Casting,
    Concentrating,
    CastRecovery,
}

impl CastingState {
    pub fn is_casting(self) -> bool {
        self != CastingState::Idle
    }

    /// Phase after this one, `None` once recovery is over.
    pub fn next_phase(self) -> Option<CastingState> {
        match self {
            CastingState::Idle => Some(CastingState::Channeling),
            CastingState::Channeling => Some(CastingState::OverChanneling),
            CastingState::OverChanneling => Some(CastingState::Casting),
            CastingState::Casting => Some(CastingState::Concentrating),
            CastingState::Concentrating => Some(CastingState::CastRecovery),
            CastingState::CastRecovery => None,
        }
    }

    /// Phases a cast can be cancelled in.
    pub fn is_interruptible(self) -> bool {
        matches!(
            self,
            CastingState::Channeling | CastingState::OverChanneling | CastingState::Concentrating
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CastingState::Idle => "Idle",
            CastingState::Channeling => "Channeling",
            CastingState::OverChanneling => "OverChanneling",
            CastingState::Casting => "Casting",
            CastingState::Concentrating => "Concentrating",
            CastingState::CastRecovery => "CastRecovery",
        }
    }
}

/// When an ability's cooldown timer begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StartCooldownPolicy {
    /// When channeling (including overchanneling) ends.
    AfterChanneling,
    #[default]
    AfterCasting,
    /// When concentration ends. Fire-and-forget abilities pass through an empty
    /// concentration phase.
    AfterConcentrating,
    /// When the ability's effect is discarded.
    AfterDiscard,
    /// When the effect is released during the casting phase.
    AfterUnleash,
}

/// When an ability's effect object is thrown away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DiscardPolicy {
    #[default]
    AfterRecovery,
    AfterCastingOrConcentrating,
    /// The effect decides, by returning [`super::EffectStatus::Discard`].
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AbilityCastType {
    #[default]
    FireAndForget,
    /// Holds the concentration phase until finished or cancelled.
    Concentration,
}

/// Whether the controller ticks cooldowns itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CooldownUpdateType {
    #[default]
    Auto,
    /// The host calls `update_cooldowns` on its own schedule.
    Manual,
}
