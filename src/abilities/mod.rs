//! Ability casting and cooldowns
//!
//! An [`AbilitiesController`] owns a user's ability slots. Casting a slot runs
//! the ability's [`CastTimeline`]; the ability's [`StartCooldownPolicy`] picks
//! the timeline event that starts its cooldown in the [`CooldownHandler`].
//!
//! ## Usage
//!
//! ```ignore
//! let mut controller = AbilitiesController::new(4);
//! controller.set_ability(0, library.get("Fireball"))?;
//! controller.start_casting(0)?;
//! controller.update(time.delta_secs());
//! ```

pub mod ability;
pub mod casting;
pub mod controller;
pub mod cooldown;
pub mod library;
pub mod timeline;

pub use ability::{
    Ability, AbilityBehaviour, AbilityEvent, AbilityEventKind, CastId, EffectStatus, NoEffect,
};
pub use casting::{
    AbilityCastType, CastingState, CooldownUpdateType, DiscardPolicy, StartCooldownPolicy,
};
pub use controller::{AbilitiesController, CastSnapshot};
pub use cooldown::{CooldownHandler, CooldownInfo, CooldownSpec};
pub use library::{AbilityDefinition, AbilityLibrary};
pub use timeline::{CastTimeline, TimelineData, TimelineEvent, TimelineState};
