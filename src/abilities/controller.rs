//! Abilities controller
//!
//! Owns an ability user's slots, their cooldowns and every cast whose effect is
//! still alive. At most one cast is *current* (moving through its timeline under
//! the user's control); effects of earlier casts may linger until discarded.
//!
//! Swapping the ability in a slot force-interrupts the current cast if it came
//! from that slot. Lingering effects of the old ability keep running but no
//! longer touch the slot's cooldown or charges.

use std::collections::VecDeque;
use std::sync::Arc;

use bevy::prelude::*;

use super::ability::{
    Ability, AbilityBehaviour, AbilityEvent, AbilityEventKind, CastId, EffectStatus,
};
use super::casting::{CastingState, CooldownUpdateType, DiscardPolicy, StartCooldownPolicy};
use super::cooldown::CooldownHandler;
use super::timeline::{CastTimeline, TimelineEvent, TimelineState};
use crate::error::CastError;

struct ActiveCast {
    id: CastId,
    slot: usize,
    ability: Arc<dyn Ability>,
    timeline: CastTimeline,
    /// `None` once discarded.
    behaviour: Option<Box<dyn AbilityBehaviour>>,
    times_cast: u32,
}

impl ActiveCast {
    fn is_done(&self) -> bool {
        self.behaviour.is_none() && self.timeline.state() != TimelineState::Running
    }

    fn is_lingering(&self) -> bool {
        self.behaviour.is_some() && self.timeline.state() == TimelineState::Finished
    }
}

/// Read-only view of a live cast.
#[derive(Debug, Clone, PartialEq)]
pub struct CastSnapshot {
    pub id: CastId,
    pub slot: usize,
    pub ability: String,
    pub phase: CastingState,
    pub timeline_state: TimelineState,
    pub total_elapsed: f32,
    pub effect_alive: bool,
    pub times_cast: u32,
}

fn same_ability(a: &Arc<dyn Ability>, b: &Arc<dyn Ability>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// Undrained events kept per controller; the oldest are dropped past this.
pub const MAX_PENDING_EVENTS: usize = 256;

fn emit(events: &mut VecDeque<AbilityEvent>, cast: &ActiveCast, kind: AbilityEventKind) {
    if events.len() >= MAX_PENDING_EVENTS {
        events.pop_front();
    }
    events.push_back(AbilityEvent {
        cast: cast.id,
        slot: cast.slot,
        ability: cast.ability.name().to_string(),
        kind,
    });
}

pub struct AbilitiesController {
    slots: Vec<Option<Arc<dyn Ability>>>,
    cooldowns: CooldownHandler,
    casts: Vec<ActiveCast>,
    current: Option<CastId>,
    next_cast_id: u64,
    cooldown_update: CooldownUpdateType,
    events: VecDeque<AbilityEvent>,
}

impl AbilitiesController {
    pub fn new(slot_count: usize) -> Self {
        Self {
            slots: vec![None; slot_count],
            cooldowns: CooldownHandler::new(slot_count),
            casts: Vec::new(),
            current: None,
            next_cast_id: 1,
            cooldown_update: CooldownUpdateType::Auto,
            events: VecDeque::new(),
        }
    }

    pub fn with_cooldown_update(mut self, update: CooldownUpdateType) -> Self {
        self.cooldown_update = update;
        self
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn cooldown_update(&self) -> CooldownUpdateType {
        self.cooldown_update
    }

    pub fn set_cooldown_update(&mut self, update: CooldownUpdateType) {
        self.cooldown_update = update;
    }

    pub fn cooldowns(&self) -> &CooldownHandler {
        &self.cooldowns
    }

    pub fn cooldowns_mut(&mut self) -> &mut CooldownHandler {
        &mut self.cooldowns
    }

    /// Put `ability` in `slot`, returning what was there.
    ///
    /// The slot's cooldown and charges start fresh.
    pub fn set_ability(
        &mut self,
        slot: usize,
        ability: Option<Arc<dyn Ability>>,
    ) -> Result<Option<Arc<dyn Ability>>, CastError> {
        if slot >= self.slots.len() {
            return Err(CastError::InvalidSlot(slot));
        }
        if self.casting_slot() == Some(slot) {
            // Ignore NotCasting: casting_slot() guarantees a current cast.
            let _ = self.force_interrupt_cast();
        }
        self.cooldowns
            .set_slot(slot, ability.as_ref().map(|a| a.cooldown_spec()));
        Ok(std::mem::replace(&mut self.slots[slot], ability))
    }

    pub fn ability(&self, slot: usize) -> Option<&Arc<dyn Ability>> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Slot holding an ability with this name.
    pub fn find_slot(&self, name: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|a| a.name() == name))
    }

    pub fn has_ability_in_slot(&self, slot: usize) -> bool {
        self.ability(slot).is_some()
    }

    pub fn is_ability_on_cd(&self, slot: usize) -> bool {
        self.cooldowns.is_on_cooldown(slot)
    }

    /// Phase of the current cast, `Idle` when not casting.
    pub fn casting_state(&self) -> CastingState {
        self.current_cast()
            .map_or(CastingState::Idle, |cast| cast.timeline.phase())
    }

    pub fn current_cast_id(&self) -> Option<CastId> {
        self.current
    }

    pub fn casting_ability(&self) -> Option<&Arc<dyn Ability>> {
        self.current_cast().map(|cast| &cast.ability)
    }

    pub fn casting_slot(&self) -> Option<usize> {
        self.current_cast().map(|cast| cast.slot)
    }

    pub fn active_casts(&self) -> Vec<CastSnapshot> {
        self.casts
            .iter()
            .map(|cast| CastSnapshot {
                id: cast.id,
                slot: cast.slot,
                ability: cast.ability.name().to_string(),
                phase: cast.timeline.phase(),
                timeline_state: cast.timeline.state(),
                total_elapsed: cast.timeline.total_elapsed(),
                effect_alive: cast.behaviour.is_some(),
                times_cast: cast.times_cast,
            })
            .collect()
    }

    /// Events recorded since the last drain, oldest first.
    ///
    /// Only the newest [`MAX_PENDING_EVENTS`] are kept, so a caller that never
    /// drains does not grow the buffer without bound.
    pub fn events(&self) -> impl Iterator<Item = &AbilityEvent> {
        self.events.iter()
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    pub fn drain_events(&mut self) -> Vec<AbilityEvent> {
        self.events.drain(..).collect()
    }

    /// Begin casting the ability in `slot` from its first phase.
    ///
    /// Phases with no duration resolve immediately, so an instant ability has
    /// finished by the time this returns. If the same ability still has a
    /// lingering effect and nothing else is being cast, the effect is recast
    /// instead and no cooldown or charge check applies.
    pub fn start_channeling(&mut self, slot: usize) -> Result<CastId, CastError> {
        let ability = self
            .slots
            .get(slot)
            .ok_or(CastError::InvalidSlot(slot))?
            .clone()
            .ok_or(CastError::EmptySlot(slot))?;

        if !ability.can_cast() {
            return Err(CastError::CannotCast(slot));
        }

        if self.current.is_none() {
            if let Some(index) = self
                .casts
                .iter()
                .position(|cast| cast.is_lingering() && same_ability(&cast.ability, &ability))
            {
                return Ok(self.recast(index));
            }
        }

        self.check_cast_allowed(slot)?;
        if self.current.is_some() {
            return Err(CastError::AlreadyCasting);
        }

        let id = CastId(self.next_cast_id);
        self.next_cast_id += 1;

        let mut timeline = CastTimeline::new(ability.timeline());
        timeline.start();
        let behaviour = ability.cast(slot);
        info!("Cast {} started: {} (slot {})", id, ability.name(), slot);

        self.casts.push(ActiveCast {
            id,
            slot,
            ability,
            timeline,
            behaviour: Some(behaviour),
            times_cast: 1,
        });
        self.current = Some(id);
        let index = self.casts.len() - 1;
        emit(&mut self.events, &self.casts[index], AbilityEventKind::Started);

        self.tick_cast(index, 0.0);
        self.remove_done();
        Ok(id)
    }

    /// Same as [`Self::start_channeling`]; abilities without channeling time go
    /// straight to the casting phase.
    pub fn start_casting(&mut self, slot: usize) -> Result<CastId, CastError> {
        self.start_channeling(slot)
    }

    /// Advance cooldowns (when `Auto`) and every live cast.
    pub fn update(&mut self, delta_time: f32) {
        if self.cooldown_update == CooldownUpdateType::Auto {
            self.update_cooldowns(delta_time);
        }
        for index in (0..self.casts.len()).rev() {
            self.tick_cast(index, delta_time);
        }
        self.remove_done();
    }

    pub fn update_cooldowns(&mut self, delta_time: f32) {
        self.cooldowns.update(delta_time);
    }

    /// Cancel the current cast.
    ///
    /// While channeling or overchanneling the cast is dropped without starting
    /// a cooldown. While concentrating, concentration ends and the cast moves
    /// on to recovery as if finished normally.
    pub fn cancel_cast(&mut self) -> Result<(), CastError> {
        let index = self.current_index().ok_or(CastError::NotCasting)?;
        let phase = self.casts[index].timeline.phase();
        if !phase.is_interruptible() {
            return Err(CastError::NotInterruptible);
        }

        if let Some(behaviour) = self.casts[index].behaviour.as_mut() {
            behaviour.on_cancel_requested(phase);
        }
        emit(&mut self.events, &self.casts[index], AbilityEventKind::Cancelled);

        if phase == CastingState::Concentrating {
            let events = self.casts[index].timeline.finish_concentration();
            self.apply_timeline_events(index, &events);
        } else {
            let cast = self.casts.remove(index);
            self.current = None;
            info!("Cast {} cancelled: {}", cast.id, cast.ability.name());
        }
        self.remove_done();
        Ok(())
    }

    /// Abort the current cast in any phase. No cooldown starts and the effect is dropped.
    pub fn force_interrupt_cast(&mut self) -> Result<(), CastError> {
        let index = self.current_index().ok_or(CastError::NotCasting)?;
        let mut cast = self.casts.remove(index);
        if let Some(behaviour) = cast.behaviour.as_mut() {
            behaviour.on_forced_interrupt();
        }
        self.current = None;
        emit(&mut self.events, &cast, AbilityEventKind::Interrupted);
        info!("Cast {} interrupted: {}", cast.id, cast.ability.name());
        Ok(())
    }

    /// End the concentration phase of the current cast.
    pub fn finish_concentration(&mut self) -> Result<(), CastError> {
        let index = self.current_index().ok_or(CastError::NotCasting)?;
        if self.casts[index].timeline.phase() != CastingState::Concentrating {
            return Err(CastError::NotConcentrating);
        }
        let events = self.casts[index].timeline.finish_concentration();
        self.apply_timeline_events(index, &events);
        self.remove_done();
        Ok(())
    }

    pub fn skip_overchanneling(&mut self, skip: bool) -> Result<(), CastError> {
        let index = self.current_index().ok_or(CastError::NotCasting)?;
        let events = self.casts[index].timeline.skip_overchanneling(skip);
        self.apply_timeline_events(index, &events);
        self.remove_done();
        Ok(())
    }

    /// Discard a cast's effect by hand.
    pub fn discard(&mut self, id: CastId) -> Result<(), CastError> {
        let index = self
            .casts
            .iter()
            .position(|cast| cast.id == id && cast.behaviour.is_some())
            .ok_or(CastError::UnknownCast(id.0))?;
        self.discard_at(index);
        self.remove_done();
        Ok(())
    }

    fn current_cast(&self) -> Option<&ActiveCast> {
        let id = self.current?;
        self.casts.iter().find(|cast| cast.id == id)
    }

    fn current_index(&self) -> Option<usize> {
        let id = self.current?;
        self.casts.iter().position(|cast| cast.id == id)
    }

    fn check_cast_allowed(&self, slot: usize) -> Result<(), CastError> {
        let multi_charge = self
            .cooldowns
            .info(slot)
            .is_some_and(|info| info.max_charges > 1);
        let has_charges = self.cooldowns.has_charges(slot);
        let on_cooldown = self.cooldowns.is_on_cooldown(slot);

        if multi_charge {
            if !has_charges && on_cooldown {
                return Err(CastError::OnCooldown(slot));
            }
        } else {
            if on_cooldown {
                return Err(CastError::OnCooldown(slot));
            }
            if !has_charges {
                return Err(CastError::NoCharges(slot));
            }
        }

        if self.cooldowns.is_on_cast_prevention(slot) {
            return Err(CastError::CastPrevented(slot));
        }
        Ok(())
    }

    fn recast(&mut self, index: usize) -> CastId {
        let cast = &mut self.casts[index];
        cast.times_cast += 1;
        cast.timeline.start();
        if let Some(behaviour) = cast.behaviour.as_mut() {
            behaviour.on_recast_requested(cast.times_cast);
        }
        let id = cast.id;
        info!("Cast {} recast: {} (x{})", id, cast.ability.name(), cast.times_cast);

        self.current = Some(id);
        emit(&mut self.events, &self.casts[index], AbilityEventKind::Recast);
        self.tick_cast(index, 0.0);
        self.remove_done();
        id
    }

    fn tick_cast(&mut self, index: usize, delta_time: f32) {
        let events = self.casts[index].timeline.update(delta_time);
        self.apply_timeline_events(index, &events);

        let cast = &mut self.casts[index];
        let phase = cast.timeline.phase();
        let status = cast
            .behaviour
            .as_mut()
            .map(|behaviour| behaviour.on_update(delta_time, phase));
        if status == Some(EffectStatus::Discard) {
            self.discard_at(index);
        }
    }

    fn apply_timeline_events(&mut self, index: usize, events: &[TimelineEvent]) {
        for &event in events {
            let cast = &mut self.casts[index];
            if let Some(behaviour) = cast.behaviour.as_mut() {
                behaviour.on_timeline_event(event);
            }
            let policy = cast.ability.start_cooldown_policy();
            let discard_policy = cast.ability.discard_policy();
            emit(&mut self.events, &self.casts[index], AbilityEventKind::Timeline(event));

            match event {
                TimelineEvent::ChannelingFinished => {}
                TimelineEvent::OverchannelingFinished => {
                    if policy == StartCooldownPolicy::AfterChanneling {
                        self.start_cooldown(index);
                    }
                }
                TimelineEvent::Unleashed => {
                    if self.owns_slot(index) {
                        let slot = self.casts[index].slot;
                        self.cooldowns.consume_charges(slot, 1);
                    }
                    if policy == StartCooldownPolicy::AfterUnleash {
                        self.start_cooldown(index);
                    }
                }
                TimelineEvent::CastFinished => {
                    if policy == StartCooldownPolicy::AfterCasting {
                        self.start_cooldown(index);
                    }
                }
                TimelineEvent::ConcentrationFinished => {
                    if policy == StartCooldownPolicy::AfterConcentrating {
                        self.start_cooldown(index);
                    }
                    if discard_policy == DiscardPolicy::AfterCastingOrConcentrating {
                        self.discard_at(index);
                    }
                }
                TimelineEvent::RecoveryFinished => {
                    let id = self.casts[index].id;
                    if self.current == Some(id) {
                        self.current = None;
                        emit(&mut self.events, &self.casts[index], AbilityEventKind::Finished);
                        info!("Cast {} finished: {}", id, self.casts[index].ability.name());
                    }
                    if discard_policy == DiscardPolicy::AfterRecovery {
                        self.discard_at(index);
                    }
                }
            }
        }
    }

    /// Whether the cast's ability is still the one in its slot.
    fn owns_slot(&self, index: usize) -> bool {
        let cast = &self.casts[index];
        self.ability(cast.slot)
            .is_some_and(|ability| same_ability(ability, &cast.ability))
    }

    fn start_cooldown(&mut self, index: usize) {
        if !self.owns_slot(index) {
            return;
        }
        let slot = self.casts[index].slot;
        if self.cooldowns.put_on_cooldown(slot, false) {
            debug!(
                "Slot {} on cooldown for {:.2}s",
                slot,
                self.cooldowns.info(slot).map_or(0.0, |info| info.current_cooldown)
            );
            emit(&mut self.events, &self.casts[index], AbilityEventKind::CooldownStarted);
        }
    }

    fn discard_at(&mut self, index: usize) {
        let Some(mut behaviour) = self.casts[index].behaviour.take() else {
            return;
        };
        behaviour.on_discard();
        emit(&mut self.events, &self.casts[index], AbilityEventKind::Discarded);
        if self.casts[index].ability.start_cooldown_policy() == StartCooldownPolicy::AfterDiscard {
            self.start_cooldown(index);
        }
    }

    fn remove_done(&mut self) {
        self.casts.retain(|cast| !cast.is_done());
    }
}

impl std::fmt::Debug for AbilitiesController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots: Vec<Option<&str>> = self
            .slots
            .iter()
            .map(|slot| slot.as_ref().map(|a| a.name()))
            .collect();
        f.debug_struct("AbilitiesController")
            .field("slots", &slots)
            .field("casting_state", &self.casting_state())
            .field("active_casts", &self.casts.len())
            .field("cooldowns", &self.cooldowns)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::ability::NoEffect;
    use crate::abilities::casting::AbilityCastType;
    use crate::abilities::timeline::TimelineData;

    struct Bolt {
        timeline: TimelineData,
        cooldown: f32,
        policy: StartCooldownPolicy,
    }

    impl Ability for Bolt {
        fn name(&self) -> &str {
            "Bolt"
        }

        fn cooldown(&self) -> f32 {
            self.cooldown
        }

        fn timeline(&self) -> TimelineData {
            self.timeline
        }

        fn start_cooldown_policy(&self) -> StartCooldownPolicy {
            self.policy
        }

        fn cast(&self, _slot: usize) -> Box<dyn AbilityBehaviour> {
            Box::new(NoEffect)
        }
    }

    fn controller_with(
        timeline: TimelineData,
        policy: StartCooldownPolicy,
    ) -> AbilitiesController {
        let mut controller = AbilitiesController::new(2);
        controller
            .set_ability(
                0,
                Some(Arc::new(Bolt {
                    timeline,
                    cooldown: 5.0,
                    policy,
                })),
            )
            .unwrap();
        controller
    }

    #[test]
    fn test_invalid_and_empty_slots_are_rejected() {
        let mut controller =
            controller_with(TimelineData::cast(1.0), StartCooldownPolicy::AfterCasting);
        assert_eq!(controller.start_channeling(7), Err(CastError::InvalidSlot(7)));
        assert_eq!(controller.start_channeling(1), Err(CastError::EmptySlot(1)));
        assert_eq!(controller.casting_state(), CastingState::Idle);
    }

    #[test]
    fn test_instant_cast_resolves_on_start() {
        let mut controller =
            controller_with(TimelineData::default(), StartCooldownPolicy::AfterCasting);
        controller.start_casting(0).unwrap();
        assert_eq!(controller.casting_state(), CastingState::Idle);
        assert!(controller.is_ability_on_cd(0));
        assert!(controller.active_casts().is_empty());
    }

    #[test]
    fn test_second_cast_while_casting_is_rejected() {
        let mut controller =
            controller_with(TimelineData::cast(1.0), StartCooldownPolicy::AfterCasting);
        controller.set_ability(1, controller.ability(0).cloned()).unwrap();
        controller.start_casting(0).unwrap();
        assert_eq!(controller.start_casting(1), Err(CastError::AlreadyCasting));
        assert_eq!(controller.casting_slot(), Some(0));
    }

    #[test]
    fn test_cancel_during_casting_is_not_allowed() {
        let mut controller =
            controller_with(TimelineData::cast(1.0), StartCooldownPolicy::AfterCasting);
        controller.start_casting(0).unwrap();
        assert_eq!(controller.cancel_cast(), Err(CastError::NotInterruptible));
        assert_eq!(controller.casting_state(), CastingState::Casting);
    }

    #[test]
    fn test_events_are_drained() {
        let mut controller =
            controller_with(TimelineData::default(), StartCooldownPolicy::AfterCasting);
        controller.start_casting(0).unwrap();
        let events = controller.drain_events();
        assert_eq!(events.first().map(|e| e.kind), Some(AbilityEventKind::Started));
        assert!(events
            .iter()
            .any(|e| e.kind == AbilityEventKind::CooldownStarted));
        assert_eq!(controller.pending_events(), 0);
    }

    #[test]
    fn test_undrained_events_are_bounded() {
        let mut controller = AbilitiesController::new(1);
        let instant = Bolt {
            timeline: TimelineData::default(),
            cooldown: 0.0,
            policy: StartCooldownPolicy::AfterCasting,
        };
        controller.set_ability(0, Some(Arc::new(instant))).unwrap();

        for _ in 0..200 {
            controller.start_casting(0).unwrap();
        }
        assert_eq!(controller.pending_events(), MAX_PENDING_EVENTS);

        let events = controller.drain_events();
        assert_eq!(events.len(), MAX_PENDING_EVENTS);
        assert!(events.iter().all(|e| e.cast != CastId(1)), "Oldest casts dropped first");
        assert!(events.iter().any(|e| e.cast == CastId(200)));
        assert_eq!(controller.pending_events(), 0);
    }

    #[test]
    fn test_long_frame_finishes_cast_and_starts_cooldown() {
        let timeline = TimelineData::new(1.0, 0.0, 1.0, 0.0, 1.0, AbilityCastType::FireAndForget);
        let mut controller = controller_with(timeline, StartCooldownPolicy::AfterCasting);
        controller.start_channeling(0).unwrap();
        assert_eq!(controller.casting_state(), CastingState::Channeling);

        controller.update(2.5);
        assert_eq!(controller.casting_state(), CastingState::Idle);
        assert!(controller.is_ability_on_cd(0));
        assert!(controller.active_casts().is_empty());
    }
}
