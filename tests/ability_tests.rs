//! Integration tests for the abilities controller
//!
//! These tests verify that:
//! - Casts walk their timeline and start cooldowns per the ability's policy
//! - Cooldowns and charges gate new casts
//! - Cancel, interrupt and slot swaps leave the controller consistent
//! - The demo ability library loads and casts

use std::path::PathBuf;
use std::sync::Arc;

use gameplay_core::abilities::{
    AbilitiesController, Ability, AbilityCastType, AbilityDefinition, AbilityEventKind,
    AbilityLibrary, CastingState, CooldownUpdateType, DiscardPolicy, StartCooldownPolicy,
    TimelineData, TimelineEvent,
};
use gameplay_core::error::CastError;

fn arc(definition: AbilityDefinition) -> Arc<dyn Ability> {
    Arc::new(definition)
}

/// castTime 1s, cooldown 5s, cooldown starts when casting finishes.
fn bolt() -> AbilityDefinition {
    let mut definition = AbilityDefinition::new("Bolt", 5.0, TimelineData::cast(1.0));
    definition.start_cooldown = StartCooldownPolicy::AfterCasting;
    definition
}

fn controller_with(definitions: Vec<AbilityDefinition>) -> AbilitiesController {
    let mut controller = AbilitiesController::new(definitions.len());
    for (slot, definition) in definitions.into_iter().enumerate() {
        controller.set_ability(slot, Some(arc(definition))).unwrap();
    }
    controller
}

fn kinds(controller: &mut AbilitiesController) -> Vec<AbilityEventKind> {
    controller
        .drain_events()
        .into_iter()
        .map(|event| event.kind)
        .collect()
}

// =============================================================================
// Cast flow and cooldowns
// =============================================================================

#[test]
fn test_cast_then_cooldown_blocks_recast() {
    let mut controller = controller_with(vec![bolt()]);

    controller.start_channeling(0).unwrap();
    assert_eq!(controller.casting_state(), CastingState::Casting);
    assert!(!controller.is_ability_on_cd(0), "Cooldown waits for the cast to finish");

    controller.update(0.5);
    assert_eq!(controller.casting_state(), CastingState::Casting);
    assert!(!controller.is_ability_on_cd(0));

    controller.update(0.5);
    assert_eq!(controller.casting_state(), CastingState::Idle);
    assert!(controller.is_ability_on_cd(0));

    let err = controller.start_channeling(0).unwrap_err();
    assert_eq!(err, CastError::OnCooldown(0));
    assert_eq!(controller.casting_state(), CastingState::Idle);
}

#[test]
fn test_cooldown_expires_with_updates() {
    let mut controller = controller_with(vec![bolt()]);
    controller.start_channeling(0).unwrap();
    controller.update(1.0);
    assert!(controller.is_ability_on_cd(0));

    for _ in 0..4 {
        controller.update(1.0);
    }
    assert!(controller.is_ability_on_cd(0), "1s of the 5s cooldown remains");
    controller.update(1.0);
    assert!(!controller.is_ability_on_cd(0));
    assert!(controller.start_channeling(0).is_ok());
}

#[test]
fn test_manual_cooldown_update_ignores_controller_ticks() {
    let mut controller =
        controller_with(vec![bolt()]).with_cooldown_update(CooldownUpdateType::Manual);
    controller.start_channeling(0).unwrap();
    controller.update(1.0);
    controller.update(10.0);
    assert!(controller.is_ability_on_cd(0));

    controller.update_cooldowns(5.0);
    assert!(!controller.is_ability_on_cd(0));
}

#[test]
fn test_events_follow_timeline_order() {
    let mut controller = controller_with(vec![bolt()]);
    controller.start_channeling(0).unwrap();
    controller.update(1.0);

    let events = kinds(&mut controller);
    let position = |kind: AbilityEventKind| {
        events
            .iter()
            .position(|k| *k == kind)
            .unwrap_or_else(|| panic!("{:?} missing from {:?}", kind, events))
    };
    assert_eq!(events.first(), Some(&AbilityEventKind::Started));
    assert!(
        position(AbilityEventKind::Timeline(TimelineEvent::Unleashed))
            < position(AbilityEventKind::Timeline(TimelineEvent::CastFinished))
    );
    assert!(
        position(AbilityEventKind::Timeline(TimelineEvent::CastFinished))
            < position(AbilityEventKind::CooldownStarted)
    );
    assert!(position(AbilityEventKind::CooldownStarted) < position(AbilityEventKind::Finished));
    assert!(controller.drain_events().is_empty());
}

#[test]
fn test_cast_length_does_not_depend_on_frame_size() {
    let timeline = TimelineData::new(1.0, 0.0, 1.0, 0.0, 1.0, AbilityCastType::FireAndForget);
    let mut charged = AbilityDefinition::new("Charged Bolt", 5.0, timeline);
    charged.start_cooldown = StartCooldownPolicy::AfterCasting;

    // One long frame covers the whole 2s timeline
    let mut controller = controller_with(vec![charged.clone()]);
    controller.start_channeling(0).unwrap();
    controller.update(2.5);
    assert_eq!(controller.casting_state(), CastingState::Idle);
    assert!(controller.is_ability_on_cd(0));

    // Frames that straddle the channeling boundary finish at the same time
    let mut controller = controller_with(vec![charged]);
    controller.start_channeling(0).unwrap();
    controller.update(0.7);
    controller.update(0.7);
    assert_eq!(controller.casting_state(), CastingState::Casting);
    assert!(!controller.is_ability_on_cd(0));
    controller.update(0.7);
    assert_eq!(controller.casting_state(), CastingState::Idle);
    assert!(controller.is_ability_on_cd(0));
}

#[test]
fn test_only_one_current_cast() {
    let mut other = bolt();
    other.name = "Other".to_string();
    let mut controller = controller_with(vec![bolt(), other]);

    controller.start_channeling(0).unwrap();
    assert_eq!(controller.start_channeling(1), Err(CastError::AlreadyCasting));
    assert_eq!(controller.casting_slot(), Some(0));
}

#[test]
fn test_empty_and_invalid_slots() {
    let mut controller = AbilitiesController::new(2);
    assert_eq!(controller.start_channeling(0), Err(CastError::EmptySlot(0)));
    assert_eq!(controller.start_channeling(5), Err(CastError::InvalidSlot(5)));
    assert!(matches!(
        controller.set_ability(5, Some(arc(bolt()))),
        Err(CastError::InvalidSlot(5))
    ));
}

// =============================================================================
// Charges
// =============================================================================

#[test]
fn test_charges_allow_casts_during_cooldown() {
    let mut blink = AbilityDefinition::new("Blink", 3.0, TimelineData::default());
    blink.charges = 2;
    blink.start_cooldown = StartCooldownPolicy::AfterUnleash;
    let mut controller = controller_with(vec![blink]);

    // Instant: both casts resolve inside start_channeling
    controller.start_channeling(0).unwrap();
    assert_eq!(controller.casting_state(), CastingState::Idle);
    assert!(controller.is_ability_on_cd(0));
    controller.start_channeling(0).unwrap();

    let info = controller.cooldowns().info(0).unwrap();
    assert_eq!(info.available_charges, 0);
    assert_eq!(controller.start_channeling(0), Err(CastError::OnCooldown(0)));

    // One cooldown refills one charge and restarts for the next
    controller.update(3.0);
    let info = controller.cooldowns().info(0).unwrap();
    assert_eq!(info.available_charges, 1);
    assert!(controller.is_ability_on_cd(0));
    assert!(controller.start_channeling(0).is_ok());
}

#[test]
fn test_extra_charges_are_spent_first() {
    let mut controller = controller_with(vec![bolt()]);
    controller.cooldowns_mut().add_extra_charges(0, 1);

    controller.start_channeling(0).unwrap();
    controller.update(1.0);
    let info = controller.cooldowns().info(0).unwrap();
    assert_eq!(info.extra_charges, 0);
    assert_eq!(info.available_charges, 1);
}

// =============================================================================
// Cancel, interrupt and slot swaps
// =============================================================================

fn drain_life() -> AbilityDefinition {
    let mut definition = AbilityDefinition::new(
        "Drain Life",
        8.0,
        TimelineData::new(1.0, 0.5, 0.5, 0.25, 0.25, AbilityCastType::FireAndForget),
    );
    definition.start_cooldown = StartCooldownPolicy::AfterChanneling;
    definition
}

#[test]
fn test_cancel_while_channeling_drops_cast() {
    let mut controller = controller_with(vec![drain_life()]);
    controller.start_channeling(0).unwrap();
    controller.update(0.5);
    assert_eq!(controller.casting_state(), CastingState::Channeling);

    controller.cancel_cast().unwrap();
    assert_eq!(controller.casting_state(), CastingState::Idle);
    assert!(!controller.is_ability_on_cd(0));
    assert!(controller.active_casts().is_empty());
    assert!(kinds(&mut controller).contains(&AbilityEventKind::Cancelled));
}

#[test]
fn test_cancel_is_refused_while_casting() {
    let mut controller = controller_with(vec![bolt()]);
    controller.start_channeling(0).unwrap();
    assert_eq!(controller.cancel_cast(), Err(CastError::NotInterruptible));
    assert_eq!(controller.casting_state(), CastingState::Casting);

    controller.force_interrupt_cast().unwrap();
    assert_eq!(controller.casting_state(), CastingState::Idle);
    assert!(!controller.is_ability_on_cd(0));
    assert_eq!(controller.cancel_cast(), Err(CastError::NotCasting));
}

#[test]
fn test_cancel_concentration_moves_to_recovery() {
    let mut blizzard = AbilityDefinition::new(
        "Blizzard",
        12.0,
        TimelineData::new(0.0, 0.0, 0.5, 0.5, 0.5, AbilityCastType::Concentration),
    );
    blizzard.start_cooldown = StartCooldownPolicy::AfterConcentrating;
    blizzard.discard = DiscardPolicy::AfterCastingOrConcentrating;
    let mut controller = controller_with(vec![blizzard]);

    controller.start_channeling(0).unwrap();
    controller.update(0.5);
    assert_eq!(controller.casting_state(), CastingState::Concentrating);
    controller.update(10.0);
    assert_eq!(controller.casting_state(), CastingState::Concentrating);
    assert!(!controller.is_ability_on_cd(0));

    controller.cancel_cast().unwrap();
    assert_eq!(controller.casting_state(), CastingState::CastRecovery);
    assert!(controller.is_ability_on_cd(0));

    controller.update(0.5);
    assert_eq!(controller.casting_state(), CastingState::Idle);
}

#[test]
fn test_slot_swap_interrupts_current_cast() {
    let mut controller = controller_with(vec![drain_life(), bolt()]);
    controller.start_channeling(0).unwrap();
    controller.update(0.25);
    controller.drain_events();

    let previous = controller.set_ability(0, Some(arc(bolt()))).unwrap();
    assert_eq!(previous.map(|a| a.name().to_string()), Some("Drain Life".to_string()));
    assert_eq!(controller.casting_state(), CastingState::Idle);
    assert_eq!(kinds(&mut controller), vec![AbilityEventKind::Interrupted]);

    // The new ability starts with a fresh cooldown
    assert!(controller.start_channeling(0).is_ok());
}

#[test]
fn test_swapping_another_slot_keeps_casting() {
    let mut controller = controller_with(vec![drain_life(), bolt()]);
    controller.start_channeling(0).unwrap();
    controller.set_ability(1, None).unwrap();
    assert_eq!(controller.casting_state(), CastingState::Channeling);
    assert!(!controller.has_ability_in_slot(1));
}

// =============================================================================
// Demo library
// =============================================================================

fn demo_library() -> AbilityLibrary {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/abilities.ron");
    AbilityLibrary::load(&path).expect("demo abilities should load")
}

#[test]
fn test_demo_library_loads_in_file_order() {
    let library = demo_library();
    assert_eq!(
        library.names(),
        &["Fireball", "Blink", "Drain Life", "Blizzard", "Ember Trail"]
    );
    assert_eq!(library.definition("Blink").map(|d| d.charges), Some(2));
}

#[test]
fn test_lingering_effect_is_recast() {
    let library = demo_library();
    let mut controller = AbilitiesController::new(1);
    controller.set_ability(0, library.get("Ember Trail")).unwrap();

    let id = controller.start_channeling(0).unwrap();
    controller.update(0.25);
    assert_eq!(controller.casting_state(), CastingState::Idle);
    assert!(controller.is_ability_on_cd(0));
    assert_eq!(controller.active_casts().len(), 1, "Effect lingers after the cast");

    // Recasting a lingering effect skips the cooldown check
    assert_eq!(controller.start_channeling(0), Ok(id));
    assert!(kinds(&mut controller).contains(&AbilityEventKind::Recast));
    assert_eq!(controller.active_casts()[0].times_cast, 2);

    controller.update(0.25);
    for _ in 0..10 {
        controller.update(0.25);
    }
    assert!(controller.active_casts().is_empty(), "Effect discards after lingering");
}

#[test]
fn test_duplicate_definitions_are_rejected() {
    let mut library = AbilityLibrary::new();
    library.insert(bolt()).unwrap();
    assert!(library.insert(bolt()).is_err());
    assert!(AbilityLibrary::from_ron_str("(abilities: [(name: \"\", cooldown: 1.0)])", "inline")
        .is_err());
}
