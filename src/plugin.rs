//! Bevy integration
//!
//! Behaviour trees and ability controllers are plain components ticked once
//! per frame with the virtual time delta. The debug console is a resource whose
//! commands operate on the whole `World`.

use std::sync::Arc;

use bevy::prelude::*;

use crate::abilities::{AbilitiesController, AbilityEvent, AbilityLibrary, CastingState};
use crate::activity::{ActivityEventType, ActivityLog};
use crate::behaviour_tree::{BehaviourTree, NodeFactory, NodeState};
use crate::console::{CommandArgs, CommandOutput, Console, ConsoleEntry, ParamSpec};
use crate::error::CastError;
use crate::settings::{AbilitySettings, CoreSettings};

/// An entity driven by a behaviour tree
#[derive(Component, Debug)]
pub struct TreeAgent(pub BehaviourTree);

/// An entity with ability slots
#[derive(Component, Debug)]
pub struct AbilityUser(pub AbilitiesController);

impl AbilityUser {
    pub fn from_settings(slot_count: usize, settings: &AbilitySettings) -> Self {
        let mut controller =
            AbilitiesController::new(slot_count).with_cooldown_update(settings.cooldown_update);
        controller.cooldowns_mut().set_max_cdr(settings.max_cdr);
        Self(controller)
    }
}

/// The in-game console. Commands receive the world they run in.
#[derive(Resource, Debug, Default)]
pub struct DebugConsole(pub Console<World>);

/// A line typed into the console, processed during [`CoreSystemSet::Console`]
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct ConsoleInput(pub String);

/// System set labels for core system ordering.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum CoreSystemSet {
    /// Activity clock, cooldowns and casts
    Abilities,
    /// Behaviour tree ticks
    Trees,
    /// Queued console input
    Console,
}

/// Chains the core sets. Call once before adding core systems.
pub fn configure_core_system_ordering(app: &mut App) {
    app.configure_sets(
        Update,
        (
            CoreSystemSet::Abilities,
            CoreSystemSet::Trees,
            CoreSystemSet::Console,
        )
            .chain(),
    );
}

/// Adds the per-frame core systems.
///
/// # Example
/// ```ignore
/// add_core_systems(&mut app, in_state(GameState::Playing));
/// add_core_systems(&mut app, || true);
/// ```
pub fn add_core_systems<M>(app: &mut App, run_condition: impl Condition<M> + Clone)
where
    M: 'static,
{
    app.add_systems(
        Update,
        (advance_activity_clock, tick_ability_users)
            .chain()
            .in_set(CoreSystemSet::Abilities)
            .run_if(run_condition.clone()),
    );

    app.add_systems(
        Update,
        tick_behaviour_trees
            .in_set(CoreSystemSet::Trees)
            .run_if(run_condition.clone()),
    );

    app.add_systems(
        Update,
        process_console_input
            .in_set(CoreSystemSet::Console)
            .run_if(run_condition),
    );
}

/// Registers core resources, events, systems and console commands.
#[derive(Default)]
pub struct GameplayCorePlugin {
    pub settings: CoreSettings,
}

impl Plugin for GameplayCorePlugin {
    fn build(&self, app: &mut App) {
        let mut console = Console::from_settings(&self.settings.console);
        register_core_commands(&mut console);

        app.insert_resource(self.settings.clone())
            .insert_resource(DebugConsole(console))
            .init_resource::<ActivityLog>()
            .init_resource::<AbilityLibrary>()
            .add_event::<AbilityEvent>()
            .add_event::<ConsoleInput>();

        if !app.world().contains_resource::<NodeFactory>() {
            app.insert_resource(NodeFactory::new(
                self.settings.behaviour_trees.empty_composite,
            ));
        }

        configure_core_system_ordering(app);
        add_core_systems(app, || true);
    }
}

fn owner_label(entity: Entity, name: Option<&Name>) -> String {
    match name {
        Some(name) => name.as_str().to_string(),
        None => format!("{}", entity),
    }
}

fn advance_activity_clock(time: Res<Time>, mut activity: ResMut<ActivityLog>) {
    activity.advance(time.delta_secs());
}

/// Update every ability controller and forward its events.
pub fn tick_ability_users(
    time: Res<Time>,
    mut users: Query<(Entity, &mut AbilityUser, Option<&Name>)>,
    mut activity: ResMut<ActivityLog>,
    mut events: EventWriter<AbilityEvent>,
) {
    let dt = time.delta_secs();
    for (entity, mut user, name) in &mut users {
        user.0.update(dt);
        let owner = owner_label(entity, name);
        for event in user.0.drain_events() {
            activity.log_ability_event(&owner, &event);
            events.send(event);
        }
    }
}

/// Tick every tree once. A settled tree starts a new episode next frame.
pub fn tick_behaviour_trees(
    time: Res<Time>,
    mut agents: Query<(Entity, &mut TreeAgent, Option<&Name>)>,
    mut activity: ResMut<ActivityLog>,
) {
    let dt = time.delta_secs();
    for (entity, mut agent, name) in &mut agents {
        let previous = agent.0.state();
        let state = agent.0.update(dt);
        if state.is_terminal() && state != previous {
            let owner = owner_label(entity, name);
            debug!("{}: tree finished with {}", owner, state.as_str());
            activity.log(
                ActivityEventType::TreeResult,
                format!("{}: tree finished with {}", owner, state.as_str()),
            );
        }
    }
}

/// Run queued [`ConsoleInput`] lines against the world.
pub fn process_console_input(world: &mut World) {
    let lines: Vec<String> = match world.get_resource_mut::<Events<ConsoleInput>>() {
        Some(mut events) => events.drain().map(|input| input.0).collect(),
        None => return,
    };
    for line in lines {
        submit_console_line(world, &line);
    }
}

/// Submit one line to the [`DebugConsole`] right away. Returns the entries it added.
pub fn submit_console_line(world: &mut World, line: &str) -> Vec<ConsoleEntry> {
    let added = if world.contains_resource::<DebugConsole>() {
        world.resource_scope(|world, mut console: Mut<DebugConsole>| console.0.submit(world, line))
    } else {
        Vec::new()
    };
    if let Some(mut activity) = world.get_resource_mut::<ActivityLog>() {
        for entry in &added {
            activity.log_console_entry(entry);
        }
    }
    added
}

// ============================================================================
// Console commands
// ============================================================================

/// First entity with `C`, or the one whose `Name` is `target`.
fn find_target<C: Component>(world: &mut World, target: Option<&str>) -> Option<Entity> {
    let mut query = world.query_filtered::<(Entity, Option<&Name>), With<C>>();
    let mut found: Vec<(Entity, Option<String>)> = query
        .iter(world)
        .map(|(entity, name)| (entity, name.map(|n| n.as_str().to_string())))
        .collect();
    found.sort_by_key(|(entity, _)| *entity);
    match target {
        None => found.first().map(|(entity, _)| *entity),
        Some(target) => found
            .into_iter()
            .find(|(_, name)| name.as_deref() == Some(target))
            .map(|(entity, _)| entity),
    }
}

fn missing_target(kind: &str, target: Option<&str>) -> CommandOutput {
    match target {
        Some(name) => ConsoleEntry::error(format!("No {} named '{}'", kind, name)).into(),
        None => ConsoleEntry::error(format!("No {} in the world", kind)).into(),
    }
}

fn with_ability_user(
    world: &mut World,
    target: Option<&str>,
    f: impl FnOnce(&mut AbilitiesController) -> CommandOutput,
) -> CommandOutput {
    let user = find_target::<AbilityUser>(world, target)
        .and_then(|entity| world.get_mut::<AbilityUser>(entity));
    match user {
        Some(mut user) => f(&mut user.0),
        None => missing_target("ability user", target),
    }
}

fn with_tree_agent(
    world: &mut World,
    target: Option<&str>,
    f: impl FnOnce(&mut BehaviourTree) -> CommandOutput,
) -> CommandOutput {
    let agent = find_target::<TreeAgent>(world, target)
        .and_then(|entity| world.get_mut::<TreeAgent>(entity));
    match agent {
        Some(mut agent) => f(&mut agent.0),
        None => missing_target("tree agent", target),
    }
}

fn cast_result(result: Result<(), CastError>, done: String) -> CommandOutput {
    match result {
        Ok(()) => done.into(),
        Err(e) => ConsoleEntry::warning(e.to_string()).into(),
    }
}

/// Register `id` twice: as given, and with a leading `target` name.
fn register_targeted<F>(
    console: &mut Console<World>,
    id: &str,
    description: &str,
    params: Vec<ParamSpec>,
    handler: F,
) where
    F: Fn(&mut World, Option<&str>, &CommandArgs) -> CommandOutput + Send + Sync + 'static,
{
    let handler = Arc::new(handler);
    let untargeted = Arc::clone(&handler);
    console.register(
        id,
        description,
        params.clone(),
        move |world: &mut World, args: &CommandArgs| untargeted(world, None, args),
    );

    let mut targeted_params = vec![ParamSpec::string("target")];
    targeted_params.extend(params);
    console.register(
        id,
        description,
        targeted_params,
        move |world: &mut World, args: &CommandArgs| {
            let target = args.str(0).map(str::to_string);
            handler(world, target.as_deref(), &args.skip(1))
        },
    );
}

fn slot_arg(args: &CommandArgs, index: usize) -> usize {
    args.uint(index)
        .and_then(|slot| usize::try_from(slot).ok())
        .unwrap_or(usize::MAX)
}

/// Commands for time, ability users and tree agents.
pub fn register_core_commands(console: &mut Console<World>) {
    console.register(
        "timescale.get",
        "Gets the current TimeScale",
        Vec::new(),
        |world: &mut World, _: &CommandArgs| -> CommandOutput {
            match world.get_resource::<Time<Virtual>>() {
                Some(time) => format!("Timescale: {}", time.relative_speed()).into(),
                None => ConsoleEntry::error("No virtual clock").into(),
            }
        },
    );

    console.register(
        "timescale.set",
        "Sets the TimeScale",
        vec![ParamSpec::float("value")],
        |world: &mut World, args: &CommandArgs| -> CommandOutput {
            let value = args.float(0).unwrap_or(1.0);
            if value < 0.0 {
                return ConsoleEntry::warning("Timescale must not be negative").into();
            }
            match world.get_resource_mut::<Time<Virtual>>() {
                Some(mut time) => {
                    time.set_relative_speed(value);
                    format!("Timescale is now: {}", time.relative_speed()).into()
                }
                None => ConsoleEntry::error("No virtual clock").into(),
            }
        },
    );

    register_targeted(
        console,
        "cast",
        "Casts the ability in a slot",
        vec![ParamSpec::uint("slot")],
        |world, target, args| {
            let slot = slot_arg(args, 0);
            with_ability_user(world, target, |controller| {
                match controller.start_casting(slot) {
                    Ok(id) => {
                        // Instant abilities are already done; name the slot's ability.
                        let name = controller
                            .ability(slot)
                            .map(|a| a.name().to_string())
                            .unwrap_or_default();
                        format!("Casting {} {}", name, id).into()
                    }
                    Err(e) => ConsoleEntry::warning(e.to_string()).into(),
                }
            })
        },
    );

    register_targeted(
        console,
        "channel",
        "Starts channeling the ability in a slot",
        vec![ParamSpec::uint("slot")],
        |world, target, args| {
            let slot = slot_arg(args, 0);
            with_ability_user(world, target, |controller| {
                match controller.start_channeling(slot) {
                    Ok(id) => format!("Channeling {}", id).into(),
                    Err(e) => ConsoleEntry::warning(e.to_string()).into(),
                }
            })
        },
    );

    register_targeted(
        console,
        "cancel",
        "Cancels the current cast",
        Vec::new(),
        |world, target, _| {
            with_ability_user(world, target, |controller| {
                cast_result(controller.cancel_cast(), "Cast cancelled".to_string())
            })
        },
    );

    register_targeted(
        console,
        "interrupt",
        "Force-interrupts the current cast",
        Vec::new(),
        |world, target, _| {
            with_ability_user(world, target, |controller| {
                cast_result(
                    controller.force_interrupt_cast(),
                    "Cast interrupted".to_string(),
                )
            })
        },
    );

    register_targeted(
        console,
        "concentrate.finish",
        "Ends the concentration phase of the current cast",
        Vec::new(),
        |world, target, _| {
            with_ability_user(world, target, |controller| {
                cast_result(
                    controller.finish_concentration(),
                    "Concentration finished".to_string(),
                )
            })
        },
    );

    register_targeted(
        console,
        "equip",
        "Puts a library ability in a slot",
        vec![ParamSpec::uint("slot"), ParamSpec::string("ability")],
        |world, target, args| {
            let slot = slot_arg(args, 0);
            let name = args.str(1).unwrap_or_default().to_string();
            let Some(ability) = world
                .get_resource::<AbilityLibrary>()
                .and_then(|library| library.get(&name))
            else {
                return ConsoleEntry::warning(format!("Unknown ability: {}", name)).into();
            };
            with_ability_user(world, target, |controller| {
                match controller.set_ability(slot, Some(ability)) {
                    Ok(_) => format!("Slot {} is now {}", slot, name).into(),
                    Err(e) => ConsoleEntry::warning(e.to_string()).into(),
                }
            })
        },
    );

    register_targeted(
        console,
        "cooldowns",
        "Lists slot cooldowns and charges",
        Vec::new(),
        |world, target, _| {
            with_ability_user(world, target, |controller| {
                let state = controller.casting_state();
                let mut lines = vec![format!("State: {}", state.as_str())];
                for slot in 0..controller.slot_count() {
                    let name = controller
                        .ability(slot)
                        .map(|a| a.name().to_string())
                        .unwrap_or_else(|| "-".to_string());
                    match controller.cooldowns().info(slot) {
                        Some(info) => lines.push(format!(
                            "{}: {} cd {:.2}/{:.2} charges {}/{} (+{})",
                            slot,
                            name,
                            info.current_cooldown,
                            info.max_cooldown,
                            info.available_charges,
                            info.max_charges,
                            info.extra_charges
                        )),
                        None => lines.push(format!("{}: {}", slot, name)),
                    }
                }
                lines.join("\n").into()
            })
        },
    );

    register_targeted(
        console,
        "tree.state",
        "Shows the tree result and tick count",
        Vec::new(),
        |world, target, _| {
            with_tree_agent(world, target, |tree| {
                format!("{} ({} ticks)\n{}", tree.state().as_str(), tree.ticks(), tree.describe())
                    .into()
            })
        },
    );

    register_targeted(
        console,
        "tree.reset",
        "Aborts the running tree episode",
        Vec::new(),
        |world, target, _| {
            with_tree_agent(world, target, |tree| {
                tree.reset();
                "Tree reset".into()
            })
        },
    );

    register_targeted(
        console,
        "flag",
        "Sets a boolean blackboard property",
        vec![ParamSpec::string("key"), ParamSpec::bool("value")],
        |world, target, args| {
            let key = args.str(0).unwrap_or_default().to_string();
            let value = args.bool(1).unwrap_or(false);
            with_tree_agent(world, target, |tree| {
                tree.blackboard_mut().set(key.clone(), value);
                format!("{} = {}", key, value).into()
            })
        },
    );
}

/// Snapshot used by headless runs and tests.
pub fn agent_states(world: &mut World) -> (Option<NodeState>, CastingState) {
    let tree_state = find_target::<TreeAgent>(world, None)
        .and_then(|entity| world.get::<TreeAgent>(entity))
        .map(|agent| agent.0.state());
    let casting_state = find_target::<AbilityUser>(world, None)
        .and_then(|entity| world.get::<AbilityUser>(entity))
        .map(|user| user.0.casting_state())
        .unwrap_or(CastingState::Idle);
    (tree_state, casting_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::{AbilityDefinition, TimelineData};
    use crate::behaviour_tree::{BtNode, CheckFlag};
    use crate::console::ConsoleEntryType;

    fn test_world() -> World {
        let mut world = World::new();
        world.insert_resource(Time::<Virtual>::default());
        world.insert_resource(ActivityLog::default());

        let mut library = AbilityLibrary::new();
        library
            .insert(AbilityDefinition::new("Fireball", 5.0, TimelineData::cast(1.0)))
            .unwrap();
        world.insert_resource(library);

        let mut console = Console::new(64);
        register_core_commands(&mut console);
        world.insert_resource(DebugConsole(console));

        world.spawn((
            Name::new("hero"),
            AbilityUser::from_settings(2, &AbilitySettings::default()),
            TreeAgent(BehaviourTree::new(BtNode::new(CheckFlag::new("ready")))),
        ));
        world
    }

    fn last_message(entries: &[ConsoleEntry]) -> &ConsoleEntry {
        entries.last().unwrap()
    }

    #[test]
    fn test_timescale_commands() {
        let mut world = test_world();
        let out = submit_console_line(&mut world, "timescale.set 0.5");
        assert_eq!(last_message(&out).message, "Timescale is now: 0.5");
        assert_eq!(world.resource::<Time<Virtual>>().relative_speed(), 0.5);

        let out = submit_console_line(&mut world, "timescale.get");
        assert_eq!(last_message(&out).message, "Timescale: 0.5");

        let out = submit_console_line(&mut world, "timescale.set -1");
        assert_eq!(last_message(&out).entry_type, ConsoleEntryType::Warning);
    }

    #[test]
    fn test_equip_and_cast() {
        let mut world = test_world();
        submit_console_line(&mut world, "equip 0 Fireball");
        let out = submit_console_line(&mut world, "cast 0");
        assert_eq!(last_message(&out).message, "Casting Fireball #1");
        assert_eq!(agent_states(&mut world).1, CastingState::Casting);

        let out = submit_console_line(&mut world, "cast 0");
        assert_eq!(last_message(&out).entry_type, ConsoleEntryType::Warning);
    }

    #[test]
    fn test_targeted_overload_by_name() {
        let mut world = test_world();
        let out = submit_console_line(&mut world, "equip hero 1 Fireball");
        assert_eq!(last_message(&out).message, "Slot 1 is now Fireball");

        let out = submit_console_line(&mut world, "cast villain 1");
        assert_eq!(last_message(&out), &ConsoleEntry::error("No ability user named 'villain'"));
    }

    #[test]
    fn test_unknown_ability_is_a_warning() {
        let mut world = test_world();
        let out = submit_console_line(&mut world, "equip 0 Frostbolt");
        assert_eq!(last_message(&out), &ConsoleEntry::warning("Unknown ability: Frostbolt"));
    }

    #[test]
    fn test_flag_reaches_blackboard() {
        let mut world = test_world();
        submit_console_line(&mut world, "flag ready true");

        let mut query = world.query::<&mut TreeAgent>();
        let mut agent = query.single_mut(&mut world);
        assert_eq!(agent.0.update(0.1), NodeState::Success);
    }

    #[test]
    fn test_console_lines_reach_activity_log() {
        let mut world = test_world();
        submit_console_line(&mut world, "nonsense");
        let activity = world.resource::<ActivityLog>();
        assert_eq!(activity.filter_by_type(ActivityEventType::Console).len(), 2);
    }

    #[test]
    fn test_plugin_runs_frames() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_plugins(GameplayCorePlugin::default());
        app.world_mut().spawn(TreeAgent(BehaviourTree::new(BtNode::new(CheckFlag::new("x")))));
        app.world_mut().send_event(ConsoleInput("flag x true".to_string()));

        app.update();
        app.update();

        let (tree_state, casting_state) = agent_states(app.world_mut());
        assert_eq!(tree_state, Some(NodeState::Success));
        assert_eq!(casting_state, CastingState::Idle);
        assert!(!app.world().resource::<DebugConsole>().0.is_empty());
    }
}
