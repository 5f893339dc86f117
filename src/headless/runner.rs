//! Headless scenario execution
//!
//! Runs a scenario in a windowless app with a fixed timestep, so the same
//! config always produces the same activity log.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::collections::VecDeque;
use std::time::Duration;

use crate::abilities::{AbilityLibrary, CastingState};
use crate::activity::ActivityLog;
use crate::behaviour_tree::{NodeFactory, NodeState, TreeTemplate};
use crate::console::ConsoleEntry;
use crate::plugin::{
    agent_states, AbilityUser, ConsoleInput, CoreSystemSet, DebugConsole, GameplayCorePlugin,
    TreeAgent,
};
use crate::settings::CoreSettings;

use super::config::{ScenarioConfig, ScriptStep};

/// Name of the entity a scenario spawns
pub const SCENARIO_AGENT: &str = "agent";

/// Result of a completed headless scenario
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario time when the run stopped
    pub elapsed: f32,
    /// Frames simulated
    pub ticks: u64,
    /// Last tree result, if the scenario had a tree
    pub tree_state: Option<NodeState>,
    pub casting_state: CastingState,
    /// Whether the run stopped before `max_duration_secs`
    pub stopped_early: bool,
    pub activity: ActivityLog,
    /// Console log at the end of the run
    pub console: Vec<ConsoleEntry>,
}

/// Resource to track headless scenario state
#[derive(Resource)]
pub struct ScenarioState {
    pub max_duration: f32,
    pub elapsed: f32,
    pub ticks: u64,
    pub stop_when_idle: bool,
    /// Steps not yet submitted, in time order
    pub pending: VecDeque<ScriptStep>,
    pub complete: bool,
    pub stopped_early: bool,
}

/// Plugin for headless scenario execution
pub struct HeadlessPlugin {
    pub config: ScenarioConfig,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        let tick = Duration::from_secs_f64(1.0 / f64::from(self.config.tick_rate));

        app.insert_resource(TimeUpdateStrategy::ManualDuration(tick))
            .insert_resource(ScenarioState {
                max_duration: self.config.max_duration_secs,
                elapsed: 0.0,
                ticks: 0,
                stop_when_idle: self.config.stop_when_idle,
                pending: self.config.sorted_script().into(),
                complete: false,
                stopped_early: false,
            });

        app.add_systems(
            Update,
            headless_run_script.before(CoreSystemSet::Abilities),
        )
        .add_systems(
            Update,
            (headless_track_time, headless_check_end)
                .chain()
                .after(CoreSystemSet::Console),
        )
        .add_systems(PostUpdate, headless_exit_on_complete);
    }
}

/// Submit every script step whose time has come
fn headless_run_script(mut state: ResMut<ScenarioState>, mut input: EventWriter<ConsoleInput>) {
    let elapsed = state.elapsed;
    while state
        .pending
        .front()
        .is_some_and(|step| step.at_secs <= elapsed)
    {
        if let Some(step) = state.pending.pop_front() {
            debug!("[{:.2}s] script: {}", elapsed, step.command);
            input.send(ConsoleInput(step.command));
        }
    }
}

fn headless_track_time(time: Res<Time>, mut state: ResMut<ScenarioState>) {
    state.elapsed += time.delta_secs();
    state.ticks += 1;
}

/// Check for timeout, or for an idle agent when `stop_when_idle` is set
fn headless_check_end(
    mut state: ResMut<ScenarioState>,
    trees: Query<&TreeAgent>,
    users: Query<&AbilityUser>,
) {
    if state.complete {
        return;
    }

    if state.elapsed >= state.max_duration {
        info!("Scenario timed out after {:.2}s", state.elapsed);
        state.complete = true;
        return;
    }

    if state.stop_when_idle && state.pending.is_empty() {
        let trees_settled = trees.iter().all(|agent| agent.0.state().is_terminal());
        let users_idle = users
            .iter()
            .all(|user| user.0.casting_state() == CastingState::Idle);
        if trees_settled && users_idle {
            info!("Scenario idle after {:.2}s", state.elapsed);
            state.complete = true;
            state.stopped_early = true;
        }
    }
}

/// Exit the app when the scenario is complete
fn headless_exit_on_complete(state: Res<ScenarioState>, mut exit: EventWriter<AppExit>) {
    if state.complete {
        exit.send(AppExit::Success);
    }
}

/// Build the scenario app: [`build_agent_app`] plus the headless timing and script systems
pub fn build_scenario_app(config: &ScenarioConfig, settings: CoreSettings) -> Result<App, String> {
    let mut app = build_agent_app(config, settings)?;
    app.add_plugins(HeadlessPlugin {
        config: config.clone(),
    });
    Ok(app)
}

/// Windowless app with the core plugin, the scenario's data and its agent entity
pub fn build_agent_app(config: &ScenarioConfig, settings: CoreSettings) -> Result<App, String> {
    let library = match &config.abilities {
        Some(path) => AbilityLibrary::load(&config.resolve(path)).map_err(|e| e.to_string())?,
        None => AbilityLibrary::default(),
    };

    let factory = NodeFactory::new(settings.behaviour_trees.empty_composite);
    let tree = match &config.tree {
        Some(path) => {
            let template = TreeTemplate::load(&config.resolve(path)).map_err(|e| e.to_string())?;
            Some(factory.build_tree(&template).map_err(|e| e.to_string())?)
        }
        None => None,
    };

    let mut user = AbilityUser::from_settings(config.slots.len(), &settings.abilities);
    for (slot, name) in config.slots.iter().enumerate() {
        let Some(name) = name else {
            continue;
        };
        let ability = library
            .get(name)
            .ok_or_else(|| format!("Unknown ability in slot {}: '{}'", slot, name))?;
        user.0
            .set_ability(slot, Some(ability))
            .map_err(|e| e.to_string())?;
    }

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(library)
        .insert_resource(factory)
        .add_plugins(GameplayCorePlugin { settings });

    let mut agent = app.world_mut().spawn((Name::new(SCENARIO_AGENT), user));
    if let Some(tree) = tree {
        agent.insert(TreeAgent(tree));
    }

    Ok(app)
}

/// Run a headless scenario with the given configuration
pub fn run_scenario(
    config: &ScenarioConfig,
    settings: CoreSettings,
) -> Result<ScenarioResult, String> {
    info!(
        "Starting headless scenario: {} slots, {} script steps, max {:.0}s at {} ticks/s",
        config.slots.len(),
        config.script.len(),
        config.max_duration_secs,
        config.tick_rate
    );

    let app = build_scenario_app(config, settings)?;
    run_scenario_app(app, config)
}

/// Run an app from [`build_scenario_app`] to completion and collect its result
pub fn run_scenario_app(mut app: App, config: &ScenarioConfig) -> Result<ScenarioResult, String> {
    app.finish();
    app.cleanup();

    while app.should_exit().is_none() {
        app.update();
    }

    let world = app.world_mut();
    let (tree_state, casting_state) = agent_states(world);
    let (elapsed, ticks, stopped_early) = world
        .get_resource::<ScenarioState>()
        .map(|state| (state.elapsed, state.ticks, state.stopped_early))
        .unwrap_or_default();
    let activity = world
        .get_resource::<ActivityLog>()
        .cloned()
        .unwrap_or_default();
    let console = world
        .get_resource::<DebugConsole>()
        .map(|console| console.0.entries().cloned().collect())
        .unwrap_or_default();

    if let Some(path) = &config.output_path {
        activity.save_to_file(Some(path))?;
    }

    Ok(ScenarioResult {
        elapsed,
        ticks,
        tree_state,
        casting_state,
        stopped_early,
        activity,
        console,
    })
}
