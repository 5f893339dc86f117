//! gameplay_core sandbox
//!
//! Runs a headless scenario (`--headless`) or an interactive debug console on
//! stdin that drives an ability user and an optional behaviour tree.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Duration;

use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

use gameplay_core::abilities::AbilityLibrary;
use gameplay_core::cli::{self, Args};
use gameplay_core::console::{CommandArgs, ConsoleEntryType, ParamSpec};
use gameplay_core::headless::{self, ScenarioConfig};
use gameplay_core::plugin::{submit_console_line, DebugConsole};
use gameplay_core::settings::CoreSettings;

const DEMO_ABILITIES: &str = include_str!("../demos/abilities.ron");
const REPL_SLOTS: usize = 4;
const REPL_TICK_SECS: f32 = 1.0 / 60.0;

/// Simulated seconds the REPL still has to run before reading the next line
#[derive(Resource, Default)]
struct PendingWait(f32);

fn main() {
    let args = cli::parse_args();
    let settings = match &args.settings {
        Some(path) => CoreSettings::load_from(path),
        None => CoreSettings::load(),
    };

    let result = match &args.headless {
        Some(path) => run_headless(path, &args, settings),
        None => run_repl(&args, settings),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_headless(path: &Path, args: &Args, settings: CoreSettings) -> Result<(), String> {
    let mut config = ScenarioConfig::load_from_file(path)?;
    if let Some(max_duration) = args.max_duration {
        config.max_duration_secs = max_duration;
    }
    if let Some(output) = &args.output {
        config.output_path = Some(output.display().to_string());
    }
    config.validate()?;

    println!("Starting headless scenario {}...", path.display());
    println!("  Slots: {:?}", config.slots);
    println!("  Script steps: {}", config.script.len());
    println!("  Max duration: {:.0}s", config.max_duration_secs);

    let mut app = headless::build_scenario_app(&config, settings)?;
    app.add_plugins(LogPlugin::default());
    let result = headless::run_scenario_app(app, &config)?;

    println!(
        "Scenario finished after {:.2}s ({} ticks{})",
        result.elapsed,
        result.ticks,
        if result.stopped_early { ", idle" } else { "" }
    );
    println!(
        "  Tree: {}",
        result.tree_state.map_or("none", |state| state.as_str())
    );
    println!("  Casting: {}", result.casting_state.as_str());
    println!("  Activity entries: {}", result.activity.entries.len());
    if let Some(output) = &config.output_path {
        println!("  Activity log saved to: {}", output);
    }
    Ok(())
}

fn run_repl(args: &Args, settings: CoreSettings) -> Result<(), String> {
    let mut app = match &args.scenario {
        Some(path) => {
            let config = ScenarioConfig::load_from_file(path)?;
            headless::build_agent_app(&config, settings)?
        }
        None => {
            let library = AbilityLibrary::from_ron_str(DEMO_ABILITIES, "demos/abilities.ron")
                .map_err(|e| e.to_string())?;
            let config = ScenarioConfig {
                slots: vec![None; REPL_SLOTS],
                ..Default::default()
            };
            let mut app = headless::build_agent_app(&config, settings)?;
            app.insert_resource(library);
            app
        }
    };

    app.add_plugins(LogPlugin::default())
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
            REPL_TICK_SECS,
        )))
        .init_resource::<PendingWait>();

    if let Some(mut console) = app.world_mut().get_resource_mut::<DebugConsole>() {
        console.0.register(
            "wait",
            "Advances the simulation",
            vec![ParamSpec::float("seconds")],
            |world: &mut World, args: &CommandArgs| {
                let seconds = args.float(0).unwrap_or(0.0).max(0.0);
                if let Some(mut pending) = world.get_resource_mut::<PendingWait>() {
                    pending.0 += seconds;
                }
                format!("Waiting {:.2}s", seconds)
            },
        );
    }

    app.finish();
    app.cleanup();
    app.update();

    println!("Debug console ready. Type 'help' for commands, 'quit' to exit.");
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush().map_err(|e| e.to_string())?;

        let mut line = String::new();
        let read = stdin.lock().read_line(&mut line).map_err(|e| e.to_string())?;
        let line = line.trim();
        if read == 0 || line == "quit" || line == "exit" {
            break;
        }

        for entry in submit_console_line(app.world_mut(), line) {
            match entry.entry_type {
                ConsoleEntryType::UserInput => {}
                ConsoleEntryType::ConsoleMessage => println!("{}", entry.message),
                _ => println!("{}", entry),
            }
        }

        app.update();
        while app
            .world()
            .get_resource::<PendingWait>()
            .is_some_and(|pending| pending.0 > 0.0)
        {
            app.update();
            if let Some(mut pending) = app.world_mut().get_resource_mut::<PendingWait>() {
                pending.0 -= REPL_TICK_SECS;
            }
        }
    }
    Ok(())
}
