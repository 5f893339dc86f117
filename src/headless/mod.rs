//! Headless mode for scripted runs
//!
//! Runs a scenario without any window, suitable for automated testing and
//! reproducing ability timing bugs.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -- --headless demos/fireball_scenario.json
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "abilities": "abilities.ron",
//!   "tree": "patrol_tree.ron",
//!   "slots": ["Fireball", null, "Blink"],
//!   "script": [
//!     { "at_secs": 0.0, "command": "cast 0" },
//!     { "at_secs": 0.5, "command": "cancel" }
//!   ],
//!   "max_duration_secs": 10,
//!   "stop_when_idle": true
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::{ScenarioConfig, ScriptStep};
pub use runner::{
    build_agent_app, build_scenario_app, run_scenario, run_scenario_app, ScenarioResult,
    SCENARIO_AGENT,
};
