//! gameplay_core
//!
//! Decision and scheduling primitives for Bevy games: tick-driven behaviour
//! trees, ability casting with cooldowns and charges, an index-tracked binary
//! heap, and a debug console with overloaded commands.
//!
//! This library exposes the core modules for testing and reuse; the binary
//! adds a headless scenario runner and an interactive console.

pub mod abilities;
pub mod activity;
pub mod behaviour_tree;
pub mod cli;
pub mod console;
pub mod error;
pub mod headless;
pub mod heap;
pub mod plugin;
pub mod settings;

// Re-export commonly used types
pub use abilities::{AbilitiesController, AbilityLibrary, CastingState};
pub use activity::{ActivityEventType, ActivityLog};
pub use behaviour_tree::{BehaviourTree, BtNode, NodeState};
pub use console::{Console, ConsoleEntry, ConsoleEntryType};
pub use headless::ScenarioConfig;
pub use heap::{Heap, HeapItem, HeapOrder};
pub use plugin::GameplayCorePlugin;
pub use settings::CoreSettings;
