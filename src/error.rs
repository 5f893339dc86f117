//! Error types
//!
//! Every fallible operation in the core returns one of these. Precondition
//! violations and policy rejections are both reported as values; callers decide
//! whether a rejection is worth logging.

use thiserror::Error;

/// Misuse of a [`crate::heap::Heap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeapError {
    #[error("heap is full (capacity {capacity})")]
    CapacityExceeded { capacity: usize },
    #[error("heap is empty")]
    Empty,
    #[error("item is not tracked by this heap")]
    UntrackedItem,
}

/// Failures while building or loading behaviour trees.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    #[error("no action registered under id '{0}'")]
    UnknownAction(String),
    #[error("failed to read tree template {path}: {message}")]
    Io { path: String, message: String },
    #[error("failed to parse tree template: {0}")]
    Parse(String),
}

/// Failed blackboard lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlackboardError {
    #[error("blackboard has no property '{0}'")]
    Missing(String),
    #[error("blackboard property '{key}' is not a {expected}")]
    WrongType { key: String, expected: &'static str },
}

/// Reasons a cast request or cast control call was rejected.
///
/// A rejected request never changes controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CastError {
    #[error("slot {0} does not exist")]
    InvalidSlot(usize),
    #[error("slot {0} has no ability")]
    EmptySlot(usize),
    #[error("ability in slot {0} is on cooldown")]
    OnCooldown(usize),
    #[error("ability in slot {0} has no charges left")]
    NoCharges(usize),
    #[error("ability in slot {0} is on cast prevention")]
    CastPrevented(usize),
    #[error("another ability is already being cast")]
    AlreadyCasting,
    #[error("ability in slot {0} refused to be cast")]
    CannotCast(usize),
    #[error("no cast in progress")]
    NotCasting,
    #[error("current cast phase cannot be cancelled")]
    NotInterruptible,
    #[error("current cast is not concentrating")]
    NotConcentrating,
    #[error("no active cast with id {0}")]
    UnknownCast(u64),
}

/// Failures while loading ability data files.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },
    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
    #[error("invalid ability '{name}': {reason}")]
    InvalidAbility { name: String, reason: String },
    #[error("duplicate ability name '{0}'")]
    DuplicateAbility(String),
}

/// Console dispatch failures. The message is what the console shows the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Unknown Command: {0}")]
    UnknownCommand(String),
    #[error("Correct {usage}")]
    BadArguments { id: String, usage: String },
}
