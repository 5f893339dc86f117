//! Single-child nodes that transform their child's result.

use super::node::{Behaviour, BtNode, NodeState, TickContext};

/// Swaps `Success` and `Failure`. Without a child it succeeds.
#[derive(Default)]
pub struct Inverter {
    child: Option<BtNode>,
}

impl Inverter {
    pub fn new(child: BtNode) -> Self {
        Self { child: Some(child) }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Replace the child, returning the old one.
    pub fn set_child(&mut self, child: BtNode) -> Option<BtNode> {
        self.child.replace(child)
    }
}

impl Behaviour for Inverter {
    fn name(&self) -> &str {
        "Inverter"
    }

    fn evaluate(&mut self, ctx: &mut TickContext) -> NodeState {
        let Some(child) = self.child.as_mut() else {
            return NodeState::Success;
        };
        match child.update(ctx) {
            NodeState::Success => NodeState::Failure,
            NodeState::Failure => NodeState::Success,
            _ => NodeState::Running,
        }
    }

    fn children(&self) -> &[BtNode] {
        self.child.as_slice()
    }

    fn children_mut(&mut self) -> &mut [BtNode] {
        self.child.as_mut_slice()
    }
}

/// Runs its child until it has completed `times` episodes, then yields the
/// child's last terminal state.
///
/// Without a child every tick counts as a completion. `times == 0` never finishes.
pub struct Repeater {
    child: Option<BtNode>,
    times: u32,
    completed: u32,
}

impl Repeater {
    pub fn new(times: u32, child: BtNode) -> Self {
        Self {
            child: Some(child),
            times,
            completed: 0,
        }
    }

    pub fn empty(times: u32) -> Self {
        Self {
            child: None,
            times,
            completed: 0,
        }
    }

    pub fn forever(child: BtNode) -> Self {
        Self::new(0, child)
    }

    pub fn set_child(&mut self, child: BtNode) -> Option<BtNode> {
        self.child.replace(child)
    }

    /// Completions counted in the current episode.
    pub fn completed(&self) -> u32 {
        self.completed
    }

    fn done(&self) -> bool {
        self.times != 0 && self.completed >= self.times
    }
}

impl Behaviour for Repeater {
    fn name(&self) -> &str {
        "Repeater"
    }

    fn on_start(&mut self) {
        self.completed = 0;
    }

    fn on_finish(&mut self) {
        self.completed = 0;
    }

    fn evaluate(&mut self, ctx: &mut TickContext) -> NodeState {
        let result = match self.child.as_mut() {
            Some(child) => child.update(ctx),
            None => NodeState::Success,
        };

        if !result.is_terminal() {
            return NodeState::Running;
        }

        self.completed += 1;
        if self.done() {
            result
        } else {
            NodeState::Running
        }
    }

    fn children(&self) -> &[BtNode] {
        self.child.as_slice()
    }

    fn children_mut(&mut self) -> &mut [BtNode] {
        self.child.as_mut_slice()
    }
}
