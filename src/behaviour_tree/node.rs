//! Node lifecycle
//!
//! [`BtNode`] owns one [`Behaviour`] and brackets each running episode with
//! `on_start`/`on_finish`. Behaviours only implement `evaluate`; they never
//! see the lifecycle bookkeeping.

use super::blackboard::Blackboard;

/// Result of ticking a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum NodeState {
    /// Never ticked, or reset since the last episode.
    #[default]
    Inactive,
    Running,
    Success,
    Failure,
}

impl NodeState {
    /// `Success` or `Failure`.
    pub fn is_terminal(self) -> bool {
        matches!(self, NodeState::Success | NodeState::Failure)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeState::Inactive => "Inactive",
            NodeState::Running => "Running",
            NodeState::Success => "Success",
            NodeState::Failure => "Failure",
        }
    }
}

/// Per-tick data handed down the tree.
pub struct TickContext<'a> {
    /// Seconds since the previous tick.
    pub delta_time: f32,
    pub blackboard: &'a mut Blackboard,
}

/// Node logic. Implement this for custom actions.
pub trait Behaviour: Send + Sync {
    fn name(&self) -> &str;

    /// Called once when a new running episode begins.
    fn on_start(&mut self) {}

    /// Called once when the episode ends, either with a terminal state or by reset.
    fn on_finish(&mut self) {}

    fn evaluate(&mut self, ctx: &mut TickContext) -> NodeState;

    fn children(&self) -> &[BtNode] {
        &[]
    }

    fn children_mut(&mut self) -> &mut [BtNode] {
        &mut []
    }
}

/// A node in a behaviour tree.
pub struct BtNode {
    behaviour: Box<dyn Behaviour>,
    state: NodeState,
    started: bool,
}

impl BtNode {
    pub fn new(behaviour: impl Behaviour + 'static) -> Self {
        Self::from_boxed(Box::new(behaviour))
    }

    pub fn from_boxed(behaviour: Box<dyn Behaviour>) -> Self {
        Self {
            behaviour,
            state: NodeState::Inactive,
            started: false,
        }
    }

    /// Tick this node once.
    ///
    /// A terminal result finishes the episode before it is returned, so the
    /// next call starts fresh.
    pub fn update(&mut self, ctx: &mut TickContext) -> NodeState {
        if !self.started {
            self.started = true;
            self.behaviour.on_start();
        }

        self.state = self.behaviour.evaluate(ctx);

        if self.state.is_terminal() {
            self.started = false;
            self.behaviour.on_finish();
        }

        self.state
    }

    /// Abort any running episode in this subtree and return to `Inactive`.
    pub fn reset(&mut self) {
        for child in self.behaviour.children_mut() {
            child.reset();
        }
        if self.started {
            self.started = false;
            self.behaviour.on_finish();
        }
        self.state = NodeState::Inactive;
    }

    /// State produced by the most recent tick.
    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Whether an episode is in progress.
    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn name(&self) -> &str {
        self.behaviour.name()
    }

    pub fn children(&self) -> &[BtNode] {
        self.behaviour.children()
    }

    /// Indented outline of the subtree with each node's last state.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        self.describe_into(&mut out, 0);
        out
    }

    fn describe_into(&self, out: &mut String, depth: usize) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(self.name());
        out.push_str(" [");
        out.push_str(self.state.as_str());
        out.push_str("]\n");
        for child in self.children() {
            child.describe_into(out, depth + 1);
        }
    }
}

impl std::fmt::Debug for BtNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BtNode")
            .field("name", &self.name())
            .field("state", &self.state)
            .field("children", &self.children())
            .finish()
    }
}
