//! Tree root and its blackboard.

use super::blackboard::Blackboard;
use super::node::{BtNode, NodeState, TickContext};

/// A root node plus the memory its nodes share.
#[derive(Debug)]
pub struct BehaviourTree {
    root: BtNode,
    blackboard: Blackboard,
    state: NodeState,
    ticks: u64,
}

impl BehaviourTree {
    pub fn new(root: BtNode) -> Self {
        Self::with_blackboard(root, Blackboard::new())
    }

    pub fn with_blackboard(root: BtNode, blackboard: Blackboard) -> Self {
        Self {
            root,
            blackboard,
            state: NodeState::Inactive,
            ticks: 0,
        }
    }

    /// Tick the root once with `delta_time` seconds.
    pub fn update(&mut self, delta_time: f32) -> NodeState {
        let mut ctx = TickContext {
            delta_time,
            blackboard: &mut self.blackboard,
        };
        self.state = self.root.update(&mut ctx);
        self.ticks += 1;
        self.state
    }

    /// Abort the running episode. The blackboard is left alone.
    pub fn reset(&mut self) {
        self.root.reset();
        self.state = NodeState::Inactive;
    }

    /// Swap in a new root, aborting the old one.
    pub fn set_root(&mut self, root: BtNode) -> BtNode {
        self.root.reset();
        self.state = NodeState::Inactive;
        std::mem::replace(&mut self.root, root)
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn root(&self) -> &BtNode {
        &self.root
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }

    pub fn describe(&self) -> String {
        self.root.describe()
    }
}
