//! Sequence and selector nodes.
//!
//! Both walk their children left to right with a cursor. One child is ticked
//! per tick; when that child settles, the cursor moves on and the composite
//! reports `Running` until every child it needed has been visited.

use serde::{Deserialize, Serialize};

use super::node::{Behaviour, BtNode, NodeState, TickContext};

/// Result of a composite with no children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmptyCompositePolicy {
    #[default]
    Succeed,
    Fail,
}

impl EmptyCompositePolicy {
    pub fn state(self) -> NodeState {
        match self {
            EmptyCompositePolicy::Succeed => NodeState::Success,
            EmptyCompositePolicy::Fail => NodeState::Failure,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeKind {
    /// Succeeds when every child succeeds; fails on the first failure.
    Sequence,
    /// Fails when every child fails; succeeds on the first success.
    Selector,
}

impl CompositeKind {
    /// The child outcome that moves the cursor forward.
    fn advances_on(self) -> NodeState {
        match self {
            CompositeKind::Sequence => NodeState::Success,
            CompositeKind::Selector => NodeState::Failure,
        }
    }
}

pub struct Composite {
    kind: CompositeKind,
    children: Vec<BtNode>,
    cursor: usize,
    empty_policy: EmptyCompositePolicy,
}

impl Composite {
    pub fn new(kind: CompositeKind, children: Vec<BtNode>) -> Self {
        Self {
            kind,
            children,
            cursor: 0,
            empty_policy: EmptyCompositePolicy::default(),
        }
    }

    pub fn sequence(children: Vec<BtNode>) -> Self {
        Self::new(CompositeKind::Sequence, children)
    }

    pub fn selector(children: Vec<BtNode>) -> Self {
        Self::new(CompositeKind::Selector, children)
    }

    pub fn with_empty_policy(mut self, policy: EmptyCompositePolicy) -> Self {
        self.empty_policy = policy;
        self
    }

    pub fn kind(&self) -> CompositeKind {
        self.kind
    }

    /// Index of the child the next tick evaluates.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn add_child(&mut self, child: BtNode) {
        self.children.push(child);
    }

    pub fn remove_child(&mut self, index: usize) -> Option<BtNode> {
        if index >= self.children.len() {
            return None;
        }
        let mut removed = self.children.remove(index);
        removed.reset();
        if self.cursor > index {
            self.cursor -= 1;
        }
        Some(removed)
    }
}

impl Behaviour for Composite {
    fn name(&self) -> &str {
        match self.kind {
            CompositeKind::Sequence => "Sequence",
            CompositeKind::Selector => "Selector",
        }
    }

    fn on_start(&mut self) {
        self.cursor = 0;
    }

    fn on_finish(&mut self) {
        self.cursor = 0;
    }

    fn evaluate(&mut self, ctx: &mut TickContext) -> NodeState {
        if self.children.is_empty() {
            return self.empty_policy.state();
        }
        if self.cursor >= self.children.len() {
            // Cursor ran past a removed tail child.
            return self.kind.advances_on();
        }

        let state = self.children[self.cursor].update(ctx);
        if state == self.kind.advances_on() {
            self.cursor += 1;
            if self.cursor >= self.children.len() {
                state
            } else {
                NodeState::Running
            }
        } else if state.is_terminal() {
            state
        } else {
            NodeState::Running
        }
    }

    fn children(&self) -> &[BtNode] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut [BtNode] {
        &mut self.children
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviour_tree::blackboard::Blackboard;

    struct Fixed(NodeState);

    impl Behaviour for Fixed {
        fn name(&self) -> &str {
            "Fixed"
        }

        fn evaluate(&mut self, _ctx: &mut TickContext) -> NodeState {
            self.0
        }
    }

    fn fixed(state: NodeState) -> BtNode {
        BtNode::new(Fixed(state))
    }

    fn tick(node: &mut BtNode, blackboard: &mut Blackboard) -> NodeState {
        node.update(&mut TickContext {
            delta_time: 0.016,
            blackboard,
        })
    }

    #[test]
    fn test_empty_composite_follows_policy() {
        let mut blackboard = Blackboard::new();
        let mut succeed = BtNode::new(Composite::sequence(vec![]));
        let mut fail = BtNode::new(
            Composite::selector(vec![]).with_empty_policy(EmptyCompositePolicy::Fail),
        );
        assert_eq!(tick(&mut succeed, &mut blackboard), NodeState::Success);
        assert_eq!(tick(&mut fail, &mut blackboard), NodeState::Failure);
    }

    #[test]
    fn test_sequence_stops_on_running_child() {
        let mut blackboard = Blackboard::new();
        let mut node = BtNode::new(Composite::sequence(vec![
            fixed(NodeState::Running),
            fixed(NodeState::Failure),
        ]));
        for _ in 0..3 {
            assert_eq!(tick(&mut node, &mut blackboard), NodeState::Running);
        }
    }

    #[test]
    fn test_remove_child_keeps_cursor_on_same_child() {
        let mut composite = Composite::sequence(vec![
            fixed(NodeState::Success),
            fixed(NodeState::Success),
            fixed(NodeState::Running),
        ]);
        let mut blackboard = Blackboard::new();
        let mut ctx = TickContext {
            delta_time: 0.0,
            blackboard: &mut blackboard,
        };
        composite.on_start();
        composite.evaluate(&mut ctx);
        composite.evaluate(&mut ctx);
        assert_eq!(composite.cursor(), 2);

        assert!(composite.remove_child(0).is_some());
        assert_eq!(composite.cursor(), 1);
        assert!(composite.remove_child(9).is_none());
    }
}
