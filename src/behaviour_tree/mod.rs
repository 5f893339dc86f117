//! Behaviour trees
//!
//! A tick-driven interpreter over a tree of [`BtNode`]s. Every tick evaluates
//! from the root down; composites walk their children strictly left to right,
//! advancing one child per tick.
//!
//! ## Usage
//!
//! ```ignore
//! let root = BtNode::new(Composite::sequence(vec![
//!     BtNode::new(Wait::new(1.0)),
//!     BtNode::new(DebugLog::new("done waiting")),
//! ]));
//! let mut tree = BehaviourTree::new(root);
//! while tree.update(time.delta_secs()) == NodeState::Running {}
//! ```

pub mod action;
pub mod blackboard;
pub mod composite;
pub mod decorator;
pub mod node;
pub mod template;
pub mod tree;

pub use action::{CheckFlag, DebugLog, FnAction, SetFlag, Wait};
pub use blackboard::Blackboard;
pub use composite::{Composite, CompositeKind, EmptyCompositePolicy};
pub use decorator::{Inverter, Repeater};
pub use node::{Behaviour, BtNode, NodeState, TickContext};
pub use template::{NodeFactory, NodeTemplate, TreeTemplate};
pub use tree::BehaviourTree;
