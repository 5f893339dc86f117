//! Data-driven tree construction
//!
//! Trees are described in RON and realised through a [`NodeFactory`], which
//! also knows the host-defined actions referenced by id.
//!
//! ```ron
//! (
//!     root: Selector([
//!         Sequence([CheckFlag("enemy_visible"), Action("attack")]),
//!         Repeater(times: 3, child: Some(Wait(0.5))),
//!     ]),
//! )
//! ```

use std::collections::HashMap;
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::action::{CheckFlag, DebugLog, SetFlag, Wait};
use super::composite::{Composite, CompositeKind, EmptyCompositePolicy};
use super::decorator::{Inverter, Repeater};
use super::node::{Behaviour, BtNode};
use super::tree::BehaviourTree;
use crate::error::TreeError;

/// Serialized form of a node. Children are listed in evaluation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeTemplate {
    Sequence(Vec<NodeTemplate>),
    Selector(Vec<NodeTemplate>),
    Inverter(Option<Box<NodeTemplate>>),
    Repeater {
        times: u32,
        #[serde(default)]
        child: Option<Box<NodeTemplate>>,
    },
    Wait(f32),
    DebugLog(String),
    CheckFlag(String),
    SetFlag {
        key: String,
        value: bool,
    },
    /// Host action registered on the factory.
    Action(String),
}

/// A whole tree as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeTemplate {
    pub root: NodeTemplate,
    /// Overrides the factory's empty-composite policy for this tree.
    #[serde(default)]
    pub empty_composite: Option<EmptyCompositePolicy>,
}

impl TreeTemplate {
    pub fn from_ron_str(contents: &str) -> Result<Self, TreeError> {
        ron::from_str(contents).map_err(|e| TreeError::Parse(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, TreeError> {
        let contents = std::fs::read_to_string(path).map_err(|e| TreeError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let template = Self::from_ron_str(&contents)?;
        info!("Loaded behaviour tree template from {:?}", path);
        Ok(template)
    }

    pub fn to_ron_string(&self) -> Result<String, TreeError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| TreeError::Parse(e.to_string()))
    }
}

type ActionConstructor = Box<dyn Fn() -> Box<dyn Behaviour> + Send + Sync>;

/// Turns templates into live nodes.
#[derive(Resource, Default)]
pub struct NodeFactory {
    actions: HashMap<String, ActionConstructor>,
    empty_composite: EmptyCompositePolicy,
}

impl NodeFactory {
    pub fn new(empty_composite: EmptyCompositePolicy) -> Self {
        Self {
            actions: HashMap::new(),
            empty_composite,
        }
    }

    /// Register a host action. A later registration under the same id replaces the earlier one.
    pub fn register<B, F>(&mut self, id: impl Into<String>, constructor: F) -> &mut Self
    where
        B: Behaviour + 'static,
        F: Fn() -> B + Send + Sync + 'static,
    {
        let id = id.into();
        if self.actions.contains_key(&id) {
            warn!("Replacing behaviour tree action '{}'", id);
        }
        self.actions.insert(
            id,
            Box::new(move || Box::new(constructor()) as Box<dyn Behaviour>),
        );
        self
    }

    pub fn has_action(&self, id: &str) -> bool {
        self.actions.contains_key(id)
    }

    pub fn empty_composite(&self) -> EmptyCompositePolicy {
        self.empty_composite
    }

    /// Build a node and its whole subtree.
    pub fn build(&self, template: &NodeTemplate) -> Result<BtNode, TreeError> {
        self.build_with_policy(template, self.empty_composite)
    }

    pub fn build_tree(&self, template: &TreeTemplate) -> Result<BehaviourTree, TreeError> {
        let policy = template.empty_composite.unwrap_or(self.empty_composite);
        let root = self.build_with_policy(&template.root, policy)?;
        Ok(BehaviourTree::new(root))
    }

    fn build_with_policy(
        &self,
        template: &NodeTemplate,
        policy: EmptyCompositePolicy,
    ) -> Result<BtNode, TreeError> {
        let node = match template {
            NodeTemplate::Sequence(children) => {
                BtNode::new(self.composite(CompositeKind::Sequence, children, policy)?)
            }
            NodeTemplate::Selector(children) => {
                BtNode::new(self.composite(CompositeKind::Selector, children, policy)?)
            }
            NodeTemplate::Inverter(child) => match child {
                Some(child) => BtNode::new(Inverter::new(self.build_with_policy(child, policy)?)),
                None => BtNode::new(Inverter::empty()),
            },
            NodeTemplate::Repeater { times, child } => match child {
                Some(child) => {
                    BtNode::new(Repeater::new(*times, self.build_with_policy(child, policy)?))
                }
                None => BtNode::new(Repeater::empty(*times)),
            },
            NodeTemplate::Wait(duration) => BtNode::new(Wait::new(*duration)),
            NodeTemplate::DebugLog(message) => BtNode::new(DebugLog::new(message.clone())),
            NodeTemplate::CheckFlag(key) => BtNode::new(CheckFlag::new(key.clone())),
            NodeTemplate::SetFlag { key, value } => BtNode::new(SetFlag::new(key.clone(), *value)),
            NodeTemplate::Action(id) => {
                let constructor = self
                    .actions
                    .get(id)
                    .ok_or_else(|| TreeError::UnknownAction(id.clone()))?;
                BtNode::from_boxed(constructor())
            }
        };
        Ok(node)
    }

    fn composite(
        &self,
        kind: CompositeKind,
        children: &[NodeTemplate],
        policy: EmptyCompositePolicy,
    ) -> Result<Composite, TreeError> {
        let children = children
            .iter()
            .map(|child| self.build_with_policy(child, policy))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Composite::new(kind, children).with_empty_policy(policy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviour_tree::action::FnAction;
    use crate::behaviour_tree::node::{NodeState, TickContext};

    const PATROL: &str = r#"(
        root: Selector([
            Sequence([CheckFlag("enemy_visible"), Action("attack")]),
            Repeater(times: 2, child: Some(Wait(0.5))),
        ]),
    )"#;

    #[test]
    fn test_parse_template() {
        let template = TreeTemplate::from_ron_str(PATROL).unwrap();
        match &template.root {
            NodeTemplate::Selector(children) => assert_eq!(children.len(), 2),
            other => panic!("expected selector root, got {:?}", other),
        }
        assert_eq!(template.empty_composite, None);
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let template = TreeTemplate::from_ron_str(PATROL).unwrap();
        let factory = NodeFactory::default();
        assert_eq!(
            factory.build_tree(&template).unwrap_err(),
            TreeError::UnknownAction("attack".to_string())
        );
    }

    #[test]
    fn test_build_preserves_child_order() {
        let mut factory = NodeFactory::default();
        factory.register("attack", || {
            FnAction::new("Attack", |_ctx: &mut TickContext| NodeState::Success)
        });
        let template = TreeTemplate::from_ron_str(PATROL).unwrap();
        let tree = factory.build_tree(&template).unwrap();

        let names: Vec<&str> = tree.root().children().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["Sequence", "Repeater"]);
        let leaves: Vec<&str> = tree.root().children()[0]
            .children()
            .iter()
            .map(|c| c.name())
            .collect();
        assert_eq!(leaves, vec!["CheckFlag", "Attack"]);
    }

    #[test]
    fn test_template_policy_overrides_factory() {
        let template = TreeTemplate {
            root: NodeTemplate::Sequence(vec![]),
            empty_composite: Some(EmptyCompositePolicy::Fail),
        };
        let mut tree = NodeFactory::default().build_tree(&template).unwrap();
        assert_eq!(tree.update(0.0), NodeState::Failure);
    }

    #[test]
    fn test_malformed_template_reports_parse_error() {
        assert!(matches!(
            TreeTemplate::from_ron_str("(root: Juggle)"),
            Err(TreeError::Parse(_))
        ));
    }
}
